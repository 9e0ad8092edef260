// Reporting endpoints: aggregate counts and sales history.

use tracing::debug;

use crate::admin::client::AdminClient;
use crate::admin::models::{RawSale, SalesResponse, StatsCounts, StatsResponse};
use crate::error::Error;

impl AdminClient {
    /// `GET {prefix}/stats`
    pub async fn stats(&self) -> Result<StatsCounts, Error> {
        let url = self.admin_url("stats")?;
        let resp: StatsResponse = self.get(url, &[]).await?;
        Ok(resp.into_counts())
    }

    /// `GET {prefix}/sales`
    pub async fn list_sales(&self) -> Result<Vec<RawSale>, Error> {
        let url = self.admin_url("sales")?;
        let resp: SalesResponse = self.get(url, &[]).await?;
        let sales = resp.into_sales();
        debug!(count = sales.len(), "sales fetched");
        Ok(sales)
    }
}
