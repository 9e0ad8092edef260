// Voucher endpoints
//
// Listing, manual add, bulk upload, mark-used, delete and resend.

use tracing::debug;

use crate::admin::client::AdminClient;
use crate::admin::models::{
    Ack, IdRequest, MarkUsedRequest, NewVoucher, RawId, RawVoucher, UploadRequest, UploadRow,
    VoucherListResponse, VoucherQuery,
};
use crate::error::Error;
use crate::layout::ListingMode;

impl AdminClient {
    /// `GET {prefix}/vouchers`
    ///
    /// In [`ListingMode::Query`] the status and search terms are forwarded
    /// as query parameters. The response is normalized from any of the
    /// accepted list shapes.
    pub async fn list_vouchers(
        &self,
        mode: ListingMode,
        query: VoucherQuery<'_>,
    ) -> Result<Vec<RawVoucher>, Error> {
        let url = self.admin_url("vouchers")?;
        let pairs = match mode {
            ListingMode::Query => query.pairs(),
            ListingMode::Plain => Vec::new(),
        };
        let resp: VoucherListResponse = self.get(url, &pairs).await?;
        let vouchers = resp.into_vouchers();
        debug!(count = vouchers.len(), "vouchers fetched");
        Ok(vouchers)
    }

    /// `POST {prefix}/vouchers` -- add a single voucher.
    pub async fn add_voucher(&self, voucher: &NewVoucher) -> Result<Ack, Error> {
        let url = self.admin_url("vouchers")?;
        debug!(serial = %voucher.serial, "adding voucher");
        self.post_ack(url, voucher).await
    }

    /// `POST {prefix}/upload` with `{"vouchers": [...]}`.
    ///
    /// All rows travel in one request; the backend reports how many it
    /// inserted.
    pub async fn upload_vouchers(&self, rows: &[UploadRow]) -> Result<Ack, Error> {
        let url = self.admin_url("upload")?;
        debug!(rows = rows.len(), "uploading vouchers");
        self.post_ack(url, &UploadRequest { vouchers: rows }).await
    }

    /// `POST {prefix}/upload` as `multipart/form-data`.
    ///
    /// The rows are rendered back into a `serial,pin,type` CSV and sent as
    /// the `file` part.
    pub async fn upload_vouchers_multipart(
        &self,
        file_name: &str,
        rows: &[UploadRow],
    ) -> Result<Ack, Error> {
        let url = self.admin_url("upload")?;
        debug!(rows = rows.len(), file_name, "uploading vouchers (multipart)");

        let mut csv = String::from("serial,pin,type\n");
        for row in rows {
            csv.push_str(&row.serial);
            csv.push(',');
            csv.push_str(&row.pin);
            csv.push(',');
            csv.push_str(&row.kind);
            csv.push('\n');
        }

        let part = reqwest::multipart::Part::text(csv)
            .file_name(file_name.to_owned())
            .mime_str("text/csv")?;
        let form = reqwest::multipart::Form::new().part("file", part);
        self.post_multipart_ack(url, form).await
    }

    /// `POST {prefix}/mark-used`
    pub async fn mark_used(&self, request: &MarkUsedRequest) -> Result<Ack, Error> {
        let url = self.admin_url("mark-used")?;
        debug!(voucher = ?request.target, "marking voucher used");
        self.post_ack(url, request).await
    }

    /// `DELETE {prefix}/vouchers/{id}`
    pub async fn delete_voucher(&self, id: &RawId) -> Result<Ack, Error> {
        let url = self.admin_url(&format!("vouchers/{id}"))?;
        self.delete_ack(url).await
    }

    /// `POST {prefix}/resend` -- re-send the voucher notification to its buyer.
    pub async fn resend_voucher(&self, id: &RawId) -> Result<Ack, Error> {
        let url = self.admin_url("resend")?;
        debug!(%id, "resending voucher");
        self.post_ack(url, &IdRequest { id }).await
    }
}
