//! Sales command handlers.

use std::sync::Arc;

use tabled::Tabled;

use vouchly_core::{Console, Sale, export, html};

use crate::cli::{GlobalOpts, SalesArgs, SalesCommand};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct SaleRow {
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Phone")]
    phone: String,
    #[tabled(rename = "Email")]
    email: String,
    #[tabled(rename = "Voucher")]
    voucher: String,
    #[tabled(rename = "Reference")]
    reference: String,
}

impl From<&Arc<Sale>> for SaleRow {
    fn from(s: &Arc<Sale>) -> Self {
        Self {
            date: s.date.clone().unwrap_or_default(),
            name: s.name.clone().unwrap_or_default(),
            phone: s.phone.clone().unwrap_or_default(),
            email: s.email.clone().unwrap_or_default(),
            voucher: s.voucher_display(),
            reference: s.reference.clone().unwrap_or_default(),
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(console: &Console, args: SalesArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        SalesCommand::List => {
            let spinner = util::spinner("Loading sales...", global.quiet);
            let sales = console.load_sales().await;
            spinner.finish_and_clear();
            let sales = sales?;

            let out = output::render_list(
                &global.output,
                &sales,
                |s| SaleRow::from(s),
                |s| s.reference.clone().unwrap_or_default(),
                |all| html::sales_table(all.iter().map(Arc::as_ref)),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        SalesCommand::Export { file } => {
            let sales = console.load_sales().await?;
            let csv = export::sales_csv(sales.iter().map(Arc::as_ref));
            util::write_export(file.as_deref(), &csv, global.quiet)
        }
    }
}
