//! Voucher command handlers.

use std::path::Path;
use std::sync::Arc;

use tabled::Tabled;

use vouchly_core::{
    ActionKey, Command as CoreCommand, Console, RowAction, Voucher, VoucherFilter, csv_import,
    export, html,
};

use crate::cli::{FilterArgs, GlobalOpts, VouchersArgs, VouchersCommand};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct VoucherRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Serial")]
    serial: String,
    #[tabled(rename = "PIN")]
    pin: String,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Reference")]
    reference: String,
    #[tabled(rename = "Used at")]
    date_used: String,
}

impl VoucherRow {
    fn new(v: &Voucher, color: bool) -> Self {
        Self {
            id: v.id.to_string(),
            serial: v.serial.clone(),
            pin: v.pin.clone(),
            kind: v.kind.clone().unwrap_or_default(),
            status: output::paint_status(v.used, color),
            reference: v.reference.clone().unwrap_or_default(),
            date_used: v.date_used.clone().unwrap_or_default(),
        }
    }
}

fn to_filter(args: FilterArgs) -> VoucherFilter {
    VoucherFilter::new(
        util::status_filter(args.status),
        args.search.unwrap_or_default(),
    )
}

async fn run_action(
    console: &Console,
    action: RowAction,
    id: &str,
    buyer: Option<String>,
    global: &GlobalOpts,
    fallback: &str,
) -> Result<(), CliError> {
    let key = ActionKey::from_attributes(action.as_str(), id)?;
    let result = console.execute(key.into_command(buyer)).await?;
    util::report(&result.summary(fallback), global.quiet);
    Ok(())
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| "vouchers.csv".into(), |n| n.to_string_lossy().into_owned())
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    console: &Console,
    args: VouchersArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        VouchersCommand::List(filter) => {
            let spinner = util::spinner("Loading vouchers...", global.quiet);
            let list = console.load_vouchers(&to_filter(filter)).await;
            spinner.finish_and_clear();
            let list = list?;

            let color = output::should_color(&global.color);
            let out = output::render_list(
                &global.output,
                &list,
                |v| VoucherRow::new(v, color),
                |v| v.id.to_string(),
                |all| html::voucher_table(all.iter().map(Arc::as_ref)),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        VouchersCommand::Add { serial, pin, kind } => {
            let result = console
                .execute(CoreCommand::AddVoucher { serial, pin, kind })
                .await?;
            util::report(&result.summary("Voucher added"), global.quiet);
            Ok(())
        }

        VouchersCommand::Import { file, dry_run } => {
            let text = std::fs::read_to_string(&file)?;

            if dry_run {
                let batch = csv_import::import_csv(&text, &console.config().default_voucher_type);
                util::report(
                    &format!(
                        "{} row(s) ready to upload, {} skipped (missing serial or pin)",
                        batch.rows.len(),
                        batch.skipped
                    ),
                    global.quiet,
                );
                return Ok(());
            }

            let spinner = util::spinner("Uploading vouchers...", global.quiet);
            let result = console.import_csv(&text, &file_label(&file)).await;
            spinner.finish_and_clear();
            util::report(&result?.summary("Upload complete"), global.quiet);
            Ok(())
        }

        VouchersCommand::MarkUsed {
            voucher,
            by_serial,
            buyer,
        } => {
            if by_serial {
                let result = console
                    .execute(CoreCommand::MarkUsedBySerial {
                        serial: voucher,
                        buyer,
                    })
                    .await?;
                util::report(&result.summary("Voucher marked as used"), global.quiet);
                Ok(())
            } else {
                run_action(
                    console,
                    RowAction::MarkUsed,
                    &voucher,
                    buyer,
                    global,
                    "Voucher marked as used",
                )
                .await
            }
        }

        VouchersCommand::Delete { id } => {
            let prompt = RowAction::Delete.confirm_prompt(&id);
            if !util::confirm(&prompt, "vouchers delete", global.yes)? {
                return Ok(());
            }
            run_action(console, RowAction::Delete, &id, None, global, "Voucher deleted").await
        }

        VouchersCommand::Resend { id } => {
            let prompt = RowAction::Resend.confirm_prompt(&id);
            if !util::confirm(&prompt, "vouchers resend", global.yes)? {
                return Ok(());
            }
            run_action(console, RowAction::Resend, &id, None, global, "Voucher resent").await
        }

        VouchersCommand::Export { filter, file } => {
            let list = console.load_vouchers(&to_filter(filter)).await?;
            let csv = export::vouchers_csv(list.iter().map(Arc::as_ref));
            util::write_export(file.as_deref(), &csv, global.quiet)
        }
    }
}

#[cfg(test)]
mod tests {
    use vouchly_core::VoucherId;

    use super::*;

    #[test]
    fn row_shows_blank_optionals() {
        let voucher = Voucher {
            id: VoucherId::Numeric(7),
            serial: "WAE7".into(),
            pin: "1234".into(),
            kind: None,
            used: true,
            reference: None,
            date_used: None,
            phone: None,
            email: None,
        };
        let row = VoucherRow::new(&voucher, false);
        assert_eq!(row.id, "7");
        assert_eq!(row.status, "used");
        assert!(row.kind.is_empty());
    }

    #[test]
    fn import_file_label_uses_file_name() {
        assert_eq!(file_label(Path::new("/tmp/batch-3.csv")), "batch-3.csv");
    }
}
