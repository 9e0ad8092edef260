//! Stats command handler.

use vouchly_core::Console;

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

pub async fn handle(console: &Console, global: &GlobalOpts) -> Result<(), CliError> {
    let stats = console.load_stats().await?;
    let color = output::should_color(&global.color);

    let out = output::render_single(
        &global.output,
        &stats,
        |s| {
            [("Total", s.total), ("Unused", s.unused), ("Used", s.used)]
                .iter()
                .map(|(k, v)| format!("{} {v}", output::paint_label(&format!("{k:<7}"), color)))
                .collect::<Vec<_>>()
                .join("\n")
        },
        |s| format!("{} {} {}", s.total, s.unused, s.used),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
