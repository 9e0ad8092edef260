//! Output formatting: table, JSON, YAML, plain, HTML.
//!
//! Renders data in the format selected by `--output`. Table uses `tabled`,
//! structured formats use serde, plain emits one identifier per line, and
//! HTML goes through the escaping renderers in `vouchly_core::html`.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use tabled::{Table, Tabled, settings::Style};

use vouchly_core::html::escape_html;

use crate::cli::{ColorMode, OutputFormat};
use crate::error::CliError;

// ── Color helpers ───────────────────────────────────────────────────

/// Determine whether color output should be enabled.
pub fn should_color(mode: &ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

/// Voucher status, green when available and dimmed when used.
pub fn paint_status(used: bool, color: bool) -> String {
    let label = if used { "used" } else { "unused" };
    match (color, used) {
        (false, _) => label.to_owned(),
        (true, true) => label.dimmed().to_string(),
        (true, false) => label.green().to_string(),
    }
}

/// Bold label for detail views.
pub fn paint_label(label: &str, color: bool) -> String {
    if color {
        label.bold().to_string()
    } else {
        label.to_owned()
    }
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render a list in the chosen format.
///
/// - `table`: `to_row` builds `Tabled` rows
/// - `json` / `json-compact` / `yaml`: serializes the data via serde
/// - `plain`: `id_fn` per item, one per line
/// - `html`: `html_fn` renders the whole list
pub fn render_list<T, R>(
    format: &OutputFormat,
    data: &[T],
    to_row: impl Fn(&T) -> R,
    id_fn: impl Fn(&T) -> String,
    html_fn: impl Fn(&[T]) -> String,
) -> Result<String, CliError>
where
    T: serde::Serialize,
    R: Tabled,
{
    Ok(match format {
        OutputFormat::Table => {
            let rows: Vec<R> = data.iter().map(to_row).collect();
            render_table(&rows)
        }
        OutputFormat::Json => render_json(data, false)?,
        OutputFormat::JsonCompact => render_json(data, true)?,
        OutputFormat::Yaml => render_yaml(data)?,
        OutputFormat::Plain => data.iter().map(&id_fn).collect::<Vec<_>>().join("\n"),
        OutputFormat::Html => html_fn(data),
    })
}

/// Render a single item. Table output uses `detail_fn`; HTML wraps the
/// same text in an escaped `<pre>`.
pub fn render_single<T>(
    format: &OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> String,
    id_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: serde::Serialize,
{
    Ok(match format {
        OutputFormat::Table => detail_fn(data),
        OutputFormat::Json => render_json(data, false)?,
        OutputFormat::JsonCompact => render_json(data, true)?,
        OutputFormat::Yaml => render_yaml(data)?,
        OutputFormat::Plain => id_fn(data),
        OutputFormat::Html => format!("<pre>{}</pre>", escape_html(&detail_fn(data))),
    })
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{}", output.trim_end_matches('\n'));
}

// ── Format-specific renderers ────────────────────────────────────────

fn render_table<R: Tabled>(rows: &[R]) -> String {
    if rows.is_empty() {
        return "(no results)".into();
    }
    Table::new(rows).with(Style::rounded()).to_string()
}

fn render_json<T: serde::Serialize + ?Sized>(data: &T, compact: bool) -> Result<String, CliError> {
    let rendered = if compact {
        serde_json::to_string(data)
    } else {
        serde_json::to_string_pretty(data)
    };
    rendered.map_err(|e| CliError::Internal(format!("JSON serialization failed: {e}")))
}

fn render_yaml<T: serde::Serialize + ?Sized>(data: &T) -> Result<String, CliError> {
    serde_yaml::to_string(data)
        .map_err(|e| CliError::Internal(format!("YAML serialization failed: {e}")))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[derive(serde::Serialize)]
    struct Item {
        id: u32,
        name: String,
    }

    #[derive(Tabled)]
    struct ItemRow {
        #[tabled(rename = "Name")]
        name: String,
    }

    fn items() -> Vec<Item> {
        vec![
            Item {
                id: 1,
                name: "a<b".into(),
            },
            Item {
                id: 2,
                name: "c".into(),
            },
        ]
    }

    fn render(format: &OutputFormat) -> String {
        render_list(
            format,
            &items(),
            |i| ItemRow {
                name: i.name.clone(),
            },
            |i| i.id.to_string(),
            |all| format!("{} rows", all.len()),
        )
        .unwrap()
    }

    #[test]
    fn plain_is_one_id_per_line() {
        assert_eq!(render(&OutputFormat::Plain), "1\n2");
    }

    #[test]
    fn compact_json_is_single_line() {
        assert_eq!(
            render(&OutputFormat::JsonCompact),
            r#"[{"id":1,"name":"a<b"},{"id":2,"name":"c"}]"#
        );
    }

    #[test]
    fn html_uses_list_renderer() {
        assert_eq!(render(&OutputFormat::Html), "2 rows");
    }

    #[test]
    fn single_html_is_escaped() {
        let out = render_single(
            &OutputFormat::Html,
            &items()[0],
            |i| i.name.clone(),
            |i| i.id.to_string(),
        )
        .unwrap();
        assert_eq!(out, "<pre>a&lt;b</pre>");
    }

    #[test]
    fn status_without_color_is_plain() {
        assert_eq!(paint_status(true, false), "used");
        assert_eq!(paint_status(false, false), "unused");
    }
}
