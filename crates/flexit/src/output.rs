//! Output formatting: table, JSON, YAML, plain.
//!
//! Renders data in the format selected by `--output`. Table uses `tabled`,
//! structured formats use serde, plain emits a single scripting value.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use tabled::{Table, Tabled, settings::Style};

use crate::cli::{ColorMode, OutputFormat};

// ── Color helpers ────────────────────────────────────────────────────

/// Determine whether color output should be enabled.
pub fn should_color(mode: &ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

/// Red when `alert` and color is on, plain otherwise.
pub fn alert(text: &str, alert: bool, color: bool) -> String {
    if alert && color {
        text.red().bold().to_string()
    } else {
        text.to_owned()
    }
}

pub fn dim(text: &str, color: bool) -> String {
    if color {
        text.dimmed().to_string()
    } else {
        text.to_owned()
    }
}

// ── Value formatting ─────────────────────────────────────────────────

/// Placeholder for readings the unit did not report.
pub const MISSING: &str = "—";

pub fn celsius(value: Option<f64>) -> String {
    value.map_or_else(|| MISSING.into(), |v| format!("{v:.1} °C"))
}

pub fn hours(value: Option<u32>) -> String {
    value.map_or_else(|| MISSING.into(), |v| format!("{v} h"))
}

pub fn text(value: Option<&str>) -> String {
    value.map_or_else(|| MISSING.into(), str::to_owned)
}

// ── Render dispatchers ───────────────────────────────────────────────

#[derive(Tabled)]
struct FieldRow {
    #[tabled(rename = "Field")]
    field: String,
    #[tabled(rename = "Value")]
    value: String,
}

/// Two-column field/value table for single-item detail views.
pub fn render_fields(fields: Vec<(&str, String)>) -> String {
    let rows: Vec<FieldRow> = fields
        .into_iter()
        .map(|(field, value)| FieldRow {
            field: field.to_owned(),
            value,
        })
        .collect();
    Table::new(rows).with(Style::rounded()).to_string()
}

/// Render a single serde-serializable item in the chosen format.
///
/// Table rendering uses `detail_fn`, plain uses `plain_fn`.
pub fn render_single<T>(
    format: &OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> String,
    plain_fn: impl Fn(&T) -> String,
) -> String
where
    T: serde::Serialize,
{
    match format {
        OutputFormat::Table => detail_fn(data),
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => plain_fn(data),
    }
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

// ── Format-specific renderers ────────────────────────────────────────

fn render_json<T: serde::Serialize + ?Sized>(data: &T, compact: bool) -> String {
    let rendered = if compact {
        serde_json::to_string(data)
    } else {
        serde_json::to_string_pretty(data)
    };
    rendered.unwrap_or_else(|e| format!("{{\"error\": \"serialization failed: {e}\"}}"))
}

fn render_yaml<T: serde::Serialize + ?Sized>(data: &T) -> String {
    serde_yaml::to_string(data).unwrap_or_else(|e| format!("error: serialization failed: {e}"))
}
