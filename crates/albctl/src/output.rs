//! Output formatting: table, JSON, YAML, plain, CSV.
//!
//! Renders data in the format selected by `--output`. Table uses `tabled`,
//! structured formats use serde, plain emits one identifier per line.
//! Spreadsheet-style reports can also be written as CSV with `--file`.

use std::io::{self, IsTerminal, Write};
use std::path::Path;

use owo_colors::OwoColorize;
use tabled::{Table, Tabled, builder::Builder, settings::Style};

use crate::cli::{ColorMode, OutputFormat};
use crate::error::CliError;

// ── Color helpers ────────────────────────────────────────────────────

pub fn should_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

/// Outcome of a per-object change, colored when enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    Skipped,
    Failed,
}

pub fn paint(text: &str, status: Status, color: bool) -> String {
    if !color {
        return text.to_owned();
    }
    match status {
        Status::Ok => text.green().to_string(),
        Status::Skipped => text.yellow().to_string(),
        Status::Failed => text.red().to_string(),
    }
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render a list of serde-serializable items in the chosen format.
///
/// - `table`: builds rows with `to_row` and renders them with `tabled`
/// - `json` / `json-compact` / `yaml`: serializes the original data
/// - `plain`: calls `id_fn` on each item, one per line
pub fn render_list<T, R>(
    format: OutputFormat,
    data: &[T],
    to_row: impl Fn(&T) -> R,
    id_fn: impl Fn(&T) -> String,
) -> String
where
    T: serde::Serialize,
    R: Tabled,
{
    match format {
        OutputFormat::Table => {
            let rows: Vec<R> = data.iter().map(to_row).collect();
            render_table(&rows)
        }
        OutputFormat::Json => render_json_pretty(data),
        OutputFormat::JsonCompact => render_json_compact(data),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => data.iter().map(&id_fn).collect::<Vec<_>>().join("\n"),
    }
}

/// Render a single item. Table mode uses `detail_fn`.
pub fn render_single<T>(
    format: OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> String,
    id_fn: impl Fn(&T) -> String,
) -> String
where
    T: serde::Serialize,
{
    match format {
        OutputFormat::Table => detail_fn(data),
        OutputFormat::Json => render_json_pretty(data),
        OutputFormat::JsonCompact => render_json_compact(data),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => id_fn(data),
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

pub fn render_table<R: Tabled>(rows: &[R]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

/// Table from dynamic headers and rows (metrics series).
pub fn render_dynamic_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut builder = Builder::default();
    builder.push_record(headers.iter().cloned());
    for row in rows {
        builder.push_record(row.iter().cloned());
    }
    builder.build().with(Style::rounded()).to_string()
}

pub(crate) fn render_json_pretty<T: serde::Serialize + ?Sized>(data: &T) -> String {
    serde_json::to_string_pretty(data).unwrap_or_else(|e| format!("serialization failed: {e}"))
}

pub(crate) fn render_json_compact<T: serde::Serialize + ?Sized>(data: &T) -> String {
    serde_json::to_string(data).unwrap_or_else(|e| format!("serialization failed: {e}"))
}

pub(crate) fn render_yaml<T: serde::Serialize + ?Sized>(data: &T) -> String {
    serde_yaml::to_string(data).unwrap_or_else(|e| format!("serialization failed: {e}"))
}

// ── CSV ─────────────────────────────────────────────────────────────

fn csv_err(e: csv::Error) -> CliError {
    CliError::Io(io::Error::other(e))
}

/// Write `Tabled` rows as CSV, using the table headers as the header row.
pub fn write_csv<R: Tabled, W: Write>(rows: &[R], writer: W) -> Result<(), CliError> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(R::headers().iter().map(AsRef::<str>::as_ref))
        .map_err(csv_err)?;
    for row in rows {
        csv.write_record(row.fields().iter().map(AsRef::<str>::as_ref))
            .map_err(csv_err)?;
    }
    csv.flush()?;
    Ok(())
}

/// Write dynamic headers and rows as CSV.
pub fn write_dynamic_csv<W: Write>(
    headers: &[String],
    rows: &[Vec<String>],
    writer: W,
) -> Result<(), CliError> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(headers).map_err(csv_err)?;
    for row in rows {
        csv.write_record(row).map_err(csv_err)?;
    }
    csv.flush()?;
    Ok(())
}

/// Create (or truncate) an output file.
pub fn create_file(path: &Path) -> Result<std::fs::File, CliError> {
    std::fs::File::create(path).map_err(|source| CliError::FileAccess {
        path: path.display().to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Tabled, serde::Serialize)]
    struct Row {
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "Port")]
        port: String,
    }

    fn rows() -> Vec<Row> {
        vec![
            Row {
                name: "web, primary".into(),
                port: "443".into(),
            },
            Row {
                name: "api".into(),
                port: "8443".into(),
            },
        ]
    }

    #[test]
    fn csv_uses_table_headers_and_quotes() {
        let mut buf = Vec::new();
        write_csv(&rows(), &mut buf).unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(
            String::from_utf8_lossy(&buf),
            "Name,Port\n\"web, primary\",443\napi,8443\n"
        );
    }

    #[test]
    fn plain_and_json_lists() {
        let data = rows();
        let plain = render_list(OutputFormat::Plain, &data, Row::clone, |r| r.name.clone());
        assert_eq!(plain, "web, primary\napi");
        let json = render_list(OutputFormat::JsonCompact, &data, Row::clone, |r| r.name.clone());
        assert_eq!(
            json,
            r#"[{"name":"web, primary","port":"443"},{"name":"api","port":"8443"}]"#
        );
    }

    #[test]
    fn dynamic_table_has_every_cell() {
        let table = render_dynamic_table(
            &["Timestamp".into(), "rx".into()],
            &[vec!["t1".into(), "1".into()], vec!["t2".into(), String::new()]],
        );
        assert!(table.contains("Timestamp"));
        assert!(table.contains("t2"));
    }

    #[test]
    fn paint_is_identity_without_color() {
        assert_eq!(paint("ok", Status::Ok, false), "ok");
    }
}
