//! Export a virtual service's application logs to CSV.
//!
//! The controller serves at most 10,000 logs per query and may still be
//! indexing, so `count` cannot be trusted. The export walks backwards in
//! time: each page moves `end` to the oldest timestamp seen until a page
//! comes back empty.

use std::io::Write;

use albctl_api::RequestOptions;
use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde_json::Value;
use tracing::{debug, info, warn};

use super::{array, text};
use crate::controller::Controller;
use crate::error::CoreError;

pub const PAGE_SIZE: u32 = 10_000;

#[derive(Debug, Clone)]
pub struct LogQuery {
    pub virtual_service: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub include_non_significant: bool,
    pub include_user_defined: bool,
    pub exclude_significant: bool,
}

/// Progress of a running export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportEvent<'a> {
    Fields(usize),
    Page { end: &'a DateTime<Utc>, count: usize },
}

/// Parse an ISO-8601 timestamp. Times without an offset are taken as UTC.
pub fn parse_timestamp(input: &str) -> Result<DateTime<Utc>, CoreError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(input, fmt).ok())
        .or_else(|| {
            chrono::NaiveDate::parse_from_str(input, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .map(|naive| naive.and_utc())
        .ok_or_else(|| CoreError::validation(format!("invalid timestamp {input:?}")))
}

fn iso_millis(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, false)
}

fn query_id() -> String {
    (Utc::now().timestamp_millis() / 10).to_string()
}

/// Render a log value for a spreadsheet-safe CSV cell. Text that a
/// spreadsheet would evaluate as a formula gets a leading `'`.
pub fn csv_cell(value: Option<&Value>) -> String {
    let raw = match value {
        None | Some(Value::Null) => return String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    };
    if raw.trim_start().starts_with(['+', '-', '=']) {
        format!("'{raw}")
    } else {
        raw
    }
}

fn base_options(query: &LogQuery, vs_uuid: &str) -> RequestOptions {
    RequestOptions::new()
        .param("virtualservice", vs_uuid)
        .param("nf", query.include_non_significant)
        .param("adf", !query.exclude_significant)
        .param("udf", query.include_user_defined)
}

/// Export logs as CSV into `writer`. Returns the number of logs written.
pub async fn export<W: Write>(
    ctrl: &Controller,
    query: &LogQuery,
    writer: W,
    mut on_event: impl FnMut(ExportEvent<'_>),
) -> Result<u64, CoreError> {
    let session = ctrl.session();
    let vs = session
        .get_object_by_name(
            "virtualservice",
            &query.virtual_service,
            RequestOptions::new().param("fields", "uuid"),
        )
        .await?
        .ok_or_else(|| CoreError::not_found("Virtual Service", &query.virtual_service))?;
    let vs_uuid = text(&vs, "uuid").to_owned();

    // A one-log CSV download tells us the column set.
    let probe = base_options(query, &vs_uuid)
        .param("download", true)
        .param("page_size", 1)
        .param("duration", 1)
        .param("query_id", query_id());
    let header = session.get_text("analytics/logs", &probe).await?;
    let fields: Vec<String> = header
        .lines()
        .next()
        .filter(|line| !line.trim().is_empty())
        .ok_or_else(|| CoreError::unexpected("log download returned no header line"))?
        .split(',')
        .map(str::to_owned)
        .collect();
    on_event(ExportEvent::Fields(fields.len()));
    debug!(?fields, "log fields");

    let mut csv = csv::Writer::from_writer(writer);
    let write_err = |e: csv::Error| CoreError::OperationFailed {
        message: format!("cannot write CSV: {e}"),
    };
    csv.write_record(&fields).map_err(write_err)?;

    let mut end = query.end;
    let mut total: u64 = 0;
    loop {
        let opts = base_options(query, &vs_uuid)
            .param("start", iso_millis(&query.start))
            .param("end", iso_millis(&end))
            .param("download", false)
            .param("format", "json")
            .param("page_size", PAGE_SIZE)
            .param("page", 1)
            .param("query_id", query_id());
        let page: Value = session.get_json("analytics/logs", &opts).await?;
        let results = array(&page, "results");
        on_event(ExportEvent::Page {
            end: &end,
            count: results.len(),
        });
        if results.is_empty() {
            break;
        }

        for log in results {
            csv.write_record(fields.iter().map(|f| csv_cell(log.get(f))))
                .map_err(write_err)?;
        }
        total += u64::try_from(results.len()).unwrap_or(u64::MAX);

        let last = results
            .last()
            .map(|l| text(l, "report_timestamp"))
            .unwrap_or_default();
        let next_end = parse_timestamp(last)?;
        if next_end >= end {
            warn!(%last, "log window did not move backwards; stopping");
            break;
        }
        end = next_end;
    }

    csv.flush().map_err(|e| CoreError::io("<csv output>", e))?;
    info!(total, vs = %query.virtual_service, "log export finished");
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn formula_like_values_are_quoted() {
        assert_eq!(csv_cell(Some(&json!("=SUM(A1)"))), "'=SUM(A1)");
        assert_eq!(csv_cell(Some(&json!("  -1"))), "'  -1");
        assert_eq!(csv_cell(Some(&json!(-5))), "'-5");
        assert_eq!(csv_cell(Some(&json!("GET /index.html"))), "GET /index.html");
        assert_eq!(csv_cell(Some(&json!(200))), "200");
        assert_eq!(csv_cell(None), "");
        assert_eq!(csv_cell(Some(&Value::Null)), "");
    }

    #[test]
    fn timestamps_with_and_without_offset() {
        let utc = parse_timestamp("2024-01-01T00:00").unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(iso_millis(&utc), "2024-01-01T00:00:00.000+00:00");

        let shifted =
            parse_timestamp("2024-01-01T02:00:00.5+02:00").unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(iso_millis(&shifted), "2024-01-01T00:00:00.500+00:00");

        assert!(parse_timestamp("2024-01-01").is_ok());
        assert!(parse_timestamp("not a date").is_err());
    }
}
