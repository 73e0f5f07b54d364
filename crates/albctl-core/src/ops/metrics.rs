//! Metric time series for a service engine, virtual service or pool.

use std::collections::BTreeMap;
use std::time::Duration;

use albctl_api::RequestOptions;
use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{Map, Value, json};
use strum::{Display, EnumString};
use tracing::debug;

use super::{array, scalar, text, text_at};
use crate::controller::Controller;
use crate::error::CoreError;

pub const DEFAULT_METRICS: &str = "l4_client.avg_rx_bytes,l4_client.avg_tx_bytes";
pub const DEFAULT_HISTORY: &str = "60m";

/// Sample interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
pub enum Granularity {
    #[strum(serialize = "realtime")]
    Realtime,
    #[default]
    #[strum(serialize = "5min")]
    FiveMinutes,
    #[strum(serialize = "hour")]
    Hour,
    #[strum(serialize = "day")]
    Day,
}

impl Granularity {
    pub fn seconds(self) -> u64 {
        match self {
            Self::Realtime => 5,
            Self::FiveMinutes => 300,
            Self::Hour => 3_600,
            Self::Day => 86_400,
        }
    }
}

/// Parse a history span: plain seconds (`3600`) or a duration with unit
/// suffix (`60m`, `2h`, `1d`, `1h30m`).
pub fn parse_history(input: &str) -> Result<Duration, CoreError> {
    let input = input.trim();
    if !input.is_empty() && input.bytes().all(|b| b.is_ascii_digit()) {
        let secs = input
            .parse::<u64>()
            .map_err(|e| CoreError::validation(format!("invalid history {input:?}: {e}")))?;
        return Ok(Duration::from_secs(secs));
    }
    humantime::parse_duration(input)
        .map_err(|e| CoreError::validation(format!("invalid history {input:?}: {e}")))
}

/// Parse an ISO-8601 end time. Offsets are honoured; naive times are sent
/// as written (the controller treats them as UTC).
pub fn parse_end(input: &str) -> Result<String, CoreError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.to_rfc3339_opts(SecondsFormat::AutoSi, false));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(input, fmt).ok())
        .map(|dt| dt.format("%Y-%m-%dT%H:%M:%S%.f").to_string())
        .ok_or_else(|| CoreError::validation(format!("invalid end time {input:?}")))
}

/// What to query, by object name.
#[derive(Debug, Clone, Default)]
pub struct MetricsQuery {
    pub metric_ids: Vec<String>,
    pub granularity: Granularity,
    /// ISO-8601 end time; now when `None`.
    pub end: Option<String>,
    pub history: Duration,
    pub service_engine: Option<String>,
    pub virtual_service: Option<String>,
    pub pool: Option<String>,
    /// Aggregate across every entity on the service engine.
    pub aggregate: bool,
    /// Component id for rule/group level metrics (e.g. WAF rules).
    pub obj_id: Option<String>,
    pub aggregate_obj_id: bool,
    pub pad_missing_data: bool,
}

/// Resolved UUIDs of the selected objects.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Entities {
    pub service_engine: Option<String>,
    pub virtual_service: Option<String>,
    pub pool: Option<String>,
}

/// Build one `metric_requests` entry.
///
/// Supported selections: SE alone (optionally aggregated), VS alone,
/// pool alone, or VS plus pool.
pub fn build_request(
    query: &MetricsQuery,
    entities: &Entities,
    stop: &str,
) -> Result<Map<String, Value>, CoreError> {
    let step = query.granularity.seconds();
    let mut req = Map::new();
    req.insert("stop".into(), json!(stop));
    req.insert("step".into(), json!(step));
    req.insert("limit".into(), json!(query.history.as_secs() / step));
    req.insert("metric_id".into(), json!(query.metric_ids.join(",")));
    req.insert("pad_missing_data".into(), json!(query.pad_missing_data));

    match (&entities.service_engine, &entities.virtual_service, &entities.pool) {
        (Some(se), None, None) => {
            if query.aggregate {
                req.insert("aggregate_entity".into(), json!(true));
                req.insert("entity_uuid".into(), json!("*"));
                req.insert("service_engine_uuid".into(), json!(se));
            } else {
                req.insert("entity_uuid".into(), json!(se));
            }
        }
        (None, Some(vs), None) => {
            req.insert("entity_uuid".into(), json!(vs));
        }
        (None, None, Some(pool)) => {
            req.insert("entity_uuid".into(), json!(pool));
        }
        (None, Some(vs), Some(pool)) => {
            req.insert("entity_uuid".into(), json!(vs));
            req.insert("pool_uuid".into(), json!(pool));
        }
        _ => return Err(CoreError::validation("Unsupported combination of options")),
    }

    if let Some(obj_id) = &query.obj_id {
        req.insert("obj_id".into(), json!(obj_id));
        if query.aggregate_obj_id {
            req.insert("aggregate_obj_id".into(), json!(true));
        }
    }
    Ok(req)
}

/// One series rendered as a table: `Timestamp` then one column per metric.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesTable {
    pub name: String,
    pub headers: Vec<String>,
    /// Rows sorted by timestamp; a metric without a sample at that
    /// timestamp leaves an empty cell.
    pub rows: Vec<Vec<String>>,
}

/// Turn a `series` response into tables, one per series.
pub fn tables(response: &Value) -> Vec<SeriesTable> {
    let Some(series) = response.get("series").and_then(Value::as_object) else {
        return Vec::new();
    };

    series
        .iter()
        .map(|(name, metrics)| {
            let metrics = metrics.as_array().map_or(&[][..], Vec::as_slice);
            let mut headers = vec!["Timestamp".to_owned()];
            let mut by_time: BTreeMap<String, Vec<String>> = BTreeMap::new();

            for (column, metric) in metrics.iter().enumerate() {
                headers.push(format!(
                    "{} in {}",
                    text_at(metric, "/header/name"),
                    text_at(metric, "/header/units")
                ));
                for point in array(metric, "data") {
                    let cells = by_time
                        .entry(text(point, "timestamp").to_owned())
                        .or_insert_with(|| vec![String::new(); metrics.len()]);
                    if let Some(cell) = cells.get_mut(column) {
                        *cell = scalar(point.get("value"));
                    }
                }
            }

            let rows = by_time
                .into_iter()
                .map(|(ts, cells)| std::iter::once(ts).chain(cells).collect())
                .collect();
            SeriesTable {
                name: name.clone(),
                headers,
                rows,
            }
        })
        .collect()
}

async fn uuid_of(
    ctrl: &Controller,
    object_type: &str,
    label: &str,
    name: Option<&str>,
) -> Result<Option<String>, CoreError> {
    let Some(name) = name else {
        return Ok(None);
    };
    let object = ctrl
        .session()
        .get_object_by_name(object_type, name, RequestOptions::new())
        .await?
        .ok_or_else(|| CoreError::not_found(label, name))?;
    Ok(Some(text(&object, "uuid").to_owned()))
}

/// Fetch the requested metrics.
pub async fn collect(ctrl: &Controller, query: &MetricsQuery) -> Result<Vec<SeriesTable>, CoreError> {
    let entities = Entities {
        service_engine: uuid_of(ctrl, "serviceengine", "Service Engine", query.service_engine.as_deref())
            .await?,
        virtual_service: uuid_of(
            ctrl,
            "virtualservice",
            "Virtual Service",
            query.virtual_service.as_deref(),
        )
        .await?,
        pool: uuid_of(ctrl, "pool", "Pool", query.pool.as_deref()).await?,
    };

    let stop = query.end.clone().unwrap_or_else(|| {
        Utc::now().to_rfc3339_opts(SecondsFormat::Micros, false)
    });
    let request = build_request(query, &entities, &stop)?;
    debug!(?request, "metrics request");

    let response: Value = ctrl
        .session()
        .post_json(
            "analytics/metrics/collection",
            &json!({"metric_requests": [request]}),
            &RequestOptions::new(),
        )
        .await?;

    let tables = tables(&response);
    if tables.is_empty() {
        return Err(CoreError::OperationFailed {
            message: "No data was returned - did you get a parameter wrong?".into(),
        });
    }
    Ok(tables)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn query() -> MetricsQuery {
        MetricsQuery {
            metric_ids: vec!["l4_client.avg_rx_bytes".into(), "l4_client.avg_tx_bytes".into()],
            history: Duration::from_secs(3_600),
            ..MetricsQuery::default()
        }
    }

    #[test]
    fn history_spans() {
        assert_eq!(parse_history("60m").ok(), Some(Duration::from_secs(3_600)));
        assert_eq!(parse_history("2h").ok(), Some(Duration::from_secs(7_200)));
        assert_eq!(parse_history("1d").ok(), Some(Duration::from_secs(86_400)));
        assert_eq!(parse_history("900").ok(), Some(Duration::from_secs(900)));
        assert!(parse_history("soon").is_err());
    }

    #[test]
    fn end_time_formats() {
        assert_eq!(
            parse_end("2024-05-01T12:00:00Z").ok().as_deref(),
            Some("2024-05-01T12:00:00+00:00")
        );
        assert_eq!(
            parse_end("2024-05-01 12:00:00").ok().as_deref(),
            Some("2024-05-01T12:00:00")
        );
        assert!(parse_end("yesterday").is_err());
    }

    #[test]
    fn limit_is_history_over_step() {
        let entities = Entities {
            virtual_service: Some("vs-1".into()),
            ..Entities::default()
        };
        let req = build_request(&query(), &entities, "now").unwrap_or_default();
        assert_eq!(req["step"], json!(300));
        assert_eq!(req["limit"], json!(12));
        assert_eq!(req["entity_uuid"], json!("vs-1"));
        assert_eq!(req["metric_id"], json!("l4_client.avg_rx_bytes,l4_client.avg_tx_bytes"));
        assert!(req.get("pool_uuid").is_none());
    }

    #[test]
    fn aggregated_service_engine() {
        let mut q = query();
        q.aggregate = true;
        q.obj_id = Some("rule-1".into());
        q.aggregate_obj_id = true;
        let entities = Entities {
            service_engine: Some("se-1".into()),
            ..Entities::default()
        };
        let req = build_request(&q, &entities, "now").unwrap_or_default();
        assert_eq!(req["entity_uuid"], json!("*"));
        assert_eq!(req["service_engine_uuid"], json!("se-1"));
        assert_eq!(req["aggregate_entity"], json!(true));
        assert_eq!(req["obj_id"], json!("rule-1"));
        assert_eq!(req["aggregate_obj_id"], json!(true));
    }

    #[test]
    fn vs_and_pool_combination() {
        let entities = Entities {
            virtual_service: Some("vs-1".into()),
            pool: Some("pool-1".into()),
            ..Entities::default()
        };
        let req = build_request(&query(), &entities, "now").unwrap_or_default();
        assert_eq!(req["entity_uuid"], json!("vs-1"));
        assert_eq!(req["pool_uuid"], json!("pool-1"));
    }

    #[test]
    fn unsupported_combinations() {
        for entities in [
            Entities::default(),
            Entities {
                service_engine: Some("se".into()),
                virtual_service: Some("vs".into()),
                pool: None,
            },
        ] {
            assert!(matches!(
                build_request(&query(), &entities, "now"),
                Err(CoreError::ValidationFailed { .. })
            ));
        }
    }

    #[test]
    fn series_become_aligned_tables() {
        let response = json!({"series": {"vs-1": [
            {
                "header": {"name": "l4_client.avg_rx_bytes", "units": "BYTES"},
                "data": [
                    {"timestamp": "2024-05-01T12:05:00+00:00", "value": 20.0},
                    {"timestamp": "2024-05-01T12:00:00+00:00", "value": 10.0}
                ]
            },
            {
                "header": {"name": "l4_client.avg_tx_bytes", "units": "BYTES"},
                "data": [{"timestamp": "2024-05-01T12:05:00+00:00", "value": 5}]
            }
        ]}});
        let tables = tables(&response);
        assert_eq!(tables.len(), 1);
        assert_eq!(
            tables[0].headers,
            vec![
                "Timestamp",
                "l4_client.avg_rx_bytes in BYTES",
                "l4_client.avg_tx_bytes in BYTES"
            ]
        );
        assert_eq!(
            tables[0].rows,
            vec![
                vec!["2024-05-01T12:00:00+00:00", "10.0", ""],
                vec!["2024-05-01T12:05:00+00:00", "20.0", "5"],
            ]
        );
    }

    #[test]
    fn granularity_names() {
        assert_eq!("5min".parse::<Granularity>().ok(), Some(Granularity::FiveMinutes));
        assert_eq!(Granularity::Realtime.seconds(), 5);
        assert_eq!(Granularity::default().to_string(), "5min");
    }
}
