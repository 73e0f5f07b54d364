//! Metrics query handler.

use albctl_core::Controller;
use albctl_core::ops::metrics::{self, Granularity, MetricsQuery, SeriesTable};

use crate::cli::{GlobalOpts, GranularityArg, MetricsArgs};
use crate::error::CliError;
use crate::output;

use super::util;

fn core_granularity(arg: GranularityArg) -> Granularity {
    match arg {
        GranularityArg::Realtime => Granularity::Realtime,
        GranularityArg::FiveMin => Granularity::FiveMinutes,
        GranularityArg::Hour => Granularity::Hour,
        GranularityArg::Day => Granularity::Day,
    }
}

fn query_from(args: &MetricsArgs) -> Result<MetricsQuery, CliError> {
    Ok(MetricsQuery {
        metric_ids: args.metrics.clone(),
        granularity: core_granularity(args.granularity),
        end: args.end.as_deref().map(metrics::parse_end).transpose()?,
        history: metrics::parse_history(&args.history)?,
        service_engine: args.se.clone(),
        virtual_service: args.vs.clone(),
        pool: args.pool.clone(),
        aggregate: args.aggregate,
        obj_id: args.obj_id.clone(),
        aggregate_obj_id: args.aggregate_obj_id,
        pad_missing_data: args.pad_data,
    })
}

fn render_sections(tables: &[SeriesTable]) -> String {
    tables
        .iter()
        .map(|t| {
            format!(
                "Series {}:\n{}",
                t.name,
                output::render_dynamic_table(&t.headers, &t.rows)
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// All series into one CSV file; a series-name row precedes each block
/// when there is more than one.
fn write_csv(tables: &[SeriesTable], file: &std::path::Path) -> Result<(), CliError> {
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(output::create_file(file)?);
    let labelled = tables.len() > 1;
    for table in tables {
        if labelled {
            writer
                .write_record([&table.name])
                .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
        }
        writer
            .write_record(&table.headers)
            .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
        for row in &table.rows {
            writer
                .write_record(row)
                .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
        }
    }
    writer.flush()?;
    Ok(())
}

pub async fn handle(
    controller: &Controller,
    args: MetricsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let query = query_from(&args)?;
    let tables = metrics::collect(controller, &query).await?;

    if let Some(ref file) = args.file {
        for table in &tables {
            util::note(
                global,
                &format!("Writing to {} for series {}", file.display(), table.name),
            );
        }
        return write_csv(&tables, file);
    }

    let out = output::render_single(global.output, &tables, |t| render_sections(t), |t| {
        t.iter().map(|s| s.name.clone()).collect::<Vec<_>>().join("\n")
    });
    output::print_output(&out, global.quiet);
    Ok(())
}
