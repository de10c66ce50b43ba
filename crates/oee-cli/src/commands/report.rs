//! Report command deriving OEE metrics for one entity.

use std::fmt::Write as _;
use std::io::Write;

use anyhow::{Context, Result, bail};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use oee_core::{OeeCalculations, OeeInput, OeeResult, fold_signals};
use oee_db::Database;

use super::util::{format_duration_ns, format_percent};

/// A computed report: the raw accumulator plus its derived metrics.
#[derive(Debug, Serialize)]
pub struct ReportData {
    pub entity_id: String,
    pub result: OeeResult,
    pub calculations: OeeCalculations,
}

/// Replays an entity's stored signals through the aggregation fold.
///
/// When no explicit window is given, the window snaps to the entity's first
/// and last stored signals.
pub fn generate(
    db: &Database,
    params: &OeeInput,
    entity_id: &str,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> Result<ReportData> {
    let signals = db.list_entity_signals(entity_id, start, end)?;
    let (Some(first), Some(last)) = (signals.first(), signals.last()) else {
        bail!("no signals recorded for entity {entity_id}");
    };
    let window_start = start.unwrap_or(first.timestamp);
    let window_end = end.unwrap_or(last.timestamp);

    let result = fold_signals(params, &signals, window_start, window_end)
        .with_context(|| format!("signal stream rejected for entity {entity_id}"))?;
    let calculations = result.calculations();
    Ok(ReportData {
        entity_id: entity_id.to_string(),
        result,
        calculations,
    })
}

pub fn run<W: Write>(
    writer: &mut W,
    db: &Database,
    params: &OeeInput,
    entity_id: &str,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    json: bool,
) -> Result<()> {
    let data = generate(db, params, entity_id, start, end)?;
    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&data)?)?;
    } else {
        write!(writer, "{}", format_report(&data))?;
    }
    Ok(())
}

fn format_report(data: &ReportData) -> String {
    let result = &data.result;
    let calc = &data.calculations;
    let mut out = String::new();
    let _ = writeln!(out, "OEE report for {}", data.entity_id);
    let _ = writeln!(
        out,
        "Window: {} to {} ({})",
        result.start.to_rfc3339_opts(SecondsFormat::Secs, true),
        result.end.to_rfc3339_opts(SecondsFormat::Secs, true),
        format_duration_ns(calc.total_duration),
    );
    let _ = writeln!(out);
    let _ = writeln!(out, "Availability: {}", format_percent(calc.availability));
    let _ = writeln!(out, "Performance: {}", format_percent(calc.performance));
    let _ = writeln!(out, "Quality: {}", format_percent(calc.quality));
    let _ = writeln!(out, "OEE: {}", format_percent(calc.oee));
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "Production: {:.0} units ({:.0} good, {:.0} not good)",
        result.total_production,
        calc.good_production,
        result.not_good_production,
    );
    let _ = writeln!(
        out,
        "Planned capacity: {} units",
        calc.planned_production
    );
    let _ = writeln!(
        out,
        "Work time: {}",
        format_duration_ns(result.total_work_duration)
    );
    let _ = writeln!(
        out,
        "Planned stops: {}",
        format_duration_ns(result.planned_stop_duration)
    );
    let _ = writeln!(
        out,
        "Unplanned stops: {}",
        format_duration_ns(result.unplanned_stop_duration)
    );
    out
}
