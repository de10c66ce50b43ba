//! Transitions command reconstructing an entity's state timeline.

use std::io::Write;

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};

use oee_core::{Signal, StateInfo, StateTransition, apply_transition};
use oee_db::Database;

use super::util::format_duration_ns;

/// Folds an ordered signal batch into a state timeline.
pub fn build_timeline(signals: &[Signal]) -> Result<Vec<StateTransition>> {
    let mut transitions = Vec::new();
    for signal in signals {
        transitions = apply_transition(&transitions, signal.clone())
            .context("signal stream rejected")?;
    }
    Ok(transitions)
}

pub fn run<W: Write>(
    writer: &mut W,
    db: &Database,
    entity_id: &str,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    json: bool,
    now: DateTime<Utc>,
) -> Result<()> {
    let signals = db.list_entity_signals(entity_id, start, end)?;
    if signals.is_empty() {
        bail!("no signals recorded for entity {entity_id}");
    }
    let transitions = build_timeline(&signals)?;
    let infos: Vec<StateInfo> = transitions.iter().map(|t| t.info_at(now)).collect();

    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&infos)?)?;
    } else {
        writeln!(writer, "State timeline for {entity_id}")?;
        for info in &infos {
            let ongoing = if info.open { " (ongoing)" } else { "" };
            writeln!(
                writer,
                "{} {}{}",
                info.state,
                format_duration_ns(info.duration_ns),
                ongoing
            )?;
        }
    }
    Ok(())
}
