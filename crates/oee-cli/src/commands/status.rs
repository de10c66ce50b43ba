//! Status command for showing recent activity by entity.

use std::io::Write;

use anyhow::{Context, Result};

use oee_db::Database;

use crate::Config;

pub fn run<W: Write>(writer: &mut W, config: &Config) -> Result<()> {
    let db = Database::open(&config.database_path)
        .with_context(|| format!("failed to open {}", config.database_path.display()))?;
    let entities = db.entity_activity()?;

    writeln!(writer, "OEE signal engine status")?;
    writeln!(writer, "Database: {}", config.database_path.display())?;

    if entities.is_empty() {
        writeln!(writer, "No signals recorded.")?;
        return Ok(());
    }

    writeln!(writer, "Entities:")?;
    for entity in entities {
        writeln!(
            writer,
            "- {}: {} signals, last {}",
            entity.entity_id, entity.signal_count, entity.last_signal
        )?;
    }

    Ok(())
}
