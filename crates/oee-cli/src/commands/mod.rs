//! CLI subcommand implementations.

pub mod ingest;
pub mod report;
pub mod status;
pub mod transitions;
pub mod util;
