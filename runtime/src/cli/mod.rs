//! CLI subcommand implementations for the waterlevel binary.

pub mod doctor;
pub mod output;
pub mod scrape_cmd;
