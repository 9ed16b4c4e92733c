//! Live page handling — loading the dashboard and waiting for its table.

pub mod load;
pub mod wait;
