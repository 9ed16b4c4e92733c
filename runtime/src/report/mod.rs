//! CSV report output.

pub mod csv_writer;

pub use csv_writer::{column_name, finalize_output, OutputAction, SENTINEL};
