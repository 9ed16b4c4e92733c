//! Station-table extraction.
//!
//! Reads the rendered table rows, trims every cell, drops incomplete rows,
//! and stamps each kept row with the capture date.

pub mod rows;

pub use rows::{build_dataset, capture_date, extract_rows, Dataset, Row};
