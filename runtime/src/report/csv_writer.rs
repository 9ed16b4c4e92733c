//! Report serialization and the end-of-run output decision.

use crate::extraction::Dataset;
use serde::Serialize;
use std::io;
use std::path::Path;
use tracing::{info, warn};

/// Declared report columns, in table order.
pub const COLUMNS: [&str; 9] = [
    "ชื่อสถานี",
    "ที่ตั้ง",
    "เวลา",
    "ระดับน้ำ",
    "ระดับตลิ่ง",
    "ค่าศูนย์เสาระดับ",
    "%ความจุน้ำ",
    "สถานการณ์",
    "วันที่เก็บข้อมูล",
];

/// Written instead of a report when there is nothing to record.
pub const SENTINEL: &str = "ข้อความ,ไม่มีข้อมูลให้บันทึก\n";

/// What the output step did to the report file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "action")]
pub enum OutputAction {
    /// Header plus `rows` records written.
    Report { rows: usize },
    /// The no-data sentinel was written.
    Sentinel,
    /// A report from an earlier run was left as is.
    Preserved,
}

/// Header name for field `index`; defined for every index.
pub fn column_name(index: usize) -> String {
    match COLUMNS.get(index) {
        Some(name) => (*name).to_string(),
        None => format!("extra_{index}"),
    }
}

/// Header covering the declared columns and every overflow position.
pub fn header(width: usize) -> Vec<String> {
    (0..width.max(COLUMNS.len())).map(column_name).collect()
}

/// Serialize `dataset` as CSV with every field quoted.
///
/// Rows narrower than the header are padded with empty fields.
pub fn render_report(dataset: &Dataset) -> io::Result<Vec<u8>> {
    let header = header(dataset.max_width());
    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Always)
        .from_writer(Vec::new());

    writer.write_record(&header)?;
    for row in &dataset.rows {
        let padded = row
            .iter()
            .map(String::as_str)
            .chain(std::iter::repeat("").take(header.len() - row.len()));
        writer.write_record(padded)?;
    }

    writer
        .into_inner()
        .map_err(|e| io::Error::other(e.to_string()))
}

/// Overwrite `path` with the report for `dataset`.
pub fn write_report(path: &Path, dataset: &Dataset) -> io::Result<()> {
    std::fs::write(path, render_report(dataset)?)
}

/// Overwrite `path` with the no-data sentinel.
pub fn write_sentinel(path: &Path) -> io::Result<()> {
    std::fs::write(path, SENTINEL)
}

/// Decide and perform the run's single write to the report file.
///
/// - `Some` non-empty dataset: the report replaces whatever was there.
/// - `Some` empty dataset: the sentinel replaces whatever was there.
/// - `None` (the run failed): the sentinel is written only when no report
///   existed before the run; an earlier file is kept byte-for-byte.
///
/// Calling it twice with the same inputs leaves the same file behind.
pub fn finalize_output(
    path: &Path,
    dataset: Option<&Dataset>,
    existed_before_run: bool,
) -> io::Result<OutputAction> {
    match dataset {
        Some(ds) if !ds.is_empty() => {
            write_report(path, ds)?;
            info!(path = %path.display(), rows = ds.len(), "report saved");
            Ok(OutputAction::Report { rows: ds.len() })
        }
        Some(_) => {
            warn!("table loaded but had no usable rows");
            write_sentinel(path)?;
            Ok(OutputAction::Sentinel)
        }
        None if existed_before_run => {
            info!(path = %path.display(), "keeping previous report");
            Ok(OutputAction::Preserved)
        }
        None => {
            write_sentinel(path)?;
            info!(path = %path.display(), "no previous report, wrote sentinel");
            Ok(OutputAction::Sentinel)
        }
    }
}
