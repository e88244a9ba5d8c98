use crate::domain::model::{DetailReport, DifficultySummary};
use crate::utils::error::{EtlError, Result};
use csv::{Terminator, WriterBuilder};
use serde_json::Value;

pub const DELIMITER: u8 = b'|';

/// Pipe-delimited detail report with a header row.
pub fn detail_csv(report: &DetailReport) -> Result<String> {
    let mut writer = csv_writer();
    writer.write_record(&report.columns)?;

    for recipe in &report.recipes {
        writer.write_record(
            report
                .columns
                .iter()
                .map(|column| render_cell(&recipe.cell(column))),
        )?;
    }

    finish(writer)
}

/// `Difficulty|AverageTotalTime` rows, no header. A group without a mean
/// leaves the second field empty.
pub fn summary_csv(summary: &[DifficultySummary]) -> Result<String> {
    let mut writer = csv_writer();

    for row in summary {
        let average = row.average_total_time.map(format_mean).unwrap_or_default();
        writer.write_record([row.difficulty.as_str(), average.as_str()])?;
    }

    finish(writer)
}

pub fn render_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Always keeps a decimal point: `50.0`, `47.5`.
fn format_mean(mean: f64) -> String {
    format!("{:?}", mean)
}

fn csv_writer() -> csv::Writer<Vec<u8>> {
    WriterBuilder::new()
        .delimiter(DELIMITER)
        .terminator(Terminator::Any(b'\n'))
        .has_headers(false)
        .from_writer(Vec::new())
}

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<String> {
    let bytes = writer
        .into_inner()
        .map_err(|e| EtlError::processing(format!("cannot flush CSV output: {}", e)))?;
    String::from_utf8(bytes)
        .map_err(|e| EtlError::processing(format!("CSV output is not UTF-8: {}", e)))
}
