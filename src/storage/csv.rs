//! CSV export for benchmark records.

use std::io::Write;
use std::path::Path;

use crate::BenchError;
use crate::core::schema::BenchRecord;

/// CSV column headers in deterministic order.
pub const CSV_HEADERS: &[&str] = &[
    "schema_version",
    "record_id",
    "timestamp",
    "function_name",
    "function_source",
    "engine_name",
    "engine_version",
    "git_sha",
    "warmup",
    "iterations",
    "samples",
    "compile_mean_ms",
    "compile_stddev_ms",
    "eval_mean_ms",
    "eval_stddev_ms",
    "accuracy_percent",
    "samples_correct",
    "graph_node_count",
    "max_bit_width",
    "inputset_size",
    "peak_rss_mb",
];

/// CSV exporter for benchmark records.
///
/// Exports BenchRecord data to CSV format with a flat column structure
/// and deterministic column order for easy comparison and analysis.
#[derive(Debug, Clone, Default)]
pub struct CsvExporter;

impl CsvExporter {
    /// Create a new CsvExporter.
    pub fn new() -> Self {
        CsvExporter
    }

    /// Export records to a CSV file.
    ///
    /// # Arguments
    /// * `records` - Slice of BenchRecord to export
    /// * `output` - Path to the output CSV file
    ///
    /// # Errors
    /// Returns an error if file operations or CSV writing fails.
    pub fn export(&self, records: &[BenchRecord], output: &Path) -> Result<(), BenchError> {
        // Ensure parent directory exists
        if let Some(parent) = output.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| BenchError::Message(format!("failed to create directory: {e}")))?;
            }
        }

        let file = std::fs::File::create(output)
            .map_err(|e| BenchError::Message(format!("failed to create file: {e}")))?;

        self.export_to_writer(records, file)
    }

    /// Export records to stdout.
    ///
    /// # Errors
    /// Returns an error if CSV writing fails.
    pub fn export_to_stdout(&self, records: &[BenchRecord]) -> Result<(), BenchError> {
        let stdout = std::io::stdout();
        let handle = stdout.lock();
        self.export_to_writer(records, handle)
    }

    /// Export records to any writer implementing Write.
    ///
    /// # Errors
    /// Returns an error if CSV writing fails.
    pub fn export_to_writer<W: Write>(
        &self,
        records: &[BenchRecord],
        writer: W,
    ) -> Result<(), BenchError> {
        let mut csv_writer = csv::Writer::from_writer(writer);

        // Write headers
        csv_writer
            .write_record(CSV_HEADERS)
            .map_err(|e| BenchError::Message(format!("failed to write CSV headers: {e}")))?;

        // Write each record
        for record in records {
            let row = self.record_to_row(record);
            csv_writer
                .write_record(&row)
                .map_err(|e| BenchError::Message(format!("failed to write CSV row: {e}")))?;
        }

        csv_writer
            .flush()
            .map_err(|e| BenchError::Message(format!("failed to flush CSV writer: {e}")))?;

        Ok(())
    }

    /// Convert a BenchRecord to a row of CSV values.
    fn record_to_row(&self, record: &BenchRecord) -> Vec<String> {
        vec![
            record.schema_version.to_string(),
            record.record_id.clone(),
            record.timestamp.clone(),
            record.function_name.clone(),
            record.function_source.clone().unwrap_or_default(),
            record.engine.name.clone(),
            record.engine.version.clone().unwrap_or_default(),
            record.env.git_sha.clone().unwrap_or_default(),
            record.config.warmup_iterations.to_string(),
            record.config.measured_iterations.to_string(),
            record.config.samples.to_string(),
            record
                .compile_stats
                .as_ref()
                .map(|s| format!("{:.3}", s.mean_ms))
                .unwrap_or_default(),
            record
                .compile_stats
                .as_ref()
                .and_then(|s| s.stddev_ms)
                .map(|v| format!("{:.3}", v))
                .unwrap_or_default(),
            record
                .eval_stats
                .as_ref()
                .map(|s| format!("{:.3}", s.mean_ms))
                .unwrap_or_default(),
            record
                .eval_stats
                .as_ref()
                .and_then(|s| s.stddev_ms)
                .map(|v| format!("{:.3}", v))
                .unwrap_or_default(),
            record
                .accuracy_percent
                .map(|v| format!("{:.2}", v))
                .unwrap_or_default(),
            record
                .samples_correct
                .map(|v| v.to_string())
                .unwrap_or_default(),
            record
                .graph_node_count
                .map(|v| v.to_string())
                .unwrap_or_default(),
            record
                .max_bit_width
                .map(|v| v.to_string())
                .unwrap_or_default(),
            record
                .inputset_size
                .map(|v| v.to_string())
                .unwrap_or_default(),
            record
                .peak_rss_mb
                .map(|v| format!("{:.2}", v))
                .unwrap_or_default(),
        ]
    }
}
