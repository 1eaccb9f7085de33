//! Plain-Text Benchmark Report
//!
//! One line per reported metric, `"<label>:\t<value> <unit>"`,
//! written once at the end of a bench run.

use std::io::Write;
use std::path::Path;

/// A single reported metric.
#[derive(Debug, Clone, PartialEq)]
pub struct Metric {
    /// Metric label (e.g. "threads").
    pub label: String,
    /// Measured value.
    pub value: f64,
    /// Unit suffix (e.g. "s").
    pub unit: &'static str,
}

/// Accumulates metrics and renders the report file.
#[derive(Debug, Default)]
pub struct BenchmarkReport {
    metrics: Vec<Metric>,
}

impl BenchmarkReport {
    /// Start an empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one metric line.
    pub fn push(&mut self, label: impl Into<String>, value: f64, unit: &'static str) {
        self.metrics.push(Metric {
            label: label.into(),
            value,
            unit,
        });
    }

    /// Recorded metrics, in insertion order.
    pub fn metrics(&self) -> &[Metric] {
        &self.metrics
    }

    /// Render the report as text, one line per metric.
    pub fn render(&self) -> String {
        self.metrics
            .iter()
            .map(|m| format!("{}:\t{} {}\n", m.label, m.value, m.unit))
            .collect()
    }

    /// Write the report to `path`, creating parent directories.
    pub fn write_to(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = std::fs::File::create(path)?;
        file.write_all(self.render().as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_label_tab_value_unit_lines() {
        let mut report = BenchmarkReport::new();
        report.push("sequential", 1.25, "s");
        report.push("threads", 0.5, "s");

        let text = report.render();
        assert_eq!(text, "sequential:\t1.25 s\nthreads:\t0.5 s\n");
    }

    #[test]
    fn metrics_keep_insertion_order() {
        let mut report = BenchmarkReport::new();
        report.push("b", 2.0, "s");
        report.push("a", 1.0, "s");
        let labels: Vec<_> = report.metrics().iter().map(|m| m.label.as_str()).collect();
        assert_eq!(labels, vec!["b", "a"]);
    }

    #[test]
    fn writes_report_file_with_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/report.txt");

        let mut report = BenchmarkReport::new();
        report.push("result", 1.0, "1");
        report.write_to(&path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "result:\t1 1\n");
    }
}
