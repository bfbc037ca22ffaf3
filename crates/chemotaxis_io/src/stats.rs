//! Statistics export as CSV, a JSON array or JSON lines.

use crate::error::{IoError, Result};
use crate::serialization::to_json;
use chemotaxis_core::stats::WorldStats;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

/// CSV header, in row order.
pub const CSV_COLUMNS: [&str; 17] = [
    "time",
    "organism_count",
    "preference_mean",
    "preference_stddev",
    "preference_min",
    "preference_max",
    "avg_concentration",
    "avg_energy",
    "avg_energy_ratio",
    "max_generation",
    "source_count",
    "active_source_count",
    "field_min",
    "field_max",
    "field_avg",
    "total_energy",
    "target_energy",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatsFormat {
    Csv,
    /// A single JSON array, closed by [`StatsExporter::finish`].
    Json,
    /// One JSON object per line.
    JsonLines,
}

impl FromStr for StatsFormat {
    type Err = IoError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            "jsonl" | "ndjson" | "json-lines" => Ok(Self::JsonLines),
            other => Err(IoError::unsupported(format!("stats format {other:?}"))),
        }
    }
}

impl StatsFormat {
    /// Picks the format from the extension of `path`.
    pub fn from_path(path: &Path) -> Result<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| IoError::unsupported(format!("stats path {:?} has no extension", path)))?
            .parse()
    }
}

fn csv_row(s: &WorldStats) -> String {
    format!(
        "{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{}",
        s.time,
        s.organism_count,
        s.preference_mean,
        s.preference_stddev,
        s.preference_min,
        s.preference_max,
        s.avg_concentration,
        s.avg_energy,
        s.avg_energy_ratio,
        s.max_generation,
        s.source_count,
        s.active_source_count,
        s.field_min,
        s.field_max,
        s.field_avg,
        s.total_energy,
        s.target_energy,
    )
}

/// Streams [`WorldStats`] rows to a writer.
#[derive(Debug)]
pub struct StatsExporter<W: Write> {
    writer: W,
    format: StatsFormat,
    rows: usize,
}

impl StatsExporter<BufWriter<File>> {
    /// Creates (or truncates) the file at `path`.
    pub fn create<P: AsRef<Path>>(path: P, format: StatsFormat) -> Result<Self> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| {
            IoError::FileSystem(e).with_context(format!("creating stats file {:?}", path))
        })?;
        tracing::info!(path = %path.display(), ?format, "Exporting statistics");
        Ok(Self::new(BufWriter::new(file), format))
    }
}

impl<W: Write> StatsExporter<W> {
    #[must_use]
    pub fn new(writer: W, format: StatsFormat) -> Self {
        Self {
            writer,
            format,
            rows: 0,
        }
    }

    #[must_use]
    pub fn format(&self) -> StatsFormat {
        self.format
    }

    /// Rows written so far.
    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn write(&mut self, stats: &WorldStats) -> Result<()> {
        match self.format {
            StatsFormat::Csv => {
                if self.rows == 0 {
                    writeln!(self.writer, "{}", CSV_COLUMNS.join(","))?;
                }
                writeln!(self.writer, "{}", csv_row(stats))?;
            }
            StatsFormat::Json => {
                let separator = if self.rows == 0 { "[\n  " } else { ",\n  " };
                write!(self.writer, "{}{}", separator, to_json(stats)?)?;
            }
            StatsFormat::JsonLines => {
                writeln!(self.writer, "{}", to_json(stats)?)?;
            }
        }
        self.rows += 1;
        Ok(())
    }

    /// Closes any open structure, flushes and returns the writer.
    pub fn finish(mut self) -> Result<W> {
        if self.format == StatsFormat::Json {
            let closing = if self.rows == 0 { "[]\n" } else { "\n]\n" };
            self.writer.write_all(closing.as_bytes())?;
        }
        self.writer.flush()?;
        tracing::debug!(rows = self.rows, "Statistics export finished");
        Ok(self.writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(time: f64, organisms: usize) -> WorldStats {
        WorldStats {
            time,
            organism_count: organisms,
            ..Default::default()
        }
    }

    fn export(format: StatsFormat, rows: &[WorldStats]) -> String {
        let mut exporter = StatsExporter::new(Vec::new(), format);
        for r in rows {
            exporter.write(r).unwrap();
        }
        String::from_utf8(exporter.finish().unwrap()).unwrap()
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("CSV".parse::<StatsFormat>().unwrap(), StatsFormat::Csv);
        assert_eq!("ndjson".parse::<StatsFormat>().unwrap(), StatsFormat::JsonLines);
        assert!("xml".parse::<StatsFormat>().is_err());
        assert_eq!(
            StatsFormat::from_path(Path::new("out/stats.jsonl")).unwrap(),
            StatsFormat::JsonLines
        );
        assert!(StatsFormat::from_path(Path::new("stats")).is_err());
    }

    #[test]
    fn test_csv_header_once() {
        let out = export(StatsFormat::Csv, &[row(0.0, 10), row(0.5, 12)]);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], CSV_COLUMNS.join(","));
        assert!(lines[1].starts_with("0,10,"));
        assert!(lines[2].starts_with("0.5,12,"));
        assert_eq!(lines[2].split(',').count(), CSV_COLUMNS.len());
    }

    #[test]
    fn test_json_array_is_valid() {
        let out = export(StatsFormat::Json, &[row(0.0, 10), row(1.0, 11)]);
        let parsed: Vec<WorldStats> = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed, vec![row(0.0, 10), row(1.0, 11)]);
    }

    #[test]
    fn test_empty_json_array() {
        let out = export(StatsFormat::Json, &[]);
        let parsed: Vec<WorldStats> = serde_json::from_str(&out).unwrap();
        assert!(parsed.is_empty());
    }

    #[test]
    fn test_json_lines_one_row_per_line() {
        let out = export(StatsFormat::JsonLines, &[row(0.0, 1), row(1.0, 2), row(2.0, 3)]);
        let parsed: Vec<WorldStats> = out
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(parsed.len(), 3);
        assert_eq!(parsed[2].organism_count, 3);
    }

    #[test]
    fn test_create_writes_file() {
        let path = std::env::temp_dir().join(format!("chemotaxis_stats_{}.csv", std::process::id()));
        let mut exporter = StatsExporter::create(&path, StatsFormat::Csv).unwrap();
        exporter.write(&row(0.0, 1)).unwrap();
        exporter.finish().unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
        let _ = std::fs::remove_file(&path);
    }
}
