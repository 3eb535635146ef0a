//! CSV export and import of benchmark results

use serde::Serialize;
use std::fmt;
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;

use crate::sweep::SweepRow;

/// Errors raised while writing or reading result files
#[derive(Debug)]
pub enum ExportError {
    /// The file could not be opened or written
    Io(io::Error),
    /// The CSV layer failed
    Csv(csv::Error),
    /// A record did not hold the expected fields
    Parse(String),
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportError::Io(e) => write!(f, "I/O error: {}", e),
            ExportError::Csv(e) => write!(f, "CSV error: {}", e),
            ExportError::Parse(msg) => write!(f, "Malformed CSV: {}", msg),
        }
    }
}

impl std::error::Error for ExportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExportError::Io(e) => Some(e),
            ExportError::Csv(e) => Some(e),
            ExportError::Parse(_) => None,
        }
    }
}

impl From<io::Error> for ExportError {
    fn from(e: io::Error) -> Self {
        ExportError::Io(e)
    }
}

impl From<csv::Error> for ExportError {
    fn from(e: csv::Error) -> Self {
        ExportError::Csv(e)
    }
}

fn csv_writer<W: Write>(writer: W) -> csv::Writer<W> {
    csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(writer)
}

/// Write per-step samples as `frame,ms` rows.
pub fn write_frames<W: Write>(writer: W, samples_ms: &[f64]) -> Result<(), ExportError> {
    let mut wtr = csv_writer(writer);
    wtr.write_record(["frame", "ms"])?;
    for (frame, ms) in samples_ms.iter().enumerate() {
        wtr.write_record([frame.to_string(), format!("{:.6}", ms)])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write per-step samples to a file, replacing it.
pub fn write_frames_csv(path: impl AsRef<Path>, samples_ms: &[f64]) -> Result<(), ExportError> {
    let path = path.as_ref();
    let file = File::create(path)?;
    write_frames(file, samples_ms)?;
    tracing::info!("Wrote {} frame samples to {}", samples_ms.len(), path.display());
    Ok(())
}

/// Read the `ms` column of a frame CSV.
pub fn read_frames<R: Read>(reader: R) -> Result<Vec<f64>, ExportError> {
    let mut rdr = csv::Reader::from_reader(reader);
    let ms_col = rdr
        .headers()?
        .iter()
        .position(|h| h.trim() == "ms")
        .ok_or_else(|| ExportError::Parse("missing 'ms' column".to_string()))?;

    let mut samples = Vec::new();
    for (line, record) in rdr.records().enumerate() {
        let record = record?;
        let field = record
            .get(ms_col)
            .ok_or_else(|| ExportError::Parse(format!("row {} has no ms field", line + 1)))?;
        let ms = field
            .trim()
            .parse::<f64>()
            .map_err(|e| ExportError::Parse(format!("row {}: '{}': {}", line + 1, field, e)))?;
        samples.push(ms);
    }
    Ok(samples)
}

/// Read the `ms` column of a frame CSV file.
pub fn read_frames_csv(path: impl AsRef<Path>) -> Result<Vec<f64>, ExportError> {
    read_frames(File::open(path)?)
}

#[derive(Serialize)]
struct SummaryRecord<'a> {
    #[serde(rename = "N")]
    n: usize,
    #[serde(rename = "Schedule")]
    schedule: &'a str,
    #[serde(rename = "Threads")]
    threads: usize,
    #[serde(rename = "Tb")]
    tb: String,
    #[serde(rename = "To")]
    to: String,
    #[serde(rename = "Speedup")]
    speedup: String,
    #[serde(rename = "Efficiency")]
    efficiency: String,
}

/// Write sweep rows under the `N,Schedule,Threads,Tb,To,Speedup,Efficiency` header.
pub fn write_summary<W: Write>(writer: W, rows: &[SweepRow]) -> Result<(), ExportError> {
    let mut wtr = csv_writer(writer);
    if rows.is_empty() {
        wtr.write_record(["N", "Schedule", "Threads", "Tb", "To", "Speedup", "Efficiency"])?;
    }
    for row in rows {
        let schedule = row.schedule_label();
        wtr.serialize(SummaryRecord {
            n: row.n,
            schedule: &schedule,
            threads: row.threads,
            tb: format!("{:.6}", row.tb_ms),
            to: format!("{:.6}", row.to_ms),
            speedup: format!("{:.3}", row.speedup),
            efficiency: format!("{:.3}", row.efficiency),
        })?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write sweep rows to a file, replacing it.
pub fn write_summary_csv(path: impl AsRef<Path>, rows: &[SweepRow]) -> Result<(), ExportError> {
    let path = path.as_ref();
    write_summary(File::create(path)?, rows)?;
    tracing::info!("Wrote {} summary rows to {}", rows.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel::{Schedule, SchedulePolicy, UpdateStrategy};

    fn frames_to_string(samples: &[f64]) -> String {
        let mut buf = Vec::new();
        write_frames(&mut buf, samples).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_frames_format() {
        assert_eq!(
            frames_to_string(&[1.0, 2.0, 3.5]),
            "frame,ms\n0,1.000000\n1,2.000000\n2,3.500000\n"
        );
    }

    #[test]
    fn test_frames_header_only() {
        assert_eq!(frames_to_string(&[]), "frame,ms\n");
    }

    #[test]
    fn test_read_frames() {
        let csv = "frame,ms\n0,0.250000\n1,1.125000\n";
        assert_eq!(read_frames(csv.as_bytes()).unwrap(), vec![0.25, 1.125]);
    }

    #[test]
    fn test_read_frames_missing_column() {
        let err = read_frames("frame,seconds\n0,1.0\n".as_bytes()).unwrap_err();
        assert!(matches!(err, ExportError::Parse(_)));
    }

    #[test]
    fn test_read_frames_bad_value() {
        let err = read_frames("frame,ms\n0,fast\n".as_bytes()).unwrap_err();
        assert!(err.to_string().contains("fast"));
    }

    #[test]
    fn test_summary_format() {
        let rows = vec![SweepRow {
            n: 1000,
            strategy: UpdateStrategy::ParallelFor(Schedule::with_chunk(SchedulePolicy::Dynamic, 8)),
            threads: 4,
            tb_ms: 2.0,
            to_ms: 0.8,
            speedup: 2.5,
            efficiency: 0.625,
        }];
        let mut buf = Vec::new();
        write_summary(&mut buf, &rows).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(
            text,
            "N,Schedule,Threads,Tb,To,Speedup,Efficiency\n\
             1000,\"dynamic,8\",4,2.000000,0.800000,2.500,0.625\n"
        );
    }

    #[test]
    fn test_summary_header_only() {
        let mut buf = Vec::new();
        write_summary(&mut buf, &[]).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "N,Schedule,Threads,Tb,To,Speedup,Efficiency\n");
    }

    #[test]
    fn test_missing_file() {
        let err = read_frames_csv("/nonexistent/bounce/frames.csv").unwrap_err();
        assert!(matches!(err, ExportError::Io(_)));
    }
}
