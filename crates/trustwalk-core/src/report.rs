//! CSV artifacts: propagation progress and final recommendations.
//!
//! # Progress file
//!
//! One line per snapshot: the value of every vertex in ascending id order,
//! then the cumulative number of budget units consumed. No header.
//!
//! # Recommendation file
//!
//! Rows `item_id,user_id,value`, appended one item batch at a time. A
//! freshly created file starts with that header line.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::error::Result;
use crate::graph::{TrustGraph, User};
use crate::propagation::ProgressSink;

/// Writes propagation snapshots as CSV lines.
///
/// Write failures are logged and otherwise ignored so that a broken
/// report never aborts a propagation run.
#[derive(Debug)]
pub struct CsvProgressReport<W: Write> {
    writer: csv::Writer<W>,
    lines: u64,
    failures: u64,
}

impl<W: Write> CsvProgressReport<W> {
    /// Wraps `writer`.
    pub fn new(writer: W) -> Self {
        Self {
            writer: csv::WriterBuilder::new()
                .has_headers(false)
                .flexible(true)
                .from_writer(writer),
            lines: 0,
            failures: 0,
        }
    }

    /// Number of snapshots written.
    #[must_use]
    pub fn lines(&self) -> u64 {
        self.lines
    }

    /// Number of snapshots that could not be written.
    #[must_use]
    pub fn failures(&self) -> u64 {
        self.failures
    }

    /// Flushes and returns the inner writer.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if the final flush fails.
    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|err| std::io::Error::new(err.error().kind(), err.error().to_string()).into())
    }
}

impl CsvProgressReport<File> {
    /// Creates (or truncates) a progress file at `path`.
    pub fn create(path: &Path) -> Result<Self> {
        Ok(Self::new(File::create(path)?))
    }
}

impl<W: Write> ProgressSink for CsvProgressReport<W> {
    fn snapshot(&mut self, graph: &TrustGraph, consumed: u64) {
        let mut record: Vec<String> = graph.vertices().map(|u| u.value().to_string()).collect();
        record.push(consumed.to_string());

        let written = self
            .writer
            .write_record(&record)
            .and_then(|()| self.writer.flush().map_err(csv::Error::from));
        match written {
            Ok(()) => self.lines += 1,
            Err(err) => {
                self.failures += 1;
                tracing::warn!(error = %err, consumed, "Failed to write progress snapshot");
            }
        }
    }
}

#[derive(Serialize)]
struct Recommendation {
    item_id: u64,
    user_id: u64,
    value: f64,
}

/// Appends `item_id,user_id,value` rows.
#[derive(Debug)]
pub struct RecommendationWriter<W: Write> {
    writer: csv::Writer<W>,
    rows: u64,
}

impl<W: Write> RecommendationWriter<W> {
    /// Wraps `writer`; the header is written before the first row.
    pub fn new(writer: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(writer),
            rows: 0,
        }
    }

    /// Wraps `writer` without writing a header.
    pub fn without_header(writer: W) -> Self {
        Self {
            writer: csv::WriterBuilder::new()
                .has_headers(false)
                .from_writer(writer),
            rows: 0,
        }
    }

    /// Writes one row per query with its current value in `graph`.
    ///
    /// Queries that are not in the graph are written with value 0.
    ///
    /// # Errors
    ///
    /// Returns `Error::Csv` if a row cannot be written or flushed.
    pub fn write_batch(&mut self, item_id: u64, graph: &TrustGraph, queries: &[u64]) -> Result<()> {
        for &user_id in queries {
            let value = graph.vertex(user_id).map_or(0.0, User::value);
            self.write_row(item_id, user_id, value)?;
        }
        self.writer.flush()?;
        Ok(())
    }

    /// Writes a single row.
    pub fn write_row(&mut self, item_id: u64, user_id: u64, value: f64) -> Result<()> {
        self.writer.serialize(Recommendation {
            item_id,
            user_id,
            value,
        })?;
        self.rows += 1;
        Ok(())
    }

    /// Number of rows written.
    #[must_use]
    pub fn rows(&self) -> u64 {
        self.rows
    }

    /// Flushes and returns the inner writer.
    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|err| std::io::Error::new(err.error().kind(), err.error().to_string()).into())
    }
}

impl RecommendationWriter<File> {
    /// Creates (or truncates) a recommendation file with a header line.
    pub fn create(path: &Path) -> Result<Self> {
        Ok(Self::new(File::create(path)?))
    }

    /// Opens `path` for appending, creating it if needed. No header is
    /// written.
    pub fn append(path: &Path) -> Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self::without_header(file))
    }
}
