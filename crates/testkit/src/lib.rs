#![warn(missing_docs)]
//! Shared test surfaces: world and catalog fixtures plus a JSONL record sink.

mod fixtures;

use anyhow::Result;
use chrono::Utc;
use serde::Serialize;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

pub use fixtures::*;

/// One line written by [`JsonlSink`].
#[derive(Debug, Serialize)]
pub struct EventRecord<'a, T: Serialize> {
    /// Position of the record in the stream, starting at zero.
    pub sequence: u64,
    /// RFC 3339 wall-clock time the record was written.
    pub timestamp: String,
    /// Short label, e.g. `task_report`.
    pub kind: &'a str,
    /// Record body.
    pub payload: &'a T,
}

/// A sink that writes newline-delimited JSON to disk.
pub struct JsonlSink {
    file: File,
    sequence: u64,
}

impl JsonlSink {
    /// Create a new sink at `path`, creating parent directories if needed.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }
        let file = File::create(path)?;
        Ok(Self { file, sequence: 0 })
    }

    /// Append a record to the log.
    pub fn write<T: Serialize>(&mut self, kind: &str, payload: &T) -> Result<()> {
        let record = EventRecord {
            sequence: self.sequence,
            timestamp: Utc::now().to_rfc3339(),
            kind,
            payload,
        };
        let line = serde_json::to_string(&record)?;
        self.file.write_all(line.as_bytes())?;
        self.file.write_all(b"\n")?;
        self.file.flush()?;
        self.sequence += 1;
        Ok(())
    }

    /// Records written so far.
    pub fn written(&self) -> u64 {
        self.sequence
    }
}
