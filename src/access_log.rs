//! Access Log Module
//!
//! Append-only CSV log with one row per GET/PUT request.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use thiserror::Error;
use tracing::warn;

/// Header written when the log file is created
pub const HEADER: &str = "ts_ms,op,key,hit,lat_us,size_bytes";

#[derive(Error, Debug)]
#[error("access log {path}: {source}")]
pub struct AccessLogError {
    path: PathBuf,
    source: io::Error,
}

// == Access Record ==
/// One logged request.
#[derive(Debug, Clone, Copy)]
pub struct AccessRecord<'a> {
    pub op: &'a str,
    pub key: &'a str,
    pub hit: bool,
    pub latency_us: u64,
    pub size_bytes: usize,
}

// == Access Log ==
#[derive(Debug)]
pub struct AccessLog {
    path: PathBuf,
    file: Mutex<File>,
}

impl AccessLog {
    /// Opens `path` for appending, creating parent directories and the header
    /// row when the file is new.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AccessLogError> {
        let path = path.as_ref().to_path_buf();
        let wrap = |source| AccessLogError {
            path: path.clone(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(wrap)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(wrap)?;
        if file.metadata().map_err(wrap)?.len() == 0 {
            writeln!(file, "{}", HEADER).map_err(wrap)?;
        }

        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    // == Write ==
    /// Appends one row. Failures are logged and otherwise ignored.
    pub fn record(&self, record: AccessRecord<'_>) {
        let line = format!(
            "{},{},{},{},{},{}\n",
            chrono::Utc::now().timestamp_millis(),
            record.op,
            escape(record.key),
            u8::from(record.hit),
            record.latency_us,
            record.size_bytes
        );

        let mut file = match self.file.lock() {
            Ok(file) => file,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Err(e) = file.write_all(line.as_bytes()) {
            warn!(path = %self.path.display(), error = %e, "Failed to write access log row");
        }
    }
}

/// Quotes a CSV field when it contains a delimiter, quote or line break.
fn escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
