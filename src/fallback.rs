use chrono::{DateTime, Local};
use serde::Serialize;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::PathBuf;

/// Timestamp prefix of every fallback line.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Appends descriptions of unpersisted records to a local file.
///
/// Every line has the form `<timestamp>: <json>`. Each write opens the
/// file in append mode, writes one complete line and closes it again, so
/// several processes may share the same file.
#[derive(Debug, Clone)]
pub struct FallbackWriter {
    path: PathBuf,
}

impl FallbackWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FallbackWriter { path: path.into() }
    }

    /// Append `payload` as one JSON line, creating the file if needed.
    ///
    /// **Returns**
    /// - `Err(..)` if the payload cannot be serialized or the file cannot be
    ///   written. There is no further fallback; callers usually just log it.
    pub fn write_error<T>(&self, payload: &T) -> Result<(), FallbackError>
    where
        T: Serialize + ?Sized,
    {
        let line = format_line(Local::now(), payload)?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|source| self.io_error(source))?;
        file.write_all(line.as_bytes())
            .map_err(|source| self.io_error(source))
    }

    fn io_error(&self, source: io::Error) -> FallbackError {
        FallbackError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

fn format_line<T>(now: DateTime<Local>, payload: &T) -> Result<String, serde_json::Error>
where
    T: Serialize + ?Sized,
{
    // serde_json leaves `/` and non-ASCII characters unescaped.
    let json = serde_json::to_string(payload)?;
    Ok(format!("{}: {}\n", now.format(TIMESTAMP_FORMAT), json))
}

/// Error type returned by [`FallbackWriter::write_error`].
#[derive(thiserror::Error, Debug)]
pub enum FallbackError {
    #[error("failed to serialize fallback payload: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to append to fallback file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
