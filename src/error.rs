use serde::Serialize;
use std::backtrace::Backtrace;
use std::panic::Location;

use crate::store::StoreError;

/// Boxed error used at the store seam, same shape the sinks have always used.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Everything that can go wrong between receiving a record and persisting it.
///
/// None of these ever leave [`Sink::handle`](crate::sink::Sink::handle);
/// they are turned into [`ExceptionDetail`]s and written to the fallback file.
#[derive(thiserror::Error, Debug)]
pub enum SinkError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("log record has no formatted state")]
    MissingFormatted,
}

impl SinkError {
    /// Driver error code (MySQL SQLSTATE) when one is known.
    pub fn code(&self) -> Option<&str> {
        match self {
            SinkError::Store(err) => err.code(),
            SinkError::MissingFormatted => None,
        }
    }

    /// Stable name of the error kind.
    pub fn class(&self) -> &'static str {
        match self {
            SinkError::Store(err) => err.class(),
            SinkError::MissingFormatted => "SinkError::MissingFormatted",
        }
    }
}

/// Structured description of a caught failure, written as one fallback line.
#[derive(Debug, Clone, Serialize)]
pub struct ExceptionDetail {
    pub message: String,
    pub file: String,
    pub line: u32,
    pub code: Option<String>,
    pub class: String,
    pub trace: String,
}

impl ExceptionDetail {
    /// Build the detail for `error`. `file` and `line` point at the caller,
    /// i.e. the place where the failure was caught.
    #[track_caller]
    pub fn capture(error: &SinkError) -> Self {
        let location = Location::caller();
        ExceptionDetail {
            message: error.to_string(),
            file: location.file().to_string(),
            line: location.line(),
            code: error.code().map(str::to_owned),
            class: error.class().to_string(),
            trace: Backtrace::force_capture().to_string(),
        }
    }
}
