use async_trait::async_trait;

use crate::config::SinkConfig;
use crate::error::BoxError;
use crate::record::FormattedRecord;

/// An open connection to the dedicated logging database.
#[async_trait]
pub trait LogStore: Send {
    /// Insert `row` into `table` as a single new row, using the map keys
    /// as column names.
    ///
    /// **Returns**
    /// - `Ok(())` once the row was written.
    /// - `Err(..)` on any driver, constraint or network failure. The sink
    ///   does not retry; it reports the failure through the fallback file.
    async fn insert(&mut self, table: &str, row: &FormattedRecord) -> Result<(), StoreError>;
}

/// Opens connections for a [`Sink`](crate::sink::Sink).
///
/// The sink calls `connect` lazily, at most once per successful
/// connection, and keeps the returned [`LogStore`] for its lifetime.
#[async_trait]
pub trait Connector: Send + Sync {
    type Connection: LogStore;

    async fn connect(&self, config: &SinkConfig) -> Result<Self::Connection, StoreError>;
}

/// Error type returned by [`Connector`] and [`LogStore`] implementations.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("failed to connect to log database {address}: {source}")]
    Connect {
        address: String,
        code: Option<String>,
        #[source]
        source: BoxError,
    },

    #[error("failed to insert log row into `{table}`: {source}")]
    Insert {
        table: String,
        code: Option<String>,
        #[source]
        source: BoxError,
    },
}

impl StoreError {
    pub fn code(&self) -> Option<&str> {
        match self {
            StoreError::Connect { code, .. } | StoreError::Insert { code, .. } => code.as_deref(),
        }
    }

    pub fn class(&self) -> &'static str {
        match self {
            StoreError::Connect { .. } => "StoreError::Connect",
            StoreError::Insert { .. } => "StoreError::Insert",
        }
    }
}
