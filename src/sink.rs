use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::SinkConfig;
use crate::error::{ExceptionDetail, SinkError};
use crate::fallback::FallbackWriter;
use crate::record::{FormattedRecord, LogRecord};
use crate::store::{Connector, LogStore, StoreError};

#[cfg(feature = "mysql")]
use crate::mysql::MySqlConnector;

/// Channels whose records are dropped without any side effect. They come
/// from instrumentation of the persistence layer itself.
pub const IGNORED_CHANNELS: [&str; 2] = ["event", "doctrine"];

/// Receiver of accepted log records.
///
/// The tracing layer calls `handle` once per event that passed its level
/// gate. Implementations must absorb every failure; nothing is reported
/// back to the code that emitted the event.
#[async_trait]
pub trait RecordHandler: Send {
    async fn handle(&mut self, record: LogRecord);
}

/// Persists formatted records into the dedicated logging database and
/// falls back to a local file when that is impossible.
///
/// The connection is opened lazily by the first record that needs it and
/// then kept for the lifetime of the sink (`Unconnected -> Connected`).
/// A failed attempt leaves the sink unconnected, so the next record tries
/// again. A sink is meant to be used by one writer at a time.
pub struct Sink<C: Connector> {
    config: SinkConfig,
    connector: C,
    connection: Option<C::Connection>,
    fallback: FallbackWriter,
}

/// Sink writing to MySQL through [`MySqlConnector`].
#[cfg(feature = "mysql")]
pub type MySqlSink = Sink<MySqlConnector>;

#[cfg(feature = "mysql")]
impl Sink<MySqlConnector> {
    /// Create a MySQL-backed sink. No connection is made until the first
    /// record arrives (or [`Sink::ensure_connected`] is called).
    pub fn new(config: SinkConfig) -> Self {
        Sink::with_connector(config, MySqlConnector)
    }
}

impl<C: Connector> Sink<C> {
    pub fn with_connector(config: SinkConfig, connector: C) -> Self {
        let fallback = FallbackWriter::new(config.fallback_file.clone());
        Sink {
            config,
            connector,
            connection: None,
            fallback,
        }
    }

    pub fn config(&self) -> &SinkConfig {
        &self.config
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    /// Open the connection unless one already exists.
    ///
    /// Calling this on a connected sink does not contact the connector.
    /// Deployments that want startup to fail fast can call it once right
    /// after construction.
    pub async fn ensure_connected(&mut self) -> Result<&mut C::Connection, StoreError> {
        connect_if_needed(&mut self.connection, &self.connector, &self.config).await
    }

    /// Filter, persist or fail over a single record. Never fails.
    pub async fn handle(&mut self, record: LogRecord) {
        if IGNORED_CHANNELS.contains(&record.channel.as_str()) {
            return;
        }

        let Some(formatted) = record.formatted else {
            let detail = ExceptionDetail::capture(&SinkError::MissingFormatted);
            self.report(&detail);
            return;
        };

        if let Err(err) = self.persist(&formatted).await {
            let detail = ExceptionDetail::capture(&SinkError::from(err));
            self.report(&formatted);
            self.report(&detail);
        }
    }

    async fn persist(&mut self, row: &FormattedRecord) -> Result<(), StoreError> {
        let store = connect_if_needed(&mut self.connection, &self.connector, &self.config).await?;
        store.insert(&self.config.table_name, row).await
    }

    fn report<T>(&self, payload: &T)
    where
        T: Serialize + ?Sized,
    {
        if let Err(e) = self.fallback.write_error(payload) {
            warn!(error = %e, "log record lost, fallback write failed");
        }
    }
}

async fn connect_if_needed<'a, C: Connector>(
    connection: &'a mut Option<C::Connection>,
    connector: &C,
    config: &SinkConfig,
) -> Result<&'a mut C::Connection, StoreError> {
    let conn = match connection.take() {
        Some(conn) => conn,
        None => {
            let conn = connector.connect(config).await?;
            debug!(table = %config.table_name, "log sink connected");
            conn
        }
    };
    Ok(connection.insert(conn))
}

#[async_trait]
impl<C: Connector> RecordHandler for Sink<C> {
    async fn handle(&mut self, record: LogRecord) {
        Sink::handle(self, record).await
    }
}
