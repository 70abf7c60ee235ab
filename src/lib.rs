//! Persist `tracing` events as rows of a dedicated MySQL logging table.
//!
//! A [`Sink`] receives one [`LogRecord`] at a time, drops records of the
//! `event` and `doctrine` channels, inserts the formatted row over its own
//! lazily opened connection and, when that fails, appends the row and a
//! description of the failure to a local fallback file. Nothing is ever
//! reported back to the code that logged.
//!
//! [`init::init_tracing`] wires a sink into the global subscriber through
//! [`layer::DatabaseLogLayer`].

pub mod config;
pub mod env;
pub mod error;
pub mod fallback;
pub mod formatter;
pub mod layer;
pub mod memory_store;
pub mod record;
pub mod sink;
pub mod store;

#[cfg(feature = "mysql")]
pub mod mysql;

pub mod init;
pub mod noop_sink;

pub use config::SinkConfig;
pub use record::{FormattedRecord, LogRecord};
pub use sink::{RecordHandler, Sink};

#[cfg(feature = "mysql")]
pub use sink::MySqlSink;
