//! Installs the layer as the global default subscriber, so this file must
//! contain a single test.

use std::fs;

use async_trait::async_trait;
use log_record_sink::init::{init_tracing_with_config, LayerConfig};
use log_record_sink::memory_store::MemoryConnector;
use log_record_sink::{LogRecord, RecordHandler, Sink, SinkConfig};
use tempfile::tempdir;
use tracing::Level;

/// Logs from inside the persistence path before delegating, the way a
/// database driver does.
struct InstrumentedSink(Sink<MemoryConnector>);

#[async_trait]
impl RecordHandler for InstrumentedSink {
    async fn handle(&mut self, record: LogRecord) {
        tracing::info!(target: "app::db", "executing insert");
        self.0.handle(record).await;
    }
}

#[test]
fn global_layer_persists_and_falls_back() {
    let dir = tempdir().unwrap();
    let fallback = dir.path().join("fallback.log");
    let connector = MemoryConnector::new();
    let config = SinkConfig::new("127.0.0.1", 3306, "logs", "logger", "", &fallback);
    let sink = InstrumentedSink(Sink::with_connector(config, connector.clone()));

    let stats = init_tracing_with_config(
        sink,
        LayerConfig {
            min_level: Level::INFO,
            enable_stdout: false,
        },
    )
    .unwrap();

    tracing::info!(target: "app", "service started");
    tracing::debug!(target: "app", "not persisted");

    connector.fail_inserts(true);
    tracing::error!(target: "app", "disk full");

    let rows = connector.rows();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].values["message"], serde_json::json!("service started"));

    let contents = fs::read_to_string(&fallback).unwrap();
    assert_eq!(contents.lines().count(), 2);
    let mut lines = contents.lines();
    assert!(lines.next().unwrap().contains("\"message\":\"disk full\""));
    assert!(lines.next().unwrap().contains("\"class\":\"StoreError::Insert\""));

    // One nested event per handled record, none of them persisted.
    assert_eq!(stats.dispatched_events(), 2);
    assert_eq!(stats.skipped_events(), 2);
    assert!(stats.total_events() >= 5);
}
