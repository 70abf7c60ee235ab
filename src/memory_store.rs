use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::config::SinkConfig;
use crate::record::FormattedRecord;
use crate::store::{Connector, LogStore, StoreError};

/// A row captured by [`MemoryConnector`].
#[derive(Debug, Clone, PartialEq)]
pub struct InsertedRow {
    pub table: String,
    pub values: FormattedRecord,
}

#[derive(Debug, Default)]
struct MemoryState {
    rows: Vec<InsertedRow>,
    connect_attempts: usize,
    fail_connect: bool,
    fail_insert: bool,
}

/// In-process stand-in for the logging database.
///
/// Useful for measuring the overhead of the layer without any external
/// I/O, and for tests. Clones share the same state, so a test can keep one
/// handle and give another to the sink.
#[derive(Debug, Clone, Default)]
pub struct MemoryConnector {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following connection attempt fail.
    pub fn fail_connections(&self, fail: bool) {
        self.lock().fail_connect = fail;
    }

    /// Make every following insert fail, on new and existing connections.
    pub fn fail_inserts(&self, fail: bool) {
        self.lock().fail_insert = fail;
    }

    pub fn rows(&self) -> Vec<InsertedRow> {
        self.lock().rows.clone()
    }

    pub fn connect_attempts(&self) -> usize {
        self.lock().connect_attempts
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Connection handed out by [`MemoryConnector`].
#[derive(Debug)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

#[async_trait]
impl Connector for MemoryConnector {
    type Connection = MemoryStore;

    async fn connect(&self, config: &SinkConfig) -> Result<MemoryStore, StoreError> {
        let mut state = self.lock();
        state.connect_attempts += 1;
        if state.fail_connect {
            return Err(StoreError::Connect {
                address: config.address(),
                code: Some("HY000".to_string()),
                source: "Can't connect to MySQL server (simulated)".into(),
            });
        }
        Ok(MemoryStore {
            state: Arc::clone(&self.state),
        })
    }
}

#[async_trait]
impl LogStore for MemoryStore {
    async fn insert(&mut self, table: &str, row: &FormattedRecord) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.fail_insert {
            return Err(StoreError::Insert {
                table: table.to_string(),
                code: Some("HY000".to_string()),
                source: "Lost connection to MySQL server during query (simulated)".into(),
            });
        }
        state.rows.push(InsertedRow {
            table: table.to_string(),
            values: row.clone(),
        });
        Ok(())
    }
}
