use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// Row produced by a [`RecordFormatter`](crate::formatter::RecordFormatter):
/// destination column name mapped to a scalar value.
pub type FormattedRecord = BTreeMap<String, serde_json::Value>;

/// A single log event as seen by the sink.
///
/// The raw part (`channel`, `level`, `message`, ...) comes from the
/// logging framework; `formatted` is filled in by the formatter and is
/// what actually gets inserted.
#[derive(Debug, Clone, Serialize)]
pub struct LogRecord {
    pub datetime: DateTime<Utc>,
    pub channel: String,
    pub level: String,
    pub message: Option<String>,
    pub target: String,
    pub module_path: Option<String>,
    pub file: Option<String>,
    pub line: Option<u32>,
    pub fields: BTreeMap<String, serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formatted: Option<FormattedRecord>,
}

impl LogRecord {
    /// Create a record with the current time, no message and no formatted state.
    pub fn new(channel: impl Into<String>, level: impl Into<String>) -> Self {
        let channel = channel.into();
        LogRecord {
            datetime: Utc::now(),
            target: channel.clone(),
            channel,
            level: level.into(),
            message: None,
            module_path: None,
            file: None,
            line: None,
            fields: BTreeMap::new(),
            formatted: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn with_formatted(mut self, formatted: FormattedRecord) -> Self {
        self.formatted = Some(formatted);
        self
    }
}
