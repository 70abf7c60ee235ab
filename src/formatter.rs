use serde_json::Value;

use crate::record::{FormattedRecord, LogRecord};

/// Turns a raw [`LogRecord`] into the row that gets inserted.
///
/// Returning `None` means formatting does not apply to this record; the
/// sink then reports it as malformed instead of persisting it.
pub trait RecordFormatter: Send + Sync {
    fn format(&self, record: &LogRecord) -> Option<FormattedRecord>;
}

impl<F> RecordFormatter for F
where
    F: Fn(&LogRecord) -> Option<FormattedRecord> + Send + Sync,
{
    fn format(&self, record: &LogRecord) -> Option<FormattedRecord> {
        self(record)
    }
}

/// Default formatter producing the columns
/// `datetime`, `channel`, `level`, `message` and `context`.
///
/// `context` holds the structured fields as JSON text. Events without a
/// message are left unformatted.
#[derive(Debug, Clone, Copy, Default)]
pub struct ColumnFormatter;

impl ColumnFormatter {
    pub const DATETIME_FORMAT: &'static str = "%Y-%m-%d %H:%M:%S%.6f";
}

impl RecordFormatter for ColumnFormatter {
    fn format(&self, record: &LogRecord) -> Option<FormattedRecord> {
        let message = record.message.as_ref()?;

        let context: serde_json::Map<String, Value> = record
            .fields
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        let mut row = FormattedRecord::new();
        row.insert(
            "datetime".to_string(),
            Value::String(record.datetime.format(Self::DATETIME_FORMAT).to_string()),
        );
        row.insert("channel".to_string(), Value::String(record.channel.clone()));
        row.insert("level".to_string(), Value::String(record.level.clone()));
        row.insert("message".to_string(), Value::String(message.clone()));
        row.insert("context".to_string(), Value::String(Value::Object(context).to_string()));
        Some(row)
    }
}
