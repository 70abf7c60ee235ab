use crate::record::LogRecord;
use crate::sink::RecordHandler;
use async_trait::async_trait;

/// A handler that simply drops all records.
///
/// Useful for measuring the overhead of the layer itself without any
/// database or file I/O.
#[derive(Clone, Debug, Default)]
pub struct NoopSink;

#[async_trait]
impl RecordHandler for NoopSink {
    async fn handle(&mut self, _record: LogRecord) {}
}
