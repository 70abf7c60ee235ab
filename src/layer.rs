use crate::formatter::{ColumnFormatter, RecordFormatter};
use crate::record::LogRecord;
use crate::sink::RecordHandler;
use chrono::Utc;
use std::cell::Cell;
use std::collections::BTreeMap;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use tokio::runtime::{Builder, Handle, Runtime};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

/// Targets never forwarded to the handler: this crate and the database
/// driver. Persisting them would log the persistence layer recursively.
const SKIPPED_TARGETS: [&str; 2] = [env!("CARGO_CRATE_NAME"), "sqlx"];

thread_local! {
    static IN_DISPATCH: Cell<bool> = const { Cell::new(false) };
}

/// Marks the current thread as running the handler.
struct DispatchGuard;

impl DispatchGuard {
    fn enter() -> Self {
        IN_DISPATCH.with(|flag| flag.set(true));
        DispatchGuard
    }
}

impl Drop for DispatchGuard {
    fn drop(&mut self) {
        IN_DISPATCH.with(|flag| flag.set(false));
    }
}

/// Shared event counters of a [`DatabaseLogLayer`].
#[derive(Clone, Debug, Default)]
pub struct LayerStats {
    total: Arc<AtomicU64>,
    dispatched: Arc<AtomicU64>,
    skipped: Arc<AtomicU64>,
}

impl LayerStats {
    /// Events seen by the layer, before any filtering.
    pub fn total_events(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }

    /// Events handed to the handler.
    pub fn dispatched_events(&self) -> u64 {
        self.dispatched.load(Ordering::Relaxed)
    }

    /// Events at or above the level threshold that were dropped because
    /// they came from the persistence path itself.
    pub fn skipped_events(&self) -> u64 {
        self.skipped.load(Ordering::Relaxed)
    }
}

/// `tracing_subscriber` layer that turns events into [`LogRecord`]s and
/// hands them to a [`RecordHandler`] on the emitting thread.
///
/// Events below `min_level` are ignored. The handler call is synchronous:
/// `on_event` returns only after the record was persisted or written to
/// the fallback file. There is no queue and no background task.
///
/// The layer owns a small current-thread runtime to drive the handler.
/// When the event is emitted from inside another Tokio runtime, the
/// handler runs on a scoped helper thread while the emitting thread waits.
pub struct DatabaseLogLayer {
    handler: Mutex<Box<dyn RecordHandler>>,
    runtime: Option<Runtime>,
    formatter: Arc<dyn RecordFormatter>,
    min_level: Level,
    stats: LayerStats,
}

impl DatabaseLogLayer {
    /// Create a layer forwarding events at `min_level` and above to
    /// `handler`, formatted with [`ColumnFormatter`].
    pub fn new<H>(handler: H, min_level: Level) -> Result<Self, LayerError>
    where
        H: RecordHandler + 'static,
    {
        let runtime = Builder::new_current_thread().enable_all().build()?;

        Ok(Self {
            handler: Mutex::new(Box::new(handler)),
            runtime: Some(runtime),
            formatter: Arc::new(ColumnFormatter),
            min_level,
            stats: LayerStats::default(),
        })
    }

    pub fn with_formatter<F>(mut self, formatter: F) -> Self
    where
        F: RecordFormatter + 'static,
    {
        self.formatter = Arc::new(formatter);
        self
    }

    pub fn stats(&self) -> LayerStats {
        self.stats.clone()
    }

    fn dispatch(&self, record: LogRecord) {
        let Some(runtime) = self.runtime.as_ref() else {
            return;
        };
        let handler = &self.handler;

        let run = move || {
            let _guard = DispatchGuard::enter();
            let mut handler = handler.lock().unwrap_or_else(PoisonError::into_inner);
            runtime.block_on(handler.handle(record));
        };

        let outcome = if Handle::try_current().is_ok() {
            // block_on cannot nest inside a running runtime.
            thread::scope(|scope| scope.spawn(run).join())
        } else {
            panic::catch_unwind(AssertUnwindSafe(run))
        };
        if outcome.is_err() {
            eprintln!("log record handler panicked, dropping log record");
        }
    }
}

impl Drop for DatabaseLogLayer {
    fn drop(&mut self) {
        // A plain drop panics when it happens inside an async context.
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

impl<S> Layer<S> for DatabaseLogLayer
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        self.stats.total.fetch_add(1, Ordering::Relaxed);

        let meta = event.metadata();
        if *meta.level() > self.min_level {
            return;
        }
        if IN_DISPATCH.with(Cell::get) || is_skipped_target(meta.target()) {
            self.stats.skipped.fetch_add(1, Ordering::Relaxed);
            return;
        }

        let mut fields = BTreeMap::new();
        let mut message: Option<String> = None;
        let mut channel: Option<String> = None;

        let mut visitor = FieldVisitor {
            fields: &mut fields,
            message: &mut message,
            channel: &mut channel,
        };
        event.record(&mut visitor);

        let mut record = LogRecord {
            datetime: Utc::now(),
            channel: channel.unwrap_or_else(|| channel_of(meta.target()).to_string()),
            level: meta.level().to_string(),
            message,
            target: meta.target().to_string(),
            module_path: meta.module_path().map(|s| s.to_string()),
            file: meta.file().map(|s| s.to_string()),
            line: meta.line(),
            fields,
            formatted: None,
        };
        record.formatted = self.formatter.format(&record);

        self.dispatch(record);
        self.stats.dispatched.fetch_add(1, Ordering::Relaxed);
    }
}

fn is_skipped_target(target: &str) -> bool {
    SKIPPED_TARGETS.iter().any(|root| {
        target
            .strip_prefix(root)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with("::"))
    })
}

/// Channel of an event without an explicit `channel` field: the first
/// segment of its target.
fn channel_of(target: &str) -> &str {
    target.split("::").next().unwrap_or(target)
}

/// Error type returned when building a [`DatabaseLogLayer`].
#[derive(thiserror::Error, Debug)]
pub enum LayerError {
    #[error("failed to build the log sink runtime: {0}")]
    Runtime(#[from] io::Error),
}

pub struct FieldVisitor<'a> {
    pub fields: &'a mut BTreeMap<String, serde_json::Value>,
    pub message: &'a mut Option<String>,
    pub channel: &'a mut Option<String>,
}

impl<'a> Visit for FieldVisitor<'a> {
    fn record_str(&mut self, field: &Field, value: &str) {
        match field.name() {
            "message" => *self.message = Some(value.to_string()),
            "channel" => *self.channel = Some(value.to_string()),
            name => {
                self.fields
                    .insert(name.to_string(), serde_json::Value::String(value.to_string()));
            }
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.fields.insert(field.name().to_string(), serde_json::Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.fields.insert(field.name().to_string(), serde_json::Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.fields.insert(field.name().to_string(), serde_json::Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.fields.insert(field.name().to_string(), serde_json::Value::from(value));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        // Formatted messages (`info!("x = {}", x)`) arrive here.
        self.record_str(field, &format!("{:?}", value));
    }
}
