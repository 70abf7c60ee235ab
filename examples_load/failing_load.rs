use std::time::Instant;
use tracing::error;

use log_record_sink::init::{init_tracing_with_config, LayerConfig};
use log_record_sink::memory_store::MemoryConnector;
use log_record_sink::{Sink, SinkConfig};

/// Measures the cost of the fallback path: every insert fails, so each
/// event turns into two appended fallback lines.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let fallback = std::env::temp_dir().join("log-record-sink-failing-load.log");
    let connector = MemoryConnector::new();
    connector.fail_inserts(true);

    let config = SinkConfig::new("127.0.0.1", 3306, "logs", "logger", "", &fallback);
    let layer_config = LayerConfig {
        enable_stdout: false,
        ..LayerConfig::default()
    };
    init_tracing_with_config(Sink::with_connector(config, connector.clone()), layer_config)?;

    let n: u64 = 10_000;
    let start = Instant::now();

    for i in 0..n {
        error!(iteration = i, "failing load test error");
    }

    let elapsed = start.elapsed();
    println!("failing store: {} events in {:?} (~{:.0} ev/s), {} connect attempts, fallback at {}",
        n,
        elapsed,
        n as f64 / elapsed.as_secs_f64(),
        connector.connect_attempts(),
        fallback.display()
    );
    Ok(())
}
