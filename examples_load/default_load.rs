use std::time::Instant;
use tracing::error;

use log_record_sink::init::{init_tracing_with_config, LayerConfig};
use log_record_sink::noop_sink::NoopSink;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let layer_config = LayerConfig {
        enable_stdout: false,
        ..LayerConfig::default()
    };
    let stats = init_tracing_with_config(NoopSink, layer_config)?;

    let n: u64 = 100_000;
    let start = Instant::now();

    for i in 0..n {
        error!(iteration = i, "default load test error");
    }

    let elapsed = start.elapsed();
    println!("noop handler: handled {} events in {:?} (~{:.0} ev/s)",
        stats.dispatched_events(),
        elapsed,
        n as f64 / elapsed.as_secs_f64()
    );
    Ok(())
}
