use async_trait::async_trait;
use tracing::{error, info};

use log_record_sink::init::init_tracing;
use log_record_sink::store::{Connector, LogStore, StoreError};
use log_record_sink::{FormattedRecord, Sink, SinkConfig};

/// Example of plugging in a completely custom database by implementing
/// `Connector` and `LogStore`. Imagine this talks to some proprietary DB
/// for which this crate does not provide a driver.
struct MyCustomDb;

struct MyCustomDbConnection {
    address: String,
}

#[async_trait]
impl Connector for MyCustomDb {
    type Connection = MyCustomDbConnection;

    async fn connect(&self, config: &SinkConfig) -> Result<MyCustomDbConnection, StoreError> {
        Ok(MyCustomDbConnection {
            address: config.address(),
        })
    }
}

#[async_trait]
impl LogStore for MyCustomDbConnection {
    async fn insert(&mut self, table: &str, row: &FormattedRecord) -> Result<(), StoreError> {
        // Here you would call your own client library for the target DB.
        // For the sake of example we just print the row.
        println!("[my-custom-db {}] {} <- {:?}", self.address, table, row);
        Ok(())
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = SinkConfig::new("db.internal", 9000, "logs", "logger", "", "custom-fallback.log");
    init_tracing(Sink::with_connector(config, MyCustomDb))?;

    info!("custom backend example started");
    error!(db = "my-custom-db", "simulated error sent via custom backend");
    Ok(())
}
