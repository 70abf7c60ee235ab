use crate::layer::{DatabaseLogLayer, LayerError, LayerStats};
use crate::sink::RecordHandler;
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

/// Configuration of the logging layer.
///
/// **Fields**
/// - `min_level`: least severe level that is persisted. Defaults to
///   `INFO`, i.e. informational events and above.
/// - `enable_stdout`: if `true`, a `tracing_subscriber::fmt::Layer` is
///   installed next to [`DatabaseLogLayer`] and every event is also
///   printed to the console.
#[derive(Clone, Debug)]
pub struct LayerConfig {
    pub min_level: Level,
    pub enable_stdout: bool,
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self {
            min_level: Level::INFO,
            enable_stdout: true,
        }
    }
}

/// Error type returned by the init helpers.
#[derive(thiserror::Error, Debug)]
pub enum InitError {
    #[error(transparent)]
    Layer(#[from] LayerError),

    #[error("failed to install global subscriber: {0}")]
    Subscriber(#[from] tracing::subscriber::SetGlobalDefaultError),
}

/// Initialize the global `tracing` subscriber using the provided handler
/// and [`LayerConfig`].
///
/// **Parameters**
/// - `handler`: usually a [`Sink`](crate::sink::Sink); receives every
///   accepted [`LogRecord`](crate::record::LogRecord).
/// - `config`: [`LayerConfig`] with the level threshold and console switch.
///
/// **Returns**
/// - The [`LayerStats`] counters of the installed layer.
/// - `Err(..)` if the layer runtime cannot be built or a global
///   subscriber is already set.
pub fn init_tracing_with_config<H>(handler: H, config: LayerConfig) -> Result<LayerStats, InitError>
where
    H: RecordHandler + 'static,
{
    let layer = DatabaseLogLayer::new(handler, config.min_level)?;
    let stats = layer.stats();
    install(layer, config.enable_stdout)?;
    Ok(stats)
}

/// Initialize tracing with sensible defaults.
///
/// Equivalent to calling [`init_tracing_with_config`] with
/// [`LayerConfig::default`]. This is the recommended entrypoint for
/// typical services.
pub fn init_tracing<H>(handler: H) -> Result<LayerStats, InitError>
where
    H: RecordHandler + 'static,
{
    init_tracing_with_config(handler, LayerConfig::default())
}

/// Install an already built layer (for example one with a custom
/// formatter) as the global default subscriber.
pub fn install(layer: DatabaseLogLayer, enable_stdout: bool) -> Result<(), InitError> {
    // The fmt layer changes the subscriber type, so both variants are
    // assembled separately.
    if enable_stdout {
        let fmt_layer = tracing_subscriber::fmt::layer();
        let subscriber = Registry::default().with(layer).with(fmt_layer);
        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        let subscriber = Registry::default().with(layer);
        tracing::subscriber::set_global_default(subscriber)?;
    }
    Ok(())
}
