use anyhow::anyhow;

/// Initializes the global tracing subscriber.
///
/// The default `Level` is `INFO`. It can be overridden with `RUST_LOG`.
/// Keep the returned guard alive for as long as spans should be recorded.
#[cfg(not(feature = "tracing-profile"))]
pub fn init_logger() -> anyhow::Result<Option<impl Sized>> {
    use tracing_forest::ForestLayer;
    use tracing_subscriber::util::SubscriberInitExt;
    use tracing_subscriber::{layer::SubscriberExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(ForestLayer::default())
        .try_init()
        .map_err(|e| anyhow!("failed to initialize logger: {e}"))?;
    Ok(None::<()>)
}

/// Initializes the profiling subscriber. The guard flushes the profile when
/// dropped.
#[cfg(feature = "tracing-profile")]
pub fn init_logger() -> anyhow::Result<Option<impl Sized>> {
    let guard = tracing_profile::init_tracing()
        .map_err(|e| anyhow!("failed to initialize tracing: {e:?}"))?;
    Ok(Some(guard))
}
