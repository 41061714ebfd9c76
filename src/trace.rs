use tracing::level_filters::LevelFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

/// Debug-level log lines on stderr plus spans streamed to Tracy.
///
/// Only the first call installs anything.
pub fn setup() {
    let tracy_layer = tracing_tracy::TracyLayer::default();
    let fmt = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(LevelFilter::DEBUG);
    let _ = tracing_subscriber::registry()
        .with(fmt)
        .with(tracy_layer)
        .try_init();
}
