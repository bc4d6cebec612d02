use tracing_subscriber::{
    fmt::format::Format, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

const DEFAULT_FILTER: &str = "mediafield=debug";

/// Initialize tracing for binaries.
///
/// `RUST_LOG` overrides the default filter. `LOG_FORMAT=json` switches to
/// one JSON object per event.
pub fn init_tracing() -> Result<(), tracing_subscriber::util::TryInitError> {
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let json_layer = json.then(|| tracing_subscriber::fmt::layer().json());
    let console_layer = (!json).then(|| {
        tracing_subscriber::fmt::layer().event_format(Format::default().compact().with_target(false))
    });

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into()))
        .with(json_layer)
        .with(console_layer)
        .try_init()
}
