//! Tracing subscriber setup for the binaries

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogFormat, LoggingConfig};

fn filter_for(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "spam_api={level},spam_core={level},tower_http={level}",
            level = level
        )
        .into()
    })
}

/// Install the service subscriber; `RUST_LOG` overrides the configured level
pub fn init(config: &LoggingConfig) {
    let registry = tracing_subscriber::registry().with(filter_for(&config.level));

    match config.format {
        LogFormat::Json => registry.with(fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(fmt::layer()).init(),
    }
}

/// Install a stderr subscriber so command output on stdout stays clean
pub fn init_cli(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };

    tracing_subscriber::registry()
        .with(filter_for(level))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}
