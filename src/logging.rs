//=========================================================================
// Logging
//=========================================================================
//
// One-shot `env_logger` setup for binaries built on the bindings.
//
// The library itself only emits through the `log` facade, using these
// targets: `game`, `input`, `native`.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::env;
use std::sync::Once;

use log::LevelFilter;

//=== LoggingConfig =======================================================

/// Logger configuration.
///
/// `env_filter` follows the `env_logger` filter syntax (e.g. `"info"`,
/// `"forge_game=debug,input=trace"`). When unset, `RUST_LOG` is used,
/// then `default_level`.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub env_filter: Option<String>,
    pub default_level: LevelFilter,
    pub write_style: env_logger::WriteStyle,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            env_filter: None,
            default_level: LevelFilter::Info,
            write_style: env_logger::WriteStyle::Auto,
        }
    }
}

//=== Initialization ======================================================

static INIT: Once = Once::new();

/// Initializes the global logger once; later calls are ignored.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let mut builder = configure(&config);

        // Another logger may already be installed by the host application.
        if builder.try_init().is_err() {
            log::debug!("logger already installed, keeping it");
            return;
        }

        log::debug!("logging initialized");
    });
}

fn configure(config: &LoggingConfig) -> env_logger::Builder {
    let mut builder = env_logger::Builder::new();

    if let Some(filter) = &config.env_filter {
        builder.parse_filters(filter);
    } else if let Ok(filter) = env::var("RUST_LOG") {
        builder.parse_filters(&filter);
    } else {
        builder.filter_level(config.default_level);
    }

    builder.write_style(config.write_style);
    builder
}

//=========================================================================
// Unit Tests
//=========================================================================
