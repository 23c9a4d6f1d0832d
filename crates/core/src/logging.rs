//! Logging and observability
//!
//! Structured logging via tracing-subscriber with text or JSON formatting,
//! selected at runtime by CLI flag or environment variable. All diagnostic
//! output goes to stderr so stdout stays reserved for command output; phase
//! container output is handled separately through the build log sink.
//!
//! ## Environment Variables
//!
//! * `KILN_LOG_FORMAT` - output format ("json" for JSON, anything else for text)
//! * `KILN_LOG` - logging filter specification
//! * `RUST_LOG` - standard fallback filter when `KILN_LOG` is unset

use anyhow::Result;
use std::{io, sync::Once};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static INIT: Once = Once::new();

/// Initialize the logging system
///
/// `format` selects text (default) or JSON output; `level` is the default
/// filter used when neither `KILN_LOG` nor `RUST_LOG` is set. Subsequent
/// calls are no-ops, so tests and library consumers may call this freely.
pub fn init(format: Option<&str>, level: Option<&str>) -> Result<()> {
    INIT.call_once(|| {
        let filter = create_env_filter(level);

        let env_format = std::env::var("KILN_LOG_FORMAT").ok();
        let effective_format = format.or(env_format.as_deref()).unwrap_or("text");

        match effective_format {
            "json" => {
                tracing_subscriber::registry()
                    .with(
                        fmt::layer()
                            .json()
                            .with_target(true)
                            .with_writer(io::stderr),
                    )
                    .with(filter)
                    .init();
            }
            _ => {
                tracing_subscriber::registry()
                    .with(fmt::layer().with_target(true).with_writer(io::stderr))
                    .with(filter)
                    .init();
            }
        }

        tracing::debug!("Logging initialized with format: {}", effective_format);
    });

    Ok(())
}

/// Create an EnvFilter from `KILN_LOG`, `RUST_LOG`, or the given default level
fn create_env_filter(level: Option<&str>) -> EnvFilter {
    if let Ok(kiln_log) = std::env::var("KILN_LOG") {
        return EnvFilter::try_new(&kiln_log).unwrap_or_else(|_| EnvFilter::new("info"));
    }
    if let Ok(rust_log) = std::env::var("RUST_LOG") {
        if let Ok(filter) = EnvFilter::try_new(&rust_log) {
            return filter;
        }
    }
    EnvFilter::try_new(level.unwrap_or("info")).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Check if logging has been initialized
///
/// Primarily useful for testing scenarios.
pub fn is_initialized() -> bool {
    INIT.is_completed()
}
