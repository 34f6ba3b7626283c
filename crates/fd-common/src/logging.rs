//! Structured Logging Configuration
//!
//! - JSON output for production (`LOG_FORMAT=json`)
//! - Human-readable output for development (default)
//! - Level filtering through `RUST_LOG` (default: `info`)
//!
//! ```rust,ignore
//! fd_common::logging::init_logging("fd-server");
//! tracing::info!(user_id = %id, "User deactivated");
//! ```

use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Output format selected by `LOG_FORMAT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Text,
}

impl LogFormat {
    /// Parse a `LOG_FORMAT` value. Only "json" (any case) selects JSON.
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Text
        }
    }

    pub fn from_env() -> Self {
        Self::parse(&std::env::var("LOG_FORMAT").unwrap_or_default())
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initialize the global subscriber.
///
/// Safe to call more than once: later calls are ignored, which lets
/// integration tests share a process with the server setup code.
pub fn init_logging(service_name: &str) {
    let format = LogFormat::from_env();

    let result = match format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(env_filter())
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_target(true)
                    .flatten_event(true)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .try_init(),
        LogFormat::Text => tracing_subscriber::registry()
            .with(env_filter())
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false)
                    .with_ansi(true),
            )
            .try_init(),
    };

    if result.is_ok() {
        tracing::info!(service = service_name, format = ?format, "Logging initialized");
    }
}
