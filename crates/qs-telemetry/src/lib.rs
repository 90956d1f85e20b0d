//! # Quantum-Seal Telemetry
//!
//! Logging and metrics for the secure-submission core.
//!
//! ## Components
//!
//! - **Logging**: `tracing-subscriber` registry with an `EnvFilter` and a
//!   pretty or JSON `fmt` layer
//! - **Metrics**: `PrometheusRecorder`, a `qs_submission::MetricsRecorder`
//!   backed by Prometheus counters
//!
//! ## Usage
//!
//! ```rust,ignore
//! use qs_telemetry::{init_logging, PrometheusRecorder, TelemetryConfig};
//!
//! init_logging(&TelemetryConfig::from_env())?;
//! let recorder = Arc::new(PrometheusRecorder::new()?);
//! let service = SubmissionService::builder(config, canonicalizer, transport)
//!     .metrics(recorder.clone())
//!     .build()?;
//! // ...
//! println!("{}", recorder.gather_text()?);
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `QS_SERVICE_NAME` | `quantum-seal` | Service name in the startup record |
//! | `RUST_LOG` | unset | Log level filter, takes precedence over `QS_LOG_LEVEL` |
//! | `QS_LOG_LEVEL` | `info` | Log level filter when `RUST_LOG` is unset |
//! | `QS_CONSOLE_OUTPUT` | `true` | Write records to the console |
//! | `QS_JSON_LOGS` | `false` (`true` in containers) | JSON formatting |

#![warn(missing_docs)]

mod config;
mod logging;
mod metrics;

pub use config::{TelemetryConfig, DEFAULT_SERVICE_NAME};
pub use logging::{env_filter, init_logging};
pub use metrics::PrometheusRecorder;

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// The subscriber could not be installed (usually: one already is)
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    /// Metric registration or encoding failed
    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    /// Invalid filter or configuration value
    #[error("Invalid configuration: {0}")]
    Config(String),
}
