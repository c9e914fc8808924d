//! Process-wide log output.
//!
//! Events are written to stderr by a single `fmt` layer stacked on a
//! [`Registry`] and gated by an [`EnvFilter`] built from
//! [`Config::log_filter`]. The stack is installed at most once per process.

use std::io::{self, IsTerminal};

use once_cell::sync::OnceCell;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

use cryptic_config::{Config, LogFormat};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

static INSTALLED: OnceCell<LogFormat> = OnceCell::new();

/// Proof that log output is installed, carrying the format in effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TelemetryHandle {
    format: LogFormat,
}

impl TelemetryHandle {
    /// Format chosen by the call that installed the subscriber.
    #[must_use]
    pub const fn format(self) -> LogFormat {
        self.format
    }
}

/// Errors encountered while installing log output.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// The configured filter expression does not parse.
    #[error("invalid log filter `{directives}`: {source}")]
    Filter {
        /// Expression as configured.
        directives: String,
        /// Parser failure.
        #[source]
        source: ParseError,
    },
    /// A global subscriber was installed outside this module.
    #[error("failed to install log subscriber: {0}")]
    Install(#[from] TryInitError),
}

/// Installs log output on first use.
///
/// Later calls leave the installed stack alone and report the format it was
/// installed with, whatever configuration they pass.
///
/// # Examples
///
/// ```rust
/// use cryptic_config::Config;
/// use cryptic_service::telemetry;
///
/// # fn main() -> Result<(), telemetry::TelemetryError> {
/// let config = Config::default();
/// let first = telemetry::initialise(&config)?;
/// let second = telemetry::initialise(&config)?;
/// assert_eq!(first, second);
/// # Ok(())
/// # }
/// ```
///
/// # Errors
///
/// Returns [`TelemetryError::Filter`] for an unparsable filter and
/// [`TelemetryError::Install`] when a foreign global subscriber exists.
pub fn initialise(config: &Config) -> Result<TelemetryHandle, TelemetryError> {
    INSTALLED
        .get_or_try_init(|| LogOutput::from_config(config)?.install())
        .map(|format| TelemetryHandle { format: *format })
}

/// Resolved output settings, checked before anything global is touched.
struct LogOutput {
    filter: EnvFilter,
    format: LogFormat,
    ansi: bool,
}

impl LogOutput {
    fn from_config(config: &Config) -> Result<Self, TelemetryError> {
        let directives = config.log_filter();
        let filter = EnvFilter::try_new(directives).map_err(|source| TelemetryError::Filter {
            directives: directives.to_owned(),
            source,
        })?;
        Ok(Self {
            filter,
            format: config.log_format(),
            ansi: io::stderr().is_terminal(),
        })
    }

    fn layer(&self) -> BoxedLayer {
        let layer = fmt::layer()
            .with_writer(io::stderr)
            .with_ansi(self.ansi)
            .with_target(true)
            .with_timer(UtcTime::rfc_3339());
        match self.format {
            LogFormat::Json => layer.json().flatten_event(true).boxed(),
            LogFormat::Compact => layer.compact().boxed(),
        }
    }

    fn install(self) -> Result<LogFormat, TelemetryError> {
        let layer = self.layer();
        tracing_subscriber::registry()
            .with(layer)
            .with(self.filter)
            .try_init()?;
        Ok(self.format)
    }
}
