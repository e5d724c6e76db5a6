//! Logging initialisation for the treesum CLI.
//!
//! Installs a global `tracing` subscriber writing to `stderr`, selects human
//! or JSON formatting from `TREESUM_LOG_FORMAT`, and bridges the `log` facade
//! so dependencies using either API emit structured events.

use std::{env, io, str::FromStr, sync::OnceLock};

use thiserror::Error;
use tracing::Subscriber;
use tracing_log::LogTracer;
use tracing_subscriber::{
    EnvFilter, Layer, fmt::format::FmtSpan, layer::SubscriberExt, registry::LookupSpan,
    util::SubscriberInitExt,
};

/// Environment variable selecting the log format.
pub const LOG_FORMAT_ENV: &str = "TREESUM_LOG_FORMAT";

static ACTIVE: OnceLock<LogFormat> = OnceLock::new();

/// Output format of the stderr log stream.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum LogFormat {
    /// Multi-line, human-readable records.
    #[default]
    Human,
    /// One JSON object per record, including the current span list.
    Json,
}

impl LogFormat {
    /// Reads the format from `TREESUM_LOG_FORMAT`; unset means [`LogFormat::Human`].
    ///
    /// # Errors
    /// Returns [`LoggingError::InvalidUnicode`] or
    /// [`LoggingError::UnsupportedFormat`] for unusable values.
    pub fn from_env() -> Result<Self, LoggingError> {
        Self::from_var(env::var(LOG_FORMAT_ENV))
    }

    fn from_var(var: Result<String, env::VarError>) -> Result<Self, LoggingError> {
        match var {
            Ok(raw) => raw.parse(),
            Err(env::VarError::NotPresent) => Ok(Self::default()),
            Err(source @ env::VarError::NotUnicode(_)) => Err(LoggingError::InvalidUnicode {
                name: LOG_FORMAT_ENV,
                source,
            }),
        }
    }

    /// Span close events carry the aggregation timings, so they are kept.
    fn layer<S>(self) -> Box<dyn Layer<S> + Send + Sync + 'static>
    where
        S: Subscriber + for<'span> LookupSpan<'span>,
    {
        let records = tracing_subscriber::fmt::layer()
            .with_span_events(FmtSpan::CLOSE)
            .with_writer(io::stderr);
        match self {
            Self::Human => records.boxed(),
            Self::Json => records
                .json()
                .with_current_span(true)
                .with_span_list(true)
                .boxed(),
        }
    }

    fn install(self) -> Result<(), LoggingError> {
        let _ = LogTracer::init();
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        tracing_subscriber::registry()
            .with(filter)
            .with(self.layer())
            .try_init()
            .map_err(|source| LoggingError::InstallFailed { source })
    }
}

impl FromStr for LogFormat {
    type Err = LoggingError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "human" => Ok(Self::Human),
            "json" => Ok(Self::Json),
            other => Err(LoggingError::UnsupportedFormat {
                provided: other.to_owned(),
            }),
        }
    }
}

/// Errors raised while initialising structured logging.
#[derive(Debug, Error)]
pub enum LoggingError {
    /// Environment variable contained invalid UTF-8 data.
    #[error("environment variable `{name}` contained invalid UTF-8: {source}")]
    InvalidUnicode {
        /// Name of the offending environment variable.
        name: &'static str,
        /// Underlying parse failure.
        #[source]
        source: env::VarError,
    },
    /// Unsupported log format requested via `TREESUM_LOG_FORMAT`.
    #[error("unsupported log format `{provided}`; expected `human` or `json`")]
    UnsupportedFormat {
        /// Raw value supplied by the user.
        provided: String,
    },
    /// Failed to install the global tracing subscriber.
    #[error("failed to install tracing subscriber: {source}")]
    InstallFailed {
        /// Error raised by `tracing_subscriber`.
        #[source]
        source: tracing_subscriber::util::TryInitError,
    },
}

/// Installs global structured logging once and returns the format in use.
///
/// The level comes from `RUST_LOG` (default `info`). When another
/// subscriber already owns the global slot it is left in place and the
/// conflict is reported on `stderr`.
///
/// # Errors
/// Returns [`LoggingError`] when `TREESUM_LOG_FORMAT` is unusable.
pub fn init_logging() -> Result<LogFormat, LoggingError> {
    if let Some(&format) = ACTIVE.get() {
        return Ok(format);
    }
    let format = LogFormat::from_env()?;
    if let Err(err) = format.install() {
        eprintln!("keeping the existing subscriber: {err}");
    }
    Ok(*ACTIVE.get_or_init(|| format))
}
