//! # Logger
//!
//! Installs the process-wide `tracing` subscriber: an ANSI console layer, an optional
//! non-blocking rolling file layer (plain or JSON), and an [`EnvFilter`] built from the
//! configured level plus any extra directives. `RUST_LOG` applies when no directives are given.
//!
//! Services usually start from [`LoggingConfig`] via [`Logger::from_config`]; the typestate
//! [`LoggerBuilder`] is there for callers that need finer control.
//!
//! ## Example
//!
//! ```rust
//! # use tripdesk_logger::{Logger, LevelFilter};
//! let _logger = Logger::builder()
//!     .name("tripdesk")
//!     .console(true)
//!     .level(LevelFilter::DEBUG)
//!     .init()?;
//! # Ok::<(), tripdesk_logger::LoggerError>(())
//! ```

mod error;

pub use crate::error::{LoggerError, LoggerErrorExt};
pub use tracing::level_filters::LevelFilter;
pub use tracing_appender::rolling::Rotation;

use private::Sealed;
use std::fs;
use std::marker::PhantomData;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::RollingFileAppender;
use tracing_subscriber::fmt::layer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};
use tripdesk_domain::config::LoggingConfig;

const DEFAULT_MAX_FILES: usize = 10;
const LOG_FILE_SUFFIX: &str = "log";

#[derive(Debug)]
struct Settings {
    console: bool,
    dir: Option<PathBuf>,
    level: LevelFilter,
    rotation: Rotation,
    max_files: usize,
    json: bool,
    env_filter: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            console: true,
            dir: None,
            level: LevelFilter::INFO,
            rotation: Rotation::DAILY,
            max_files: DEFAULT_MAX_FILES,
            json: false,
            env_filter: None,
        }
    }
}

#[derive(Debug)]
pub struct NoName;
#[derive(Debug)]
pub struct WithName(String);
#[derive(Debug)]
pub struct NoFile;
#[derive(Debug)]
pub struct WithFile;

mod private {
    pub trait Sealed {}
}
impl Sealed for NoName {}
impl Sealed for WithName {}
impl Sealed for NoFile {}
impl Sealed for WithFile {}

/// Configures and installs the global subscriber.
///
/// A name is required before [`LoggerBuilder::init`] becomes available; file-only options
/// unlock once a directory is set with [`LoggerBuilder::path`].
#[derive(Debug)]
pub struct LoggerBuilder<N: Sealed = NoName, F: Sealed = NoFile> {
    settings: Settings,
    name: N,
    file: PhantomData<F>,
}

impl<F: Sealed> LoggerBuilder<NoName, F> {
    /// Sets the service name, also used as the log file prefix.
    pub fn name(self, name: impl Into<String>) -> LoggerBuilder<WithName, F> {
        LoggerBuilder { settings: self.settings, name: WithName(name.into()), file: PhantomData }
    }
}

impl LoggerBuilder<WithName, WithFile> {
    /// Number of rotated files to keep.
    #[must_use = "builders do nothing unless you call .init()"]
    pub const fn max_files(mut self, max: usize) -> Self {
        self.settings.max_files = max;
        self
    }

    #[must_use = "builders do nothing unless you call .init()"]
    pub const fn rotation(mut self, rotation: Rotation) -> Self {
        self.settings.rotation = rotation;
        self
    }

    /// Writes file output as JSON lines.
    #[must_use = "builders do nothing unless you call .init()"]
    pub const fn json(mut self) -> Self {
        self.settings.json = true;
        self
    }
}

impl<F: Sealed> LoggerBuilder<WithName, F> {
    #[must_use = "builders do nothing unless you call .init()"]
    pub const fn level(mut self, level: LevelFilter) -> Self {
        self.settings.level = level;
        self
    }

    /// Adds filter directives, e.g. `tripdesk_entitlements=debug`.
    ///
    /// Invalid directives make [`LoggerBuilder::init`] fail.
    #[must_use = "builders do nothing unless you call .init()"]
    pub fn env_filter(mut self, filter: impl Into<String>) -> Self {
        self.settings.env_filter = Some(filter.into());
        self
    }

    #[must_use = "builders do nothing unless you call .init()"]
    pub const fn console(mut self, enabled: bool) -> Self {
        self.settings.console = enabled;
        self
    }

    /// Enables rolling file output into `dir`.
    pub fn path(self, dir: impl Into<PathBuf>) -> LoggerBuilder<WithName, WithFile> {
        let mut settings = self.settings;
        settings.dir = Some(dir.into());
        LoggerBuilder { settings, name: self.name, file: PhantomData }
    }

    /// Installs the global subscriber.
    ///
    /// The returned [`Logger`] owns the file writer's worker guard and must be kept alive
    /// until shutdown so buffered lines are flushed.
    ///
    /// # Errors
    /// - [`LoggerError::InvalidConfiguration`] for an empty name, zero `max_files`, invalid
    ///   filter directives, or when no output is enabled.
    /// - [`LoggerError::Appender`] if the log directory cannot be used.
    /// - [`LoggerError::Subscriber`] if a global subscriber is already installed.
    pub fn init(self) -> Result<Logger, LoggerError> {
        let Self { settings, name: WithName(name), .. } = self;
        validate(&settings, &name)?;
        let env_filter = env_filter(&settings)?;

        let mut layers = Vec::new();
        if settings.console {
            layers.push(layer().compact().with_ansi(true).boxed());
        }

        let guard = match &settings.dir {
            Some(dir) => {
                fs::create_dir_all(dir).map_err(|e| LoggerError::Internal {
                    message: e.to_string().into(),
                    context: Some(format!("Creating log directory {}", dir.display()).into()),
                })?;

                let appender = RollingFileAppender::builder()
                    .rotation(settings.rotation.clone())
                    .filename_prefix(&name)
                    .filename_suffix(LOG_FILE_SUFFIX)
                    .max_log_files(settings.max_files)
                    .build(dir)
                    .context("Building rolling file appender")?;

                let (writer, guard) = tracing_appender::non_blocking(appender);
                let file_layer = layer().with_writer(writer).with_ansi(false);
                layers.push(if settings.json { file_layer.json().boxed() } else { file_layer.boxed() });
                Some(guard)
            },
            None => None,
        };

        if layers.is_empty() {
            return Err(LoggerError::InvalidConfiguration {
                message: "No output enabled; enable the console or set a log directory".into(),
                context: None,
            });
        }

        tracing_subscriber::registry().with(env_filter).with(layers).try_init()?;
        tracing::debug!(service = %name, "Logger initialized");

        Ok(Logger { guard })
    }
}

/// Handle to the installed logging system.
#[must_use = "dropping the handle stops the background file writer"]
#[derive(Debug)]
pub struct Logger {
    guard: Option<WorkerGuard>,
}

impl Logger {
    /// Starts a [`LoggerBuilder`] with console output at `INFO`.
    #[must_use = "builders do nothing unless you call .init()"]
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder { settings: Settings::default(), name: NoName, file: PhantomData }
    }

    /// Installs the global subscriber as described by the `[logging]` config section.
    ///
    /// # Errors
    /// Returns [`LoggerError::InvalidConfiguration`] for an unknown level, otherwise as
    /// [`LoggerBuilder::init`].
    pub fn from_config(name: &str, config: &LoggingConfig) -> Result<Self, LoggerError> {
        let mut builder =
            Self::builder().name(name).level(parse_level(&config.level)?).console(config.console);
        if let Some(filter) = &config.env_filter {
            builder = builder.env_filter(filter.clone());
        }

        match &config.dir {
            Some(dir) => {
                let builder = builder.path(dir).max_files(config.max_files);
                if config.json { builder.json().init() } else { builder.init() }
            },
            None => builder.init(),
        }
    }

    /// Whether file output is active.
    #[must_use]
    pub const fn writes_files(&self) -> bool {
        self.guard.is_some()
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        if self.guard.is_some() {
            tracing::info!("Logging shutting down, flushing buffers");
        }
    }
}

/// Parses a level name such as `info` or `DEBUG`; `off` disables output.
///
/// # Errors
/// Returns [`LoggerError::InvalidConfiguration`] for anything else.
pub fn parse_level(level: &str) -> Result<LevelFilter, LoggerError> {
    level.trim().parse().map_err(|e| LoggerError::InvalidConfiguration {
        message: format!("Unknown log level '{level}': {e}").into(),
        context: None,
    })
}

fn validate(settings: &Settings, name: &str) -> Result<(), LoggerError> {
    if name.trim().is_empty() {
        return Err(LoggerError::InvalidConfiguration {
            message: "Logger name cannot be empty".into(),
            context: None,
        });
    }

    if settings.max_files == 0 {
        return Err(LoggerError::InvalidConfiguration {
            message: "max_files must be greater than zero".into(),
            context: None,
        });
    }

    Ok(())
}

fn env_filter(settings: &Settings) -> Result<EnvFilter, LoggerError> {
    let builder = EnvFilter::builder().with_default_directive(settings.level.into());
    settings.env_filter.as_ref().map_or_else(
        || Ok(builder.from_env_lossy()),
        |filter| {
            builder.parse(filter).map_err(|e| LoggerError::InvalidConfiguration {
                message: format!("Invalid env filter '{filter}': {e}").into(),
                context: None,
            })
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults() {
        let builder = Logger::builder().name("tripdesk").env_filter("tripdesk=debug");
        assert!(builder.settings.console);
        assert_eq!(builder.settings.level, LevelFilter::INFO);
        assert_eq!(builder.settings.max_files, DEFAULT_MAX_FILES);
        assert_eq!(builder.settings.env_filter.as_deref(), Some("tripdesk=debug"));
        assert!(builder.settings.dir.is_none());
    }

    #[test]
    fn file_options_apply() {
        let builder =
            Logger::builder().name("tripdesk").path("logs").max_files(3).json().level(LevelFilter::WARN);
        assert_eq!(builder.settings.dir.as_deref(), Some(std::path::Path::new("logs")));
        assert_eq!(builder.settings.max_files, 3);
        assert!(builder.settings.json);
        assert_eq!(builder.settings.level, LevelFilter::WARN);
    }

    #[test]
    fn levels_parse_case_insensitively() -> Result<(), LoggerError> {
        assert_eq!(parse_level("debug")?, LevelFilter::DEBUG);
        assert_eq!(parse_level(" WARN ")?, LevelFilter::WARN);
        assert_eq!(parse_level("off")?, LevelFilter::OFF);
        assert!(matches!(parse_level("chatty"), Err(LoggerError::InvalidConfiguration { .. })));
        Ok(())
    }

    #[test]
    fn invalid_settings_are_rejected_before_install() {
        let empty_name = Logger::builder().name("  ").init();
        assert!(matches!(empty_name, Err(LoggerError::InvalidConfiguration { .. })));

        let no_output = Logger::builder().name("tripdesk").console(false).init();
        assert!(matches!(no_output, Err(LoggerError::InvalidConfiguration { .. })));

        let zero_files = Logger::builder().name("tripdesk").path("logs").max_files(0).init();
        assert!(matches!(zero_files, Err(LoggerError::InvalidConfiguration { .. })));

        let bad_filter = Logger::builder().name("tripdesk").env_filter("tripdesk=chatty").init();
        assert!(matches!(bad_filter, Err(LoggerError::InvalidConfiguration { .. })));
    }
}
