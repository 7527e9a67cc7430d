//! Subscriber setup for the container's `tracing` events
//!
//! The container emits events under the `diy_ioc` target:
//!
//! | level   | event                                               |
//! |---------|-----------------------------------------------------|
//! | `INFO`  | application context ready                           |
//! | `DEBUG` | context creation, registration, auto-registration, singleton initialisation, resolution failure |
//! | `TRACE` | every resolution and where its provider was found   |
//!
//! A subscriber is only installed with the `logging-json` or `logging-pretty`
//! feature; without either, the `init*` functions do nothing and events go to
//! whatever subscriber the application installs itself.
//!
//! # Example
//!
//! ```rust,ignore
//! use diy_ioc::logging;
//!
//! // Default format for the enabled features
//! logging::init();
//!
//! // Or configure
//! logging::builder()
//!     .trace()
//!     .ioc_only()
//!     .compact()
//!     .init();
//! ```
//!
//! Set `RUST_LOG` to override the builder's filter with any `EnvFilter`
//! directive, e.g. `RUST_LOG=diy_ioc=trace`.

use tracing::Level;

/// Target used by every event the container emits
pub const TARGET: &str = "diy_ioc";

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One JSON object per event
    #[default]
    Json,
    /// Multi-line, colored
    Pretty,
    /// Single line per event
    Compact,
}

/// Builder for the logging subscriber.
#[derive(Debug, Clone)]
pub struct LoggingBuilder {
    level: Level,
    format: LogFormat,
    target: Option<&'static str>,
    file: bool,
    line_number: bool,
    thread_ids: bool,
}

impl Default for LoggingBuilder {
    fn default() -> Self {
        Self {
            level: Level::DEBUG,
            format: if cfg!(feature = "logging-json") {
                LogFormat::Json
            } else {
                LogFormat::Pretty
            },
            target: None,
            file: false,
            line_number: false,
            thread_ids: false,
        }
    }
}

impl LoggingBuilder {
    /// Create a builder with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the minimum level
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Set level to TRACE
    pub fn trace(self) -> Self {
        self.with_level(Level::TRACE)
    }

    /// Set level to DEBUG
    pub fn debug(self) -> Self {
        self.with_level(Level::DEBUG)
    }

    /// Set level to INFO
    pub fn info(self) -> Self {
        self.with_level(Level::INFO)
    }

    /// Only show events from `target`
    pub fn with_target_filter(mut self, target: &'static str) -> Self {
        self.target = Some(target);
        self
    }

    /// Only show the container's own events
    pub fn ioc_only(self) -> Self {
        self.with_target_filter(TARGET)
    }

    /// Include source file in events
    pub fn with_file(mut self) -> Self {
        self.file = true;
        self
    }

    /// Include line numbers in events
    pub fn with_line_number(mut self) -> Self {
        self.line_number = true;
        self
    }

    /// Include thread IDs in events
    pub fn with_thread_ids(mut self) -> Self {
        self.thread_ids = true;
        self
    }

    /// Use JSON output
    pub fn json(mut self) -> Self {
        self.format = LogFormat::Json;
        self
    }

    /// Use pretty multi-line output
    pub fn pretty(mut self) -> Self {
        self.format = LogFormat::Pretty;
        self
    }

    /// Use compact single-line output
    pub fn compact(mut self) -> Self {
        self.format = LogFormat::Compact;
        self
    }

    /// `EnvFilter` directive string for the configured level and target.
    pub fn directives(&self) -> String {
        let level = self.level.as_str().to_ascii_lowercase();
        match self.target {
            Some(target) => format!("{target}={level}"),
            None => level,
        }
    }

    /// Install the subscriber as the global default.
    ///
    /// Returns `false` if a global subscriber was already set.
    #[cfg(any(feature = "logging-json", feature = "logging-pretty"))]
    pub fn init(self) -> bool {
        use tracing_subscriber::{EnvFilter, fmt, prelude::*};

        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.directives()));
        let layer = fmt::layer()
            .with_file(self.file)
            .with_line_number(self.line_number)
            .with_thread_ids(self.thread_ids)
            .with_target(true);
        let registry = tracing_subscriber::registry().with(filter);

        let installed = match self.format {
            #[cfg(feature = "logging-json")]
            LogFormat::Json => registry.with(layer.json()).try_init(),
            #[cfg(not(feature = "logging-json"))]
            LogFormat::Json => registry.with(layer.pretty()).try_init(),
            LogFormat::Pretty => registry.with(layer.pretty()).try_init(),
            LogFormat::Compact => registry.with(layer.compact()).try_init(),
        };
        installed.is_ok()
    }

    /// Does nothing without a subscriber feature.
    #[cfg(not(any(feature = "logging-json", feature = "logging-pretty")))]
    pub fn init(self) -> bool {
        false
    }
}

/// Create a new logging builder
pub fn builder() -> LoggingBuilder {
    LoggingBuilder::new()
}

/// Initialize with the default format: JSON with `logging-json`, pretty otherwise.
pub fn init() -> bool {
    builder().init()
}

/// Initialize JSON output
pub fn init_json() -> bool {
    builder().json().init()
}

/// Initialize pretty output
pub fn init_pretty() -> bool {
    builder().pretty().init()
}

/// Initialize with only the container's events shown
pub fn init_ioc_only() -> bool {
    builder().ioc_only().init()
}
