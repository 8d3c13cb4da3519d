// Logging for the Roost runtime
//
// Built on `tracing`: runtime events carry actor type, actor id and turn kind
// as structured fields. Hosts pick one of the `init*` functions once at
// startup; later calls are ignored.
//
// ```rust,ignore
// roost::logging::init_production();
// roost::logging::init_with_file(LogConfig::default(), "/var/log/roost/runtime.log")?;
// ```
//
// The span and event macros (`actor_span!`, `turn_span!`, `log_lifecycle!`,
// `log_turn!`, `log_error!`) are exported at the crate root.

use std::fs::OpenOptions;
use std::io;
use std::sync::{Mutex, Once};
use tracing::{Level, Subscriber};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Configuration for the Roost logging system
///
/// # Examples
///
/// ```rust
/// use roost::logging::LogConfig;
/// use tracing::Level;
///
/// let custom_config = LogConfig {
///     level: Level::DEBUG,
///     json_format: true,
///     show_file_line: false,
///     show_thread_info: true,
///     show_time: true,
///     target_filters: Some("roost=debug,roost::activation=trace".to_string()),
/// };
/// ```
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Minimum log level to display
    pub level: Level,
    /// Whether to use JSON format for logs
    pub json_format: bool,
    /// Whether to include file and line information
    pub show_file_line: bool,
    /// Whether to include thread name/id
    pub show_thread_info: bool,
    /// Whether to include timestamps
    pub show_time: bool,
    /// Target filter expressions (format: "target=level,target2=level2,...")
    pub target_filters: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            json_format: false,
            show_file_line: true,
            show_thread_info: true,
            show_time: true,
            target_filters: None,
        }
    }
}

// Initialization guard to ensure we only initialize once
static INIT: Once = Once::new();

fn build_filter(config: &LogConfig) -> EnvFilter {
    let mut env_filter = EnvFilter::from_default_env().add_directive(config.level.into());
    if let Some(filters) = &config.target_filters {
        for filter in filters.split(',') {
            if let Ok(directive) = filter.parse() {
                env_filter = env_filter.add_directive(directive);
            }
        }
    }
    env_filter
}

/// Initialize the logging system with the given configuration
///
/// Safe to call multiple times; only the first call takes effect.
pub fn init(config: LogConfig) {
    INIT.call_once(|| {
        let env_filter = build_filter(&config);
        let registry = tracing_subscriber::registry().with(env_filter);

        let subscriber: Box<dyn Subscriber + Send + Sync> = match (config.json_format, config.show_time) {
            (true, _) => Box::new(registry.with(fmt::layer().json().flatten_event(true))),
            (false, true) => Box::new(
                registry.with(
                    fmt::layer()
                        .with_ansi(atty::is(atty::Stream::Stdout))
                        .with_file(config.show_file_line)
                        .with_line_number(config.show_file_line)
                        .with_thread_names(config.show_thread_info)
                        .with_thread_ids(config.show_thread_info),
                ),
            ),
            (false, false) => Box::new(
                registry.with(
                    fmt::layer()
                        .without_time()
                        .with_ansi(atty::is(atty::Stream::Stdout))
                        .with_file(config.show_file_line)
                        .with_line_number(config.show_file_line)
                        .with_thread_names(config.show_thread_info)
                        .with_thread_ids(config.show_thread_info),
                ),
            ),
        };

        set_global_subscriber(subscriber);
    });
}

// Helper function to set the global subscriber
fn set_global_subscriber<S>(subscriber: S)
where
    S: Subscriber + Send + Sync + 'static,
{
    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Error setting global tracing subscriber: {}", err);
    }
}

/// Initialize logging with both console and file output
///
/// `log_file` is opened in append mode (created if missing) before anything
/// is installed, so a bad path is reported to the caller. File output is
/// always plain text.
pub fn init_with_file(config: LogConfig, log_file: &str) -> Result<(), io::Error> {
    let file = OpenOptions::new().create(true).append(true).open(log_file)?;

    INIT.call_once(move || {
        let env_filter = build_filter(&config);

        let console_layer = fmt::layer()
            .with_ansi(atty::is(atty::Stream::Stdout))
            .with_file(config.show_file_line)
            .with_line_number(config.show_file_line)
            .with_thread_names(config.show_thread_info)
            .with_thread_ids(config.show_thread_info);

        let file_layer = fmt::layer()
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .with_file(true)
            .with_line_number(true)
            .with_thread_ids(true);

        let subscriber = tracing_subscriber::registry()
            .with(env_filter)
            .with(console_layer)
            .with(file_layer);

        set_global_subscriber(subscriber);
    });

    Ok(())
}

/// INFO level, human-readable console output.
pub fn init_default() {
    init(LogConfig::default());
}

/// Initialize logging optimized for development environments
///
/// - DEBUG level for the runtime, TRACE for activations
/// - Colorized console output with file/line information
pub fn init_development() {
    let config = LogConfig {
        level: Level::DEBUG,
        json_format: false,
        show_file_line: true,
        show_thread_info: true,
        show_time: true,
        target_filters: Some("roost=debug,roost::activation=trace".to_string()),
    };
    init(config);
}

/// Initialize logging optimized for production environments
///
/// JSON output for log aggregators, no file/line information.
pub fn init_production() {
    let config = LogConfig {
        level: Level::INFO,
        json_format: true,
        show_file_line: false,
        show_thread_info: true,
        show_time: true,
        target_filters: None,
    };
    init(config);
}

/// Initialize logging for testing
///
/// Only warnings and errors, no timestamps or thread info.
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn my_test() {
///     roost::logging::init_test();
/// }
/// ```
pub fn init_test() {
    let config = LogConfig {
        level: Level::WARN,
        json_format: false,
        show_file_line: true,
        show_thread_info: false,
        show_time: false,
        target_filters: None,
    };
    init(config);
}

/// Create a new span for actor operations
///
/// ```rust
/// use roost::actor_span;
///
/// let span = actor_span!("Counter", "42");
/// let _guard = span.enter();
///
/// let span = actor_span!("Counter", "42", activation = 3);
/// ```
#[macro_export]
macro_rules! actor_span {
    ($actor_type:expr, $actor_id:expr) => {
        tracing::info_span!("actor", actor_type = %$actor_type, actor_id = %$actor_id)
    };
    ($actor_type:expr, $actor_id:expr, $($fields:tt)*) => {
        tracing::info_span!("actor", actor_type = %$actor_type, actor_id = %$actor_id, $($fields)*)
    };
}

/// Create a span covering one turn
///
/// ```rust
/// use roost::turn_span;
///
/// let span = turn_span!("timer", "record");
/// ```
#[macro_export]
macro_rules! turn_span {
    ($kind:expr, $target:expr) => {
        tracing::debug_span!("turn", kind = %$kind, name = %$target)
    };
    ($kind:expr, $target:expr, $($fields:tt)*) => {
        tracing::debug_span!("turn", kind = %$kind, name = %$target, $($fields)*)
    };
}

/// Log actor lifecycle events - activation, deactivation
///
/// ```rust
/// use roost::log_lifecycle;
///
/// log_lifecycle!("Counter", "42", "activated");
/// log_lifecycle!("Counter", "42", "deactivated", reason = "idle");
/// ```
#[macro_export]
macro_rules! log_lifecycle {
    ($actor_type:expr, $actor_id:expr, $event:expr) => {
        tracing::info!(actor_type = %$actor_type, actor_id = %$actor_id, event = $event)
    };
    ($actor_type:expr, $actor_id:expr, $event:expr, $($fields:tt)*) => {
        tracing::info!(actor_type = %$actor_type, actor_id = %$actor_id, event = $event, $($fields)*)
    };
}

/// Log turn processing events
///
/// ```rust
/// use roost::log_turn;
///
/// log_turn!("Counter", "42", "method", "increment");
/// log_turn!("Counter", "42", "timer", "record", elapsed_ms = 3);
/// ```
#[macro_export]
macro_rules! log_turn {
    ($actor_type:expr, $actor_id:expr, $kind:expr, $target:expr) => {
        tracing::debug!(actor_type = %$actor_type, actor_id = %$actor_id, kind = %$kind, name = %$target)
    };
    ($actor_type:expr, $actor_id:expr, $kind:expr, $target:expr, $($fields:tt)*) => {
        tracing::debug!(actor_type = %$actor_type, actor_id = %$actor_id, kind = %$kind, name = %$target, $($fields)*)
    };
}

/// Log error events - use for all error conditions
///
/// ```rust
/// use roost::log_error;
///
/// let error = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
/// log_error!(error);
/// log_error!(error, component = "backend", operation = "save_state");
/// ```
#[macro_export]
macro_rules! log_error {
    ($error:expr) => {
        tracing::error!(error = %$error)
    };
    ($error:expr, $($fields:tt)*) => {
        tracing::error!(error = %$error, $($fields)*)
    };
}
