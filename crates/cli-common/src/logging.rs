//! Logging setup shared by the middleware binaries.
//!
//! Logs go to stderr so that stdout stays reserved for the run report. The
//! level comes from configuration rather than CLI flags, since these
//! processes are driven by config files in scheduled environments.

/// The format for logs.
#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    /// Logs are written to stderr in jsonl format, which log shippers can
    /// forward with the proper level and field structure intact.
    Json,
    /// Plain text with no colors.
    Text,
    /// Same as plain text, but with fancy colors for better readability in
    /// interactive terminals.
    Color,
}

fn default_log_format() -> LogFormat {
    if atty::is(atty::Stream::Stderr) {
        LogFormat::Color
    } else {
        // Non-interactive runs default to JSON so that programmatic users
        // don't have to ask for it.
        LogFormat::Json
    }
}

/// Initializes logging with the given env-filter directive (e.g. "info").
/// Panics if called twice.
pub fn init_logging(filter: &str, format: Option<LogFormat>) {
    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        // CLOSE span events log each span once, when it completes, together
        // with its timing and recorded fields.
        .with_span_events(tracing_subscriber::fmt::format::FmtSpan::CLOSE)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_target(false);

    match format.unwrap_or_else(default_log_format) {
        LogFormat::Json => {
            builder
                .json()
                .flatten_event(true)
                .with_current_span(true)
                .with_span_list(false)
                .init();
        }
        LogFormat::Text => {
            builder.compact().with_ansi(false).init();
        }
        LogFormat::Color => {
            builder.compact().with_ansi(true).init();
        }
    }
}
