use tracing_subscriber::EnvFilter;

/// Initialize the tracing subscriber with the configured log level.
///
/// Maps config log levels to tracing levels:
/// - "DISABLED" -> no subscriber installed
/// - "WARNING" -> WARN
/// - "CRITICAL" -> ERROR
/// - Others map directly (TRACE, DEBUG, INFO, ERROR)
pub fn init_tracing(log_level: &str) {
    let level = log_level.to_uppercase();

    if level == "DISABLED" {
        return;
    }

    let filter = EnvFilter::try_new(tracing_level(&level)).unwrap_or_else(|_| EnvFilter::new("INFO"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}

fn tracing_level(level: &str) -> &str {
    match level {
        "WARNING" => "WARN",
        "CRITICAL" => "ERROR",
        other => other,
    }
}

/// Log an inquiry as it arrives.
pub fn log_inquiry(seq: u64, inquiry: &str) {
    tracing::info!(seq, "    Human: {inquiry}");
}

/// Log a resolved answer with the time it took.
pub fn log_exchange(seq: u64, answer: &str, duration_ms: u64) {
    tracing::info!(seq, duration_ms, "Assistant: {answer}");
    tracing::info!(seq, "       (in {duration_ms} ms)");
}
