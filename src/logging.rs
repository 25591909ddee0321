use std::path::PathBuf;

use tracing_subscriber::EnvFilter;

/// Opt-in file logging for embedding applications: daily-rolling log files
/// under the platform config directory, level controlled via `RUST_LOG`.
/// Call at most once per process.
pub fn setup_logging() {
    let log_dir = dirs::config_dir()
        .map(|d| d.join("salon-booking"))
        .unwrap_or_else(|| PathBuf::from("."));

    std::fs::create_dir_all(&log_dir).ok();

    let file_appender = tracing_appender::rolling::daily(log_dir, "salon-booking.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(false)
        .init();

    // The guard must outlive the process for the writer thread to flush.
    std::mem::forget(guard);

    tracing::info!("salon-booking logging initialised");
}
