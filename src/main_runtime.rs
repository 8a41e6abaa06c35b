use rl_portfolio::config::LoggingConfig;
use rl_portfolio::rl::training::CancellationToken;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber; keep the returned guard alive until exit
pub fn init_logging(config: &LoggingConfig) -> Option<WorkerGuard> {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info,rl_portfolio=debug"));

    // `tracing_appender::rolling::daily` panics if it can't create the
    // initial log file, so preflight writability.
    let mut guard = None;
    let file_layer = match &config.log_dir {
        Some(log_dir) => {
            let test_path = log_dir.join(".rl_portfolio_write_test");
            let writable = std::fs::create_dir_all(log_dir).is_ok()
                && std::fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&test_path)
                    .is_ok();
            if writable {
                let _ = std::fs::remove_file(&test_path);

                // Daily rotating file appender
                let file_appender = tracing_appender::rolling::daily(log_dir, "rl-portfolio.log");
                let (non_blocking, worker_guard) = tracing_appender::non_blocking(file_appender);
                guard = Some(worker_guard);

                Some(
                    tracing_subscriber::fmt::layer()
                        .with_writer(non_blocking)
                        .with_ansi(false) // No color codes in file
                        .with_target(true),
                )
            } else {
                eprintln!(
                    "Warning: Could not write to log directory {}, file logging disabled",
                    log_dir.display()
                );
                None
            }
        }
        None => None,
    };

    // Console layer, plain or JSON
    let console_layer = (!config.json).then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
    });
    let json_layer = config
        .json
        .then(|| tracing_subscriber::fmt::layer().json().with_target(true));

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(json_layer)
        .with(file_layer)
        .init();

    if let Some(log_dir) = config.log_dir.as_ref().filter(|_| guard.is_some()) {
        eprintln!("Logging to: {}/rl-portfolio.log", log_dir.display());
    }
    guard
}

pub fn init_logging_simple() {
    // Minimal logging for one-shot commands
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .try_init();
}

/// Cancel `token` on the first Ctrl+C
pub fn spawn_ctrl_c_handler(token: CancellationToken) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received shutdown signal, stopping after the current step");
                token.cancel();
            }
            Err(e) => warn!("Failed to install Ctrl+C handler: {}", e),
        }
    });
}
