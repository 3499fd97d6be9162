//! Tracing subscriber setup for the binary.

use lf_core::config::LoggingConfig;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Default filter directives when `RUST_LOG` is unset.
pub fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "ladderforge=trace,lf_pipeline=trace,lf_av=trace,lf_probe=debug,lf_core=debug"
    } else {
        "ladderforge=info,lf_pipeline=info,lf_av=info,lf_probe=info,lf_core=info"
    }
}

/// Install the global subscriber.
///
/// `RUST_LOG` wins over the verbosity default. When `logging.directory` is
/// set, a daily rolling file layer is added; keep the returned guard alive
/// for the life of the process or buffered lines are lost.
pub fn init(verbose: bool, logging: &LoggingConfig) -> Option<WorkerGuard> {
    let env_filter = std::env::var("RUST_LOG")
        .map(EnvFilter::new)
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)));

    let stderr_layer = fmt::layer().with_writer(std::io::stderr);

    match &logging.directory {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, &logging.file_prefix);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(env_filter)
                .with(stderr_layer)
                .with(fmt::layer().with_ansi(false).with_writer(writer))
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(stderr_layer)
                .init();
            None
        }
    }
}
