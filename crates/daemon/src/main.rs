// SPDX-License-Identifier: MIT

//! `aetherd`, the Aether kernel daemon.

use aether_daemon::{env, lifecycle};
use tracing_subscriber::EnvFilter;

fn init_tracing() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter = EnvFilter::try_from_env("AETHER_LOG")
        .unwrap_or_else(|_| EnvFilter::new("info"));

    // File logging when a state dir exists, stderr otherwise.
    match env::state_dir() {
        Some(dir) if std::fs::create_dir_all(&dir).is_ok() => {
            let appender = tracing_appender::rolling::daily(dir.join("logs"), "aetherd.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .init();
            Some(guard)
        }
        _ => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
            None
        }
    }
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let _guard = init_tracing();
    let config = env::kernel_config();

    match lifecycle::run(config).await {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "daemon failed");
            eprintln!("aetherd: {err}");
            std::process::ExitCode::FAILURE
        }
    }
}
