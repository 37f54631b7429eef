// SPDX-License-Identifier: MIT

//! Daemon lifecycle: bind sockets, start the scheduler loop and
//! listener, wait for shutdown, checkpoint on the way out.

use crate::env;
use crate::kernel::{Kernel, KernelConfig};
use crate::listener::Listener;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::net::{TcpListener, UnixListener};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

pub const SOCKET_FILE: &str = "aetherd.sock";

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("no state directory could be resolved (set AETHER_STATE_DIR)")]
    NoStateDir,

    #[error("kernel start failed: {0}")]
    Kernel(#[from] aether_core::KernelError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Resolve the socket path inside the state directory.
fn socket_path(state_dir: &Path) -> PathBuf {
    state_dir.join(SOCKET_FILE)
}

/// Run the daemon until SIGINT or a `Shutdown` request.
pub async fn run(config: KernelConfig) -> Result<(), LifecycleError> {
    let state_dir = config.state_dir.clone().ok_or(LifecycleError::NoStateDir)?;
    std::fs::create_dir_all(&state_dir)?;

    let mut kernel = Kernel::start(config, aether_core::SystemClock)?;
    let shutdown = CancellationToken::new();

    // Stale socket from a previous run.
    let sock = socket_path(&state_dir);
    if sock.exists() {
        std::fs::remove_file(&sock)?;
    }
    let unix = UnixListener::bind(&sock)?;
    let tcp = match env::tcp_port() {
        Some(port) => {
            let listener = TcpListener::bind(("127.0.0.1", port)).await?;
            info!(port, "listening on TCP");
            Some(listener)
        }
        None => None,
    };
    info!(socket = %sock.display(), "listening on unix socket");

    let scheduler_task =
        tokio::spawn(kernel.scheduler.clone().run(shutdown.clone()));

    let kernel = Arc::new(kernel);
    let listener =
        Listener::new(unix, tcp, Arc::clone(&kernel), shutdown.clone());
    let listener_task = tokio::spawn(listener.run());

    tokio::select! {
        _ = shutdown.cancelled() => {}
        signal = tokio::signal::ctrl_c() => {
            if let Err(err) = signal {
                warn!(error = %err, "ctrl-c handler failed");
            }
            info!("interrupt received, shutting down");
            shutdown.cancel();
        }
    }

    let drain = env::drain_timeout();
    let _ = tokio::time::timeout(drain, async {
        let _ = listener_task.await;
        let _ = scheduler_task.await;
    })
    .await;

    // Sole strong handle again: detach consumers and checkpoint.
    // Checkpointing is idempotent, so transient failures retry.
    match Arc::try_unwrap(kernel) {
        Ok(mut kernel) => {
            let store = kernel.store.clone();
            kernel.shutdown();
            if let Err(err) =
                crate::retry::with_backoff(3, || store.checkpoint().map_err(Into::into)).await
            {
                warn!(error = %err, "checkpoint failed after retries");
            }
        }
        Err(kernel) => {
            warn!("connections still draining; checkpointing shared kernel");
            let store = kernel.store.clone();
            if let Err(err) =
                crate::retry::with_backoff(3, || store.checkpoint().map_err(Into::into)).await
            {
                warn!(error = %err, "checkpoint failed after retries");
            }
        }
    }
    let _ = std::fs::remove_file(&sock);
    info!("daemon stopped");
    Ok(())
}
