// SPDX-License-Identifier: MIT

//! Listener task for handling socket I/O.
//!
//! Accepts connections on a Unix socket (and optionally TCP), reads
//! length-prefixed request frames, dispatches them, and writes response
//! frames. A `Subscribe` request flips the connection into an SSE event
//! stream until the client disconnects.

use crate::dispatch::{dispatch, DispatchOutcome};
use crate::kernel::Kernel;
use crate::VERSION;
use aether_core::Clock;
use aether_wire::{read_frame, write_frame, ProtocolError, RequestFrame, ResponseFrame};
use std::sync::Arc;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpListener, UnixListener};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Errors from connection handling.
#[derive(Debug, Error)]
pub(crate) enum ConnectionError {
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Listener over a Unix socket with optional TCP.
pub struct Listener<C: Clock + 'static> {
    unix: UnixListener,
    tcp: Option<TcpListener>,
    kernel: Arc<Kernel<C>>,
    shutdown: CancellationToken,
}

impl<C: Clock + 'static> Listener<C> {
    pub fn new(
        unix: UnixListener,
        tcp: Option<TcpListener>,
        kernel: Arc<Kernel<C>>,
        shutdown: CancellationToken,
    ) -> Self {
        Self { unix, tcp, kernel, shutdown }
    }

    /// Accept-loop until shutdown. Each connection runs in its own task.
    pub async fn run(self) {
        info!("listener started");
        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                accepted = self.unix.accept() => match accepted {
                    Ok((stream, _)) => self.spawn_connection(stream),
                    Err(err) => warn!(error = %err, "unix accept failed"),
                },
                accepted = accept_tcp(self.tcp.as_ref()) => match accepted {
                    Ok(stream) => self.spawn_connection(stream),
                    Err(err) => warn!(error = %err, "tcp accept failed"),
                },
            }
        }
        info!("listener stopped");
    }

    fn spawn_connection<S>(&self, stream: S)
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let kernel = Arc::clone(&self.kernel);
        let shutdown = self.shutdown.clone();
        tokio::spawn(async move {
            if let Err(err) = handle_connection(kernel, stream, shutdown).await {
                debug!(error = %err, "connection closed with error");
            }
        });
    }
}

/// TCP accept that parks forever when TCP is not configured.
async fn accept_tcp(
    tcp: Option<&TcpListener>,
) -> Result<tokio::net::TcpStream, std::io::Error> {
    match tcp {
        Some(listener) => listener.accept().await.map(|(stream, _)| stream),
        None => std::future::pending().await,
    }
}

async fn handle_connection<C, S>(
    kernel: Arc<Kernel<C>>,
    mut stream: S,
    shutdown: CancellationToken,
) -> Result<(), ConnectionError>
where
    C: Clock + 'static,
    S: AsyncRead + AsyncWrite + Unpin,
{
    loop {
        let frame: Option<RequestFrame> = tokio::select! {
            _ = shutdown.cancelled() => return Ok(()),
            frame = read_frame(&mut stream) => frame?,
        };
        let Some(frame) = frame else {
            return Ok(()); // clean EOF
        };

        match dispatch(&kernel, &frame) {
            DispatchOutcome::Respond(envelope) => {
                write_frame(&mut stream, &ResponseFrame::new(VERSION, envelope)).await?;
            }
            DispatchOutcome::Stream { filters } => {
                return stream_events(kernel, stream, &filters, shutdown).await;
            }
            DispatchOutcome::Shutdown(envelope) => {
                write_frame(&mut stream, &ResponseFrame::new(VERSION, envelope)).await?;
                info!("shutdown requested over the wire");
                shutdown.cancel();
                return Ok(());
            }
        }
    }
}

/// Forward SSE frames to the client until it disconnects or the daemon
/// shuts down. Every subscription the connection created is released
/// on exit.
async fn stream_events<C, S>(
    kernel: Arc<Kernel<C>>,
    mut stream: S,
    filters: &str,
    shutdown: CancellationToken,
) -> Result<(), ConnectionError>
where
    C: Clock + 'static,
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (id, mut rx) = kernel.fanout.subscribe(filters);
    debug!(subscriber = id, filters, "event stream opened");

    let result = loop {
        tokio::select! {
            _ = shutdown.cancelled() => break Ok(()),
            frame = rx.recv() => match frame {
                Some(bytes) => {
                    if let Err(err) = stream.write_all(&bytes).await {
                        break Err(ConnectionError::Io(err));
                    }
                    if let Err(err) = stream.flush().await {
                        break Err(ConnectionError::Io(err));
                    }
                }
                None => break Ok(()),
            },
        }
    };

    kernel.fanout.unsubscribe(id);
    debug!(subscriber = id, "event stream closed");
    result
}

#[cfg(test)]
#[path = "listener_tests.rs"]
mod tests;
