//! TCP gateway speaking newline-delimited JSON events.
//!
//! Each connection gets its own streaming session; inbound events are read
//! line by line and dispatched, outbound events (both the session's own
//! stream and direct responses) are serialized onto the socket by a writer
//! task.

use crate::batch::{BatchTranslationService, TranslateRequest};
use crate::error::{Result, SignstreamError};
use crate::session::{ClientInfo, SessionId};
use crate::streaming::events::{InboundEvent, OutboundEvent};
use crate::streaming::manager::StreamingSessionManager;

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// How long the accept loop waits before re-checking the shutdown flag.
const ACCEPT_POLL: Duration = Duration::from_millis(100);

/// The service's network front door.
pub struct Gateway {
    streaming: Arc<StreamingSessionManager>,
    batch: Arc<BatchTranslationService>,
    shutdown: Arc<AtomicBool>,
}

impl Gateway {
    pub fn new(
        streaming: Arc<StreamingSessionManager>,
        batch: Arc<BatchTranslationService>,
    ) -> Self {
        Self {
            streaming,
            batch,
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Request the accept loop to stop. Existing connections drain on their
    /// own; only new connections are refused.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }

    pub fn shutdown_flag(&self) -> Arc<AtomicBool> {
        self.shutdown.clone()
    }

    /// Bind the listening socket.
    pub async fn bind(&self, host: &str, port: u16) -> Result<TcpListener> {
        TcpListener::bind((host, port))
            .await
            .map_err(|e| SignstreamError::GatewaySocket {
                message: format!("failed to bind {host}:{port}: {e}"),
            })
    }

    /// Accept connections until shutdown is requested.
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        let addr = listener
            .local_addr()
            .map_err(|e| SignstreamError::GatewaySocket {
                message: format!("listener has no local address: {e}"),
            })?;
        info!("gateway listening on {addr}");

        while !self.shutdown.load(Ordering::SeqCst) {
            match tokio::time::timeout(ACCEPT_POLL, listener.accept()).await {
                Ok(Ok((stream, peer))) => {
                    debug!("accepted connection from {peer}");
                    let streaming = self.streaming.clone();
                    let batch = self.batch.clone();
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(streaming, batch, stream, peer).await {
                            warn!("connection from {peer} ended with error: {e}");
                        }
                    });
                }
                Ok(Err(e)) => error!("accept failed: {e}"),
                Err(_) => {} // poll tick, re-check shutdown
            }
        }
        info!("gateway shut down");
        Ok(())
    }

    /// Bind and serve in one call.
    pub async fn run(&self, host: &str, port: u16) -> Result<()> {
        let listener = self.bind(host, port).await?;
        self.serve(listener).await
    }
}

async fn handle_connection(
    streaming: Arc<StreamingSessionManager>,
    batch: Arc<BatchTranslationService>,
    stream: TcpStream,
    peer: SocketAddr,
) -> Result<()> {
    let (read_half, mut write_half) = stream.into_split();
    let mut lines = BufReader::new(read_half).lines();

    let client_info = ClientInfo {
        origin: Some(peer.to_string()),
        user_agent: None,
    };
    let (id, mut session_rx) = streaming.connect(client_info).await;

    // All outbound traffic funnels through one channel so the writer is the
    // only task touching the socket.
    let (out_tx, mut out_rx) = mpsc::channel::<OutboundEvent>(64);
    let forward_tx = out_tx.clone();
    let forwarder = tokio::spawn(async move {
        while let Some(event) = session_rx.recv().await {
            if forward_tx.send(event).await.is_err() {
                break;
            }
        }
    });

    let writer = tokio::spawn(async move {
        while let Some(event) = out_rx.recv().await {
            let line = match event.to_json() {
                Ok(line) => line,
                Err(e) => {
                    error!("dropping unserializable event: {e}");
                    continue;
                }
            };
            if write_half.write_all(line.as_bytes()).await.is_err()
                || write_half.write_all(b"\n").await.is_err()
            {
                break;
            }
        }
        let _shutdown = write_half.shutdown().await;
    });

    while let Ok(Some(line)) = lines.next_line().await {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match InboundEvent::from_json(line) {
            Ok(event) => {
                dispatch_event(&streaming, &batch, id, event, &out_tx).await;
            }
            Err(e) => {
                debug!("{id} sent a malformed event: {e}");
                send(&out_tx, OutboundEvent::Error {
                    message: e.to_string(),
                })
                .await;
            }
        }
    }

    streaming.disconnect(id).await;
    if forwarder.await.is_err() {
        warn!("event forwarder for {id} panicked");
    }
    drop(out_tx);
    if writer.await.is_err() {
        warn!("writer task for {id} panicked");
    }
    debug!("connection from {peer} closed");
    Ok(())
}

async fn dispatch_event(
    streaming: &StreamingSessionManager,
    batch: &BatchTranslationService,
    id: SessionId,
    event: InboundEvent,
    out_tx: &mpsc::Sender<OutboundEvent>,
) {
    match event {
        InboundEvent::VideoFrame { frame, mode, .. } => {
            if let Err(e) = streaming.on_frame(id, frame, mode.as_deref()).await {
                send(out_tx, OutboundEvent::Error {
                    message: e.to_string(),
                })
                .await;
            }
        }
        InboundEvent::SetAnalysisMode { mode } => {
            if let Err(e) = streaming.set_mode(id, &mode).await {
                send(out_tx, OutboundEvent::Error {
                    message: e.to_string(),
                })
                .await;
            }
        }
        InboundEvent::StartSession => {
            if let Err(e) = streaming.start_session(id).await {
                send(out_tx, OutboundEvent::Error {
                    message: e.to_string(),
                })
                .await;
            }
        }
        InboundEvent::EndSession => {
            if let Err(e) = streaming.end_session(id).await {
                send(out_tx, OutboundEvent::Error {
                    message: e.to_string(),
                })
                .await;
            }
        }
        InboundEvent::Translate {
            video_data,
            video_url,
            mode,
        } => {
            let request = TranslateRequest {
                video_data,
                video_url,
                mode,
            };
            let event = match batch.translate(request).await {
                Ok(response) => OutboundEvent::Translation(response),
                Err(e) => OutboundEvent::Error {
                    message: e.to_string(),
                },
            };
            send(out_tx, event).await;
        }
        InboundEvent::TranslateUpload {
            filename,
            data,
            mode,
        } => {
            let event = match batch.translate_upload(&filename, &data, mode.as_deref()).await {
                Ok(response) => OutboundEvent::Translation(response),
                Err(e) => OutboundEvent::Error {
                    message: e.to_string(),
                },
            };
            send(out_tx, event).await;
        }
        InboundEvent::ListModes => {
            send(out_tx, OutboundEvent::Modes {
                modes: batch.list_modes(),
            })
            .await;
        }
    }
}

async fn send(tx: &mpsc::Sender<OutboundEvent>, event: OutboundEvent) {
    if tx.send(event).await.is_err() {
        debug!("connection writer gone, event dropped");
    }
}
