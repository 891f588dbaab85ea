//! Session manager for the live streaming pipeline.
//!
//! One manager owns every connected client's state. The session map lock is
//! only held for bookkeeping; frame decoding and classification run on the
//! blocking pool with the lock released, so a slow model never stalls other
//! sessions' frames.

use crate::classify::Classifier;
use crate::config::StreamConfig;
use crate::error::{Result, SignstreamError};
use crate::landmark::LandmarkExtractor;
use crate::session::{
    ActiveSession, ClientInfo, Mode, Session, SessionBuffer, SessionId, next_session_id,
};
use crate::streaming::events::{OutboundEvent, rfc3339, unix_timestamp};
use crate::streaming::heartbeat::spawn_heartbeat;

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant, SystemTime};
use tokio::sync::{Mutex, Notify, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Outbound events buffered per connection before backpressure kicks in.
const EVENT_CHANNEL_CAPACITY: usize = 64;

struct SessionEntry {
    session: Session,
    buffer: SessionBuffer,
    sender: mpsc::Sender<OutboundEvent>,
    heartbeat_stop: Arc<Notify>,
    heartbeat: Option<JoinHandle<()>>,
}

/// Owns all live connections and drives frames through extraction and
/// classification.
pub struct StreamingSessionManager {
    extractor: LandmarkExtractor,
    classifier: Arc<dyn Classifier>,
    stream: StreamConfig,
    sessions: Mutex<HashMap<SessionId, SessionEntry>>,
    next_id: AtomicU64,
}

impl StreamingSessionManager {
    pub fn new(
        extractor: LandmarkExtractor,
        classifier: Arc<dyn Classifier>,
        stream: StreamConfig,
    ) -> Self {
        Self {
            extractor,
            classifier,
            stream,
            sessions: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Register a new connection.
    ///
    /// Returns the connection id and the receiving end of its event stream;
    /// a connection acknowledgment is already queued on it.
    pub async fn connect(
        &self,
        client_info: ClientInfo,
    ) -> (SessionId, mpsc::Receiver<OutboundEvent>) {
        let id = SessionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

        let mode = Mode::default();
        let stop = Arc::new(Notify::new());
        let heartbeat = spawn_heartbeat(
            id,
            Duration::from_millis(self.stream.heartbeat_interval_ms),
            Duration::from_millis(self.stream.heartbeat_error_backoff_ms),
            tx.clone(),
            stop.clone(),
        );

        let greeting = OutboundEvent::ConnectionSuccess {
            message: "connected to signstream".to_string(),
            timestamp: unix_timestamp(),
        };
        if tx.send(greeting).await.is_err() {
            debug!("{id} dropped its receiver before the greeting");
        }

        let entry = SessionEntry {
            session: Session::new(client_info),
            buffer: SessionBuffer::new(mode.window_size(&self.stream)),
            sender: tx,
            heartbeat_stop: stop,
            heartbeat: Some(heartbeat),
        };
        let origin = entry.session.client_info.origin.clone();
        self.sessions.lock().await.insert(id, entry);
        match origin {
            Some(origin) => info!("{id} connected from {origin}"),
            None => info!("{id} connected"),
        }
        (id, rx)
    }

    /// Tear down a connection: stop its heartbeat, then drop its state.
    ///
    /// Idempotent; disconnecting an unknown id is a no-op.
    pub async fn disconnect(&self, id: SessionId) {
        let (stop, handle) = {
            let mut sessions = self.sessions.lock().await;
            let Some(entry) = sessions.get_mut(&id) else {
                return;
            };
            (entry.heartbeat_stop.clone(), entry.heartbeat.take())
        };

        stop.notify_one();
        if let Some(handle) = handle
            && handle.await.is_err()
        {
            warn!("heartbeat task for {id} panicked");
        }

        let mut sessions = self.sessions.lock().await;
        if let Some(entry) = sessions.remove(&id) {
            info!(
                "{id} disconnected after {} frames",
                entry.session.frames_processed
            );
        }
    }

    /// Switch a session's analysis mode.
    pub async fn set_mode(&self, id: SessionId, raw_mode: &str) -> Result<Mode> {
        let mode = Mode::normalize(raw_mode);
        {
            let mut sessions = self.sessions.lock().await;
            let entry = sessions.get_mut(&id).ok_or_else(|| not_found(id))?;
            if mode != entry.session.mode {
                entry.session.mode = mode;
                entry.buffer.retarget(mode.window_size(&self.stream));
            }
        }
        self.emit_if_live(
            id,
            OutboundEvent::ModeUpdated {
                mode: mode.as_str().to_string(),
            },
        )
        .await;
        Ok(mode)
    }

    /// Begin a recording session within a connection.
    ///
    /// Resets the frame counter; starting while a session is active replaces
    /// it.
    pub async fn start_session(&self, id: SessionId) -> Result<String> {
        let session_id = next_session_id();
        {
            let mut sessions = self.sessions.lock().await;
            let entry = sessions.get_mut(&id).ok_or_else(|| not_found(id))?;
            entry.session.frames_processed = 0;
            entry.session.active = Some(ActiveSession {
                session_id: session_id.clone(),
                started_at: Instant::now(),
            });
        }
        self.emit_if_live(
            id,
            OutboundEvent::SessionStarted {
                session_id: session_id.clone(),
                started_at: rfc3339(SystemTime::now()),
            },
        )
        .await;
        Ok(session_id)
    }

    /// End the active recording session and report its summary.
    ///
    /// A no-op when no recording session is active.
    pub async fn end_session(&self, id: SessionId) -> Result<()> {
        let summary = {
            let mut sessions = self.sessions.lock().await;
            let entry = sessions.get_mut(&id).ok_or_else(|| not_found(id))?;
            entry.session.active.take().map(|active| {
                OutboundEvent::SessionEnded {
                    session_id: active.session_id,
                    frames_processed: entry.session.frames_processed,
                    duration: active.started_at.elapsed().as_secs_f64(),
                    mode: entry.session.mode.as_str().to_string(),
                }
            })
        };

        let Some(event) = summary else {
            debug!("{id} ended a session with none active");
            return Ok(());
        };
        self.emit_if_live(id, event).await;
        Ok(())
    }

    /// Process one streamed frame.
    ///
    /// Extraction and classification both run off the session lock. Results
    /// are delivered only if the session still exists when they are ready;
    /// a disconnect races cleanly with in-flight work.
    pub async fn on_frame(
        &self,
        id: SessionId,
        encoded_frame: String,
        mode_override: Option<&str>,
    ) -> Result<()> {
        {
            let mut sessions = self.sessions.lock().await;
            let entry = sessions.get_mut(&id).ok_or_else(|| not_found(id))?;
            // Every received frame counts, including ones that later fail
            // to decode.
            entry.session.frames_processed += 1;
            if let Some(raw) = mode_override {
                let mode = Mode::normalize(raw);
                if mode != entry.session.mode {
                    entry.session.mode = mode;
                    entry.buffer.retarget(mode.window_size(&self.stream));
                }
            }
        }

        let extractor = self.extractor.clone();
        let extracted =
            tokio::task::spawn_blocking(move || extractor.extract_encoded(&encoded_frame))
                .await
                .map_err(|e| SignstreamError::TransientProcessing {
                    message: format!("frame task failed: {e}"),
                })?;

        let vector = match extracted {
            Ok(vector) => vector,
            Err(e) => {
                debug!("{id} sent an undecodable frame: {e}");
                self.emit_if_live(
                    id,
                    OutboundEvent::Error {
                        message: e.to_string(),
                    },
                )
                .await;
                return Ok(());
            }
        };

        let (window, mode) = {
            let mut sessions = self.sessions.lock().await;
            let Some(entry) = sessions.get_mut(&id) else {
                // Disconnected while the frame was being processed.
                return Ok(());
            };
            (entry.buffer.append(vector), entry.session.mode)
        };

        let Some(window) = window else {
            return Ok(());
        };

        let classifier = self.classifier.clone();
        let inference = tokio::time::timeout(
            Duration::from_millis(self.stream.inference_timeout_ms),
            tokio::task::spawn_blocking(move || classifier.predict(&window, mode)),
        )
        .await;

        let event = match inference {
            Err(_) => {
                warn!("{id} classification timed out, dropping window");
                OutboundEvent::Error {
                    message: "processing timed out, window dropped".to_string(),
                }
            }
            Ok(Err(join_err)) => {
                warn!("{id} classification task failed: {join_err}");
                OutboundEvent::Error {
                    message: "internal processing error".to_string(),
                }
            }
            Ok(Ok(Err(e))) => {
                warn!("{id} classification failed: {e}");
                OutboundEvent::Error {
                    message: e.to_string(),
                }
            }
            Ok(Ok(Ok(prediction))) => OutboundEvent::TranslationResult {
                text: prediction.label,
                confidence: prediction.confidence,
                timestamp: unix_timestamp(),
            },
        };
        self.emit_if_live(id, event).await;
        Ok(())
    }

    /// Number of currently connected clients.
    pub async fn session_count(&self) -> usize {
        self.sessions.lock().await.len()
    }

    /// Deliver an event to a session if it still exists, silently dropping
    /// it otherwise.
    async fn emit_if_live(&self, id: SessionId, event: OutboundEvent) {
        let sender = {
            let sessions = self.sessions.lock().await;
            sessions.get(&id).map(|entry| entry.sender.clone())
        };
        if let Some(sender) = sender
            && sender.send(event).await.is_err()
        {
            debug!("{id} receiver gone, event dropped");
        }
    }
}

fn not_found(id: SessionId) -> SignstreamError {
    SignstreamError::SessionNotFound {
        session_id: id.to_string(),
    }
}
