//! Wire events exchanged with streaming clients.
//!
//! Events are JSON objects tagged by a `type` field, one per line on the
//! gateway socket.

use crate::error::{Result, SignstreamError};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Events sent by clients.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundEvent {
    /// One captured camera frame, base64-encoded.
    VideoFrame {
        frame: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        timestamp: Option<f64>,
        /// Optional per-frame mode override.
        #[serde(skip_serializing_if = "Option::is_none")]
        mode: Option<String>,
    },
    /// Switch the session's analysis mode.
    SetAnalysisMode { mode: String },
    /// Begin a recording session.
    StartSession,
    /// End the current recording session.
    EndSession,
    /// One-shot translation of a clip sent inline or by URL.
    Translate {
        #[serde(skip_serializing_if = "Option::is_none")]
        video_data: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        video_url: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        mode: Option<String>,
    },
    /// One-shot translation of an uploaded clip file.
    TranslateUpload {
        filename: String,
        data: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        mode: Option<String>,
    },
    /// List the analysis modes the service supports.
    ListModes,
}

/// Events sent to clients.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundEvent {
    /// Acknowledges a new connection.
    ConnectionSuccess { message: String, timestamp: f64 },
    /// One classification produced from the live stream.
    TranslationResult {
        text: String,
        confidence: f32,
        timestamp: f64,
    },
    /// Confirms a mode change.
    ModeUpdated { mode: String },
    /// Confirms a recording session has begun.
    SessionStarted {
        session_id: String,
        started_at: String,
    },
    /// Summarizes a finished recording session.
    SessionEnded {
        session_id: String,
        frames_processed: u64,
        /// Seconds from session start to session end.
        duration: f64,
        mode: String,
    },
    /// Periodic liveness signal.
    Heartbeat { timestamp: f64 },
    /// Result of a one-shot translation request.
    Translation(crate::batch::TranslationResponse),
    /// Supported analysis modes.
    Modes { modes: Vec<crate::batch::ModeInfo> },
    /// Something went wrong with the client's last request.
    Error { message: String },
}

impl InboundEvent {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| SignstreamError::GatewayProtocol {
            message: format!("invalid inbound event: {e}"),
        })
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| SignstreamError::GatewayProtocol {
            message: format!("failed to serialize event: {e}"),
        })
    }
}

impl OutboundEvent {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| SignstreamError::GatewayProtocol {
            message: format!("invalid outbound event: {e}"),
        })
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| SignstreamError::GatewayProtocol {
            message: format!("failed to serialize event: {e}"),
        })
    }
}

/// Seconds since the Unix epoch, fractional.
pub fn unix_timestamp() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

/// RFC 3339 rendering of a wall-clock instant, second precision.
pub fn rfc3339(time: SystemTime) -> String {
    humantime::format_rfc3339_seconds(time).to_string()
}
