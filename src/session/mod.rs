//! Per-client session state: analysis modes, session records, and the
//! rolling frame buffer.

pub mod buffer;

pub use buffer::SessionBuffer;

use crate::config::StreamConfig;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

/// Analysis mode selecting which model and window size a session uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Character,
    Word,
    Sentence,
}

impl Mode {
    /// Parse a client-supplied mode string; anything unrecognized falls back
    /// to word mode rather than failing the request.
    pub fn normalize(raw: &str) -> Mode {
        match raw.trim().to_ascii_lowercase().as_str() {
            "character" | "char" => Mode::Character,
            "sentence" => Mode::Sentence,
            _ => Mode::Word,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Character => "character",
            Mode::Word => "word",
            Mode::Sentence => "sentence",
        }
    }

    /// Window size in frames for this mode.
    ///
    /// Sentence mode runs on the word model and shares its window.
    pub fn window_size(&self, stream: &StreamConfig) -> usize {
        match self {
            Mode::Character => stream.char_window_frames,
            Mode::Word | Mode::Sentence => stream.word_window_frames,
        }
    }
}

impl Default for Mode {
    fn default() -> Self {
        Mode::Word
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque connection identifier assigned by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "client-{}", self.0)
    }
}

/// Who connected, as reported by the transport.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientInfo {
    pub origin: Option<String>,
    pub user_agent: Option<String>,
}

/// A started recording session within a connection.
#[derive(Debug, Clone)]
pub struct ActiveSession {
    pub session_id: String,
    pub started_at: Instant,
}

/// Everything tracked about one connected client.
#[derive(Debug, Clone)]
pub struct Session {
    pub connected_at: Instant,
    pub frames_processed: u64,
    pub mode: Mode,
    pub client_info: ClientInfo,
    pub active: Option<ActiveSession>,
}

impl Session {
    pub fn new(client_info: ClientInfo) -> Self {
        Self {
            connected_at: Instant::now(),
            frames_processed: 0,
            mode: Mode::default(),
            client_info,
            active: None,
        }
    }
}

static SESSION_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Generate a recording-session identifier.
///
/// Wall-clock seconds plus a process-wide counter, so two sessions started
/// within the same second still get distinct ids.
pub fn next_session_id() -> String {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let n = SESSION_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("session_{secs}_{n}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_maps_known_modes() {
        assert_eq!(Mode::normalize("character"), Mode::Character);
        assert_eq!(Mode::normalize("CHAR"), Mode::Character);
        assert_eq!(Mode::normalize("word"), Mode::Word);
        assert_eq!(Mode::normalize("sentence"), Mode::Sentence);
    }

    #[test]
    fn normalize_falls_back_to_word() {
        assert_eq!(Mode::normalize("paragraph"), Mode::Word);
        assert_eq!(Mode::normalize(""), Mode::Word);
    }

    #[test]
    fn sentence_shares_word_window() {
        let stream = StreamConfig::default();
        assert_eq!(Mode::Sentence.window_size(&stream), Mode::Word.window_size(&stream));
        assert!(Mode::Character.window_size(&stream) < Mode::Word.window_size(&stream));
    }

    #[test]
    fn session_id_display() {
        assert_eq!(SessionId(7).to_string(), "client-7");
    }

    #[test]
    fn session_ids_are_unique() {
        let a = next_session_id();
        let b = next_session_id();
        assert_ne!(a, b);
        assert!(a.starts_with("session_"));
    }

    #[test]
    fn new_session_starts_in_word_mode_with_no_recording() {
        let session = Session::new(ClientInfo::default());
        assert_eq!(session.mode, Mode::Word);
        assert_eq!(session.frames_processed, 0);
        assert!(session.active.is_none());
    }
}
