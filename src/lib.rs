//! signstream - Real-time sign language recognition service
//!
//! Streams camera frames in, translated Vietnamese text out; whole clips
//! can also be translated in one shot.

// Enforce error handling discipline
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod batch;
pub mod classify;
pub mod config;
pub mod defaults;
pub mod error;
pub mod gateway;
pub mod landmark;
pub mod session;
pub mod streaming;
pub mod video;

// Core traits (frame → landmarks → prediction)
pub use classify::{Classifier, Prediction, Window};
pub use landmark::{HandDetector, LandmarkExtractor, LandmarkVector};
pub use video::{ClipDecoder, Frame};

// Services
pub use batch::{BatchTranslationService, TranslateRequest, TranslationResponse};
pub use gateway::Gateway;
pub use streaming::StreamingSessionManager;

// Error handling
pub use error::{Result, SignstreamError};

// Config
pub use config::Config;

/// Build version string with optional git commit hash.
///
/// Returns `"0.1.0+abc1234"` when git hash is available, `"0.1.0"` otherwise.
pub fn version_string() -> String {
    let version = env!("CARGO_PKG_VERSION");
    match option_env!("GIT_HASH") {
        Some(hash) if !hash.is_empty() => format!("{}+{}", version, hash),
        _ => version.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_string_starts_with_cargo_version() {
        let ver = version_string();
        assert!(
            ver.starts_with(env!("CARGO_PKG_VERSION")),
            "version_string should start with CARGO_PKG_VERSION, got: {}",
            ver
        );
    }
}
