//! Error types for signstream.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SignstreamError {
    // Configuration errors
    #[error("Configuration file not found at {path}")]
    ConfigFileNotFound { path: String },

    #[error("Invalid configuration value for {key}: {message}")]
    ConfigInvalidValue { key: String, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    // Client-facing request errors
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error(
        "Unsupported clip format: {extension} (accepted: {})",
        crate::defaults::ACCEPTED_CLIP_EXTENSIONS.join(", ")
    )]
    UnsupportedFormat { extension: String },

    // Internal contract violation: window geometry does not match the model.
    // Indicates a bug in window construction, never a user error.
    #[error("Model input shape mismatch: expected {expected}, got {actual}")]
    ModelInputShape { expected: String, actual: String },

    // Per-frame degradation
    #[error("Frame decode failed: {message}")]
    FrameDecode { message: String },

    #[error("Processing error: {message}")]
    TransientProcessing { message: String },

    #[error("Unknown session: {session_id}")]
    SessionNotFound { session_id: String },

    // Model loading / inference errors
    #[error("Model weights not found at {path}")]
    ModelNotFound { path: String },

    #[error("Model load failed: {message}")]
    ModelLoad { message: String },

    #[error("Inference failed: {message}")]
    Inference { message: String },

    // Gateway errors
    #[error("Gateway socket error: {message}")]
    GatewaySocket { message: String },

    #[error("Gateway protocol error: {message}")]
    GatewayProtocol { message: String },

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Generic error for cases not covered above
    #[error("{0}")]
    Other(String),
}

impl SignstreamError {
    /// Whether this error is the caller's fault (maps to a 400-class response).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            SignstreamError::InvalidInput { .. } | SignstreamError::UnsupportedFormat { .. }
        )
    }
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, SignstreamError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_invalid_input_display() {
        let error = SignstreamError::InvalidInput {
            message: "video_data or video_url is required".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Invalid input: video_data or video_url is required"
        );
    }

    #[test]
    fn test_unsupported_format_display() {
        let error = SignstreamError::UnsupportedFormat {
            extension: "avi".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Unsupported clip format: avi (accepted: mp4, webm, mov)"
        );
        for accepted in crate::defaults::ACCEPTED_CLIP_EXTENSIONS {
            assert!(error.to_string().contains(accepted));
        }
    }

    #[test]
    fn test_model_input_shape_display() {
        let error = SignstreamError::ModelInputShape {
            expected: "150 vectors of 126".to_string(),
            actual: "140 vectors of 126".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Model input shape mismatch: expected 150 vectors of 126, got 140 vectors of 126"
        );
    }

    #[test]
    fn test_frame_decode_display() {
        let error = SignstreamError::FrameDecode {
            message: "not a valid image".to_string(),
        };
        assert_eq!(error.to_string(), "Frame decode failed: not a valid image");
    }

    #[test]
    fn test_session_not_found_display() {
        let error = SignstreamError::SessionNotFound {
            session_id: "client-7".to_string(),
        };
        assert_eq!(error.to_string(), "Unknown session: client-7");
    }

    #[test]
    fn test_client_error_classification() {
        assert!(
            SignstreamError::InvalidInput {
                message: "empty clip".to_string()
            }
            .is_client_error()
        );
        assert!(
            SignstreamError::UnsupportedFormat {
                extension: "avi".to_string()
            }
            .is_client_error()
        );
        assert!(
            !SignstreamError::ModelInputShape {
                expected: "150".to_string(),
                actual: "75".to_string()
            }
            .is_client_error()
        );
        assert!(
            !SignstreamError::TransientProcessing {
                message: "timeout".to_string()
            }
            .is_client_error()
        );
    }

    #[test]
    fn test_from_io_error() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let error: SignstreamError = io_error.into();
        assert!(error.to_string().contains("file not found"));
    }

    #[test]
    fn test_from_toml_error() {
        let toml_str = "invalid = toml = syntax";
        let toml_error = toml::from_str::<toml::Value>(toml_str).unwrap_err();
        let error: SignstreamError = toml_error.into();
        assert!(error.to_string().contains("Configuration error"));
    }

    #[test]
    fn test_error_is_send_and_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<SignstreamError>();
        assert_sync::<SignstreamError>();
    }

    #[test]
    fn test_result_type_alias() {
        fn returns_result() -> Result<i32> {
            Ok(42)
        }
        assert_eq!(returns_result().unwrap(), 42);
    }
}
