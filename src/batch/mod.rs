//! One-shot clip translation: a whole video in, one prediction out.

use crate::classify::{Classifier, Window};
use crate::config::StreamConfig;
use crate::defaults::{ACCEPTED_CLIP_EXTENSIONS, ASSUMED_CLIP_FPS};
use crate::error::{Result, SignstreamError};
use crate::landmark::LandmarkExtractor;
use crate::session::Mode;
use crate::video::ClipDecoder;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// A one-shot translation request: exactly one video source plus an
/// optional analysis mode.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TranslateRequest {
    /// Base64-encoded clip bytes.
    pub video_data: Option<String>,
    /// URL to fetch the clip from instead.
    pub video_url: Option<String>,
    pub mode: Option<String>,
}

/// One recognized item in a translation response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationEntry {
    pub text: String,
    pub confidence: f32,
}

/// One entry in the supported-modes listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeInfo {
    pub id: String,
    pub name: String,
    pub description: String,
}

/// Result of translating one clip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationResponse {
    pub results: Vec<TranslationEntry>,
    pub analysis_mode: String,
    /// Wall-clock seconds spent serving the request.
    pub processing_time: f64,
    /// Estimated clip length in seconds, from its decoded frame count.
    pub video_duration: f64,
}

/// Translates whole clips through the same extraction and classification
/// stack the live stream uses.
pub struct BatchTranslationService {
    extractor: LandmarkExtractor,
    classifier: Arc<dyn Classifier>,
    decoder: Arc<dyn ClipDecoder>,
    http: reqwest::Client,
    stream: StreamConfig,
}

impl BatchTranslationService {
    pub fn new(
        extractor: LandmarkExtractor,
        classifier: Arc<dyn Classifier>,
        decoder: Arc<dyn ClipDecoder>,
        stream: StreamConfig,
    ) -> Self {
        Self {
            extractor,
            classifier,
            decoder,
            http: reqwest::Client::new(),
            stream,
        }
    }

    /// Translate a clip supplied inline or by URL.
    pub async fn translate(&self, request: TranslateRequest) -> Result<TranslationResponse> {
        let started = Instant::now();
        let mode = Mode::normalize(request.mode.as_deref().unwrap_or_default());

        let bytes = if let Some(encoded) = request.video_data.as_deref() {
            BASE64
                .decode(encoded.trim())
                .map_err(|e| SignstreamError::InvalidInput {
                    message: format!("video_data is not valid base64: {e}"),
                })?
        } else if let Some(url) = request.video_url.as_deref() {
            self.fetch_clip(url).await?
        } else {
            return Err(SignstreamError::InvalidInput {
                message: "video_data or video_url is required".to_string(),
            });
        };

        self.translate_clip_bytes(&bytes, ".mp4", mode, started).await
    }

    /// Translate an uploaded clip file.
    ///
    /// The filename's extension is checked against the accepted container
    /// list before any bytes are decoded.
    pub async fn translate_upload(
        &self,
        filename: &str,
        data: &str,
        mode: Option<&str>,
    ) -> Result<TranslationResponse> {
        let started = Instant::now();

        let extension = Path::new(filename)
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        if !ACCEPTED_CLIP_EXTENSIONS.contains(&extension.as_str()) {
            return Err(SignstreamError::UnsupportedFormat {
                extension: if extension.is_empty() {
                    "(none)".to_string()
                } else {
                    extension
                },
            });
        }

        let bytes = BASE64
            .decode(data.trim())
            .map_err(|e| SignstreamError::InvalidInput {
                message: format!("uploaded clip is not valid base64: {e}"),
            })?;

        let suffix = format!(".{extension}");
        let mode = Mode::normalize(mode.unwrap_or_default());
        self.translate_clip_bytes(&bytes, &suffix, mode, started).await
    }

    /// The analysis modes a client may request.
    pub fn list_modes(&self) -> Vec<ModeInfo> {
        vec![
            ModeInfo {
                id: "character".to_string(),
                name: "Character".to_string(),
                description: "Fingerspelled characters, one per window".to_string(),
            },
            ModeInfo {
                id: "word".to_string(),
                name: "Word".to_string(),
                description: "Whole-word signs from the word vocabulary".to_string(),
            },
        ]
    }

    async fn fetch_clip(&self, url: &str) -> Result<Vec<u8>> {
        debug!("fetching clip from {url}");
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| SignstreamError::InvalidInput {
                message: format!("failed to fetch video_url: {e}"),
            })?;
        if !response.status().is_success() {
            return Err(SignstreamError::InvalidInput {
                message: format!("video_url returned status {}", response.status()),
            });
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| SignstreamError::TransientProcessing {
                message: format!("failed to read clip body: {e}"),
            })?;
        Ok(bytes.to_vec())
    }

    async fn translate_clip_bytes(
        &self,
        bytes: &[u8],
        suffix: &str,
        mode: Mode,
        started: Instant,
    ) -> Result<TranslationResponse> {
        // The decoder works on files; the scratch file is removed on drop
        // whether or not decoding succeeds.
        let mut scratch = tempfile::Builder::new()
            .prefix("signstream-clip-")
            .suffix(suffix)
            .tempfile()?;
        scratch.write_all(bytes)?;
        scratch.flush()?;

        let frames = self.decoder.decode(scratch.path()).await?;
        if frames.is_empty() {
            return Err(SignstreamError::InvalidInput {
                message: "no frames could be decoded from the clip".to_string(),
            });
        }

        let video_duration = frames.len() as f64 / ASSUMED_CLIP_FPS;
        let window_size = mode.window_size(&self.stream);

        let extractor = self.extractor.clone();
        let classifier = self.classifier.clone();
        let prediction = tokio::task::spawn_blocking(move || {
            let vectors = frames.iter().map(|f| extractor.extract(f)).collect();
            let window = Window::from_sequence(vectors, window_size);
            classifier.predict(&window, mode)
        })
        .await
        .map_err(|e| SignstreamError::TransientProcessing {
            message: format!("translation task failed: {e}"),
        })??;

        info!(
            "translated clip: {} ({:.2} confidence, {mode} mode)",
            prediction.label, prediction.confidence
        );
        Ok(TranslationResponse {
            results: vec![TranslationEntry {
                text: prediction.label,
                confidence: prediction.confidence,
            }],
            analysis_mode: mode.as_str().to_string(),
            processing_time: started.elapsed().as_secs_f64(),
            video_duration,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::MockClassifier;
    use crate::landmark::MockHandDetector;
    use crate::video::MockClipDecoder;

    fn test_stream_config() -> StreamConfig {
        StreamConfig {
            word_window_frames: 4,
            char_window_frames: 2,
            ..StreamConfig::default()
        }
    }

    fn service(
        classifier: MockClassifier,
        decoder: MockClipDecoder,
    ) -> (BatchTranslationService, Arc<MockClassifier>, Arc<MockClipDecoder>) {
        let classifier = Arc::new(classifier);
        let decoder = Arc::new(decoder);
        let service = BatchTranslationService::new(
            LandmarkExtractor::new(Arc::new(MockHandDetector::new())),
            classifier.clone(),
            decoder.clone(),
            test_stream_config(),
        );
        (service, classifier, decoder)
    }

    #[tokio::test]
    async fn missing_video_source_is_invalid_input() {
        let (service, _, decoder) = service(MockClassifier::new(), MockClipDecoder::new());
        let err = service.translate(TranslateRequest::default()).await.unwrap_err();
        assert!(matches!(err, SignstreamError::InvalidInput { .. }));
        assert!(decoder.calls().is_empty());
    }

    #[tokio::test]
    async fn invalid_base64_is_invalid_input() {
        let (service, _, _) = service(MockClassifier::new(), MockClipDecoder::new());
        let err = service
            .translate(TranslateRequest {
                video_data: Some("@@not-base64@@".to_string()),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, SignstreamError::InvalidInput { .. }));
    }

    #[tokio::test]
    async fn empty_clip_is_invalid_input() {
        let (service, _, _) =
            service(MockClassifier::new(), MockClipDecoder::new().with_frame_count(0));
        let err = service
            .translate(TranslateRequest {
                video_data: Some(BASE64.encode(b"clip-bytes")),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, SignstreamError::InvalidInput { .. }));
    }

    #[tokio::test]
    async fn short_clip_is_padded_to_the_full_window() {
        let (service, classifier, _) = service(
            MockClassifier::new().with_prediction("xin chào", 0.9),
            MockClipDecoder::new().with_frame_count(2),
        );

        let response = service
            .translate(TranslateRequest {
                video_data: Some(BASE64.encode(b"clip-bytes")),
                ..Default::default()
            })
            .await
            .unwrap();

        // The classifier always sees the full word window, zero-padded.
        assert_eq!(classifier.calls(), vec![(4, Mode::Word)]);
        assert_eq!(response.results.len(), 1);
        assert_eq!(response.results[0].text, "xin chào");
        assert_eq!(response.analysis_mode, "word");
        assert!((response.video_duration - 2.0 / 60.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn mode_selects_the_character_window() {
        let (service, classifier, _) = service(
            MockClassifier::new(),
            MockClipDecoder::new().with_frame_count(5),
        );

        service
            .translate(TranslateRequest {
                video_data: Some(BASE64.encode(b"clip-bytes")),
                mode: Some("character".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(classifier.calls(), vec![(2, Mode::Character)]);
    }

    #[tokio::test]
    async fn upload_rejects_unsupported_extension_before_decoding() {
        let (service, _, decoder) = service(MockClassifier::new(), MockClipDecoder::new());
        let err = service
            .translate_upload("clip.avi", &BASE64.encode(b"clip-bytes"), None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SignstreamError::UnsupportedFormat { ref extension } if extension.as_str() == "avi"
        ));
        assert!(decoder.calls().is_empty());
    }

    #[tokio::test]
    async fn upload_accepts_whitelisted_extensions() {
        let (service, _, decoder) = service(
            MockClassifier::new(),
            MockClipDecoder::new().with_frame_count(1),
        );
        let response = service
            .translate_upload("Clip.MP4", &BASE64.encode(b"clip-bytes"), Some("word"))
            .await
            .unwrap();
        assert_eq!(response.results.len(), 1);
        assert_eq!(decoder.calls().len(), 1);
    }

    #[tokio::test]
    async fn list_modes_matches_supported_models() {
        let (service, _, _) = service(MockClassifier::new(), MockClipDecoder::new());
        let ids: Vec<_> = service.list_modes().into_iter().map(|m| m.id).collect();
        assert_eq!(ids, vec!["character", "word"]);
    }
}
