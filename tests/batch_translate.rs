//! One-shot clip translation scenarios.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use signstream::batch::{BatchTranslationService, TranslateRequest};
use signstream::classify::MockClassifier;
use signstream::config::StreamConfig;
use signstream::error::SignstreamError;
use signstream::landmark::{LandmarkExtractor, MockHandDetector};
use signstream::session::Mode;
use signstream::video::MockClipDecoder;
use std::sync::Arc;

const WORD_WINDOW: usize = 6;
const CHAR_WINDOW: usize = 3;

fn service(
    classifier: MockClassifier,
    decoder: MockClipDecoder,
) -> (
    BatchTranslationService,
    Arc<MockClassifier>,
    Arc<MockClipDecoder>,
) {
    let classifier = Arc::new(classifier);
    let decoder = Arc::new(decoder);
    let service = BatchTranslationService::new(
        LandmarkExtractor::new(Arc::new(MockHandDetector::new())),
        classifier.clone(),
        decoder.clone(),
        StreamConfig {
            word_window_frames: WORD_WINDOW,
            char_window_frames: CHAR_WINDOW,
            ..StreamConfig::default()
        },
    );
    (service, classifier, decoder)
}

fn inline_request(mode: Option<&str>) -> TranslateRequest {
    TranslateRequest {
        video_data: Some(BASE64.encode(b"fake clip bytes")),
        video_url: None,
        mode: mode.map(str::to_string),
    }
}

#[tokio::test]
async fn inline_clip_translates_with_word_model_by_default() {
    let (service, classifier, _) = service(
        MockClassifier::new().with_prediction("hạnh phúc", 0.91),
        MockClipDecoder::new().with_frame_count(2),
    );

    let response = service.translate(inline_request(None)).await.unwrap();

    assert_eq!(response.results.len(), 1);
    assert_eq!(response.results[0].text, "hạnh phúc");
    assert_eq!(response.analysis_mode, "word");
    assert!(response.processing_time >= 0.0);
    // Duration comes from the decoded frame count at the assumed frame rate.
    assert!((response.video_duration - 2.0 / 60.0).abs() < 1e-9);
    // The classifier saw a full, zero-padded word window.
    assert_eq!(classifier.calls(), vec![(WORD_WINDOW, Mode::Word)]);
}

#[tokio::test]
async fn long_clip_is_truncated_to_the_window() {
    let (service, classifier, _) = service(
        MockClassifier::new(),
        MockClipDecoder::new().with_frame_count(WORD_WINDOW * 3),
    );

    service.translate(inline_request(None)).await.unwrap();
    assert_eq!(classifier.calls(), vec![(WORD_WINDOW, Mode::Word)]);
}

#[tokio::test]
async fn character_mode_uses_the_character_window() {
    let (service, classifier, _) = service(
        MockClassifier::new(),
        MockClipDecoder::new().with_frame_count(1),
    );

    let response = service.translate(inline_request(Some("character"))).await.unwrap();
    assert_eq!(response.analysis_mode, "character");
    assert_eq!(classifier.calls(), vec![(CHAR_WINDOW, Mode::Character)]);
}

#[tokio::test]
async fn unknown_mode_falls_back_to_word() {
    let (service, classifier, _) = service(
        MockClassifier::new(),
        MockClipDecoder::new().with_frame_count(1),
    );

    let response = service.translate(inline_request(Some("paragraph"))).await.unwrap();
    assert_eq!(response.analysis_mode, "word");
    assert_eq!(classifier.calls(), vec![(WORD_WINDOW, Mode::Word)]);
}

#[tokio::test]
async fn request_without_any_source_is_rejected_before_decoding() {
    let (service, _, decoder) = service(MockClassifier::new(), MockClipDecoder::new());

    let err = service
        .translate(TranslateRequest::default())
        .await
        .unwrap_err();
    assert!(matches!(err, SignstreamError::InvalidInput { .. }));
    assert!(err.is_client_error());
    assert!(decoder.calls().is_empty());
}

#[tokio::test]
async fn undecodable_clip_is_invalid_input() {
    let (service, _, _) = service(
        MockClassifier::new(),
        MockClipDecoder::new().with_frame_count(0),
    );

    let err = service.translate(inline_request(None)).await.unwrap_err();
    assert!(matches!(err, SignstreamError::InvalidInput { .. }));
}

#[tokio::test]
async fn upload_extension_gate_runs_before_the_decoder() {
    let (service, _, decoder) = service(MockClassifier::new(), MockClipDecoder::new());

    for filename in ["clip.avi", "clip.mkv", "clip", "clip.mp4.exe"] {
        let err = service
            .translate_upload(filename, &BASE64.encode(b"bytes"), None)
            .await
            .unwrap_err();
        assert!(
            matches!(err, SignstreamError::UnsupportedFormat { .. }),
            "{filename} should be rejected"
        );
        assert!(err.is_client_error());
    }
    assert!(decoder.calls().is_empty());
}

#[tokio::test]
async fn upload_accepts_every_whitelisted_container() {
    for filename in ["a.mp4", "b.webm", "c.mov", "D.MOV"] {
        let (service, _, decoder) = service(
            MockClassifier::new(),
            MockClipDecoder::new().with_frame_count(1),
        );
        service
            .translate_upload(filename, &BASE64.encode(b"bytes"), None)
            .await
            .unwrap();
        assert_eq!(decoder.calls().len(), 1, "{filename} should be decoded");
    }
}

#[tokio::test]
async fn classifier_failure_propagates() {
    let (service, _, _) = service(
        MockClassifier::new().with_failure(),
        MockClipDecoder::new().with_frame_count(1),
    );

    let err = service.translate(inline_request(None)).await.unwrap_err();
    assert!(matches!(err, SignstreamError::Inference { .. }));
    assert!(!err.is_client_error());
}
