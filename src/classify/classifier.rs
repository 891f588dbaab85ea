//! Classification trait and mock implementation.

use crate::classify::window::Window;
use crate::error::{Result, SignstreamError};
use crate::session::Mode;

use std::sync::{Arc, Mutex};

/// One classification result: the predicted label and the model's confidence
/// (the winning class's softmax probability, in `[0, 1]`).
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub label: String,
    pub confidence: f32,
}

/// Trait for window classification.
///
/// This trait allows swapping implementations (real models vs mock).
pub trait Classifier: Send + Sync {
    /// Classify a window under the given analysis mode.
    fn predict(&self, window: &Window, mode: Mode) -> Result<Prediction>;

    /// Check if the classifier is ready
    fn is_ready(&self) -> bool;
}

impl<T: Classifier + ?Sized> Classifier for Arc<T> {
    fn predict(&self, window: &Window, mode: Mode) -> Result<Prediction> {
        (**self).predict(window, mode)
    }

    fn is_ready(&self) -> bool {
        (**self).is_ready()
    }
}

/// Mock classifier for testing
#[derive(Debug)]
pub struct MockClassifier {
    prediction: Prediction,
    should_fail: bool,
    calls: Mutex<Vec<(usize, Mode)>>,
}

impl Default for MockClassifier {
    fn default() -> Self {
        Self {
            prediction: Prediction {
                label: "xin chào".to_string(),
                confidence: 0.9,
            },
            should_fail: false,
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl MockClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a specific prediction to return
    pub fn with_prediction(mut self, label: impl Into<String>, confidence: f32) -> Self {
        self.prediction = Prediction {
            label: label.into(),
            confidence,
        };
        self
    }

    /// Configure the mock to fail on predict
    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }

    /// Window lengths and modes this mock has been asked to classify.
    pub fn calls(&self) -> Vec<(usize, Mode)> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

impl Classifier for MockClassifier {
    fn predict(&self, window: &Window, mode: Mode) -> Result<Prediction> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((window.len(), mode));
        }
        if self.should_fail {
            return Err(SignstreamError::Inference {
                message: "mock classification failure".to_string(),
            });
        }
        Ok(self.prediction.clone())
    }

    fn is_ready(&self) -> bool {
        !self.should_fail
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(len: usize) -> Window {
        Window::from_sequence(Vec::new(), len)
    }

    #[test]
    fn mock_returns_configured_prediction() {
        let classifier = MockClassifier::new().with_prediction("mệt", 0.42);
        let p = classifier.predict(&window(5), Mode::Word).unwrap();
        assert_eq!(p.label, "mệt");
        assert!((p.confidence - 0.42).abs() < f32::EPSILON);
    }

    #[test]
    fn mock_records_calls() {
        let classifier = MockClassifier::new();
        classifier.predict(&window(3), Mode::Character).unwrap();
        classifier.predict(&window(7), Mode::Word).unwrap();
        assert_eq!(
            classifier.calls(),
            vec![(3, Mode::Character), (7, Mode::Word)]
        );
    }

    #[test]
    fn mock_failure() {
        let classifier = MockClassifier::new().with_failure();
        assert!(classifier.predict(&window(1), Mode::Word).is_err());
        assert!(!classifier.is_ready());
    }

    #[test]
    fn arc_classifier_delegates() {
        let classifier = Arc::new(MockClassifier::new());
        assert!(classifier.predict(&window(2), Mode::Word).is_ok());
        assert!(classifier.is_ready());
    }
}
