//! Candle implementation of the exported BiLSTM-with-attention classifiers.
//!
//! Weight names follow the PyTorch export of the training code: `lstm.*`
//! for the recurrent stack, `attention.attn.*` for the attention scorer,
//! `bn_context.*` and `classifier.{0,2,4}.*` for the head. Both the word
//! and character model share this architecture and differ only in class
//! count and window size.

use crate::classify::classifier::{Classifier, Prediction};
use crate::classify::vocab::Vocabulary;
use crate::classify::window::Window;
use crate::config::{ModelConfig, StreamConfig};
use crate::defaults::{LANDMARK_DIM, LSTM_HIDDEN, LSTM_LAYERS};
use crate::error::{Result, SignstreamError};
use crate::session::Mode;

use candle_core::{D, DType, Device, Tensor};
use candle_nn::rnn::Direction;
use candle_nn::{
    BatchNorm, LSTM, LSTMConfig, Linear, Module, ModuleT, RNN, VarBuilder, batch_norm, linear,
    lstm,
};
use std::path::Path;
use tracing::info;

fn load_err(context: &str, e: candle_core::Error) -> SignstreamError {
    SignstreamError::ModelLoad {
        message: format!("{context}: {e}"),
    }
}

fn infer_err(context: &str, e: candle_core::Error) -> SignstreamError {
    SignstreamError::Inference {
        message: format!("{context}: {e}"),
    }
}

/// The network itself: stacked bidirectional LSTM, additive attention over
/// the sequence, batch-normalized context, two-layer classifier head.
struct BiLstmAttention {
    layers: Vec<(LSTM, LSTM)>,
    attention: Linear,
    bn_context: BatchNorm,
    fc_hidden: Linear,
    bn_hidden: BatchNorm,
    fc_out: Linear,
}

impl BiLstmAttention {
    fn load(vb: &VarBuilder, n_classes: usize) -> Result<Self> {
        let bidir = 2 * LSTM_HIDDEN;

        let mut layers = Vec::with_capacity(LSTM_LAYERS);
        for layer_idx in 0..LSTM_LAYERS {
            let in_dim = if layer_idx == 0 { LANDMARK_DIM } else { bidir };
            let forward = lstm(
                in_dim,
                LSTM_HIDDEN,
                LSTMConfig {
                    layer_idx,
                    ..Default::default()
                },
                vb.pp("lstm"),
            )
            .map_err(|e| load_err(&format!("lstm layer {layer_idx} forward"), e))?;
            let backward = lstm(
                in_dim,
                LSTM_HIDDEN,
                LSTMConfig {
                    layer_idx,
                    direction: Direction::Backward,
                    ..Default::default()
                },
                vb.pp("lstm"),
            )
            .map_err(|e| load_err(&format!("lstm layer {layer_idx} backward"), e))?;
            layers.push((forward, backward));
        }

        let attention = linear(bidir, 1, vb.pp("attention").pp("attn"))
            .map_err(|e| load_err("attention scorer", e))?;
        let bn_context = batch_norm(bidir, 1e-5, vb.pp("bn_context"))
            .map_err(|e| load_err("context batch norm", e))?;
        let fc_hidden = linear(bidir, LSTM_HIDDEN, vb.pp("classifier").pp("0"))
            .map_err(|e| load_err("classifier hidden layer", e))?;
        let bn_hidden = batch_norm(LSTM_HIDDEN, 1e-5, vb.pp("classifier").pp("2"))
            .map_err(|e| load_err("classifier batch norm", e))?;
        let fc_out = linear(LSTM_HIDDEN, n_classes, vb.pp("classifier").pp("4"))
            .map_err(|e| load_err("classifier output layer", e))?;

        Ok(Self {
            layers,
            attention,
            bn_context,
            fc_hidden,
            bn_hidden,
            fc_out,
        })
    }

    /// Run the network on a `(batch, seq, features)` input, producing raw
    /// class logits of shape `(batch, n_classes)`.
    fn forward(&self, input: &Tensor) -> candle_core::Result<Tensor> {
        let (_batch, seq_len, _features) = input.dims3()?;

        // Index tensor that reverses the time axis; candle's LSTM only runs
        // forward, so the backward direction sees a flipped sequence and its
        // output is flipped back before concatenation.
        let reversed: Vec<u32> = (0..seq_len as u32).rev().collect();
        let reversed = Tensor::from_vec(reversed, seq_len, input.device())?;

        let mut x = input.clone();
        for (forward, backward) in &self.layers {
            let fwd_out = forward.states_to_tensor(&forward.seq(&x)?)?;

            let flipped = x.index_select(&reversed, 1)?;
            let bwd_out = backward
                .states_to_tensor(&backward.seq(&flipped)?)?
                .index_select(&reversed, 1)?;

            x = Tensor::cat(&[&fwd_out, &bwd_out], D::Minus1)?;
        }
        let x = x.relu()?;

        // Additive attention: score each timestep, softmax over the
        // sequence, and collapse to a single context vector.
        let scores = self.attention.forward(&x)?.squeeze(D::Minus1)?;
        let weights = candle_nn::ops::softmax(&scores, D::Minus1)?;
        let context = x.broadcast_mul(&weights.unsqueeze(D::Minus1)?)?.sum(1)?;

        let context = self.bn_context.forward_t(&context, false)?;
        let hidden = self.fc_hidden.forward(&context)?.relu()?;
        let hidden = self.bn_hidden.forward_t(&hidden, false)?;
        self.fc_out.forward(&hidden)
    }
}

struct ModelSlot {
    model: BiLstmAttention,
    vocab: Vocabulary,
    window_frames: usize,
}

/// Loaded word and character models behind the [`Classifier`] trait.
pub struct BiLstmClassifier {
    word: ModelSlot,
    character: ModelSlot,
    device: Device,
}

impl BiLstmClassifier {
    /// Load both models from their configured safetensors files.
    pub fn load(model: &ModelConfig, stream: &StreamConfig, device: &Device) -> Result<Self> {
        let word_vocab = Vocabulary::word();
        let char_vocab = Vocabulary::character();

        let word = ModelSlot {
            model: Self::load_weights(&model.word_weights, word_vocab.len(), device)?,
            vocab: word_vocab,
            window_frames: stream.word_window_frames,
        };
        let character = ModelSlot {
            model: Self::load_weights(&model.char_weights, char_vocab.len(), device)?,
            vocab: char_vocab,
            window_frames: stream.char_window_frames,
        };

        info!(
            "loaded word model ({} classes) and character model ({} classes)",
            word.vocab.len(),
            character.vocab.len()
        );
        Ok(Self {
            word,
            character,
            device: device.clone(),
        })
    }

    fn load_weights(path: &Path, n_classes: usize, device: &Device) -> Result<BiLstmAttention> {
        if !path.exists() {
            return Err(SignstreamError::ModelNotFound {
                path: path.display().to_string(),
            });
        }
        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[path], DType::F32, device)
                .map_err(|e| load_err(&format!("read {}", path.display()), e))?
        };
        BiLstmAttention::load(&vb, n_classes)
    }

    fn slot(&self, mode: Mode) -> &ModelSlot {
        match mode {
            Mode::Character => &self.character,
            // Sentence mode reuses the word model over the word-size window.
            Mode::Word | Mode::Sentence => &self.word,
        }
    }

    fn window_to_tensor(&self, window: &Window) -> Result<Tensor> {
        let mut flat = Vec::with_capacity(window.len() * LANDMARK_DIM);
        for vector in window.vectors() {
            flat.extend_from_slice(vector.as_slice());
        }
        Tensor::from_vec(flat, (1, window.len(), LANDMARK_DIM), &self.device)
            .map_err(|e| infer_err("window tensor", e))
    }
}

impl Classifier for BiLstmClassifier {
    fn predict(&self, window: &Window, mode: Mode) -> Result<Prediction> {
        let slot = self.slot(mode);
        validate_window(window, slot.window_frames)?;

        let input = self.window_to_tensor(window)?;
        let logits = slot
            .model
            .forward(&input)
            .map_err(|e| infer_err("classifier forward", e))?;
        let probs = candle_nn::ops::softmax(&logits, D::Minus1)
            .map_err(|e| infer_err("softmax", e))?
            .squeeze(0)
            .map_err(|e| infer_err("squeeze batch", e))?;
        let probs: Vec<f32> = probs.to_vec1().map_err(|e| infer_err("read probs", e))?;

        let (best_idx, best_prob) = probs
            .iter()
            .copied()
            .enumerate()
            .fold((0usize, f32::MIN), |acc, (i, p)| {
                if p > acc.1 { (i, p) } else { acc }
            });

        let label = slot
            .vocab
            .label(best_idx)
            .ok_or_else(|| SignstreamError::Inference {
                message: format!("class index {best_idx} outside vocabulary"),
            })?;
        Ok(Prediction {
            label: label.to_string(),
            confidence: best_prob,
        })
    }

    fn is_ready(&self) -> bool {
        true
    }
}

/// Check a window against the geometry a model expects.
///
/// Window construction already guarantees this; a failure here is an internal
/// bug, not bad client input.
pub fn validate_window(window: &Window, expected_frames: usize) -> Result<()> {
    if window.len() != expected_frames {
        return Err(SignstreamError::ModelInputShape {
            expected: format!("{expected_frames} vectors of {LANDMARK_DIM}"),
            actual: format!("{} vectors", window.len()),
        });
    }
    for (i, vector) in window.vectors().iter().enumerate() {
        if vector.len() != LANDMARK_DIM {
            return Err(SignstreamError::ModelInputShape {
                expected: format!("{expected_frames} vectors of {LANDMARK_DIM}"),
                actual: format!("vector {i} has {} values", vector.len()),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmark::LandmarkVector;

    #[test]
    fn validate_window_accepts_exact_geometry() {
        let window = Window::from_sequence(vec![LandmarkVector::zeros(); 10], 10);
        assert!(validate_window(&window, 10).is_ok());
    }

    #[test]
    fn validate_window_rejects_wrong_length() {
        let window = Window::from_sequence(Vec::new(), 5);
        let err = validate_window(&window, 8).unwrap_err();
        assert!(matches!(err, SignstreamError::ModelInputShape { .. }));
    }

    #[test]
    fn missing_weights_yield_model_not_found() {
        let model = ModelConfig {
            word_weights: "/nonexistent/word.safetensors".into(),
            char_weights: "/nonexistent/char.safetensors".into(),
            hand_weights: "/nonexistent/hand.safetensors".into(),
        };
        let err = BiLstmClassifier::load(&model, &StreamConfig::default(), &Device::Cpu)
            .err()
            .unwrap();
        assert!(matches!(err, SignstreamError::ModelNotFound { .. }));
    }
}
