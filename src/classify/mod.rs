//! Sequence classification: vocabularies, fixed-size windows, and the
//! BiLSTM-with-attention models behind them.

pub mod bilstm;
pub mod classifier;
pub mod vocab;
pub mod window;

pub use bilstm::BiLstmClassifier;
pub use classifier::{Classifier, MockClassifier, Prediction};
pub use vocab::Vocabulary;
pub use window::Window;
