//! Fixed-size windows of landmark vectors, the classifier's only input.

use crate::landmark::LandmarkVector;

/// Exactly `size` landmark vectors in stream order.
///
/// Windows are the unit of inference. They are only ever built here, so a
/// `Window` in hand always has its full length.
#[derive(Debug, Clone, PartialEq)]
pub struct Window {
    vectors: Vec<LandmarkVector>,
}

impl Window {
    /// Build a window from an arbitrary-length sequence.
    ///
    /// Longer sequences keep their first `size` vectors; shorter ones are
    /// padded at the tail with zero vectors, the same "no hands" signal the
    /// models saw in training.
    pub fn from_sequence(mut vectors: Vec<LandmarkVector>, size: usize) -> Self {
        vectors.truncate(size);
        vectors.resize_with(size, LandmarkVector::zeros);
        Self { vectors }
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    pub fn vectors(&self) -> &[LandmarkVector] {
        &self.vectors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmark::Handedness;

    fn marked_vector(fill: f32) -> LandmarkVector {
        let mut v = LandmarkVector::zeros();
        v.set_hand(Handedness::Left, &vec![[fill; 3]; 21]);
        v
    }

    #[test]
    fn exact_length_sequence_is_kept_as_is() {
        let vectors = vec![marked_vector(0.1), marked_vector(0.2)];
        let window = Window::from_sequence(vectors.clone(), 2);
        assert_eq!(window.vectors(), &vectors[..]);
    }

    #[test]
    fn short_sequence_is_zero_padded_at_the_tail() {
        let window = Window::from_sequence(vec![marked_vector(0.3)], 4);
        assert_eq!(window.len(), 4);
        assert!(!window.vectors()[0].is_zero());
        assert!(window.vectors()[1].is_zero());
        assert!(window.vectors()[3].is_zero());
    }

    #[test]
    fn long_sequence_keeps_its_head() {
        let vectors = vec![marked_vector(0.1), marked_vector(0.2), marked_vector(0.3)];
        let window = Window::from_sequence(vectors, 2);
        assert_eq!(window.len(), 2);
        assert!(!window.vectors()[0].is_zero());
    }

    #[test]
    fn empty_sequence_becomes_all_zero_window() {
        let window = Window::from_sequence(Vec::new(), 3);
        assert_eq!(window.len(), 3);
        assert!(window.vectors().iter().all(|v| v.is_zero()));
    }
}
