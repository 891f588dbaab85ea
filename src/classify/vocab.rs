//! Output vocabularies for the sequence classifiers.
//!
//! Label order is the training-time class order of the exported weights and
//! must never be re-sorted or deduplicated.

/// Character-level vocabulary: Vietnamese letters plus the diacritic-entry
/// strokes used by the fingerspelling alphabet.
pub const CHARACTERS: [&str; 34] = [
    "a", "ă", "â", "b", "c", "d", "đ", "e", "ê", "g", "h", "i", "k", "l", "m", "n", "o", "ô",
    "ơ", "p", "q", "r", "s", "t", "u", "ư", "v", "x", "y", "/", "\\", "?", "~", ".",
];

/// Word-level vocabulary entries appended after the characters.
pub const WORDS: [&str; 16] = [
    "xin chào",
    "tạm biệt",
    "cảm ơn",
    "xin lỗi",
    "ở đâu",
    "ai",
    "khi nào",
    "tại sao",
    "làm ơn",
    "giúp đỡ",
    "ghét",
    "hạnh phúc",
    "biết ơn",
    "buồn",
    "mệt",
    "khát",
];

/// An ordered label set mapping class indices to output strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabulary {
    labels: Vec<&'static str>,
}

impl Vocabulary {
    /// The character model's vocabulary: characters only.
    pub fn character() -> Self {
        Self {
            labels: CHARACTERS.to_vec(),
        }
    }

    /// The word model's vocabulary: characters followed by words, matching
    /// the combined class list the word model was trained on.
    pub fn word() -> Self {
        let mut labels = CHARACTERS.to_vec();
        labels.extend_from_slice(&WORDS);
        Self { labels }
    }

    /// Label for a class index.
    pub fn label(&self, index: usize) -> Option<&'static str> {
        self.labels.get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn contains(&self, label: &str) -> bool {
        self.labels.contains(&label)
    }
}
