// ============================================================
// Layer 3 — Document Domain Type
// ============================================================
// A single text file of the training corpus: where it came
// from and its raw contents, before cleaning or tokenisation.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// File name, kept so log lines can say which file a problem came from
    pub source: String,

    /// The full raw text
    pub text: String,
}

impl Document {
    pub fn new(source: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            text:   text.into(),
        }
    }

    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}
