// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The application and data layers depend on these traits, not
// on the concrete loader or tokenizer:
//
//   DocumentSource — where raw text comes from
//                    (TextLoader reads a directory of .txt files)
//
//   Vocabulary     — how canonical words map to token ids
//                    (WordVocab wraps a HuggingFace WordLevel
//                     tokenizer persisted as tokenizer.json)
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use anyhow::Result;
use crate::domain::document::Document;

// ─── DocumentSource ───────────────────────────────────────────────────────────
/// Any component that can load documents from a source.
pub trait DocumentSource {
    /// Load all available documents from this source.
    fn load_all(&self) -> Result<Vec<Document>>;
}

// ─── Vocabulary ───────────────────────────────────────────────────────────────
/// Word ↔ id mapping with sentence boundary markers.
pub trait Vocabulary {
    /// Number of ids, V. Every id produced is in [0, V).
    fn size(&self) -> usize;

    /// Id of the start-of-sentence marker `<s>`.
    fn bos_id(&self) -> u32;

    /// Id of the end-of-sentence marker `</s>`.
    fn eos_id(&self) -> u32;

    /// Map canonical words to ids; unknown words map to `<unk>`.
    fn encode_words(&self, words: &[String]) -> Result<Vec<u32>>;

    /// Map ids back to space-separated words.
    fn decode(&self, ids: &[u32]) -> Result<String>;
}
