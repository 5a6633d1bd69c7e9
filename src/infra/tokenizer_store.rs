// ============================================================
// Layer 6 — Tokenizer Store
// ============================================================
// Builds, saves, and loads the word-level vocabulary.
//
// The vocabulary is persisted as a HuggingFace tokenizer.json
// (WordLevel model, WhitespaceSplit pre-tokenizer) so that the
// same word→id table is used by training, evaluation, and
// generation.
//
// Id layout:
//   0  <s>     sentence start
//   1  </s>    sentence end
//   2  <unk>   any word outside the vocabulary
//   3… words by descending corpus frequency, ties alphabetical
//
// Low ids are the frequent words, which is the ordering the
// log-uniform candidate sampler assumes.
//
// The JSON is written by hand and loaded back with
// Tokenizer::from_file; tokenizers 0.15 trainers cannot produce
// a ModelWrapper-typed WordLevel model directly.

use anyhow::{Context, Result};
use std::{collections::HashMap, fs, path::PathBuf};
use tokenizers::Tokenizer;

use crate::domain::traits::Vocabulary;

pub const BOS_TOKEN: &str = "<s>";
pub const EOS_TOKEN: &str = "</s>";
pub const UNK_TOKEN: &str = "<unk>";

const SPECIAL_TOKENS: [&str; 3] = [BOS_TOKEN, EOS_TOKEN, UNK_TOKEN];
const TOKENIZER_FILE: &str = "tokenizer.json";

// ─── WordVocab ────────────────────────────────────────────────────────────────
/// A loaded word-level tokenizer with the special ids resolved.
pub struct WordVocab {
    tokenizer: Tokenizer,
    bos_id:    u32,
    eos_id:    u32,
    unk_id:    u32,
}

impl WordVocab {
    pub fn from_tokenizer(tokenizer: Tokenizer) -> Result<Self> {
        let id = |token: &str| {
            tokenizer
                .token_to_id(token)
                .with_context(|| format!("Tokenizer has no '{token}' token"))
        };
        let (bos_id, eos_id, unk_id) = (id(BOS_TOKEN)?, id(EOS_TOKEN)?, id(UNK_TOKEN)?);
        Ok(Self { tokenizer, bos_id, eos_id, unk_id })
    }

    #[cfg(test)]
    pub fn unk_id(&self) -> u32 {
        self.unk_id
    }
}

impl Vocabulary for WordVocab {
    fn size(&self) -> usize {
        self.tokenizer.get_vocab_size(false)
    }

    fn bos_id(&self) -> u32 {
        self.bos_id
    }

    fn eos_id(&self) -> u32 {
        self.eos_id
    }

    fn encode_words(&self, words: &[String]) -> Result<Vec<u32>> {
        Ok(words
            .iter()
            .map(|w| self.tokenizer.token_to_id(w).unwrap_or(self.unk_id))
            .collect())
    }

    /// Sentence markers are dropped from the decoded text.
    fn decode(&self, ids: &[u32]) -> Result<String> {
        let words: Vec<String> = ids
            .iter()
            .filter(|&&id| id != self.bos_id && id != self.eos_id)
            .map(|&id| {
                self.tokenizer
                    .id_to_token(id)
                    .with_context(|| format!("Id {id} is outside the vocabulary"))
            })
            .collect::<Result<_>>()?;
        Ok(words.join(" "))
    }
}

// ─── TokenizerStore ───────────────────────────────────────────────────────────
pub struct TokenizerStore {
    dir: PathBuf,
}

impl TokenizerStore {
    pub fn new(dir: impl Into<String>) -> Self {
        Self { dir: PathBuf::from(dir.into()) }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(TOKENIZER_FILE)
    }

    /// Load an existing vocabulary, or build one from `sentences`.
    pub fn load_or_build(&self, sentences: &[Vec<String>], vocab_size: usize) -> Result<WordVocab> {
        if self.path().exists() {
            tracing::info!("Loading existing tokenizer from '{}'", self.path().display());
            self.load()
        } else {
            tracing::info!("Building new tokenizer (vocab_size={})", vocab_size);
            self.build_and_save(sentences, vocab_size)
        }
    }

    pub fn load(&self) -> Result<WordVocab> {
        let path = self.path();
        let tokenizer = Tokenizer::from_file(&path)
            .map_err(|e| anyhow::anyhow!("Cannot load tokenizer from '{}': {}", path.display(), e))?;
        WordVocab::from_tokenizer(tokenizer)
    }

    fn build_and_save(&self, sentences: &[Vec<String>], vocab_size: usize) -> Result<WordVocab> {
        anyhow::ensure!(
            vocab_size > SPECIAL_TOKENS.len(),
            "vocab_size must leave room for words beyond {} special tokens, got {}",
            SPECIAL_TOKENS.len(),
            vocab_size
        );
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create '{}'", self.dir.display()))?;

        let words = most_frequent_words(sentences, vocab_size - SPECIAL_TOKENS.len());

        let mut vocab = serde_json::Map::new();
        for (id, token) in SPECIAL_TOKENS.iter().copied().chain(words.iter().map(String::as_str)).enumerate() {
            vocab.insert(token.to_string(), serde_json::json!(id));
        }

        let added_tokens: Vec<serde_json::Value> = SPECIAL_TOKENS
            .iter()
            .enumerate()
            .map(|(id, token)| serde_json::json!({
                "id": id,
                "content": token,
                "single_word": true,
                "lstrip": false,
                "rstrip": false,
                "normalized": false,
                "special": true
            }))
            .collect();

        let tokenizer_json = serde_json::json!({
            "version": "1.0",
            "truncation": null,
            "padding": null,
            "added_tokens": added_tokens,
            "normalizer": null,
            "pre_tokenizer": { "type": "WhitespaceSplit" },
            "post_processor": null,
            "decoder": null,
            "model": {
                "type": "WordLevel",
                "vocab": vocab,
                "unk_token": UNK_TOKEN
            }
        });

        let path = self.path();
        fs::write(&path, serde_json::to_string_pretty(&tokenizer_json)?)
            .with_context(|| format!("Cannot write tokenizer to '{}'", path.display()))?;

        tracing::info!(
            "Tokenizer built with {} entries, saved to '{}'",
            words.len() + SPECIAL_TOKENS.len(),
            path.display()
        );
        self.load()
    }
}

/// The `limit` most frequent words, by descending count then alphabetically.
/// Special tokens appearing in the corpus are not counted as words.
pub fn most_frequent_words(sentences: &[Vec<String>], limit: usize) -> Vec<String> {
    let mut freq: HashMap<&str, usize> = HashMap::new();
    for word in sentences.iter().flatten() {
        if !SPECIAL_TOKENS.contains(&word.as_str()) {
            *freq.entry(word.as_str()).or_insert(0) += 1;
        }
    }

    let mut words: Vec<(&str, usize)> = freq.into_iter().collect();
    words.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    words.truncate(limit);
    words.into_iter().map(|(w, _)| w.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> Vec<Vec<String>> {
        ["the cat sat", "the dog sat", "a cat ran the race"]
            .iter()
            .map(|s| s.split(' ').map(str::to_string).collect())
            .collect()
    }

    fn scratch_store(name: &str) -> TokenizerStore {
        let dir = std::env::temp_dir().join(format!("rnnlm_tok_{}_{}", name, std::process::id()));
        fs::remove_dir_all(&dir).ok();
        TokenizerStore::new(dir.to_string_lossy())
    }

    #[test]
    fn test_frequency_order_with_alphabetical_ties() {
        let words = most_frequent_words(&corpus(), 4);
        // the=3, cat=2, sat=2, then a/dog/race/ran with 1
        assert_eq!(words, vec!["the", "cat", "sat", "a"]);
    }

    #[test]
    fn test_build_assigns_special_ids_first() {
        let store = scratch_store("ids");
        let vocab = store.load_or_build(&corpus(), 6).unwrap();

        assert_eq!(vocab.size(), 6);
        assert_eq!(vocab.bos_id(), 0);
        assert_eq!(vocab.eos_id(), 1);
        assert_eq!(vocab.unk_id(), 2);

        let words: Vec<String> = ["the", "cat", "zebra"].iter().map(|s| s.to_string()).collect();
        assert_eq!(vocab.encode_words(&words).unwrap(), vec![3, 4, 2]);
        fs::remove_dir_all(&store.dir).ok();
    }

    #[test]
    fn test_decode_drops_sentence_markers() {
        let store = scratch_store("decode");
        let vocab = store.load_or_build(&corpus(), 10).unwrap();
        assert_eq!(vocab.decode(&[0, 3, 4, 2, 1]).unwrap(), "the cat <unk>");
        assert!(vocab.decode(&[99]).is_err());
        fs::remove_dir_all(&store.dir).ok();
    }

    #[test]
    fn test_existing_file_is_reused() {
        let store = scratch_store("reuse");
        store.load_or_build(&corpus(), 5).unwrap();
        // A different corpus and size are ignored once the file exists
        let again = store.load_or_build(&[], 1000).unwrap();
        assert_eq!(again.size(), 5);
        fs::remove_dir_all(&store.dir).ok();
    }

    #[test]
    fn test_too_small_vocab_is_rejected() {
        let store = scratch_store("small");
        assert!(store.load_or_build(&corpus(), 3).is_err());
    }
}
