// ============================================================
// Layer 4 — Corpus Encoding
// ============================================================
// Flattens sentences into the single id stream the batcher cuts:
//
//   <s> w1 w2 ... wn </s> <s> w1 ... </s> ...
//
// Every sentence boundary is visible to the model, so it learns
// to predict </s> and can be started from <s> when generating.

use anyhow::Result;

use crate::domain::traits::Vocabulary;

/// Encode `sentences` into one id stream, wrapping each sentence
/// in the vocabulary's begin/end markers.
pub fn encode_corpus<V: Vocabulary + ?Sized>(vocab: &V, sentences: &[Vec<String>]) -> Result<Vec<u32>> {
    let mut ids = Vec::with_capacity(sentences.iter().map(|s| s.len() + 2).sum());
    for sentence in sentences {
        ids.push(vocab.bos_id());
        ids.extend(vocab.encode_words(sentence)?);
        ids.push(vocab.eos_id());
    }
    tracing::debug!("Encoded {} sentences into {} ids", sentences.len(), ids.len());
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Vocabulary of single lowercase letters: a=3, b=4, ... ; anything else is <unk>.
    struct LetterVocab;

    impl Vocabulary for LetterVocab {
        fn size(&self) -> usize { 29 }
        fn bos_id(&self) -> u32 { 0 }
        fn eos_id(&self) -> u32 { 1 }

        fn encode_words(&self, words: &[String]) -> Result<Vec<u32>> {
            Ok(words
                .iter()
                .map(|w| match w.as_bytes() {
                    [c @ b'a'..=b'z'] => (c - b'a') as u32 + 3,
                    _ => 2,
                })
                .collect())
        }

        fn decode(&self, _ids: &[u32]) -> Result<String> {
            Ok(String::new())
        }
    }

    fn sentence(words: &[&str]) -> Vec<String> {
        words.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_each_sentence_is_wrapped() {
        let ids = encode_corpus(&LetterVocab, &[sentence(&["a", "b"]), sentence(&["c"])]).unwrap();
        assert_eq!(ids, vec![0, 3, 4, 1, 0, 5, 1]);
    }

    #[test]
    fn test_unknown_words_map_to_unk() {
        let ids = encode_corpus(&LetterVocab, &[sentence(&["zebra"])]).unwrap();
        assert_eq!(ids, vec![0, 2, 1]);
    }

    #[test]
    fn test_empty_corpus_is_empty_stream() {
        assert!(encode_corpus(&LetterVocab, &[]).unwrap().is_empty());
    }
}
