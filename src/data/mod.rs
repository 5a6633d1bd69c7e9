// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything from raw .txt files to device-ready batches:
//
//   .txt files
//       │
//       ▼
//   TextLoader        → reads files into Documents
//       │
//       ▼
//   Preprocessor      → cleans text, splits canonical sentences
//       │
//       ▼
//   split_train_val   → seeded train/dev split of sentences
//       │
//       ▼
//   encode_corpus     → <s> … </s> wrapped id stream
//       │
//       ▼
//   BatchGenerator    → [batch, time] windows that continue rows
//       │
//       ▼
//   TensorBatch       → Int tensors on the training device
//
// Reference: Rust Book §13 (Iterators and Closures)

/// Loads .txt files from a directory
pub mod loader;

/// Cleans text and splits it into canonical sentences
pub mod preprocessor;

/// Shuffles and splits sentences into train/dev sets
pub mod splitter;

/// Flattens sentences into a single id stream
pub mod dataset;

/// Cuts an id stream into language-model batches
pub mod batcher;
