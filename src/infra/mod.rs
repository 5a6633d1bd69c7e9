// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Persistence shared by training, evaluation, and generation:
//
//   checkpoint.rs      — core-graph weights (full-precision .mpk.gz),
//                        train_config.json, latest/best epoch
//
//   tokenizer_store.rs — word-level vocabulary as tokenizer.json,
//                        built from the training corpus once and
//                        reused afterwards
//
//   metrics.rs         — per-epoch CSV log
//
// Reference: Burn Book §5 (Checkpointing)

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Vocabulary building, saving, and loading
pub mod tokenizer_store;

/// Training metrics CSV logger
pub mod metrics;
