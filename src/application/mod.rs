// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Workflow coordination only:
//   - No ML math or model code here
//   - No printing here (that's Layer 1)
//
// Reference: Clean Architecture pattern

// Corpus → vocabulary → training loop
pub mod train_use_case;

// Perplexity of a trained model on a corpus
pub mod eval_use_case;

// Sampling sentences from a trained model
pub mod generate_use_case;
