// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Pure Rust structs and traits that define the core concepts
// of the language model pipeline:
//
//   - a Document of raw corpus text
//   - TokenGrid / LmBatch: the [batch, time] id grids a model
//     consumes (input_w) and predicts (target_y)
//   - the DocumentSource and Vocabulary abstractions
//
// Rules for this layer:
//   - NO Burn framework types
//   - NO file I/O
//   - Only plain data and traits
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

// A loaded corpus file
pub mod document;

// Input/target id grids with shape validation
pub mod token_grid;

// Core abstractions (traits) that other layers implement
pub mod traits;
