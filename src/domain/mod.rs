// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust types that describe the problem:
//   - an Image is a 28×28 grid of normalized intensities
//   - a Label is one of the 26 alphabet classes
//   - a Sample pairs the two
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//   - Only plain Rust structs, enums, and traits
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

// Image, Label and Sample value types
pub mod sample;

// Error taxonomy shared by every lower layer
pub mod error;

// Core abstractions (traits) that other layers implement
pub mod traits;
