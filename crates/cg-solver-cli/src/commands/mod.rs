//! CLI command implementations for cg-solve
//!
//! - `solve` - Build a preset system and run Conjugate Gradient on it
//! - `inspect` - Report the structure of a preset matrix

pub mod inspect;
pub mod solve;
