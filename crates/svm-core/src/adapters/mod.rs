//! # Adapters Layer
//!
//! Concrete implementations of the driven ports.

pub mod static_compiler;

pub use static_compiler::*;
