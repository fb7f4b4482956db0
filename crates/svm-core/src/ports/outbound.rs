//! # Driven Ports (SPI - Outbound)
//!
//! Services the VM host depends on but does not implement itself.

use crate::domain::entities::Contract;
use crate::errors::CompileError;

// =============================================================================
// CONTRACT COMPILER
// =============================================================================

/// Turns contract source into a deployable [`Contract`].
///
/// The VM never depends on a concrete compiler. Hosts plug one in through
/// this trait.
pub trait ContractCompiler: Send + Sync {
    /// Compiles `source` into bytecode plus ABI.
    ///
    /// # Errors
    ///
    /// Returns `CompileError::Parse` when the source cannot be read and
    /// `CompileError::Compile` when it cannot be lowered to bytecode.
    fn compile(&self, source: &str) -> Result<Contract, CompileError>;
}
