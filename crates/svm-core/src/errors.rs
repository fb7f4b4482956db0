//! # Error Types
//!
//! All error types for bytecode execution and the surrounding service.

use thiserror::Error;

// =============================================================================
// VM ERRORS
// =============================================================================

/// Errors that can occur while executing bytecode.
///
/// Every primitive (stack, memory, storage, gas) reports failure through this
/// type instead of panicking, so a bad program can never take the host down.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VmError {
    /// Push onto a full stack.
    #[error("stack overflow: limit {limit}")]
    StackOverflow {
        /// Configured stack bound.
        limit: usize,
    },

    /// Pop from an empty stack.
    #[error("stack underflow")]
    StackUnderflow,

    /// Memory access outside the fixed buffer.
    #[error("memory access out of bounds: offset {offset}, size {size}, capacity {capacity}")]
    OutOfBounds {
        /// Start of the access.
        offset: usize,
        /// Bytes requested.
        size: usize,
        /// Buffer capacity.
        capacity: usize,
    },

    /// Gas charge exceeds what is left.
    #[error("out of gas: required {required}, remaining {remaining}")]
    OutOfGas {
        /// Units the instruction needed.
        required: u64,
        /// Units left in the meter.
        remaining: u64,
    },

    /// Byte at the program counter is not part of the instruction set.
    #[error("unknown opcode: 0x{0:02X}")]
    UnknownOpcode(u8),

    /// PUSH immediate runs past the end of the bytecode.
    #[error("unexpected end of bytecode: need {needed} bytes at pc {pc}, {available} available")]
    UnexpectedEndOfBytecode {
        /// Offset of the PUSH opcode.
        pc: usize,
        /// Immediate width.
        needed: usize,
        /// Bytes left after the opcode.
        available: usize,
    },

    /// Jump target lies outside `[0, code_len]`.
    #[error("invalid jump destination: {destination} (code length {code_len})")]
    InvalidJumpDestination {
        /// Popped target.
        destination: u64,
        /// Bytecode length.
        code_len: usize,
    },

    /// Bump allocator has no room left for the request.
    #[error("allocation exhausted: requested {requested}, available {available}")]
    AllocationExhausted {
        /// Bytes requested.
        requested: usize,
        /// Bytes still free.
        available: usize,
    },
}

impl VmError {
    /// Returns true if the failure came from hitting a resource bound rather
    /// than from malformed bytecode.
    #[must_use]
    pub fn is_resource_exhaustion(&self) -> bool {
        matches!(
            self,
            Self::OutOfGas { .. }
                | Self::StackOverflow { .. }
                | Self::OutOfBounds { .. }
                | Self::AllocationExhausted { .. }
        )
    }

    /// Returns true if this is an out-of-gas failure.
    #[must_use]
    pub fn is_out_of_gas(&self) -> bool {
        matches!(self, Self::OutOfGas { .. })
    }
}

/// A [`VmError`] pinned to the instruction that raised it.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("execution error at pc={pc}: {error}")]
pub struct ExecutionFault {
    /// Offset of the faulting instruction.
    pub pc: usize,
    /// What went wrong.
    #[source]
    pub error: VmError,
}

impl ExecutionFault {
    /// Creates a fault at the given offset.
    #[must_use]
    pub fn new(pc: usize, error: VmError) -> Self {
        Self { pc, error }
    }
}

// =============================================================================
// COMPILER ERRORS
// =============================================================================

/// Errors reported by a [`ContractCompiler`](crate::ports::ContractCompiler).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CompileError {
    /// Source text could not be parsed.
    #[error("parse error: {0}")]
    Parse(String),

    /// Parsed source could not be lowered to bytecode.
    #[error("compile error: {0}")]
    Compile(String),
}

// =============================================================================
// CONFIG ERRORS
// =============================================================================

/// Invalid VM configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Stack bound of zero.
    #[error("max_stack_depth must be greater than zero")]
    ZeroStackDepth,

    /// Memory capacity of zero.
    #[error("memory_size must be greater than zero")]
    ZeroMemory,

    /// Memory capacity above the supported maximum.
    #[error("memory_size {size} exceeds the maximum of {max} bytes")]
    MemoryTooLarge {
        /// Requested capacity.
        size: usize,
        /// Largest accepted capacity.
        max: usize,
    },

    /// Configuration document could not be decoded.
    #[error("invalid config: {0}")]
    Malformed(String),
}

// =============================================================================
// SERVICE ERRORS
// =============================================================================

/// Errors from the execution service.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// Source failed to compile.
    #[error(transparent)]
    Compile(#[from] CompileError),

    /// Execution faulted where a successful run was required.
    #[error(transparent)]
    Execution(#[from] ExecutionFault),

    /// Concurrency limiter was closed.
    #[error("service is shutting down")]
    Shutdown,

    /// A worker task died before producing a result.
    #[error("execution task failed: {0}")]
    TaskFailed(String),
}

// =============================================================================
// TESTS
// =============================================================================
