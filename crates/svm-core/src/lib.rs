//! # SVM Core - Gas-Metered Stack Bytecode VM
//!
//! ## Purpose
//!
//! Executes contract bytecode on a small stack machine with an Ethereum-style
//! execution model: 64-bit words, a bounded operand stack, fixed memory,
//! per-call key-value storage and one unit of gas per instruction.
//!
//! ## Domain Invariants
//!
//! | Invariant | Enforcement Location |
//! |-----------|---------------------|
//! | Gas used never exceeds the budget | `domain/value_objects.rs` - `GasMeter::charge()` |
//! | Stack depth never exceeds its bound | `evm/stack.rs` - `Stack::push()` |
//! | No memory access outside the buffer | `evm/memory.rs` - `Memory::store()`, `Memory::load()` |
//! | Nothing survives between calls | `evm/interpreter.rs` - `execute_with_config()` |
//! | Results are well-formed | `domain/invariants.rs` - `check_all_invariants()` |
//!
//! ## Execution Limits
//!
//! | Limit | Default | Purpose |
//! |-------|---------|---------|
//! | `gas_limit` | 100 000 | Bounds runaway programs |
//! | `max_stack_depth` | 1024 | Stack overflow guard |
//! | `memory_size` | 4 MiB (max 64 MiB) | Fixed memory image |
//!
//! ## VM Components
//!
//! | Component | Location | Purpose |
//! |-----------|----------|---------|
//! | Interpreter | `evm/interpreter.rs` | Execution loop |
//! | Dispatcher | `evm/dispatch.rs` | Per-opcode semantics |
//! | Stack | `evm/stack.rs` | Bounded operand stack |
//! | Memory | `evm/memory.rs` | Fixed linear memory |
//! | Storage | `evm/storage.rs` | Per-call key-value slots |
//! | Gas | `evm/gas.rs` | Costs and estimation |
//!
//! ## Usage Example
//!
//! ```
//! use svm_core::prelude::*;
//!
//! // PUSH1 1, PUSH1 2, ADD, STOP
//! let contract = Contract::new(vec![0x60, 0x01, 0x60, 0x02, 0x01, 0x00]);
//! let result = execute(&contract, &[]);
//!
//! assert!(result.success);
//! assert_eq!(result.return_word(), Some(3));
//! assert_eq!(result.gas_used, 4);
//! ```

// Crate-level lints
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::similar_names)]

// =============================================================================
// MODULES
// =============================================================================

pub mod adapters;
pub mod domain;
pub mod errors;
pub mod evm;
pub mod ports;
pub mod service;

// =============================================================================
// PRELUDE
// =============================================================================

/// Convenient re-exports for common usage.
pub mod prelude {
    // Domain entities
    pub use crate::domain::entities::{
        Abi, AbiConstructor, AbiEntry, AbiFunction, AbiParam, Contract, ExecutionResult,
        ExecutionStatus, StateMutability, VmConfig,
    };

    // Value objects
    pub use crate::domain::value_objects::{Bytes, GasMeter, Hash, StorageKey, Word, WORD_BYTES};

    // Domain services
    pub use crate::domain::services::keccak256;

    // Invariants
    pub use crate::domain::invariants::{
        check_all_invariants, InvariantCheckResult, InvariantViolation,
    };

    // Ports
    pub use crate::ports::inbound::{
        BatchExecutor, ContractExecutor, ExecutionReceipt, ExecutionRequest,
    };
    pub use crate::ports::outbound::ContractCompiler;

    // Errors
    pub use crate::errors::{CompileError, ConfigError, ExecutionFault, ServiceError, VmError};

    // VM components
    pub use crate::evm::{
        execute, execute_with_config, gas, memory::Memory, opcodes::Opcode, stack::Stack,
        storage::ContractStorage, BumpAllocator, Interpreter, MachineState,
    };

    // Adapters
    pub use crate::adapters::StaticCompiler;

    // Service
    pub use crate::service::{ExecutionService, ServiceConfig, ServiceStats};
}

// =============================================================================
// CRATE INFO
// =============================================================================

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// =============================================================================
// TESTS
// =============================================================================
