//! # Machine State
//!
//! Everything one call mutates. Built fresh for every call and dropped when
//! the call returns.

use crate::domain::entities::VmConfig;
use crate::domain::value_objects::GasMeter;
use crate::errors::VmError;
use crate::evm::memory::Memory;
use crate::evm::stack::Stack;
use crate::evm::storage::ContractStorage;
use std::fmt;

/// Mutable state of a single execution.
#[derive(Clone, Debug)]
pub struct MachineState {
    /// Operand stack.
    pub stack: Stack,
    /// Fixed execution memory.
    pub memory: Memory,
    /// Contract storage for this call.
    pub storage: ContractStorage,
    /// Offset of the next instruction.
    pub pc: usize,
    /// Gas meter.
    pub gas: GasMeter,
}

impl MachineState {
    /// Creates a zeroed state sized by `config`.
    ///
    /// # Errors
    ///
    /// Returns `OutOfBounds` if the configured memory cannot be allocated.
    pub fn new(config: &VmConfig) -> Result<Self, VmError> {
        Ok(Self {
            stack: Stack::with_limit(config.max_stack_depth),
            memory: Memory::new(config.memory_size)?,
            storage: ContractStorage::new(),
            pc: 0,
            gas: GasMeter::new(config.gas_limit),
        })
    }
}

impl fmt::Display for MachineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "VM{{PC:{}, Gas:{}, Stack:{:?}}}",
            self.pc,
            self.gas.remaining(),
            self.stack.as_slice()
        )
    }
}

// =============================================================================
// TESTS
// =============================================================================
