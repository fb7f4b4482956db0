//! # Interpreter
//!
//! The execution loop: charge, fetch, decode, dispatch, until STOP, the end
//! of the bytecode, or a fault.
//!
//! ## State Machine
//!
//! ```text
//! Running ──STOP / end of code──→ Stopped
//!    │
//!    └──────────any VmError─────→ Failed
//! ```
//!
//! Both terminal states are absorbing: stepping again is a no-op.

use crate::domain::entities::{Contract, ExecutionResult, ExecutionStatus, VmConfig};
use crate::domain::services::word_to_be_bytes;
use crate::domain::value_objects::Bytes;
use crate::errors::{ExecutionFault, VmError};
use crate::evm::dispatch::{dispatch, Control};
use crate::evm::gas::costs;
use crate::evm::opcodes::Opcode;
use crate::evm::state::MachineState;
use tracing::{debug, instrument, trace};

/// Single-call bytecode interpreter.
pub struct Interpreter<'a> {
    code: &'a [u8],
    input: &'a [u8],
    state: MachineState,
    status: ExecutionStatus,
    fault: Option<ExecutionFault>,
}

impl<'a> Interpreter<'a> {
    /// Builds a fresh machine and loads `code` into memory at offset 0.
    ///
    /// # Errors
    ///
    /// Returns an `OutOfBounds` fault at pc 0 if the memory cannot be
    /// allocated or the bytecode does not fit in it. No gas has been charged
    /// at that point.
    pub fn new(code: &'a [u8], input: &'a [u8], config: &VmConfig) -> Result<Self, ExecutionFault> {
        let mut state =
            MachineState::new(config).map_err(|error| ExecutionFault::new(0, error))?;
        state
            .memory
            .store(0, code)
            .map_err(|error| ExecutionFault::new(0, error))?;

        Ok(Self {
            code,
            input,
            state,
            status: ExecutionStatus::Running,
            fault: None,
        })
    }

    /// Current machine state.
    #[must_use]
    pub fn state(&self) -> &MachineState {
        &self.state
    }

    /// Current loop status.
    #[must_use]
    pub fn status(&self) -> ExecutionStatus {
        self.status
    }

    /// Call data passed with this execution.
    #[must_use]
    pub fn input(&self) -> &[u8] {
        self.input
    }

    /// Executes one instruction.
    ///
    /// Returns the status after the instruction. Once the loop has stopped,
    /// further calls return `Stopped` without touching the machine.
    ///
    /// # Errors
    ///
    /// Returns the fault that moved the loop to `Failed`, and the same fault
    /// again on every later call.
    pub fn step(&mut self) -> Result<ExecutionStatus, ExecutionFault> {
        if let Some(fault) = &self.fault {
            return Err(fault.clone());
        }
        if self.status == ExecutionStatus::Stopped {
            return Ok(self.status);
        }

        if self.state.pc >= self.code.len() {
            self.status = ExecutionStatus::Stopped;
            return Ok(self.status);
        }

        let pc = self.state.pc;
        match self.execute_at(pc) {
            Ok(Control::Continue) if self.state.pc < self.code.len() => {}
            Ok(_) => self.status = ExecutionStatus::Stopped,
            Err(error) => {
                let fault = ExecutionFault::new(pc, error);
                self.status = ExecutionStatus::Failed;
                self.fault = Some(fault.clone());
                return Err(fault);
            }
        }

        Ok(self.status)
    }

    fn execute_at(&mut self, pc: usize) -> Result<Control, VmError> {
        let code = self.code;
        self.state.gas.charge(costs::INSTRUCTION)?;

        let byte = code[pc];
        let opcode = Opcode::from_byte(byte).ok_or(VmError::UnknownOpcode(byte))?;
        self.state.pc = pc + 1;

        let operand = match opcode.push_size() {
            Some(size) => {
                let start = pc + 1;
                let available = code.len() - start;
                if size > available {
                    return Err(VmError::UnexpectedEndOfBytecode {
                        pc,
                        needed: size,
                        available,
                    });
                }
                self.state.pc = start + size;
                &code[start..start + size]
            }
            None => &[][..],
        };

        trace!(
            pc,
            opcode = %opcode,
            gas_remaining = self.state.gas.remaining(),
            stack_depth = self.state.stack.len(),
            "step"
        );

        dispatch(&mut self.state, opcode, operand, code.len())
    }

    /// Runs to completion and builds the result.
    #[instrument(skip_all, fields(code_len = self.code.len(), gas_limit = self.state.gas.limit()))]
    pub fn run(mut self) -> ExecutionResult {
        while let Ok(ExecutionStatus::Running) = self.step() {}

        let result = self.into_result();
        debug!(
            success = result.success,
            gas_used = result.gas_used,
            error = result.error.as_ref().map(tracing::field::display),
            "execution finished"
        );
        result
    }

    /// Builds the result for the current state.
    ///
    /// A machine that is still `Running` is reported as stopped at its current
    /// position.
    #[must_use]
    pub fn into_result(self) -> ExecutionResult {
        let gas_used = self.state.gas.used();
        match self.fault {
            Some(fault) => ExecutionResult::failure(fault, gas_used),
            None => {
                let return_data = self
                    .state
                    .stack
                    .peek()
                    .map_or_else(Bytes::new, |top| Bytes::from_slice(&word_to_be_bytes(top)));
                ExecutionResult::success(return_data, gas_used)
            }
        }
    }
}

// =============================================================================
// ENTRY POINTS
// =============================================================================

/// Executes `contract` with the default configuration.
#[must_use]
pub fn execute(contract: &Contract, input: &[u8]) -> ExecutionResult {
    execute_with_config(contract, input, &VmConfig::default())
}

/// Executes `contract` under `config`.
///
/// Every call builds its own machine; nothing survives between calls.
#[must_use]
#[instrument(skip_all, fields(code_hash = %contract.code_hash(), input_len = input.len()))]
pub fn execute_with_config(contract: &Contract, input: &[u8], config: &VmConfig) -> ExecutionResult {
    match Interpreter::new(contract.bytecode.as_slice(), input, config) {
        Ok(interpreter) => interpreter.run(),
        Err(fault) => {
            debug!(%fault, "bytecode rejected before execution");
            ExecutionResult::failure(fault, 0)
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const STOP: u8 = 0x00;
    const ADD: u8 = 0x01;
    const MUL: u8 = 0x02;
    const SUB: u8 = 0x03;
    const DIV: u8 = 0x04;
    const POP: u8 = 0x50;
    const SLOAD: u8 = 0x54;
    const SSTORE: u8 = 0x55;
    const JUMP: u8 = 0x56;
    const JUMPI: u8 = 0x57;
    const PUSH1: u8 = 0x60;
    const PUSH2: u8 = 0x61;

    fn run(code: &[u8]) -> ExecutionResult {
        execute(&Contract::new(code.to_vec()), &[])
    }

    fn run_with(code: &[u8], config: VmConfig) -> ExecutionResult {
        execute_with_config(&Contract::new(code.to_vec()), &[], &config)
    }

    fn small(gas_limit: u64) -> VmConfig {
        VmConfig {
            gas_limit,
            max_stack_depth: 1024,
            memory_size: 256,
        }
    }

    #[test]
    fn test_add() {
        let result = run(&[PUSH1, 1, PUSH1, 2, ADD, STOP]);

        assert!(result.success);
        assert_eq!(result.return_data.as_slice(), &[0, 0, 0, 0, 0, 0, 0, 3]);
        assert_eq!(result.gas_used, 4);
        assert!(result.error.is_none());
    }

    #[test]
    fn test_storage_round_trip() {
        let result = run(&[PUSH1, 5, PUSH1, 0, SSTORE, PUSH1, 0, SLOAD, STOP]);

        assert!(result.success);
        assert_eq!(result.return_word(), Some(5));
        assert_eq!(result.gas_used, 6);
    }

    #[test]
    fn test_sload_unwritten_key() {
        let result = run(&[PUSH1, 9, SLOAD, STOP]);
        assert_eq!(result.return_word(), Some(0));
    }

    #[test]
    fn test_div_by_zero() {
        let result = run(&[PUSH1, 1, PUSH1, 0, DIV, STOP]);

        assert!(result.success);
        assert_eq!(result.return_word(), Some(0));
    }

    #[test]
    fn test_sub_and_mul() {
        assert_eq!(run(&[PUSH1, 10, PUSH1, 3, SUB, STOP]).return_word(), Some(7));
        assert_eq!(run(&[PUSH1, 6, PUSH1, 7, MUL, STOP]).return_word(), Some(42));
        assert_eq!(
            run(&[PUSH1, 0, PUSH1, 1, SUB, STOP]).return_word(),
            Some(u64::MAX)
        );
    }

    #[test]
    fn test_unknown_opcode() {
        let result = run(&[PUSH1, 1, 0xEE, STOP]);

        assert!(!result.success);
        assert!(result.return_data.is_empty());
        assert_eq!(result.gas_used, 2); // fetch of 0xEE is charged
        let fault = result.error.unwrap();
        assert_eq!(fault.pc, 2);
        assert_eq!(fault.error, VmError::UnknownOpcode(0xEE));
    }

    #[test]
    fn test_out_of_gas() {
        let result = run_with(&[PUSH1, 1, PUSH1, 2, ADD, STOP], small(3));

        assert!(!result.success);
        assert!(result.is_out_of_gas());
        assert_eq!(result.gas_used, 3);
        assert_eq!(result.error.unwrap().pc, 5);
    }

    #[test]
    fn test_exact_budget_succeeds() {
        let result = run_with(&[PUSH1, 1, PUSH1, 2, ADD, STOP], small(4));
        assert!(result.success);
        assert_eq!(result.gas_used, 4);
    }

    #[test]
    fn test_zero_budget() {
        let result = run_with(&[STOP], small(0));
        assert!(result.is_out_of_gas());
        assert_eq!(result.gas_used, 0);
    }

    #[test]
    fn test_empty_bytecode() {
        let result = run(&[]);

        assert!(result.success);
        assert!(result.return_data.is_empty());
        assert_eq!(result.gas_used, 0);
    }

    #[test]
    fn test_runs_off_end() {
        let result = run(&[PUSH1, 7]);

        assert!(result.success);
        assert_eq!(result.return_word(), Some(7));
        assert_eq!(result.gas_used, 1);
    }

    #[test]
    fn test_empty_stack_returns_nothing() {
        let result = run(&[PUSH1, 7, POP, STOP]);
        assert!(result.success);
        assert!(result.return_data.is_empty());
    }

    #[test]
    fn test_stack_underflow() {
        let result = run(&[PUSH1, 1, ADD]);

        assert_eq!(result.vm_error(), Some(&VmError::StackUnderflow));
        assert_eq!(result.error.unwrap().pc, 2);
        assert_eq!(result.gas_used, 2);
    }

    #[test]
    fn test_stack_overflow() {
        let config = VmConfig {
            max_stack_depth: 2,
            ..small(100)
        };
        let result = run_with(&[PUSH1, 1, PUSH1, 2, PUSH1, 3, STOP], config);

        assert_eq!(result.vm_error(), Some(&VmError::StackOverflow { limit: 2 }));
        assert_eq!(result.error.unwrap().pc, 4);
    }

    #[test]
    fn test_truncated_push() {
        let result = run(&[PUSH1, 1, PUSH2, 0xAB]);

        assert_eq!(
            result.vm_error(),
            Some(&VmError::UnexpectedEndOfBytecode {
                pc: 2,
                needed: 2,
                available: 1
            })
        );
        assert_eq!(result.gas_used, 2);
    }

    #[test]
    fn test_wide_push_truncated() {
        let mut code = vec![0x7F]; // PUSH32
        code.extend_from_slice(&[0xFF; 24]);
        code.extend_from_slice(&0x0102u64.to_be_bytes());
        code.push(STOP);

        assert_eq!(run(&code).return_word(), Some(0x0102));
    }

    #[test]
    fn test_jump_skips_code() {
        // 0: PUSH1 5, 2: JUMP, 3: PUSH1 (never), 5: PUSH1 9, 7: STOP
        let code = [PUSH1, 5, JUMP, PUSH1, 1, PUSH1, 9, STOP];
        let result = run(&code);

        assert!(result.success);
        assert_eq!(result.return_word(), Some(9));
        assert_eq!(result.gas_used, 4);
    }

    #[test]
    fn test_jump_to_end_stops() {
        let result = run(&[PUSH1, 3, JUMP]);
        assert!(result.success);
        assert!(result.return_data.is_empty());
    }

    #[test]
    fn test_invalid_jump() {
        let result = run(&[PUSH1, 200, JUMP, STOP]);

        assert_eq!(
            result.vm_error(),
            Some(&VmError::InvalidJumpDestination {
                destination: 200,
                code_len: 4
            })
        );
        assert_eq!(result.error.unwrap().pc, 2);
    }

    #[test]
    fn test_jumpi() {
        // taken: 0: PUSH1 8, 2: PUSH1 1, 4: JUMPI, 5: PUSH1 1, 7: STOP, 8: PUSH1 2, 10: STOP
        let taken = [PUSH1, 8, PUSH1, 1, JUMPI, PUSH1, 1, STOP, PUSH1, 2, STOP];
        assert_eq!(run(&taken).return_word(), Some(2));

        let mut not_taken = taken;
        not_taken[3] = 0;
        assert_eq!(run(&not_taken).return_word(), Some(1));
    }

    #[test]
    fn test_infinite_loop_runs_out_of_gas() {
        let result = run_with(&[PUSH1, 0, JUMP], small(1_000));

        assert!(result.is_out_of_gas());
        assert_eq!(result.gas_used, 1_000);
    }

    #[test]
    fn test_bytecode_larger_than_memory() {
        let config = VmConfig {
            memory_size: 2,
            ..VmConfig::default()
        };
        let result = run_with(&[PUSH1, 1, STOP], config);

        assert!(!result.success);
        assert_eq!(result.gas_used, 0);
        assert!(matches!(
            result.vm_error(),
            Some(VmError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn test_oversized_memory_fails_without_allocating() {
        let config = VmConfig {
            memory_size: 1 << 62,
            ..VmConfig::default()
        };
        let result = run_with(&[STOP], config);

        assert!(!result.success);
        assert_eq!(result.gas_used, 0);
        assert_eq!(result.error.as_ref().map(|fault| fault.pc), Some(0));
        assert!(matches!(
            result.vm_error(),
            Some(VmError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn test_bytecode_loaded_into_memory() {
        let code = [PUSH1, 1, STOP];
        let interpreter = Interpreter::new(&code, &[], &small(10)).unwrap();
        assert_eq!(&interpreter.state().memory.as_slice()[..3], &code);
    }

    #[test]
    fn test_step_by_step() {
        let code = [PUSH1, 1, PUSH1, 2, ADD, STOP];
        let input = [0xCA, 0xFE];
        let mut interpreter = Interpreter::new(&code, &input, &small(10)).unwrap();
        assert_eq!(interpreter.input(), &input);

        assert_eq!(interpreter.step(), Ok(ExecutionStatus::Running));
        assert_eq!(interpreter.state().to_string(), "VM{PC:2, Gas:9, Stack:[1]}");

        assert_eq!(interpreter.step(), Ok(ExecutionStatus::Running));
        assert_eq!(interpreter.step(), Ok(ExecutionStatus::Running));
        assert_eq!(interpreter.state().stack.as_slice(), &[3]);

        assert_eq!(interpreter.step(), Ok(ExecutionStatus::Stopped));
        assert_eq!(interpreter.status(), ExecutionStatus::Stopped);

        // absorbing
        assert_eq!(interpreter.step(), Ok(ExecutionStatus::Stopped));
        assert_eq!(interpreter.state().gas.used(), 4);
    }

    #[test]
    fn test_failed_is_absorbing() {
        let code = [0xEE];
        let mut interpreter = Interpreter::new(&code, &[], &small(10)).unwrap();

        let fault = interpreter.step().unwrap_err();
        assert_eq!(interpreter.status(), ExecutionStatus::Failed);
        assert_eq!(interpreter.step(), Err(fault));
        assert_eq!(interpreter.state().gas.used(), 1);
    }

    #[test]
    fn test_storage_is_per_call() {
        let writer = Contract::new(vec![PUSH1, 5, PUSH1, 0, SSTORE, STOP]);
        let reader = Contract::new(vec![PUSH1, 0, SLOAD, STOP]);

        assert!(execute(&writer, &[]).success);
        assert_eq!(execute(&reader, &[]).return_word(), Some(0));
    }
}
