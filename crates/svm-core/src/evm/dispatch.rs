//! # Opcode Dispatcher
//!
//! One transition per instruction: given the state, a decoded opcode and its
//! immediate, mutate the state or fail. Gas and fetching belong to the loop.
//!
//! Stack effects are not transactional. If the second pop of a binary
//! operation underflows, the first value is already gone.

use crate::domain::services::decode_immediate;
use crate::domain::value_objects::Word;
use crate::errors::VmError;
use crate::evm::opcodes::Opcode;
use crate::evm::state::MachineState;

/// What the loop should do after an instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Control {
    /// Fetch the next instruction.
    Continue,
    /// STOP was executed.
    Halt,
}

/// Executes one instruction against `state`.
///
/// `operand` is the PUSH immediate (empty for every other opcode) and
/// `code_len` bounds jump targets.
///
/// # Errors
///
/// Returns the `VmError` raised by the instruction. Pops completed before the
/// failure are not restored.
pub fn dispatch(
    state: &mut MachineState,
    opcode: Opcode,
    operand: &[u8],
    code_len: usize,
) -> Result<Control, VmError> {
    match opcode {
        Opcode::Stop => return Ok(Control::Halt),

        Opcode::Add => binary_op(state, Word::wrapping_add)?,
        Opcode::Sub => binary_op(state, Word::wrapping_sub)?,
        Opcode::Mul => binary_op(state, Word::wrapping_mul)?,
        Opcode::Div => binary_op(state, |a, b| a.checked_div(b).unwrap_or(0))?,

        Opcode::Pop => {
            state.stack.pop()?;
        }

        Opcode::SStore => {
            let key = state.stack.pop()?;
            let value = state.stack.pop()?;
            state.storage.store_word(key, value);
        }

        Opcode::SLoad => {
            let key = state.stack.pop()?;
            let value = state.storage.load_word(key);
            state.stack.push(value)?;
        }

        Opcode::Jump => {
            let destination = state.stack.pop()?;
            state.pc = jump_target(destination, code_len)?;
        }

        Opcode::JumpI => {
            let condition = state.stack.pop()?;
            let destination = state.stack.pop()?;
            if condition != 0 {
                state.pc = jump_target(destination, code_len)?;
            }
        }

        Opcode::Push1
        | Opcode::Push2
        | Opcode::Push3
        | Opcode::Push4
        | Opcode::Push5
        | Opcode::Push6
        | Opcode::Push7
        | Opcode::Push8
        | Opcode::Push9
        | Opcode::Push10
        | Opcode::Push11
        | Opcode::Push12
        | Opcode::Push13
        | Opcode::Push14
        | Opcode::Push15
        | Opcode::Push16
        | Opcode::Push17
        | Opcode::Push18
        | Opcode::Push19
        | Opcode::Push20
        | Opcode::Push21
        | Opcode::Push22
        | Opcode::Push23
        | Opcode::Push24
        | Opcode::Push25
        | Opcode::Push26
        | Opcode::Push27
        | Opcode::Push28
        | Opcode::Push29
        | Opcode::Push30
        | Opcode::Push31
        | Opcode::Push32 => {
            state.stack.push(decode_immediate(operand))?;
        }
    }

    Ok(Control::Continue)
}

/// Pops `b`, then `a`, and pushes `op(a, b)`.
fn binary_op(state: &mut MachineState, op: impl FnOnce(Word, Word) -> Word) -> Result<(), VmError> {
    let b = state.stack.pop()?;
    let a = state.stack.pop()?;
    state.stack.push(op(a, b))
}

/// Validates a jump target. Landing exactly on `code_len` is allowed and ends
/// the run normally.
fn jump_target(destination: Word, code_len: usize) -> Result<usize, VmError> {
    usize::try_from(destination)
        .ok()
        .filter(|&dest| dest <= code_len)
        .ok_or(VmError::InvalidJumpDestination {
            destination,
            code_len,
        })
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::VmConfig;
    use proptest::prelude::*;

    fn state_with(values: &[Word]) -> MachineState {
        let mut state = MachineState::new(&VmConfig {
            memory_size: 64,
            ..VmConfig::default()
        })
        .unwrap();
        for &value in values {
            state.stack.push(value).unwrap();
        }
        state
    }

    fn run(state: &mut MachineState, opcode: Opcode) -> Result<Control, VmError> {
        dispatch(state, opcode, &[], 100)
    }

    #[test]
    fn test_stop_halts() {
        let mut state = state_with(&[7]);
        assert_eq!(run(&mut state, Opcode::Stop), Ok(Control::Halt));
        assert_eq!(state.stack.as_slice(), &[7]);
    }

    #[test]
    fn test_arithmetic_operand_order() {
        let mut state = state_with(&[10, 3]);
        run(&mut state, Opcode::Sub).unwrap();
        assert_eq!(state.stack.peek(), Some(7)); // a - b with b on top

        let mut state = state_with(&[10, 3]);
        run(&mut state, Opcode::Div).unwrap();
        assert_eq!(state.stack.peek(), Some(3));

        let mut state = state_with(&[6, 7]);
        run(&mut state, Opcode::Mul).unwrap();
        assert_eq!(state.stack.peek(), Some(42));

        let mut state = state_with(&[1, 2]);
        run(&mut state, Opcode::Add).unwrap();
        assert_eq!(state.stack.as_slice(), &[3]);
    }

    #[test]
    fn test_wrapping() {
        let mut state = state_with(&[0, 1]);
        run(&mut state, Opcode::Sub).unwrap();
        assert_eq!(state.stack.peek(), Some(u64::MAX));

        let mut state = state_with(&[u64::MAX, 1]);
        run(&mut state, Opcode::Add).unwrap();
        assert_eq!(state.stack.peek(), Some(0));

        let mut state = state_with(&[u64::MAX, 2]);
        run(&mut state, Opcode::Mul).unwrap();
        assert_eq!(state.stack.peek(), Some(u64::MAX - 1));
    }

    #[test]
    fn test_div_by_zero_is_zero() {
        let mut state = state_with(&[1, 0]);
        assert_eq!(run(&mut state, Opcode::Div), Ok(Control::Continue));
        assert_eq!(state.stack.as_slice(), &[0]);
    }

    #[test]
    fn test_partial_pop_not_rolled_back() {
        let mut state = state_with(&[5]);
        assert_eq!(run(&mut state, Opcode::Add), Err(VmError::StackUnderflow));
        assert!(state.stack.is_empty());
    }

    #[test]
    fn test_pop() {
        let mut state = state_with(&[1, 2]);
        run(&mut state, Opcode::Pop).unwrap();
        assert_eq!(state.stack.as_slice(), &[1]);

        let mut state = state_with(&[]);
        assert_eq!(run(&mut state, Opcode::Pop), Err(VmError::StackUnderflow));
    }

    #[test]
    fn test_sstore_key_on_top() {
        // value pushed first, key pushed last
        let mut state = state_with(&[5, 0]);
        run(&mut state, Opcode::SStore).unwrap();
        assert!(state.stack.is_empty());
        assert_eq!(state.storage.load_word(0), 5);
        assert_eq!(state.storage.load_word(5), 0);
    }

    #[test]
    fn test_sload() {
        let mut state = state_with(&[9]);
        state.storage.store_word(9, 1234);
        run(&mut state, Opcode::SLoad).unwrap();
        assert_eq!(state.stack.as_slice(), &[1234]);

        let mut state = state_with(&[1]);
        run(&mut state, Opcode::SLoad).unwrap();
        assert_eq!(state.stack.as_slice(), &[0]);
    }

    #[test]
    fn test_push_decodes_immediate() {
        let mut state = state_with(&[]);
        dispatch(&mut state, Opcode::Push2, &[0x01, 0x00], 100).unwrap();
        assert_eq!(state.stack.peek(), Some(256));

        let mut wide = [0xFF; 32];
        wide[24..].copy_from_slice(&42u64.to_be_bytes());
        dispatch(&mut state, Opcode::Push32, &wide, 100).unwrap();
        assert_eq!(state.stack.peek(), Some(42));
    }

    #[test]
    fn test_push_overflow() {
        let mut state = MachineState::new(&VmConfig {
            max_stack_depth: 1,
            memory_size: 8,
            ..VmConfig::default()
        })
        .unwrap();
        dispatch(&mut state, Opcode::Push1, &[1], 10).unwrap();
        assert_eq!(
            dispatch(&mut state, Opcode::Push1, &[2], 10),
            Err(VmError::StackOverflow { limit: 1 })
        );
        assert_eq!(state.stack.as_slice(), &[1]);
    }

    #[test]
    fn test_jump() {
        let mut state = state_with(&[100]);
        run(&mut state, Opcode::Jump).unwrap();
        assert_eq!(state.pc, 100); // end of code is a valid target

        let mut state = state_with(&[101]);
        state.pc = 3;
        assert_eq!(
            run(&mut state, Opcode::Jump),
            Err(VmError::InvalidJumpDestination {
                destination: 101,
                code_len: 100
            })
        );
        assert_eq!(state.pc, 3); // not committed
    }

    #[test]
    fn test_jumpi_condition_on_top() {
        // destination pushed first, condition last
        let mut state = state_with(&[42, 1]);
        run(&mut state, Opcode::JumpI).unwrap();
        assert_eq!(state.pc, 42);
        assert!(state.stack.is_empty());

        let mut state = state_with(&[42, 0]);
        state.pc = 7;
        run(&mut state, Opcode::JumpI).unwrap();
        assert_eq!(state.pc, 7);
        assert!(state.stack.is_empty());
    }

    #[test]
    fn test_jumpi_validates_only_taken_jumps() {
        let mut state = state_with(&[u64::MAX, 0]);
        assert!(run(&mut state, Opcode::JumpI).is_ok());

        let mut state = state_with(&[u64::MAX, 1]);
        assert!(matches!(
            run(&mut state, Opcode::JumpI),
            Err(VmError::InvalidJumpDestination { .. })
        ));
    }

    proptest! {
        #[test]
        fn prop_arithmetic_wraps(a in any::<u64>(), b in any::<u64>()) {
            let mut state = state_with(&[a, b]);
            run(&mut state, Opcode::Add).unwrap();
            prop_assert_eq!(state.stack.peek(), Some(a.wrapping_add(b)));

            let mut state = state_with(&[a, b]);
            run(&mut state, Opcode::Sub).unwrap();
            prop_assert_eq!(state.stack.peek(), Some(a.wrapping_sub(b)));

            let mut state = state_with(&[a, b]);
            run(&mut state, Opcode::Mul).unwrap();
            prop_assert_eq!(state.stack.peek(), Some(a.wrapping_mul(b)));

            let mut state = state_with(&[a, b]);
            run(&mut state, Opcode::Div).unwrap();
            prop_assert_eq!(state.stack.peek(), Some(if b == 0 { 0 } else { a / b }));
        }
    }
}
