//! # Gas Metering
//!
//! Flat pricing: every fetched instruction costs the same, whatever it does.
//! The meter itself lives in [`GasMeter`](crate::domain::value_objects::GasMeter).

use crate::evm::opcodes::Opcode;

/// Default gas budget per call.
pub const DEFAULT_GAS_LIMIT: u64 = 100_000;

/// Gas costs.
pub mod costs {
    /// Charged once per fetched instruction, before decode.
    pub const INSTRUCTION: u64 = 1;
}

/// Gas a jump-free program needs to reach its first STOP (or its end).
///
/// Walks the bytecode the same way the loop does, skipping PUSH immediates.
/// Stops counting at the first byte the loop would fault on, including that
/// byte, since the loop charges before decoding.
#[must_use]
pub fn straight_line_cost(code: &[u8]) -> u64 {
    let mut pc = 0;
    let mut gas = 0;

    while pc < code.len() {
        gas += costs::INSTRUCTION;
        let Some(opcode) = Opcode::from_byte(code[pc]) else {
            break;
        };
        if opcode == Opcode::Stop {
            break;
        }
        pc += 1 + opcode.push_size().unwrap_or(0);
    }

    gas
}

// =============================================================================
// TESTS
// =============================================================================
