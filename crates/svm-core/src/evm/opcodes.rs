//! # Opcodes
//!
//! Instruction set definitions. Byte values match the EVM so existing
//! bytecode for this subset runs unchanged.

use std::fmt;

/// VM opcode.
///
/// `PushN` reads the next N bytes as a big-endian immediate and pushes it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
#[allow(missing_docs)]
pub enum Opcode {
    // 0x00 - Stop and Arithmetic
    /// Halt successfully.
    Stop = 0x00,
    /// Wrapping addition.
    Add = 0x01,
    /// Wrapping multiplication.
    Mul = 0x02,
    /// Wrapping subtraction.
    Sub = 0x03,
    /// Integer division; zero divisor yields 0.
    Div = 0x04,

    // 0x50 - Stack, Storage, Flow
    /// Discard the top of the stack.
    Pop = 0x50,
    /// Load a storage slot.
    SLoad = 0x54,
    /// Write a storage slot.
    SStore = 0x55,
    /// Unconditional jump.
    Jump = 0x56,
    /// Jump if the condition is non-zero.
    JumpI = 0x57,

    // 0x60-0x7F - Push
    Push1 = 0x60,
    Push2 = 0x61,
    Push3 = 0x62,
    Push4 = 0x63,
    Push5 = 0x64,
    Push6 = 0x65,
    Push7 = 0x66,
    Push8 = 0x67,
    Push9 = 0x68,
    Push10 = 0x69,
    Push11 = 0x6A,
    Push12 = 0x6B,
    Push13 = 0x6C,
    Push14 = 0x6D,
    Push15 = 0x6E,
    Push16 = 0x6F,
    Push17 = 0x70,
    Push18 = 0x71,
    Push19 = 0x72,
    Push20 = 0x73,
    Push21 = 0x74,
    Push22 = 0x75,
    Push23 = 0x76,
    Push24 = 0x77,
    Push25 = 0x78,
    Push26 = 0x79,
    Push27 = 0x7A,
    Push28 = 0x7B,
    Push29 = 0x7C,
    Push30 = 0x7D,
    Push31 = 0x7E,
    Push32 = 0x7F,
}

impl Opcode {
    /// Try to decode an opcode from a byte.
    #[must_use]
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x00 => Some(Self::Stop),
            0x01 => Some(Self::Add),
            0x02 => Some(Self::Mul),
            0x03 => Some(Self::Sub),
            0x04 => Some(Self::Div),

            0x50 => Some(Self::Pop),
            0x54 => Some(Self::SLoad),
            0x55 => Some(Self::SStore),
            0x56 => Some(Self::Jump),
            0x57 => Some(Self::JumpI),

            0x60 => Some(Self::Push1),
            0x61 => Some(Self::Push2),
            0x62 => Some(Self::Push3),
            0x63 => Some(Self::Push4),
            0x64 => Some(Self::Push5),
            0x65 => Some(Self::Push6),
            0x66 => Some(Self::Push7),
            0x67 => Some(Self::Push8),
            0x68 => Some(Self::Push9),
            0x69 => Some(Self::Push10),
            0x6A => Some(Self::Push11),
            0x6B => Some(Self::Push12),
            0x6C => Some(Self::Push13),
            0x6D => Some(Self::Push14),
            0x6E => Some(Self::Push15),
            0x6F => Some(Self::Push16),
            0x70 => Some(Self::Push17),
            0x71 => Some(Self::Push18),
            0x72 => Some(Self::Push19),
            0x73 => Some(Self::Push20),
            0x74 => Some(Self::Push21),
            0x75 => Some(Self::Push22),
            0x76 => Some(Self::Push23),
            0x77 => Some(Self::Push24),
            0x78 => Some(Self::Push25),
            0x79 => Some(Self::Push26),
            0x7A => Some(Self::Push27),
            0x7B => Some(Self::Push28),
            0x7C => Some(Self::Push29),
            0x7D => Some(Self::Push30),
            0x7E => Some(Self::Push31),
            0x7F => Some(Self::Push32),

            _ => None,
        }
    }

    /// Returns the byte value.
    #[must_use]
    pub const fn as_byte(self) -> u8 {
        self as u8
    }

    /// Returns true if this is a PUSH opcode.
    #[must_use]
    pub fn is_push(self) -> bool {
        (0x60..=0x7F).contains(&self.as_byte())
    }

    /// Immediate width in bytes for PUSH opcodes.
    #[must_use]
    pub fn push_size(self) -> Option<usize> {
        self.is_push()
            .then(|| usize::from(self.as_byte() - Self::Push1.as_byte()) + 1)
    }

    /// Assembly mnemonic.
    #[must_use]
    pub fn mnemonic(self) -> &'static str {
        const PUSH: [&str; 32] = [
            "PUSH1", "PUSH2", "PUSH3", "PUSH4", "PUSH5", "PUSH6", "PUSH7", "PUSH8", "PUSH9",
            "PUSH10", "PUSH11", "PUSH12", "PUSH13", "PUSH14", "PUSH15", "PUSH16", "PUSH17",
            "PUSH18", "PUSH19", "PUSH20", "PUSH21", "PUSH22", "PUSH23", "PUSH24", "PUSH25",
            "PUSH26", "PUSH27", "PUSH28", "PUSH29", "PUSH30", "PUSH31", "PUSH32",
        ];
        match self {
            Self::Stop => "STOP",
            Self::Add => "ADD",
            Self::Mul => "MUL",
            Self::Sub => "SUB",
            Self::Div => "DIV",
            Self::Pop => "POP",
            Self::SLoad => "SLOAD",
            Self::SStore => "SSTORE",
            Self::Jump => "JUMP",
            Self::JumpI => "JUMPI",
            push => PUSH[usize::from(push.as_byte() - Self::Push1.as_byte())],
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

impl From<Opcode> for u8 {
    fn from(opcode: Opcode) -> Self {
        opcode.as_byte()
    }
}

// =============================================================================
// TESTS
// =============================================================================
