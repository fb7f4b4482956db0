//! # Virtual Machine
//!
//! Execution engine for contract bytecode.
//!
//! ## Components
//!
//! - `interpreter.rs` - Execution loop and entry points
//! - `dispatch.rs` - Per-opcode state transitions
//! - `state.rs` - Machine state for one call
//! - `stack.rs` - Bounded operand stack
//! - `memory.rs` - Fixed linear memory
//! - `storage.rs` - Per-call key-value storage
//! - `gas.rs` - Gas constants and estimation
//! - `opcodes.rs` - Opcode definitions
//! - `allocator.rs` - Downward bump allocator

pub mod allocator;
pub mod dispatch;
pub mod gas;
pub mod interpreter;
pub mod memory;
pub mod opcodes;
pub mod stack;
pub mod state;
pub mod storage;

pub use allocator::*;
pub use dispatch::*;
pub use gas::*;
pub use interpreter::*;
pub use memory::*;
pub use opcodes::*;
pub use stack::*;
pub use state::*;
pub use storage::*;
