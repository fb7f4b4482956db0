//! # Ports Layer
//!
//! Trait definitions between the VM and the outside world.
//!
//! - **Driving Ports (Inbound)**: `ContractExecutor`, `BatchExecutor`
//! - **Driven Ports (Outbound)**: `ContractCompiler`
//! - No concrete implementations in this module

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
