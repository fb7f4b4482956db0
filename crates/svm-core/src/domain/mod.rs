//! # Domain Layer
//!
//! Plain data and pure functions shared by the VM and its hosts.
//! No I/O, no async.

pub mod entities;
pub mod invariants;
pub mod services;
pub mod value_objects;

pub use entities::*;
pub use invariants::*;
pub use services::*;
pub use value_objects::*;
