//! # Core Domain Entities
//!
//! Boundary objects handed to and returned from the VM: the deployable
//! [`Contract`], the [`ExecutionResult`] it produces, and the [`VmConfig`]
//! that sizes each run.

use crate::domain::services::{decode_stored_word, keccak256};
use crate::domain::value_objects::{Bytes, Hash, Word, WORD_BYTES};
use crate::errors::{ConfigError, ExecutionFault, VmError};
use crate::evm::gas::DEFAULT_GAS_LIMIT;
use crate::evm::memory::{DEFAULT_MEMORY_SIZE, MAX_MEMORY_SIZE};
use crate::evm::stack::MAX_STACK_SIZE;
use serde::{Deserialize, Serialize};
use std::env;
use tracing::warn;

// =============================================================================
// ABI DESCRIPTOR
// =============================================================================

/// Contract interface descriptor.
///
/// Deserializes from the usual JSON ABI array. The VM itself never reads it;
/// it travels with the bytecode for callers that need to encode input.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Abi {
    entries: Vec<AbiEntry>,
}

impl Abi {
    /// Creates an empty descriptor.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a descriptor from entries.
    #[must_use]
    pub fn from_entries(entries: Vec<AbiEntry>) -> Self {
        Self { entries }
    }

    /// Parses a JSON ABI array.
    ///
    /// # Errors
    ///
    /// Returns the decoder error if `json` is not a valid ABI array.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// All entries in declaration order.
    #[must_use]
    pub fn entries(&self) -> &[AbiEntry] {
        &self.entries
    }

    /// Returns true if the descriptor declares nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates declared functions.
    pub fn functions(&self) -> impl Iterator<Item = &AbiFunction> {
        self.entries.iter().filter_map(|entry| match entry {
            AbiEntry::Function(function) => Some(function),
            _ => None,
        })
    }

    /// Looks up a function by name.
    #[must_use]
    pub fn function(&self, name: &str) -> Option<&AbiFunction> {
        self.functions().find(|function| function.name == name)
    }

    /// Returns the constructor, if declared.
    #[must_use]
    pub fn constructor(&self) -> Option<&AbiConstructor> {
        self.entries.iter().find_map(|entry| match entry {
            AbiEntry::Constructor(constructor) => Some(constructor),
            _ => None,
        })
    }
}

/// One ABI entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AbiEntry {
    /// Callable function.
    Function(AbiFunction),
    /// Deployment constructor.
    Constructor(AbiConstructor),
    /// Anything else (events, errors, fallback); kept only so parsing succeeds.
    #[serde(other)]
    Other,
}

/// Function declaration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbiFunction {
    /// Function name.
    pub name: String,
    /// Parameters.
    #[serde(default)]
    pub inputs: Vec<AbiParam>,
    /// Return values.
    #[serde(default)]
    pub outputs: Vec<AbiParam>,
    /// Declared mutability.
    #[serde(default)]
    pub state_mutability: StateMutability,
}

impl AbiFunction {
    /// Canonical signature, e.g. `add(uint256,uint256)`.
    #[must_use]
    pub fn signature(&self) -> String {
        let params: Vec<&str> = self.inputs.iter().map(|p| p.ty.as_str()).collect();
        format!("{}({})", self.name, params.join(","))
    }

    /// Returns true if the function cannot write storage.
    #[must_use]
    pub fn is_read_only(&self) -> bool {
        matches!(
            self.state_mutability,
            StateMutability::Pure | StateMutability::View
        )
    }
}

/// Constructor declaration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbiConstructor {
    /// Parameters.
    #[serde(default)]
    pub inputs: Vec<AbiParam>,
    /// Declared mutability.
    #[serde(default)]
    pub state_mutability: StateMutability,
}

/// Named, typed parameter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbiParam {
    /// Parameter name (may be empty for return values).
    #[serde(default)]
    pub name: String,
    /// Solidity type name, e.g. `uint256`.
    #[serde(rename = "type")]
    pub ty: String,
}

/// Function mutability.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateMutability {
    /// Reads nothing, writes nothing.
    Pure,
    /// Reads storage only.
    View,
    /// May write storage.
    #[default]
    Nonpayable,
    /// May write storage and accept value.
    Payable,
}

// =============================================================================
// CONTRACT
// =============================================================================

/// Compiled contract: bytecode plus its interface descriptor.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contract {
    /// Bytecode executed from offset 0.
    pub bytecode: Bytes,
    /// Interface descriptor.
    #[serde(default)]
    pub abi: Abi,
}

impl Contract {
    /// Creates a contract with an empty ABI.
    #[must_use]
    pub fn new(bytecode: impl Into<Bytes>) -> Self {
        Self {
            bytecode: bytecode.into(),
            abi: Abi::new(),
        }
    }

    /// Attaches an ABI.
    #[must_use]
    pub fn with_abi(mut self, abi: Abi) -> Self {
        self.abi = abi;
        self
    }

    /// Keccak-256 of the bytecode.
    #[must_use]
    pub fn code_hash(&self) -> Hash {
        keccak256(self.bytecode.as_slice())
    }
}

// =============================================================================
// EXECUTION STATUS
// =============================================================================

/// State of the execution loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExecutionStatus {
    /// More instructions to run.
    Running,
    /// Halted by STOP or by running off the end of the bytecode.
    Stopped,
    /// Aborted by an error.
    Failed,
}

// =============================================================================
// EXECUTION RESULT
// =============================================================================

/// Outcome of one call. Built once by the loop, never mutated afterwards.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExecutionResult {
    /// Whether execution stopped normally.
    pub success: bool,
    /// Top of the final stack as 8 big-endian bytes, or empty.
    pub return_data: Bytes,
    /// Gas consumed, including the unit charged for a faulting instruction.
    pub gas_used: u64,
    /// Failure details (set iff `success` is false).
    pub error: Option<ExecutionFault>,
}

impl ExecutionResult {
    /// Creates a successful result.
    #[must_use]
    pub fn success(return_data: Bytes, gas_used: u64) -> Self {
        Self {
            success: true,
            return_data,
            gas_used,
            error: None,
        }
    }

    /// Creates a failed result.
    #[must_use]
    pub fn failure(fault: ExecutionFault, gas_used: u64) -> Self {
        Self {
            success: false,
            return_data: Bytes::new(),
            gas_used,
            error: Some(fault),
        }
    }

    /// The underlying VM error, if execution failed.
    #[must_use]
    pub fn vm_error(&self) -> Option<&VmError> {
        self.error.as_ref().map(|fault| &fault.error)
    }

    /// Returns true if execution ran out of gas.
    #[must_use]
    pub fn is_out_of_gas(&self) -> bool {
        self.vm_error().is_some_and(VmError::is_out_of_gas)
    }

    /// Decodes the return data as a word. `None` when nothing was returned.
    #[must_use]
    pub fn return_word(&self) -> Option<Word> {
        (self.return_data.len() == WORD_BYTES).then(|| decode_stored_word(self.return_data.as_slice()))
    }
}

// =============================================================================
// VM CONFIGURATION
// =============================================================================

/// Virtual machine configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VmConfig {
    /// Gas budget per call (default: 100 000).
    pub gas_limit: u64,
    /// Maximum stack depth (default: 1024).
    pub max_stack_depth: usize,
    /// Fixed memory size in bytes (default: 4 MiB).
    pub memory_size: usize,
}

impl Default for VmConfig {
    fn default() -> Self {
        Self {
            gas_limit: DEFAULT_GAS_LIMIT,
            max_stack_depth: MAX_STACK_SIZE,
            memory_size: DEFAULT_MEMORY_SIZE,
        }
    }
}

impl VmConfig {
    /// Returns the default config with a different gas budget.
    #[must_use]
    pub fn with_gas_limit(gas_limit: u64) -> Self {
        Self {
            gas_limit,
            ..Self::default()
        }
    }

    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `SVM_GAS_LIMIT`: Gas budget per call (default: 100000)
    /// - `SVM_MAX_STACK_DEPTH`: Stack bound (default: 1024)
    /// - `SVM_MEMORY_SIZE`: Memory size in bytes (default: 4194304)
    ///
    /// Unset or unparsable variables fall back to the default. A set of
    /// values that fails [`VmConfig::validate`] is replaced by the default
    /// config as a whole.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let config = Self {
            gas_limit: env_or("SVM_GAS_LIMIT", defaults.gas_limit),
            max_stack_depth: env_or("SVM_MAX_STACK_DEPTH", defaults.max_stack_depth),
            memory_size: env_or("SVM_MEMORY_SIZE", defaults.memory_size),
        };
        match config.validate() {
            Ok(()) => config,
            Err(error) => {
                warn!(%error, "invalid VM config in environment, using defaults");
                defaults
            }
        }
    }

    /// Parses a JSON document; missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns `Malformed` if the JSON does not decode, or any error from
    /// [`VmConfig::validate`].
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Malformed(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that the configuration can build a machine.
    ///
    /// # Errors
    ///
    /// Returns `ZeroStackDepth`, `ZeroMemory`, or `MemoryTooLarge` when
    /// `memory_size` is above [`MAX_MEMORY_SIZE`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_stack_depth == 0 {
            return Err(ConfigError::ZeroStackDepth);
        }
        if self.memory_size == 0 {
            return Err(ConfigError::ZeroMemory);
        }
        if self.memory_size > MAX_MEMORY_SIZE {
            return Err(ConfigError::MemoryTooLarge {
                size: self.memory_size,
                max: MAX_MEMORY_SIZE,
            });
        }
        Ok(())
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(default)
}

// =============================================================================
// TESTS
// =============================================================================
