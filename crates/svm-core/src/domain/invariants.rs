//! # Domain Invariants
//!
//! Properties every [`ExecutionResult`] must satisfy. Hosts check them after
//! each run and log anything that slips through.

use crate::domain::entities::{ExecutionResult, VmConfig};
use crate::domain::value_objects::WORD_BYTES;
use std::fmt;

// =============================================================================
// INVARIANT CHECKS
// =============================================================================

/// Gas used never exceeds the budget.
#[must_use]
pub fn check_gas_limit_invariant(result: &ExecutionResult, config: &VmConfig) -> bool {
    result.gas_used <= config.gas_limit
}

/// `success` is set exactly when there is no error.
#[must_use]
pub fn check_outcome_invariant(result: &ExecutionResult) -> bool {
    result.success == result.error.is_none()
}

/// A failed run returns nothing.
#[must_use]
pub fn check_failure_data_invariant(result: &ExecutionResult) -> bool {
    result.success || result.return_data.is_empty()
}

/// A successful run returns either nothing or exactly one word.
#[must_use]
pub fn check_return_width_invariant(result: &ExecutionResult) -> bool {
    !result.success || matches!(result.return_data.len(), 0 | WORD_BYTES)
}

/// Check all invariants at once.
#[must_use]
pub fn check_all_invariants(result: &ExecutionResult, config: &VmConfig) -> InvariantCheckResult {
    let mut violations = Vec::new();

    if !check_gas_limit_invariant(result, config) {
        violations.push(InvariantViolation::GasLimitExceeded {
            used: result.gas_used,
            limit: config.gas_limit,
        });
    }

    if !check_outcome_invariant(result) {
        violations.push(InvariantViolation::InconsistentOutcome {
            success: result.success,
        });
    }

    if !check_failure_data_invariant(result) {
        violations.push(InvariantViolation::DataOnFailure {
            len: result.return_data.len(),
        });
    }

    if !check_return_width_invariant(result) {
        violations.push(InvariantViolation::ReturnWidth {
            len: result.return_data.len(),
        });
    }

    if violations.is_empty() {
        InvariantCheckResult::Valid
    } else {
        InvariantCheckResult::Invalid(violations)
    }
}

// =============================================================================
// INVARIANT TYPES
// =============================================================================

/// Result of checking all invariants.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InvariantCheckResult {
    /// All invariants hold.
    Valid,
    /// One or more invariants violated.
    Invalid(Vec<InvariantViolation>),
}

impl InvariantCheckResult {
    /// Returns true if all invariants hold.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    /// Violations found, empty when valid.
    #[must_use]
    pub fn violations(&self) -> &[InvariantViolation] {
        match self {
            Self::Valid => &[],
            Self::Invalid(violations) => violations,
        }
    }
}

/// Specific invariant violation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InvariantViolation {
    /// Gas used is above the budget.
    GasLimitExceeded {
        /// Gas the result reports.
        used: u64,
        /// Configured budget.
        limit: u64,
    },
    /// `success` disagrees with the presence of an error.
    InconsistentOutcome {
        /// Reported success flag.
        success: bool,
    },
    /// A failed run carried return data.
    DataOnFailure {
        /// Return data length.
        len: usize,
    },
    /// Return data is neither empty nor one word.
    ReturnWidth {
        /// Return data length.
        len: usize,
    },
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GasLimitExceeded { used, limit } => {
                write!(f, "gas limit exceeded: used {used} > limit {limit}")
            }
            Self::InconsistentOutcome { success } => {
                write!(f, "success={success} disagrees with error field")
            }
            Self::DataOnFailure { len } => {
                write!(f, "failed execution returned {len} bytes")
            }
            Self::ReturnWidth { len } => {
                write!(f, "return data is {len} bytes, expected 0 or {WORD_BYTES}")
            }
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
