//! # Driving Ports (API - Inbound)
//!
//! Interfaces a host exposes to callers that want bytecode executed.

use crate::domain::entities::{Contract, ExecutionResult};
use crate::domain::value_objects::{Bytes, Hash};
use crate::errors::ServiceError;
use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

// =============================================================================
// EXECUTION REQUEST
// =============================================================================

/// One call to run: a contract, its call data and a correlation id.
#[derive(Clone, Debug)]
pub struct ExecutionRequest {
    /// Correlation id, echoed in the receipt and in log spans.
    pub id: Uuid,
    /// Contract to execute.
    pub contract: Arc<Contract>,
    /// Call data.
    pub input: Bytes,
}

impl ExecutionRequest {
    /// Creates a request with a fresh random id.
    #[must_use]
    pub fn new(contract: Arc<Contract>, input: impl Into<Bytes>) -> Self {
        Self {
            id: Uuid::new_v4(),
            contract,
            input: input.into(),
        }
    }
}

/// Outcome of one request in a batch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExecutionReceipt {
    /// Id of the request this answers.
    pub request_id: Uuid,
    /// Keccak-256 of the executed bytecode.
    pub code_hash: Hash,
    /// What the VM returned.
    pub result: ExecutionResult,
}

// =============================================================================
// CONTRACT EXECUTOR (Primary Driving Port)
// =============================================================================

/// Primary API for contract execution.
///
/// ## Usage
///
/// ```ignore
/// let result = executor.execute(contract, Bytes::new()).await?;
/// ```
#[async_trait]
pub trait ContractExecutor: Send + Sync {
    /// Executes a contract once.
    ///
    /// A VM fault is not an `Err`: it comes back inside the
    /// [`ExecutionResult`]. `Err` means the host could not run the call.
    async fn execute(
        &self,
        contract: Arc<Contract>,
        input: Bytes,
    ) -> Result<ExecutionResult, ServiceError>;

    /// Gas a call consumes when it succeeds.
    ///
    /// # Returns
    ///
    /// * `u64` - Gas used by a successful run
    /// * `ServiceError::Execution` - The run faulted
    async fn estimate_gas(&self, contract: Arc<Contract>, input: Bytes) -> Result<u64, ServiceError>;
}

// =============================================================================
// BATCH EXECUTOR
// =============================================================================

/// Executes many independent calls.
#[async_trait]
pub trait BatchExecutor: Send + Sync {
    /// Executes every request.
    ///
    /// Requests share nothing, so they may run concurrently. One failing
    /// request does not affect the others. Receipts come back in request
    /// order.
    async fn execute_batch(
        &self,
        requests: Vec<ExecutionRequest>,
    ) -> Result<Vec<ExecutionReceipt>, ServiceError>;
}

// =============================================================================
// TESTS
// =============================================================================
