//! # Execution Service
//!
//! Async host around the VM. Runs each call as its own blocking task,
//! bounded by a semaphore, and keeps running totals.
//!
//! Calls share nothing: every task builds its own machine, so the only shared
//! state here is the statistics block.

use crate::domain::entities::{Contract, ExecutionResult, VmConfig};
use crate::domain::invariants::check_all_invariants;
use crate::domain::value_objects::{Bytes, Hash};
use crate::errors::{ServiceError, VmError};
use crate::evm::interpreter::execute_with_config;
use crate::ports::inbound::{BatchExecutor, ContractExecutor, ExecutionReceipt, ExecutionRequest};
use crate::ports::outbound::ContractCompiler;

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::{RwLock, Semaphore};
use tokio::task::{self, JoinHandle};
use tracing::{debug, info, info_span, instrument, warn};
use uuid::Uuid;

/// Default bound on executions in flight.
pub const DEFAULT_MAX_CONCURRENT_EXECUTIONS: usize = 16;

/// Execution service configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Configuration every call runs under.
    pub vm_config: VmConfig,
    /// Executions allowed in flight at once (at least 1).
    pub max_concurrent_executions: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            vm_config: VmConfig::default(),
            max_concurrent_executions: DEFAULT_MAX_CONCURRENT_EXECUTIONS,
        }
    }
}

/// Statistics for the execution service.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ServiceStats {
    /// Total executions completed.
    pub executions: u64,
    /// Executions that stopped normally.
    pub successful_executions: u64,
    /// Executions that faulted.
    pub failed_executions: u64,
    /// Faulted executions that ran out of gas.
    pub out_of_gas: u64,
    /// Faulted executions that hit a resource bound (gas, stack, memory or
    /// allocator) rather than malformed bytecode.
    pub resource_exhausted: u64,
    /// Total gas consumed.
    pub total_gas_used: u64,
    /// Results that broke a domain invariant.
    pub invariant_violations: u64,
}

/// A call handed to the blocking pool but not yet collected.
struct PendingExecution {
    request_id: Uuid,
    code_hash: Hash,
    handle: JoinHandle<ExecutionResult>,
}

/// The execution service.
///
/// This service:
/// 1. Compiles source through the [`ContractCompiler`] port when asked
/// 2. Runs each call on tokio's blocking pool
/// 3. Checks every result against the domain invariants
/// 4. Maintains execution statistics
pub struct ExecutionService<C: ContractCompiler> {
    /// Service configuration.
    config: ServiceConfig,
    /// Compiler adapter.
    compiler: Arc<C>,
    /// Concurrency limiter.
    permits: Arc<Semaphore>,
    /// Service statistics.
    stats: Arc<RwLock<ServiceStats>>,
}

impl<C: ContractCompiler> ExecutionService<C> {
    /// Create a new execution service.
    pub fn new(compiler: C, config: ServiceConfig) -> Self {
        let permits = Arc::new(Semaphore::new(config.max_concurrent_executions.max(1)));
        Self {
            config,
            compiler: Arc::new(compiler),
            permits,
            stats: Arc::new(RwLock::new(ServiceStats::default())),
        }
    }

    /// Service configuration.
    #[must_use]
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Get current service statistics.
    pub async fn stats(&self) -> ServiceStats {
        self.stats.read().await.clone()
    }

    /// Stops accepting work. Calls already running finish normally; new calls
    /// fail with [`ServiceError::Shutdown`].
    pub fn shutdown(&self) {
        info!("execution service shutting down");
        self.permits.close();
    }

    /// Compiles `source` and executes the result once.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Compile` if the compiler rejects the source, or
    /// any error from [`ContractExecutor::execute`].
    #[instrument(skip(self, source, input), fields(source_len = source.len()))]
    pub async fn compile_and_execute(
        &self,
        source: &str,
        input: Bytes,
    ) -> Result<ExecutionResult, ServiceError> {
        let contract = self.compiler.compile(source)?;
        debug!(
            code_hash = %contract.code_hash(),
            code_len = contract.bytecode.len(),
            "compiled contract"
        );
        self.execute(Arc::new(contract), input).await
    }

    /// Waits for a permit and starts the call on the blocking pool.
    async fn submit(&self, request: ExecutionRequest) -> Result<PendingExecution, ServiceError> {
        let permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|_| ServiceError::Shutdown)?;

        let ExecutionRequest {
            id,
            contract,
            input,
        } = request;
        let code_hash = contract.code_hash();
        let vm_config = self.config.vm_config.clone();
        let span = info_span!("execution", request_id = %id, code_hash = %code_hash);

        let handle = task::spawn_blocking(move || {
            let _permit = permit;
            span.in_scope(|| execute_with_config(&contract, input.as_slice(), &vm_config))
        });

        Ok(PendingExecution {
            request_id: id,
            code_hash,
            handle,
        })
    }

    /// Collects a submitted call and records its outcome.
    async fn complete(&self, pending: PendingExecution) -> Result<ExecutionReceipt, ServiceError> {
        let result = pending
            .handle
            .await
            .map_err(|e| ServiceError::TaskFailed(e.to_string()))?;

        self.record(pending.request_id, &result).await;

        Ok(ExecutionReceipt {
            request_id: pending.request_id,
            code_hash: pending.code_hash,
            result,
        })
    }

    /// Collects every submitted call in order. If `rejected` is set, or any
    /// call fails to join, the finished calls are still recorded and the
    /// first error is returned.
    async fn collect(
        &self,
        pending: Vec<PendingExecution>,
        rejected: Option<ServiceError>,
    ) -> Result<Vec<ExecutionReceipt>, ServiceError> {
        let mut failure = rejected;
        let mut receipts = Vec::with_capacity(pending.len());
        for execution in pending {
            match self.complete(execution).await {
                Ok(receipt) => receipts.push(receipt),
                Err(e) => {
                    failure.get_or_insert(e);
                }
            }
        }

        match failure {
            Some(error) => {
                warn!(recorded = receipts.len(), %error, "batch aborted");
                Err(error)
            }
            None => Ok(receipts),
        }
    }

    async fn record(&self, request_id: Uuid, result: &ExecutionResult) {
        let check = check_all_invariants(result, &self.config.vm_config);
        for violation in check.violations() {
            warn!(%request_id, %violation, "execution result violates invariant");
        }

        let mut stats = self.stats.write().await;
        stats.executions += 1;
        stats.total_gas_used = stats.total_gas_used.saturating_add(result.gas_used);
        if result.success {
            stats.successful_executions += 1;
        } else {
            stats.failed_executions += 1;
            if result.is_out_of_gas() {
                stats.out_of_gas += 1;
            }
            if result.vm_error().is_some_and(VmError::is_resource_exhaustion) {
                stats.resource_exhausted += 1;
            }
        }
        if !check.is_valid() {
            stats.invariant_violations += 1;
        }
    }
}

// =============================================================================
// Port Implementations
// =============================================================================

#[async_trait]
impl<C: ContractCompiler> ContractExecutor for ExecutionService<C> {
    async fn execute(
        &self,
        contract: Arc<Contract>,
        input: Bytes,
    ) -> Result<ExecutionResult, ServiceError> {
        let pending = self.submit(ExecutionRequest::new(contract, input)).await?;
        let receipt = self.complete(pending).await?;
        Ok(receipt.result)
    }

    async fn estimate_gas(&self, contract: Arc<Contract>, input: Bytes) -> Result<u64, ServiceError> {
        let result = self.execute(contract, input).await?;
        match result.error {
            Some(fault) => Err(fault.into()),
            None => Ok(result.gas_used),
        }
    }
}

#[async_trait]
impl<C: ContractCompiler> BatchExecutor for ExecutionService<C> {
    #[instrument(skip_all, fields(batch_size = requests.len()))]
    async fn execute_batch(
        &self,
        requests: Vec<ExecutionRequest>,
    ) -> Result<Vec<ExecutionReceipt>, ServiceError> {
        let mut pending = Vec::with_capacity(requests.len());
        let mut rejected = None;
        for request in requests {
            match self.submit(request).await {
                Ok(execution) => pending.push(execution),
                Err(e) => {
                    rejected = Some(e);
                    break;
                }
            }
        }

        let receipts = self.collect(pending, rejected).await?;

        let succeeded = receipts.iter().filter(|r| r.result.success).count();
        info!(
            total = receipts.len(),
            succeeded,
            "batch execution completed"
        );
        Ok(receipts)
    }
}

// =============================================================================
// TESTS
// =============================================================================
