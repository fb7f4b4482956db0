//! # Static Compiler
//!
//! In-memory [`ContractCompiler`] for tests and embedding. It compiles
//! nothing: sources map to contracts registered up front.

use crate::domain::entities::Contract;
use crate::errors::CompileError;
use crate::ports::outbound::ContractCompiler;
use std::collections::HashMap;

/// Compiler backed by a fixed source-to-contract table.
#[derive(Clone, Debug, Default)]
pub struct StaticCompiler {
    /// Contracts keyed by trimmed source text.
    sources: HashMap<String, Contract>,
    /// Returned for any other non-blank source.
    fallback: Option<Contract>,
}

impl StaticCompiler {
    /// Create a compiler that knows no sources.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a compiler that returns `contract` for every non-blank source.
    #[must_use]
    pub fn always(contract: Contract) -> Self {
        Self {
            sources: HashMap::new(),
            fallback: Some(contract),
        }
    }

    /// Registers `contract` as the output for `source`.
    #[must_use]
    pub fn with_source(mut self, source: &str, contract: Contract) -> Self {
        self.sources.insert(source.trim().to_owned(), contract);
        self
    }
}

impl ContractCompiler for StaticCompiler {
    fn compile(&self, source: &str) -> Result<Contract, CompileError> {
        let source = source.trim();
        if source.is_empty() {
            return Err(CompileError::Parse("empty source".into()));
        }

        self.sources
            .get(source)
            .or(self.fallback.as_ref())
            .cloned()
            .ok_or_else(|| CompileError::Compile(format!("no bytecode for source: {source}")))
    }
}

// =============================================================================
// TESTS
// =============================================================================
