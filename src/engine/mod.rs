//! The transactional configuration engine.
//!
//! Composes the leaf modules into the one operation that has cross-file
//! consistency requirements: applying a batch of MCP mutations across many
//! providers with conflict detection, policy-driven resolution, and
//! all-or-nothing rollback.
//!
//! Component layering, leaves first: [`conflict::ConflictDetector`] reads
//! existing config through the store; [`policy::PolicyExecutor`] turns
//! detected conflicts plus a [`ConflictPolicy`](crate::core::ConflictPolicy)
//! into a write plan; [`transaction::TransactionalBatchInstaller`] wraps the
//! plan in a snapshot/rollback boundary; [`scope::ScopeCoordinator`]
//! composes global and project scopes plus instruction injection for one
//! provider.

pub mod conflict;
pub mod policy;
pub mod scope;
pub mod transaction;

pub use conflict::ConflictDetector;
pub use policy::{PolicyExecutor, PolicyOutcome};
pub use scope::{InstructionContent, InstructionFileReport, ScopeCoordinator, ScopeOutcome, ScopeRequest};
pub use transaction::{InstallOptions, TransactionalBatchInstaller};

use crate::core::Scope;
use serde::Serialize;

/// Why a mutation conflicts with a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConflictCode {
    /// The mutation requests a transport kind the provider does not support.
    UnsupportedTransport,
    /// The mutation carries headers but the provider does not support them.
    UnsupportedHeaders,
    /// An entry with the same name already exists with materially different
    /// configuration.
    ExistingMismatch,
}

/// An advisory finding for one (provider, mutation) pair. Conflicts never
/// block by themselves; the [`ConflictPolicy`](crate::core::ConflictPolicy)
/// decides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConflictRecord {
    pub provider_id: String,
    pub server_name: String,
    pub code: ConflictCode,
    pub detail: String,
}

/// The result of attempting one mutation against one provider.
#[derive(Debug, Clone, Serialize)]
pub struct MutationOutcome {
    pub provider_id: String,
    pub server_name: String,
    pub scope: Scope,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl MutationOutcome {
    pub fn ok(provider_id: &str, server_name: &str, scope: Scope) -> Self {
        Self {
            provider_id: provider_id.to_string(),
            server_name: server_name.to_string(),
            scope,
            success: true,
            error: None,
        }
    }

    pub fn failed(provider_id: &str, server_name: &str, scope: Scope, error: String) -> Self {
        Self {
            provider_id: provider_id.to_string(),
            server_name: server_name.to_string(),
            scope,
            success: false,
            error: Some(error),
        }
    }
}

/// A mutation omitted from a batch, with the conflicts that caused it.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedMutation {
    pub provider_id: String,
    pub server_name: String,
    pub conflicts: Vec<ConflictRecord>,
}

/// Outcome of one transactional batch.
#[derive(Debug, Clone, Serialize)]
pub struct BatchResult {
    /// True only when every mutation applied cleanly.
    pub success: bool,
    /// Mutations actually written before any abort point.
    pub applied_count: usize,
    /// Whether snapshots were restored.
    ///
    /// Reports what actually happened rather than mirroring `!success`: a
    /// batch that fails before its first write (a fail-policy abort, or
    /// every mutation unresolved) touched nothing, so there is nothing to
    /// roll back and this stays `false`.
    pub rollback_performed: bool,
    /// Per-provider per-mutation outcomes, in application order.
    pub outcomes: Vec<MutationOutcome>,
    /// All conflicts detected for the batch, regardless of policy.
    pub conflicts: Vec<ConflictRecord>,
    /// Mutations skipped by policy, with their conflicts.
    pub skipped: Vec<SkippedMutation>,
    /// Failures encountered while restoring snapshots. Reported distinctly
    /// from the original write failure, never masked by it.
    pub rollback_errors: Vec<String>,
}
