//! Snapshot-based transactional batch application.
//!
//! Before the first write, the installer captures the prior bytes (or
//! absence) of every distinct file the plan will touch. If any mutation
//! fails mid-batch, every snapshot is restored: files that existed get
//! their exact prior bytes back, files that did not exist are deleted.
//! Snapshots live in memory only; nothing extra is left on disk.

use super::policy::PolicyExecutor;
use super::{BatchResult, MutationOutcome};
use crate::core::{ConflictPolicy, Priority, SyncError};
use crate::lockstate::LockStateStore;
use crate::mcp::McpMutation;
use crate::provider::{Provider, ProviderRegistry, select_by_minimum_priority};
use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Batch-level options.
#[derive(Debug, Clone, Copy)]
pub struct InstallOptions {
    /// Only providers at or above this tier are targeted.
    pub minimum_priority: Priority,
    pub policy: ConflictPolicy,
}

impl Default for InstallOptions {
    fn default() -> Self {
        Self { minimum_priority: Priority::Low, policy: ConflictPolicy::Overwrite }
    }
}

/// Captured prior state of one target file.
struct Snapshot {
    /// Prior bytes, or `None` when the file did not exist.
    prior: Option<Vec<u8>>,
    /// Ancestor directories absent at capture time, deepest first. Writing
    /// the file creates them, so restoring must prune them again.
    created_dirs: Vec<PathBuf>,
}

impl Snapshot {
    fn capture(path: &Path) -> Result<Self> {
        let prior = match fs::read(path) {
            Ok(bytes) => Some(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Cannot snapshot config file: {}", path.display()));
            }
        };

        let mut created_dirs = Vec::new();
        if prior.is_none() {
            let mut ancestor = path.parent();
            while let Some(dir) = ancestor {
                if dir.as_os_str().is_empty() || dir.exists() {
                    break;
                }
                created_dirs.push(dir.to_path_buf());
                ancestor = dir.parent();
            }
        }

        Ok(Self { prior, created_dirs })
    }

    fn restore(&self, path: &Path) -> Result<()> {
        match &self.prior {
            Some(bytes) => crate::utils::atomic_write(path, bytes),
            None => {
                match fs::remove_file(path) {
                    Ok(()) => {}
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                    Err(e) => return Err(e.into()),
                }
                // Prune directories the write created, deepest first. A
                // directory that gained other content stays, and so do its
                // ancestors.
                for dir in &self.created_dirs {
                    if fs::remove_dir(dir).is_err() {
                        break;
                    }
                }
                Ok(())
            }
        }
    }
}

/// Applies a mutation batch across selected providers with all-or-nothing
/// semantics.
pub struct TransactionalBatchInstaller<'a> {
    registry: &'a ProviderRegistry,
    lock_state: Option<&'a LockStateStore>,
}

impl<'a> TransactionalBatchInstaller<'a> {
    pub fn new(registry: &'a ProviderRegistry) -> Self {
        Self { registry, lock_state: None }
    }

    /// Records successful batches in the given lock-state store.
    pub fn with_lock_state(mut self, store: &'a LockStateStore) -> Self {
        self.lock_state = Some(store);
        self
    }

    /// Applies `mutations` to every provider at or above the minimum
    /// priority tier, rolling every touched file back if any mutation
    /// fails.
    ///
    /// An unresolvable scope (a provider with no config file for a
    /// mutation's scope) counts as a failed mutation: the remaining writes
    /// still run, and the batch then rolls back, so the caller sees the
    /// complete account of what would have failed.
    pub async fn install_with_rollback(
        &self,
        providers: &[Provider],
        mutations: &[McpMutation],
        options: &InstallOptions,
        project_dir: &Path,
    ) -> Result<BatchResult> {
        let targets = select_by_minimum_priority(providers, options.minimum_priority);
        let executor = PolicyExecutor::new(self.registry);
        let plan = executor.plan(&targets, mutations, options.policy, project_dir)?;

        // Fail policy with conflicts: aborted before any snapshot or write
        if options.policy == ConflictPolicy::Fail && !plan.conflicts.is_empty() {
            return Ok(BatchResult {
                success: false,
                applied_count: 0,
                rollback_performed: false,
                outcomes: plan.unresolved,
                conflicts: plan.conflicts,
                skipped: plan.skipped,
                rollback_errors: Vec::new(),
            });
        }

        let mut snapshots: BTreeMap<PathBuf, Snapshot> = BTreeMap::new();
        for write in &plan.writes {
            if !snapshots.contains_key(&write.path) {
                snapshots.insert(write.path.clone(), Snapshot::capture(&write.path)?);
            }
        }

        let mut outcomes = plan.unresolved;
        let batch_failed_upfront = !outcomes.is_empty();

        let mut applied_count = 0;
        let mut write_failed = false;
        for write in &plan.writes {
            let scope = write.mutation.scope;
            match executor.apply_write(write) {
                Ok(()) => {
                    applied_count += 1;
                    outcomes.push(MutationOutcome::ok(&write.provider.id, &write.mutation.name, scope));
                }
                Err(e) => {
                    outcomes.push(MutationOutcome::failed(
                        &write.provider.id,
                        &write.mutation.name,
                        scope,
                        format!("{e:#}"),
                    ));
                    write_failed = true;
                    break;
                }
            }
        }

        let success = !write_failed && !batch_failed_upfront;
        let mut rollback_performed = false;
        let mut rollback_errors = Vec::new();

        if !success && applied_count > 0 {
            debug!(files = snapshots.len(), "Batch failed, restoring snapshots");
            rollback_performed = true;
            for (path, snapshot) in &snapshots {
                if let Err(e) = snapshot.restore(path) {
                    rollback_errors.push(
                        SyncError::RollbackFailed {
                            path: path.display().to_string(),
                            reason: format!("{e:#}"),
                        }
                        .to_string(),
                    );
                }
            }
        }

        if success {
            self.record_batch(&targets, mutations).await;
        }

        Ok(BatchResult {
            success,
            applied_count,
            rollback_performed,
            outcomes,
            conflicts: plan.conflicts,
            skipped: plan.skipped,
            rollback_errors,
        })
    }

    /// Removes named server entries from every targeted provider at the
    /// given scope, with the same snapshot/rollback boundary as install.
    pub async fn remove_with_rollback(
        &self,
        providers: &[Provider],
        names: &[String],
        scope: crate::core::Scope,
        minimum_priority: Priority,
        project_dir: &Path,
    ) -> Result<BatchResult> {
        let targets = select_by_minimum_priority(providers, minimum_priority);

        let mut snapshots: BTreeMap<PathBuf, Snapshot> = BTreeMap::new();
        let mut outcomes = Vec::new();
        let mut applied_count = 0;
        let mut write_failed = false;

        'outer: for name in names {
            for provider in &targets {
                let Some(path) = provider.config_path(scope, project_dir) else {
                    continue;
                };
                if !snapshots.contains_key(&path) {
                    snapshots.insert(path.clone(), Snapshot::capture(&path)?);
                }
                match crate::store::remove(&path, provider.format, &provider.config_key, name) {
                    Ok(removed) => {
                        if removed {
                            applied_count += 1;
                            outcomes.push(MutationOutcome::ok(&provider.id, name, scope));
                        }
                    }
                    Err(e) => {
                        outcomes.push(MutationOutcome::failed(
                            &provider.id,
                            name,
                            scope,
                            format!("{e:#}"),
                        ));
                        write_failed = true;
                        break 'outer;
                    }
                }
            }
        }

        let mut rollback_performed = false;
        let mut rollback_errors = Vec::new();
        if write_failed && applied_count > 0 {
            rollback_performed = true;
            for (path, snapshot) in &snapshots {
                if let Err(e) = snapshot.restore(path) {
                    rollback_errors.push(
                        SyncError::RollbackFailed {
                            path: path.display().to_string(),
                            reason: format!("{e:#}"),
                        }
                        .to_string(),
                    );
                }
            }
        }

        if !write_failed {
            if let Some(store) = self.lock_state {
                for name in names {
                    if let Err(e) = store.remove_mcp_server(name).await {
                        warn!(server = %name, error = %format!("{e:#}"), "Could not update lock state");
                    }
                }
            }
        }

        Ok(BatchResult {
            success: !write_failed,
            applied_count,
            rollback_performed,
            outcomes,
            conflicts: Vec::new(),
            skipped: Vec::new(),
            rollback_errors,
        })
    }

    /// Records a successful batch in the lock state. Recording failure
    /// never fails the batch; the config files are already correct.
    async fn record_batch(&self, targets: &[&Provider], mutations: &[McpMutation]) {
        let Some(store) = self.lock_state else {
            return;
        };
        let agents: Vec<String> = targets.iter().map(|p| p.id.clone()).collect();
        for mutation in mutations {
            if let Err(e) = store
                .record_mcp_server(&mutation.name, None, &agents, mutation.scope)
                .await
            {
                warn!(
                    server = %mutation.name,
                    error = %format!("{e:#}"),
                    "Could not record install in lock state"
                );
            }
        }
    }
}
