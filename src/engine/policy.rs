//! Policy-driven execution planning.
//!
//! The executor is split into [`PolicyExecutor::plan`], which decides what
//! would be written without touching anything, and per-write application.
//! The split exists so the transactional installer can snapshot every
//! target file after planning and before the first write.

use super::conflict::ConflictDetector;
use super::{ConflictRecord, MutationOutcome, SkippedMutation};
use crate::core::ConflictPolicy;
use crate::mcp::McpMutation;
use crate::provider::{Provider, ProviderRegistry};
use crate::store;
use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing::debug;

/// One write the plan has committed to: a concrete (provider, mutation)
/// pair with its resolved config path.
pub struct PlannedWrite<'p> {
    pub provider: &'p Provider,
    pub mutation: &'p McpMutation,
    pub path: PathBuf,
}

/// The decided shape of a batch before any file is touched.
pub struct ExecutionPlan<'p> {
    /// Writes to perform, in mutation order (each mutation fans out across
    /// providers before the next mutation is considered).
    pub writes: Vec<PlannedWrite<'p>>,
    /// Pairs whose provider has no config file for the mutation's scope.
    /// Already failures; they never become writes.
    pub unresolved: Vec<MutationOutcome>,
    /// Pairs withheld by policy.
    pub skipped: Vec<SkippedMutation>,
    /// Every conflict detected for the batch, regardless of policy.
    pub conflicts: Vec<ConflictRecord>,
}

/// What a plan-and-apply run did, pair by pair.
#[derive(Debug, Clone)]
pub struct PolicyOutcome {
    /// Attempted pairs, successful or failed, in application order.
    pub applied: Vec<MutationOutcome>,
    /// Pairs withheld by policy.
    pub skipped: Vec<SkippedMutation>,
    /// Every conflict detected for the batch.
    pub conflicts: Vec<ConflictRecord>,
}

pub struct PolicyExecutor<'a> {
    registry: &'a ProviderRegistry,
}

impl<'a> PolicyExecutor<'a> {
    pub fn new(registry: &'a ProviderRegistry) -> Self {
        Self { registry }
    }

    /// Runs conflict detection and resolves the policy into a plan.
    ///
    /// Under [`ConflictPolicy::Fail`], any conflict empties the plan: all
    /// pairs move to `skipped` and nothing will be written. Under
    /// [`ConflictPolicy::Skip`], only the conflicting pairs are withheld.
    /// [`ConflictPolicy::Overwrite`] plans every resolvable pair.
    pub fn plan<'p>(
        &self,
        providers: &[&'p Provider],
        mutations: &'p [McpMutation],
        policy: ConflictPolicy,
        project_dir: &Path,
    ) -> Result<ExecutionPlan<'p>> {
        let conflicts = ConflictDetector::new(self.registry).detect(providers, mutations, project_dir)?;
        let abort_all = policy == ConflictPolicy::Fail && !conflicts.is_empty();

        let mut plan = ExecutionPlan {
            writes: Vec::new(),
            unresolved: Vec::new(),
            skipped: Vec::new(),
            conflicts,
        };

        for mutation in mutations {
            for provider in providers {
                let Some(path) = provider.config_path(mutation.scope, project_dir) else {
                    plan.unresolved.push(MutationOutcome::failed(
                        &provider.id,
                        &mutation.name,
                        mutation.scope,
                        format!("provider '{}' has no {} config file", provider.id, mutation.scope),
                    ));
                    continue;
                };

                let pair_conflicts: Vec<ConflictRecord> = plan
                    .conflicts
                    .iter()
                    .filter(|c| c.provider_id == provider.id && c.server_name == mutation.name)
                    .cloned()
                    .collect();

                let withheld = abort_all
                    || (policy == ConflictPolicy::Skip && !pair_conflicts.is_empty());
                if withheld {
                    plan.skipped.push(SkippedMutation {
                        provider_id: provider.id.clone(),
                        server_name: mutation.name.clone(),
                        conflicts: pair_conflicts,
                    });
                } else {
                    plan.writes.push(PlannedWrite { provider, mutation, path });
                }
            }
        }

        Ok(plan)
    }

    /// Performs one planned write: transform to the provider's native shape,
    /// then leaf-merge into the config file.
    pub fn apply_write(&self, write: &PlannedWrite<'_>) -> Result<()> {
        let transform = self.registry.transform_for(write.provider);
        let native = transform(&write.mutation.name, &write.mutation.spec);
        debug!(
            provider = %write.provider.id,
            server = %write.mutation.name,
            file = %write.path.display(),
            "Writing MCP server entry"
        );
        store::write(
            &write.path,
            write.provider.format,
            &write.provider.config_key,
            &write.mutation.name,
            &native,
        )
    }

    /// Plans and applies in one step, without snapshots or rollback.
    ///
    /// Per-write failures become failed [`MutationOutcome`]s rather than
    /// propagating, so a batch always yields a complete account. Callers
    /// that need all-or-nothing semantics go through
    /// [`super::TransactionalBatchInstaller`] instead.
    pub fn apply(
        &self,
        providers: &[&Provider],
        mutations: &[McpMutation],
        policy: ConflictPolicy,
        project_dir: &Path,
    ) -> Result<PolicyOutcome> {
        let plan = self.plan(providers, mutations, policy, project_dir)?;

        let mut applied = plan.unresolved;
        for write in &plan.writes {
            let scope = write.mutation.scope;
            match self.apply_write(write) {
                Ok(()) => {
                    applied.push(MutationOutcome::ok(&write.provider.id, &write.mutation.name, scope));
                }
                Err(e) => {
                    applied.push(MutationOutcome::failed(
                        &write.provider.id,
                        &write.mutation.name,
                        scope,
                        format!("{e:#}"),
                    ));
                }
            }
        }

        Ok(PolicyOutcome {
            applied,
            skipped: plan.skipped,
            conflicts: plan.conflicts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Priority, Scope};
    use crate::mcp::ServerSpec;
    use crate::provider::test_fixtures::provider;
    use tempfile::TempDir;

    fn stdio_mutation(name: &str, command: &str) -> McpMutation {
        McpMutation::new(
            name,
            ServerSpec::Command { command: command.into(), args: vec![] },
            Scope::Project,
        )
    }

    #[test]
    fn test_fail_policy_empties_plan_on_any_conflict() {
        let temp = TempDir::new().unwrap();
        let registry =
            ProviderRegistry::from_providers(vec![provider("agent", Priority::High, temp.path())])
                .unwrap();
        let p = registry.get("agent").unwrap();

        // Seed a mismatching entry so "docs" conflicts; "clean" does not
        let path = p.config_path(Scope::Project, temp.path()).unwrap();
        crate::utils::ensure_dir(path.parent().unwrap()).unwrap();
        store::write(&path, p.format, &p.config_key, "docs", &serde_json::json!({"command": "other"}))
            .unwrap();

        let mutations = vec![stdio_mutation("docs", "serve"), stdio_mutation("clean", "run")];
        let targets: Vec<&Provider> = registry.all().iter().collect();
        let plan = PolicyExecutor::new(&registry)
            .plan(&targets, &mutations, ConflictPolicy::Fail, temp.path())
            .unwrap();

        assert!(plan.writes.is_empty());
        assert_eq!(plan.skipped.len(), 2);
        assert_eq!(plan.conflicts.len(), 1);
        // The non-conflicting pair is withheld with no conflicts of its own
        assert!(plan.skipped.iter().any(|s| s.server_name == "clean" && s.conflicts.is_empty()));
    }

    #[test]
    fn test_skip_policy_withholds_only_conflicting_pairs() {
        let temp = TempDir::new().unwrap();
        let registry =
            ProviderRegistry::from_providers(vec![provider("agent", Priority::High, temp.path())])
                .unwrap();
        let p = registry.get("agent").unwrap();

        let path = p.config_path(Scope::Project, temp.path()).unwrap();
        crate::utils::ensure_dir(path.parent().unwrap()).unwrap();
        store::write(&path, p.format, &p.config_key, "docs", &serde_json::json!({"command": "other"}))
            .unwrap();

        let mutations = vec![stdio_mutation("docs", "serve"), stdio_mutation("clean", "run")];
        let targets: Vec<&Provider> = registry.all().iter().collect();
        let outcome = PolicyExecutor::new(&registry)
            .apply(&targets, &mutations, ConflictPolicy::Skip, temp.path())
            .unwrap();

        assert_eq!(outcome.skipped.len(), 1);
        assert_eq!(outcome.skipped[0].server_name, "docs");
        assert_eq!(outcome.applied.len(), 1);
        assert!(outcome.applied[0].success);

        // The skipped entry kept its prior value
        let root = store::read(&path, p.format).unwrap();
        assert_eq!(root[&p.config_key]["docs"]["command"], "other");
        assert_eq!(root[&p.config_key]["clean"]["command"], "run");
    }

    #[test]
    fn test_overwrite_policy_replaces_mismatched_entry() {
        let temp = TempDir::new().unwrap();
        let registry =
            ProviderRegistry::from_providers(vec![provider("agent", Priority::High, temp.path())])
                .unwrap();
        let p = registry.get("agent").unwrap();

        let path = p.config_path(Scope::Project, temp.path()).unwrap();
        crate::utils::ensure_dir(path.parent().unwrap()).unwrap();
        store::write(&path, p.format, &p.config_key, "docs", &serde_json::json!({"command": "other"}))
            .unwrap();

        let mutations = vec![stdio_mutation("docs", "serve")];
        let targets: Vec<&Provider> = registry.all().iter().collect();
        let outcome = PolicyExecutor::new(&registry)
            .apply(&targets, &mutations, ConflictPolicy::Overwrite, temp.path())
            .unwrap();

        // The conflict is still reported even though the write proceeded
        assert_eq!(outcome.conflicts.len(), 1);
        assert!(outcome.applied[0].success);
        let root = store::read(&path, p.format).unwrap();
        assert_eq!(root[&p.config_key]["docs"]["command"], "serve");
    }

    #[test]
    fn test_unresolvable_scope_is_a_failed_outcome() {
        let temp = TempDir::new().unwrap();
        let mut p = provider("global-only", Priority::High, temp.path());
        p.project_config_path = None;
        let registry = ProviderRegistry::from_providers(vec![p]).unwrap();

        let mutations = vec![stdio_mutation("docs", "serve")];
        let targets: Vec<&Provider> = registry.all().iter().collect();
        let plan = PolicyExecutor::new(&registry)
            .plan(&targets, &mutations, ConflictPolicy::Overwrite, temp.path())
            .unwrap();

        assert!(plan.writes.is_empty());
        assert_eq!(plan.unresolved.len(), 1);
        assert!(!plan.unresolved[0].success);
        assert!(plan.unresolved[0].error.as_ref().unwrap().contains("no project config file"));
    }
}
