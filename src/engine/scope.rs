//! Global/project scope coordination and instruction fan-out.
//!
//! Two jobs live here: configuring one provider at both scopes in a single
//! request, and updating instruction files for many providers without
//! touching any file twice. Several providers resolve their project
//! instruction file to the same path (`AGENTS.md` is the common case), so
//! the fan-out dedupes by resolved path and performs exactly one injection
//! per file.

use super::transaction::{InstallOptions, TransactionalBatchInstaller};
use super::MutationOutcome;
use crate::core::{ConfigFormat, ConflictPolicy, Priority, Scope};
use crate::instructions::{InjectAction, InstructionInjector};
use crate::mcp::{McpMutation, ServerSpec};
use crate::provider::{Provider, ProviderRegistry};
use anyhow::Result;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Instruction content for a scope request.
pub enum InstructionContent {
    /// The same content at both scopes.
    Shared(String),
    /// Distinct content per scope; `None` leaves that scope's file alone.
    PerScope { global: Option<String>, project: Option<String> },
}

impl InstructionContent {
    fn for_scope(&self, scope: Scope) -> Option<&str> {
        match self {
            Self::Shared(content) => Some(content),
            Self::PerScope { global, project } => match scope {
                Scope::Global => global.as_deref(),
                Scope::Project => project.as_deref(),
            },
        }
    }
}

/// One provider's servers and instructions, across both scopes.
pub struct ScopeRequest {
    pub global_servers: Vec<(String, ServerSpec)>,
    pub project_servers: Vec<(String, ServerSpec)>,
    pub instructions: Option<InstructionContent>,
    pub policy: ConflictPolicy,
}

/// What a scope request did, per scope.
pub struct ScopeOutcome {
    pub global: Vec<MutationOutcome>,
    pub project: Vec<MutationOutcome>,
    /// Instruction file action per scope that had content and a resolvable
    /// path.
    pub instructions: BTreeMap<Scope, InjectAction>,
}

/// One instruction file touched by a fan-out, with every provider that
/// resolves to it.
#[derive(Debug, Serialize)]
pub struct InstructionFileReport {
    pub path: PathBuf,
    pub action: InjectAction,
    /// Ids of all providers sharing this file, in provider order.
    pub providers: Vec<String>,
    /// Distinct config formats among those providers.
    pub formats: Vec<ConfigFormat>,
}

pub struct ScopeCoordinator<'a> {
    registry: &'a ProviderRegistry,
    injector: &'a dyn InstructionInjector,
}

impl<'a> ScopeCoordinator<'a> {
    pub fn new(registry: &'a ProviderRegistry, injector: &'a dyn InstructionInjector) -> Self {
        Self { registry, injector }
    }

    /// Configures one provider at global and project scope in a single
    /// request. Each scope runs as its own transactional batch: a project
    /// failure rolls back project files but leaves completed global work in
    /// place.
    pub async fn configure_global_and_project(
        &self,
        provider: &Provider,
        request: &ScopeRequest,
        project_dir: &Path,
    ) -> Result<ScopeOutcome> {
        let installer = TransactionalBatchInstaller::new(self.registry);
        let providers = std::slice::from_ref(provider);
        let options = InstallOptions { minimum_priority: Priority::Low, policy: request.policy };

        let mut outcome = ScopeOutcome {
            global: Vec::new(),
            project: Vec::new(),
            instructions: BTreeMap::new(),
        };

        for scope in [Scope::Global, Scope::Project] {
            let servers = match scope {
                Scope::Global => &request.global_servers,
                Scope::Project => &request.project_servers,
            };
            if !servers.is_empty() {
                let mutations: Vec<McpMutation> = servers
                    .iter()
                    .map(|(name, spec)| McpMutation::new(name.clone(), spec.clone(), scope))
                    .collect();
                let batch = installer
                    .install_with_rollback(providers, &mutations, &options, project_dir)
                    .await?;
                match scope {
                    Scope::Global => outcome.global = batch.outcomes,
                    Scope::Project => outcome.project = batch.outcomes,
                }
            }

            if let Some(instructions) = &request.instructions {
                if let Some(content) = instructions.for_scope(scope) {
                    if let Some(path) = provider.instructions_path(scope, project_dir) {
                        let action = self.injector.inject(&path, content)?;
                        outcome.instructions.insert(scope, action);
                    }
                }
            }
        }

        Ok(outcome)
    }

    /// Updates instruction files for many providers as a single pass over
    /// the distinct resolved paths. A file shared by several providers is
    /// written exactly once, and the report names every provider behind it.
    pub fn update_instructions_single_operation(
        &self,
        providers: &[&Provider],
        scope: Scope,
        content: &str,
        project_dir: &Path,
    ) -> Result<Vec<InstructionFileReport>> {
        let mut by_path: BTreeMap<PathBuf, (Vec<String>, Vec<ConfigFormat>)> = BTreeMap::new();
        for provider in providers {
            let Some(path) = provider.instructions_path(scope, project_dir) else {
                continue;
            };
            let (ids, formats) = by_path.entry(path).or_default();
            ids.push(provider.id.clone());
            if !formats.contains(&provider.format) {
                formats.push(provider.format);
            }
        }

        let mut reports = Vec::new();
        for (path, (providers, formats)) in by_path {
            let action = self.injector.inject(&path, content)?;
            debug!(
                file = %path.display(),
                providers = providers.len(),
                ?action,
                "Instruction file updated"
            );
            reports.push(InstructionFileReport { path, action, providers, formats });
        }
        Ok(reports)
    }
}
