//! Conflict detection for a batch of mutations against a provider set.
//!
//! Detection is read-only and advisory. Every (provider, mutation) pair is
//! checked independently, and every finding is reported even when a later
//! policy would allow the write to proceed, so callers can show the full
//! picture before deciding anything.

use super::{ConflictCode, ConflictRecord};
use crate::mcp::McpMutation;
use crate::provider::{Provider, ProviderRegistry};
use crate::store;
use anyhow::Result;
use std::path::Path;
use tracing::debug;

pub struct ConflictDetector<'a> {
    registry: &'a ProviderRegistry,
}

impl<'a> ConflictDetector<'a> {
    pub fn new(registry: &'a ProviderRegistry) -> Self {
        Self { registry }
    }

    /// Checks every mutation against every provider and returns all
    /// findings.
    ///
    /// A provider with no config file for the mutation's scope produces no
    /// findings here; scope applicability is the planner's concern. Reading
    /// an existing config file that turns out to be malformed is an error,
    /// not a conflict: detection cannot honestly answer the mismatch
    /// question without parsing the file.
    pub fn detect(
        &self,
        providers: &[&Provider],
        mutations: &[McpMutation],
        project_dir: &Path,
    ) -> Result<Vec<ConflictRecord>> {
        let mut conflicts = Vec::new();

        for provider in providers {
            for mutation in mutations {
                let Some(path) = provider.config_path(mutation.scope, project_dir) else {
                    continue;
                };

                let transport = mutation.spec.transport_kind();
                if !provider.supports_transport(transport) {
                    conflicts.push(ConflictRecord {
                        provider_id: provider.id.clone(),
                        server_name: mutation.name.clone(),
                        code: ConflictCode::UnsupportedTransport,
                        detail: format!(
                            "server '{}' needs {transport} transport, provider supports: {}",
                            mutation.name,
                            provider
                                .supported_transports
                                .iter()
                                .map(|t| t.as_str())
                                .collect::<Vec<_>>()
                                .join(", ")
                        ),
                    });
                }

                if mutation.spec.has_headers() && !provider.supports_headers {
                    conflicts.push(ConflictRecord {
                        provider_id: provider.id.clone(),
                        server_name: mutation.name.clone(),
                        code: ConflictCode::UnsupportedHeaders,
                        detail: format!(
                            "server '{}' sends custom headers, which '{}' cannot express",
                            mutation.name, provider.id
                        ),
                    });
                }

                if path.exists() {
                    let root = store::read(&path, provider.format)?;
                    if let Some(existing) = store::get_entry(&root, &provider.config_key, &mutation.name) {
                        let transform = self.registry.transform_for(provider);
                        let proposed = transform(&mutation.name, &mutation.spec);
                        if *existing != proposed {
                            debug!(
                                provider = %provider.id,
                                server = %mutation.name,
                                file = %path.display(),
                                "Existing entry differs from proposed configuration"
                            );
                            conflicts.push(ConflictRecord {
                                provider_id: provider.id.clone(),
                                server_name: mutation.name.clone(),
                                code: ConflictCode::ExistingMismatch,
                                detail: format!(
                                    "'{}' already configures server '{}' differently in {}",
                                    provider.id,
                                    mutation.name,
                                    path.display()
                                ),
                            });
                        }
                    }
                }
            }
        }

        Ok(conflicts)
    }
}
