//! Provider descriptors and the provider registry.
//!
//! A [`Provider`] is a static description of one AI coding agent: where its
//! config files live per scope, which format they use, which dot-path key
//! holds MCP server entries, and which transports it supports. Descriptors
//! are immutable for the process lifetime and owned by the
//! [`ProviderRegistry`].
//!
//! The registry is an explicitly constructed value passed into the engine,
//! not a process-wide singleton; tests build one against a temp home via
//! [`ProviderRegistry::with_home`].

mod registry;
mod selector;
pub mod transform;

pub use registry::{HOME_ENV, ProviderRegistry, resolve_home};
pub use selector::select_by_minimum_priority;

use crate::core::{ConfigFormat, Priority, ProviderStatus, Scope, TransportKind};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Static descriptor for one provider target.
#[derive(Debug, Clone, Serialize)]
pub struct Provider {
    /// Canonical identifier, e.g. `claude-code`.
    pub id: String,
    /// Alternate names accepted on lookup.
    pub aliases: Vec<String>,
    pub priority: Priority,
    pub status: ProviderStatus,
    /// Format of the provider's config files.
    pub format: ConfigFormat,
    /// Dot-path key under which MCP server entries live.
    pub config_key: String,
    /// Absolute path of the global-scope config file.
    pub global_config_path: PathBuf,
    /// Project-scope config file, relative to the project directory.
    /// `None` means the provider has no project scope.
    pub project_config_path: Option<String>,
    pub supported_transports: Vec<TransportKind>,
    pub supports_headers: bool,
    /// Absolute path of the global instruction file, if the provider has one.
    pub global_instructions_path: Option<PathBuf>,
    /// Instruction file name relative to the project directory.
    pub project_instructions_file: Option<String>,
    /// Identifier of the config transform used for this provider's native
    /// shape; validated against the transform registry at load time.
    pub transform: String,
}

impl Provider {
    /// Resolves the config file path for a scope, or `None` when the
    /// provider has no file for that scope.
    pub fn config_path(&self, scope: Scope, project_dir: &Path) -> Option<PathBuf> {
        match scope {
            Scope::Global => Some(self.global_config_path.clone()),
            Scope::Project => {
                self.project_config_path.as_ref().map(|rel| project_dir.join(rel))
            }
        }
    }

    /// Resolves the instruction file path for a scope, if any.
    pub fn instructions_path(&self, scope: Scope, project_dir: &Path) -> Option<PathBuf> {
        match scope {
            Scope::Global => self.global_instructions_path.clone(),
            Scope::Project => {
                self.project_instructions_file.as_ref().map(|name| project_dir.join(name))
            }
        }
    }

    pub fn supports_transport(&self, kind: TransportKind) -> bool {
        self.supported_transports.contains(&kind)
    }

    /// Whether the identifier or any alias matches (case-insensitive).
    pub fn matches(&self, name: &str) -> bool {
        let name = name.trim();
        self.id.eq_ignore_ascii_case(name)
            || self.aliases.iter().any(|a| a.eq_ignore_ascii_case(name))
    }
}
