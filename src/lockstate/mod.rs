//! Durable record of installed artifacts, guarded against concurrent CLI
//! invocations.
//!
//! The lock file is a single JSON document under the mcpsync home directory
//! recording installed skills, MCP servers, and the last provider
//! selection. It is created lazily with empty maps on first read, mutated
//! only through the guarded read-modify-write in
//! [`LockStateStore::update`], and written atomically (unique temp file in
//! the same directory, then renamed into place) so the visible file is
//! always a complete prior or current version.
//!
//! A corrupt lock file is treated as recoverable: [`LockStateStore::read`]
//! logs a warning and returns a fresh empty state, favoring availability
//! over strict auditability.

mod guard;

pub use guard::{GuardConfig, LockGuard};

use crate::core::Scope;
use crate::utils::atomic_write;
use anyhow::{Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Current lock file schema version.
pub const LOCK_FILE_VERSION: u32 = 1;

/// Name of the persisted state file inside the mcpsync home directory.
pub const LOCK_FILE_NAME: &str = "lockfile.json";

/// Install metadata for one artifact (skill or MCP server).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockEntry {
    /// Where the artifact came from (registry name, URL, or local path).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// RFC3339 timestamp of first install.
    pub installed_at: String,
    /// RFC3339 timestamp of the most recent update.
    pub updated_at: String,
    /// Provider ids this artifact is linked into.
    #[serde(default)]
    pub agents: Vec<String>,
    /// Canonical path of the installed artifact, if file-backed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Whether the artifact was installed at global scope.
    #[serde(default)]
    pub global: bool,
}

/// Versioned persisted record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockFile {
    pub version: u32,
    #[serde(default)]
    pub skills: BTreeMap<String, LockEntry>,
    #[serde(default)]
    pub mcp_servers: BTreeMap<String, LockEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_selected_agents: Option<Vec<String>>,
}

impl Default for LockFile {
    fn default() -> Self {
        Self {
            version: LOCK_FILE_VERSION,
            skills: BTreeMap::new(),
            mcp_servers: BTreeMap::new(),
            last_selected_agents: None,
        }
    }
}

impl LockFile {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Guarded store for the lock file.
pub struct LockStateStore {
    path: PathBuf,
    guard_config: GuardConfig,
}

impl LockStateStore {
    /// Store rooted at an explicit state directory.
    pub fn new(state_dir: &Path) -> Self {
        Self::with_guard_config(state_dir, GuardConfig::default())
    }

    pub fn with_guard_config(state_dir: &Path, guard_config: GuardConfig) -> Self {
        Self { path: state_dir.join(LOCK_FILE_NAME), guard_config }
    }

    /// Store rooted at the default mcpsync home (`MCPSYNC_HOME` or
    /// `~/.mcpsync`).
    pub fn open_default() -> Result<Self> {
        let home = crate::provider::resolve_home()?;
        Ok(Self::new(&home.join(".mcpsync")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn guard_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".lock");
        self.path.with_file_name(name)
    }

    /// Reads the current state. Never fails: a missing file or unparsable
    /// content yields a fresh empty [`LockFile`].
    pub fn read(&self) -> LockFile {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!(file = %self.path.display(), error = %e, "Could not read lock file, starting fresh");
                }
                return LockFile::new();
            }
        };
        if content.trim().is_empty() {
            return LockFile::new();
        }
        match serde_json::from_str(&content) {
            Ok(state) => state,
            Err(e) => {
                warn!(file = %self.path.display(), error = %e, "Lock file is corrupt, starting fresh");
                LockFile::new()
            }
        }
    }

    /// Acquires the guard, reads the current state, applies `mutator`,
    /// writes the result atomically, and returns the mutated state.
    ///
    /// The guard is released even when the mutator fails; in that case
    /// nothing is written and the error propagates.
    pub async fn update<F>(&self, mutator: F) -> Result<LockFile>
    where
        F: FnOnce(&mut LockFile) -> Result<()>,
    {
        let _guard = LockGuard::acquire(&self.guard_path(), self.guard_config).await?;

        let mut state = self.read();
        mutator(&mut state)?;

        let mut content = serde_json::to_string_pretty(&state)
            .context("Failed to serialize lock file")?;
        content.push('\n');
        atomic_write(&self.path, content.as_bytes())
            .with_context(|| format!("Cannot write lock file: {}", self.path.display()))?;

        Ok(state)
    }

    /// Records (or refreshes) an installed MCP server entry, merging the
    /// linked provider ids.
    pub async fn record_mcp_server(
        &self,
        name: &str,
        source: Option<&str>,
        agents: &[String],
        scope: Scope,
    ) -> Result<LockFile> {
        let name = name.to_string();
        let source = source.map(str::to_string);
        let agents = agents.to_vec();
        self.update(move |state| {
            let now = Utc::now().to_rfc3339();
            match state.mcp_servers.get_mut(&name) {
                Some(entry) => {
                    entry.updated_at = now;
                    entry.global = scope == Scope::Global;
                    if source.is_some() {
                        entry.source = source;
                    }
                    for agent in agents {
                        if !entry.agents.contains(&agent) {
                            entry.agents.push(agent);
                        }
                    }
                }
                None => {
                    state.mcp_servers.insert(
                        name,
                        LockEntry {
                            source,
                            installed_at: now.clone(),
                            updated_at: now,
                            agents,
                            path: None,
                            global: scope == Scope::Global,
                        },
                    );
                }
            }
            Ok(())
        })
        .await
    }

    /// Drops an MCP server entry. Unknown names are a no-op.
    pub async fn remove_mcp_server(&self, name: &str) -> Result<LockFile> {
        let name = name.to_string();
        self.update(move |state| {
            state.mcp_servers.remove(&name);
            Ok(())
        })
        .await
    }

    /// Records an installed skill.
    pub async fn record_skill(
        &self,
        name: &str,
        source: Option<&str>,
        path: &Path,
        agents: &[String],
        global: bool,
    ) -> Result<LockFile> {
        let name = name.to_string();
        let source = source.map(str::to_string);
        let path = path.display().to_string();
        let agents = agents.to_vec();
        self.update(move |state| {
            let now = Utc::now().to_rfc3339();
            let installed_at = state
                .skills
                .get(&name)
                .map_or_else(|| now.clone(), |e| e.installed_at.clone());
            state.skills.insert(
                name,
                LockEntry {
                    source,
                    installed_at,
                    updated_at: now,
                    agents,
                    path: Some(path),
                    global,
                },
            );
            Ok(())
        })
        .await
    }

    /// Remembers the provider set the user last targeted.
    pub async fn set_last_selected_agents(&self, agents: Vec<String>) -> Result<LockFile> {
        self.update(move |state| {
            state.last_selected_agents = Some(agents);
            Ok(())
        })
        .await
    }
}
