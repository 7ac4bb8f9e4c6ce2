//! Built-in provider registry.
//!
//! Descriptors cover the agents this tool knows how to configure, spanning
//! all four config formats. Paths are resolved against a home directory
//! supplied at construction time (`MCPSYNC_HOME` overrides the real home),
//! which keeps the registry fully reloadable in tests.

use super::transform::{TransformFn, TransformRegistry};
use super::Provider;
use crate::core::{ConfigFormat, Priority, ProviderStatus, SyncError, TransportKind};
use anyhow::Result;
use std::path::{Path, PathBuf};

/// Environment variable overriding the home directory used for global paths
/// and the lock-state store.
pub const HOME_ENV: &str = "MCPSYNC_HOME";

#[derive(Debug)]
pub struct ProviderRegistry {
    providers: Vec<Provider>,
    transforms: TransformRegistry,
}

impl ProviderRegistry {
    /// Builds the registry against the user's home directory.
    pub fn new() -> Result<Self> {
        Self::with_home(&resolve_home()?)
    }

    /// Builds the registry against an explicit home directory.
    pub fn with_home(home: &Path) -> Result<Self> {
        Self::from_providers(builtin_providers(home))
    }

    /// Builds a registry from explicit descriptors, validating that every
    /// referenced transform id is known.
    pub fn from_providers(providers: Vec<Provider>) -> Result<Self> {
        let transforms = TransformRegistry::builtin();
        for provider in &providers {
            if transforms.get(&provider.transform).is_none() {
                return Err(SyncError::UnknownTransform {
                    provider: provider.id.clone(),
                    transform: provider.transform.clone(),
                }
                .into());
            }
        }
        Ok(Self { providers, transforms })
    }

    /// Replaces the descriptor set, re-running transform validation.
    pub fn reload(&mut self, providers: Vec<Provider>) -> Result<()> {
        *self = Self::from_providers(providers)?;
        Ok(())
    }

    pub fn all(&self) -> &[Provider] {
        &self.providers
    }

    /// Looks up a provider by id or alias.
    pub fn get(&self, id_or_alias: &str) -> Option<&Provider> {
        self.providers.iter().find(|p| p.matches(id_or_alias))
    }

    /// The transform for a provider. Infallible for providers that came out
    /// of this registry, since transform ids were validated at load.
    pub fn transform_for(&self, provider: &Provider) -> TransformFn {
        self.transforms.get(&provider.transform).expect("transform ids validated at load")
    }
}

/// Resolves the home directory, honoring the `MCPSYNC_HOME` override.
pub fn resolve_home() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(HOME_ENV) {
        if !dir.trim().is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }
    dirs::home_dir().ok_or_else(|| SyncError::NoHomeDirectory.into())
}

fn builtin_providers(home: &Path) -> Vec<Provider> {
    use ConfigFormat::{Json, JsonWithComments, Toml, Yaml};
    use TransportKind::{Http, Sse, Stdio};

    vec![
        Provider {
            id: "claude-code".into(),
            aliases: vec!["claude".into()],
            priority: Priority::High,
            status: ProviderStatus::Stable,
            format: Json,
            config_key: "mcpServers".into(),
            global_config_path: home.join(".claude.json"),
            project_config_path: Some(".mcp.json".into()),
            supported_transports: vec![Stdio, Sse, Http],
            supports_headers: true,
            global_instructions_path: Some(home.join(".claude/CLAUDE.md")),
            project_instructions_file: Some("CLAUDE.md".into()),
            transform: "canonical".into(),
        },
        Provider {
            id: "cursor".into(),
            aliases: vec![],
            priority: Priority::High,
            status: ProviderStatus::Stable,
            format: Json,
            config_key: "mcpServers".into(),
            global_config_path: home.join(".cursor/mcp.json"),
            project_config_path: Some(".cursor/mcp.json".into()),
            supported_transports: vec![Stdio, Sse],
            supports_headers: false,
            global_instructions_path: None,
            project_instructions_file: Some("AGENTS.md".into()),
            transform: "canonical".into(),
        },
        Provider {
            id: "vscode".into(),
            aliases: vec!["code".into()],
            priority: Priority::Medium,
            status: ProviderStatus::Stable,
            format: JsonWithComments,
            config_key: "servers".into(),
            global_config_path: home.join(".config/Code/User/mcp.json"),
            project_config_path: Some(".vscode/mcp.json".into()),
            supported_transports: vec![Stdio, Sse, Http],
            supports_headers: true,
            global_instructions_path: None,
            project_instructions_file: None,
            transform: "vscode".into(),
        },
        Provider {
            id: "windsurf".into(),
            aliases: vec![],
            priority: Priority::Medium,
            status: ProviderStatus::Stable,
            format: Json,
            config_key: "mcpServers".into(),
            global_config_path: home.join(".codeium/windsurf/mcp_config.json"),
            project_config_path: None,
            supported_transports: vec![Stdio, Sse],
            supports_headers: false,
            global_instructions_path: None,
            project_instructions_file: None,
            transform: "canonical".into(),
        },
        Provider {
            id: "codex".into(),
            aliases: vec![],
            priority: Priority::Medium,
            status: ProviderStatus::Stable,
            format: Toml,
            config_key: "mcp_servers".into(),
            global_config_path: home.join(".codex/config.toml"),
            project_config_path: None,
            supported_transports: vec![Stdio],
            supports_headers: false,
            global_instructions_path: Some(home.join(".codex/AGENTS.md")),
            project_instructions_file: Some("AGENTS.md".into()),
            transform: "codex".into(),
        },
        Provider {
            id: "gemini".into(),
            aliases: vec!["gemini-cli".into()],
            priority: Priority::Medium,
            status: ProviderStatus::Stable,
            format: Json,
            config_key: "mcpServers".into(),
            global_config_path: home.join(".gemini/settings.json"),
            project_config_path: Some(".gemini/settings.json".into()),
            supported_transports: vec![Stdio, Sse, Http],
            supports_headers: true,
            global_instructions_path: Some(home.join(".gemini/GEMINI.md")),
            project_instructions_file: Some("GEMINI.md".into()),
            transform: "canonical".into(),
        },
        Provider {
            id: "opencode".into(),
            aliases: vec![],
            priority: Priority::Low,
            status: ProviderStatus::Experimental,
            format: Json,
            config_key: "mcp".into(),
            global_config_path: home.join(".config/opencode/opencode.json"),
            project_config_path: Some("opencode.json".into()),
            supported_transports: vec![Stdio, Http],
            supports_headers: false,
            global_instructions_path: None,
            project_instructions_file: Some("AGENTS.md".into()),
            transform: "opencode".into(),
        },
        Provider {
            id: "goose".into(),
            aliases: vec![],
            priority: Priority::Low,
            status: ProviderStatus::Experimental,
            format: Yaml,
            config_key: "extensions".into(),
            global_config_path: home.join(".config/goose/config.yaml"),
            project_config_path: None,
            supported_transports: vec![Stdio],
            supports_headers: false,
            global_instructions_path: Some(home.join(".config/goose/.goosehints")),
            project_instructions_file: Some(".goosehints".into()),
            transform: "canonical".into(),
        },
        Provider {
            id: "zed".into(),
            aliases: vec![],
            priority: Priority::Low,
            status: ProviderStatus::Experimental,
            format: JsonWithComments,
            config_key: "context_servers".into(),
            global_config_path: home.join(".config/zed/settings.json"),
            project_config_path: Some(".zed/settings.json".into()),
            supported_transports: vec![Stdio],
            supports_headers: false,
            global_instructions_path: None,
            project_instructions_file: None,
            transform: "canonical".into(),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_registry_validates() {
        let registry = ProviderRegistry::with_home(Path::new("/tmp/home")).unwrap();
        assert!(registry.all().len() >= 8);
    }

    #[test]
    fn test_alias_lookup_is_case_insensitive() {
        let registry = ProviderRegistry::with_home(Path::new("/tmp/home")).unwrap();
        assert_eq!(registry.get("Claude").unwrap().id, "claude-code");
        assert_eq!(registry.get("code").unwrap().id, "vscode");
        assert!(registry.get("unknown").is_none());
    }

    #[test]
    fn test_unknown_transform_fails_fast() {
        let mut provider =
            crate::provider::test_fixtures::provider("bad", Priority::Low, Path::new("/tmp"));
        provider.transform = "missing".into();
        let err = ProviderRegistry::from_providers(vec![provider]).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SyncError>(),
            Some(SyncError::UnknownTransform { .. })
        ));
    }

    #[test]
    fn test_all_formats_covered() {
        let registry = ProviderRegistry::with_home(Path::new("/tmp/home")).unwrap();
        for format in [
            ConfigFormat::Json,
            ConfigFormat::JsonWithComments,
            ConfigFormat::Yaml,
            ConfigFormat::Toml,
        ] {
            assert!(
                registry.all().iter().any(|p| p.format == format),
                "no provider with format {format}"
            );
        }
    }
}
