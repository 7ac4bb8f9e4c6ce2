//! Per-provider config transforms.
//!
//! A transform rewrites the canonical [`ServerSpec`] shape into a provider's
//! native config shape. Transforms are pure functions looked up by string
//! id; the [`TransformRegistry`] is validated when the provider registry is
//! constructed, so a descriptor naming an unknown transform fails fast
//! instead of silently passing configuration through untransformed.

use crate::core::TransportKind;
use crate::mcp::ServerSpec;
use serde_json::{Value, json};
use std::collections::HashMap;

/// A pure rewrite from canonical spec to a provider-native JSON value.
pub type TransformFn = fn(name: &str, spec: &ServerSpec) -> Value;

/// Registry of known transforms, keyed by id.
#[derive(Debug)]
pub struct TransformRegistry {
    transforms: HashMap<&'static str, TransformFn>,
}

impl TransformRegistry {
    pub fn builtin() -> Self {
        let mut transforms: HashMap<&'static str, TransformFn> = HashMap::new();
        transforms.insert("canonical", canonical);
        transforms.insert("vscode", vscode);
        transforms.insert("opencode", opencode);
        transforms.insert("codex", codex);
        Self { transforms }
    }

    pub fn get(&self, id: &str) -> Option<TransformFn> {
        self.transforms.get(id).copied()
    }
}

/// Pass-through: the canonical shape is the native shape.
fn canonical(_name: &str, spec: &ServerSpec) -> Value {
    spec.to_canonical_value()
}

/// VS Code `mcp.json` entries always carry an explicit `type` field.
fn vscode(_name: &str, spec: &ServerSpec) -> Value {
    match spec {
        ServerSpec::Remote { .. } => spec.to_canonical_value(),
        ServerSpec::Package { command, args } | ServerSpec::Command { command, args } => {
            let mut obj = json!({
                "type": TransportKind::Stdio.as_str(),
                "command": command,
            });
            if !args.is_empty() {
                obj["args"] = json!(args);
            }
            obj
        }
    }
}

/// OpenCode uses a single command array and a `local`/`remote` type tag.
fn opencode(_name: &str, spec: &ServerSpec) -> Value {
    match spec {
        ServerSpec::Remote { url, headers, .. } => {
            let mut obj = json!({
                "type": "remote",
                "url": url,
                "enabled": true,
            });
            if let Some(headers) = headers {
                if !headers.is_empty() {
                    obj["headers"] = json!(headers);
                }
            }
            obj
        }
        ServerSpec::Package { command, args } | ServerSpec::Command { command, args } => {
            let mut full = vec![command.clone()];
            full.extend(args.iter().cloned());
            json!({
                "type": "local",
                "command": full,
                "enabled": true,
            })
        }
    }
}

/// Codex TOML tables hold only `command`/`args` (or `url` for remotes,
/// which codex rejects upstream as an unsupported transport).
fn codex(_name: &str, spec: &ServerSpec) -> Value {
    match spec {
        ServerSpec::Remote { url, .. } => json!({ "url": url }),
        ServerSpec::Package { command, args } | ServerSpec::Command { command, args } => {
            let mut obj = json!({ "command": command });
            if !args.is_empty() {
                obj["args"] = json!(args);
            }
            obj
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pkg() -> ServerSpec {
        ServerSpec::Package { command: "npx".into(), args: vec!["-y".into(), "@x/y".into()] }
    }

    #[test]
    fn test_vscode_adds_explicit_type() {
        let value = vscode("docs", &pkg());
        assert_eq!(value["type"], "stdio");
        assert_eq!(value["command"], "npx");
    }

    #[test]
    fn test_opencode_flattens_command() {
        let value = opencode("docs", &pkg());
        assert_eq!(value["type"], "local");
        assert_eq!(value["command"], json!(["npx", "-y", "@x/y"]));
    }

    #[test]
    fn test_unknown_transform_is_absent() {
        assert!(TransformRegistry::builtin().get("bogus").is_none());
    }
}
