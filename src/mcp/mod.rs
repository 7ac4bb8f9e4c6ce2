//! Canonical MCP (Model Context Protocol) server configuration.
//!
//! A [`ServerSpec`] is the provider-independent description of how to launch
//! or connect to an MCP server. Per-provider transforms (see
//! [`crate::provider::transform`]) rewrite the canonical shape into each
//! provider's native config shape before it is written to disk.

use crate::core::{Scope, TransportKind};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::BTreeMap;

/// Canonical configuration for one MCP server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ServerSpec {
    /// A remote server reached over SSE or streamable HTTP.
    Remote {
        transport: TransportKind,
        url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        headers: Option<BTreeMap<String, String>>,
    },
    /// A local server launched through a package runner (npx, uvx, ...).
    Package {
        command: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        args: Vec<String>,
    },
    /// A local server launched as a raw command.
    Command {
        command: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        args: Vec<String>,
    },
}

impl ServerSpec {
    /// The transport kind this spec requires from a provider.
    ///
    /// Local launches (package or raw command) are stdio.
    pub fn transport_kind(&self) -> TransportKind {
        match self {
            Self::Remote { transport, .. } => *transport,
            Self::Package { .. } | Self::Command { .. } => TransportKind::Stdio,
        }
    }

    /// Whether the spec carries custom HTTP headers.
    pub fn has_headers(&self) -> bool {
        matches!(self, Self::Remote { headers: Some(h), .. } if !h.is_empty())
    }

    /// The canonical native JSON shape, used by providers without a
    /// dedicated transform.
    pub fn to_canonical_value(&self) -> Value {
        match self {
            Self::Remote { transport, url, headers } => {
                let mut obj = json!({
                    "type": transport.as_str(),
                    "url": url,
                });
                if let Some(headers) = headers {
                    if !headers.is_empty() {
                        obj["headers"] = json!(headers);
                    }
                }
                obj
            }
            Self::Package { command, args } | Self::Command { command, args } => {
                let mut obj = json!({ "command": command });
                if !args.is_empty() {
                    obj["args"] = json!(args);
                }
                obj
            }
        }
    }
}

/// A requested configuration change: install `spec` under `name` in the
/// given scope of each targeted provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McpMutation {
    /// Server name, unique within a provider's config-key section.
    pub name: String,
    /// Canonical server configuration.
    #[serde(alias = "server")]
    pub spec: ServerSpec,
    /// Target scope.
    pub scope: Scope,
}

impl McpMutation {
    pub fn new(name: impl Into<String>, spec: ServerSpec, scope: Scope) -> Self {
        Self { name: name.into(), spec, scope }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_kind_classification() {
        let remote = ServerSpec::Remote {
            transport: TransportKind::Sse,
            url: "https://example.com/sse".into(),
            headers: None,
        };
        assert_eq!(remote.transport_kind(), TransportKind::Sse);

        let pkg = ServerSpec::Package { command: "npx".into(), args: vec!["-y".into()] };
        assert_eq!(pkg.transport_kind(), TransportKind::Stdio);
    }

    #[test]
    fn test_canonical_value_omits_empty_fields() {
        let spec = ServerSpec::Command { command: "server".into(), args: vec![] };
        assert_eq!(spec.to_canonical_value(), json!({ "command": "server" }));

        let spec = ServerSpec::Remote {
            transport: TransportKind::Http,
            url: "https://example.com/mcp".into(),
            headers: Some(BTreeMap::new()),
        };
        let value = spec.to_canonical_value();
        assert!(value.get("headers").is_none());
    }

    #[test]
    fn test_mutation_deserializes_tagged_spec() {
        let raw = r#"{
            "name": "docs",
            "scope": "project",
            "spec": { "kind": "package", "command": "npx", "args": ["-y", "@example/docs"] }
        }"#;
        let mutation: McpMutation = serde_json::from_str(raw).unwrap();
        assert_eq!(mutation.name, "docs");
        assert_eq!(mutation.scope, Scope::Project);
        assert!(matches!(mutation.spec, ServerSpec::Package { .. }));
    }
}
