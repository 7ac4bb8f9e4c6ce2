//! Shared helpers for CLI commands.

use crate::mcp::McpMutation;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Loads a mutation batch from a JSON file: an array of mutation objects,
/// each `{ "name", "scope", "spec": { "kind", ... } }`.
pub fn load_mutations(path: &Path) -> Result<Vec<McpMutation>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Cannot read mutations file: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Invalid mutations file: {}", path.display()))
}

/// Pretty-prints a serializable value as JSON to stdout.
pub fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_mutations_rejects_malformed_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("batch.json");
        fs::write(&path, "[{ broken").unwrap();
        assert!(load_mutations(&path).is_err());
    }

    #[test]
    fn test_load_mutations_parses_batch() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("batch.json");
        fs::write(
            &path,
            r#"[
                { "name": "docs", "scope": "project",
                  "spec": { "kind": "package", "command": "npx", "args": ["-y", "@example/docs"] } },
                { "name": "api", "scope": "global",
                  "spec": { "kind": "remote", "transport": "http", "url": "https://example.com/mcp" } }
            ]"#,
        )
        .unwrap();

        let mutations = load_mutations(&path).unwrap();
        assert_eq!(mutations.len(), 2);
        assert_eq!(mutations[0].name, "docs");
    }
}
