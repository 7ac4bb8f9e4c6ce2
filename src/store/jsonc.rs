//! Comment-preserving JSONC editing.
//!
//! VS Code and Zed config files allow comments and trailing commas. Writes
//! here operate on the parsed CST instead of a plain value tree so that
//! comments and formatting outside the touched key survive the edit.

use crate::core::{ConfigFormat, SyncError};
use crate::utils::atomic_write;
use anyhow::Result;
use jsonc_parser::ParseOptions;
use jsonc_parser::cst::{CstInputValue, CstObject, CstRootNode};
use serde_json::Value;
use std::fs;
use std::path::Path;

use super::key_segments;

fn parse_cst(path: &Path, content: &str) -> Result<CstRootNode> {
    CstRootNode::parse(content, &ParseOptions::default()).map_err(|e| {
        SyncError::ConfigParse {
            file: path.display().to_string(),
            format: ConfigFormat::JsonWithComments.as_str(),
            reason: e.to_string(),
        }
        .into()
    })
}

fn not_object(path: &Path, key_path: &str) -> SyncError {
    SyncError::KeyPathNotObject {
        file: path.display().to_string(),
        key_path: key_path.to_string(),
    }
}

/// Walks the dot path, creating intermediate objects, and returns the final
/// object. Fails if an existing value along the path is not an object.
fn ensure_object_path(
    root: &CstRootNode,
    key_path: &str,
    path: &Path,
) -> Result<CstObject> {
    let mut current = root.object_value_or_set();
    for segment in key_segments(key_path) {
        current = match current.get(segment) {
            Some(prop) => prop.object_value().ok_or_else(|| not_object(path, key_path))?,
            None => current.object_value_or_set(segment),
        };
    }
    Ok(current)
}

pub(super) fn write(
    path: &Path,
    key_path: &str,
    entry_name: &str,
    entry_value: &Value,
) -> Result<()> {
    let content = if path.exists() {
        fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read config file {}: {e}", path.display()))?
    } else {
        String::new()
    };

    let root = parse_cst(path, &content)?;
    let section = ensure_object_path(&root, key_path, path)?;
    let input = to_input_value(entry_value);
    match section.get(entry_name) {
        Some(prop) => prop.set_value(input),
        None => {
            section.append(entry_name, input);
        }
    }

    atomic_write(path, root.to_string().as_bytes())
}

pub(super) fn remove(path: &Path, key_path: &str, entry_name: &str) -> Result<bool> {
    let content = fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Cannot read config file {}: {e}", path.display()))?;
    let root = parse_cst(path, &content)?;

    let mut current = match root.object_value() {
        Some(obj) => obj,
        None => return Ok(false),
    };
    for segment in key_segments(key_path) {
        current = match current.get(segment).and_then(|prop| prop.object_value()) {
            Some(next) => next,
            None => return Ok(false),
        };
    }
    match current.get(entry_name) {
        Some(prop) => {
            prop.remove();
            atomic_write(path, root.to_string().as_bytes())?;
            Ok(true)
        }
        None => Ok(false),
    }
}

/// Converts a `serde_json::Value` into the CST input value used for edits.
fn to_input_value(value: &Value) -> CstInputValue {
    match value {
        Value::Null => CstInputValue::Null,
        Value::Bool(b) => CstInputValue::Bool(*b),
        Value::Number(n) => CstInputValue::Number(n.to_string()),
        Value::String(s) => CstInputValue::String(s.clone()),
        Value::Array(items) => {
            CstInputValue::Array(items.iter().map(to_input_value).collect())
        }
        Value::Object(map) => CstInputValue::Object(
            map.iter().map(|(k, v)| (k.clone(), to_input_value(v))).collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::super::{get_entry, read};
    use crate::core::ConfigFormat;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    const JSONC: &str = r#"{
  // user servers, do not touch
  "servers": {
    "mine": {
      "type": "stdio",
      "command": "run"
    }
  },
  "telemetry": false
}"#;

    #[test]
    fn test_write_preserves_comments_and_siblings() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("mcp.json");
        fs::write(&path, JSONC).unwrap();

        super::write(&path, "servers", "docs", &json!({"type": "stdio", "command": "npx"}))
            .unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("// user servers, do not touch"));

        let root = read(&path, ConfigFormat::JsonWithComments).unwrap();
        assert_eq!(root["telemetry"], false);
        assert_eq!(root["servers"]["mine"]["command"], "run");
        assert_eq!(root["servers"]["docs"]["command"], "npx");
    }

    #[test]
    fn test_overwrite_same_entry_is_byte_stable() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("mcp.json");
        fs::write(&path, JSONC).unwrap();

        let entry = json!({"type": "stdio", "command": "npx"});
        super::write(&path, "servers", "docs", &entry).unwrap();
        let first = fs::read(&path).unwrap();
        super::write(&path, "servers", "docs", &entry).unwrap();
        let second = fs::read(&path).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_write_into_missing_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("fresh.json");

        super::write(&path, "servers", "docs", &json!({"command": "npx"})).unwrap();

        let root = read(&path, ConfigFormat::JsonWithComments).unwrap();
        assert!(get_entry(&root, "servers", "docs").is_some());
    }

    #[test]
    fn test_remove_keeps_comments() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("mcp.json");
        fs::write(&path, JSONC).unwrap();

        assert!(super::remove(&path, "servers", "mine").unwrap());
        assert!(!super::remove(&path, "servers", "mine").unwrap());

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("// user servers, do not touch"));
    }
}
