//! Format-agnostic config store.
//!
//! Reads, writes, and removes a single named entry under a dot-path key
//! inside one provider config file, for JSON, JSON-with-comments, YAML, and
//! TOML. Writes are merges at the leaf: intermediate objects along the key
//! path are created if absent, exactly one key is set under the final
//! object, and every sibling key is left untouched. The comment-preserving
//! formats (JSONC via CST editing, TOML via `toml_edit`) keep comments and
//! formatting outside the touched key intact.
//!
//! All writes go through [`crate::utils::atomic_write`].

mod jsonc;

use crate::core::{ConfigFormat, SyncError};
use crate::utils::atomic_write;
use anyhow::{Context, Result};
use serde_json::{Map, Value, json};
use std::fs;
use std::path::Path;
use toml_edit::DocumentMut;

/// Splits a dot-path config key into its segments.
fn key_segments(key_path: &str) -> impl Iterator<Item = &str> {
    key_path.split('.').filter(|s| !s.is_empty())
}

fn read_file(path: &Path) -> Result<String> {
    fs::read_to_string(path)
        .with_context(|| format!("Cannot read config file: {}", path.display()))
}

fn parse_error(path: &Path, format: ConfigFormat, reason: impl ToString) -> SyncError {
    SyncError::ConfigParse {
        file: path.display().to_string(),
        format: format.as_str(),
        reason: reason.to_string(),
    }
}

/// Reads a config file into a JSON value.
///
/// Missing files are the caller's concern; use [`read_or_empty`] when an
/// absent file should behave like an empty document. Malformed content is a
/// typed [`SyncError::ConfigParse`].
pub fn read(path: &Path, format: ConfigFormat) -> Result<Value> {
    let content = read_file(path)?;
    parse(path, format, &content)
}

/// Like [`read`], but a missing file yields an empty object.
pub fn read_or_empty(path: &Path, format: ConfigFormat) -> Result<Value> {
    if !path.exists() {
        return Ok(json!({}));
    }
    read(path, format)
}

fn parse(path: &Path, format: ConfigFormat, content: &str) -> Result<Value> {
    if content.trim().is_empty() {
        return Ok(json!({}));
    }
    let value = match format {
        ConfigFormat::Json => serde_json::from_str(content)
            .map_err(|e| parse_error(path, format, e))?,
        ConfigFormat::JsonWithComments => {
            jsonc_parser::parse_to_serde_value(content, &jsonc_parser::ParseOptions::default())
                .map_err(|e| parse_error(path, format, e))?
        }
        ConfigFormat::Yaml => serde_yaml::from_str(content)
            .map_err(|e| parse_error(path, format, e))?,
        ConfigFormat::Toml => toml::from_str(content)
            .map_err(|e| parse_error(path, format, e))?,
    };
    Ok(value)
}

/// Looks up the entry named `entry_name` under `key_path` in an already
/// parsed document. Used by conflict detection; never touches the disk.
pub fn get_entry<'a>(root: &'a Value, key_path: &str, entry_name: &str) -> Option<&'a Value> {
    let mut current = root;
    for segment in key_segments(key_path) {
        current = current.as_object()?.get(segment)?;
    }
    current.as_object()?.get(entry_name)
}

/// Writes `entry_value` as the key `entry_name` under `key_path`,
/// creating intermediate objects as needed and preserving sibling keys.
pub fn write(
    path: &Path,
    format: ConfigFormat,
    key_path: &str,
    entry_name: &str,
    entry_value: &Value,
) -> Result<()> {
    match format {
        ConfigFormat::Json => write_json(path, key_path, entry_name, entry_value),
        ConfigFormat::JsonWithComments => jsonc::write(path, key_path, entry_name, entry_value),
        ConfigFormat::Yaml => write_yaml(path, key_path, entry_name, entry_value),
        ConfigFormat::Toml => write_toml(path, key_path, entry_name, entry_value),
    }
}

/// Removes the entry named `entry_name` under `key_path`.
///
/// Returns whether an entry was actually removed. A missing file or missing
/// key path is `Ok(false)`.
pub fn remove(path: &Path, format: ConfigFormat, key_path: &str, entry_name: &str) -> Result<bool> {
    if !path.exists() {
        return Ok(false);
    }
    match format {
        ConfigFormat::Json => remove_json(path, key_path, entry_name),
        ConfigFormat::JsonWithComments => jsonc::remove(path, key_path, entry_name),
        ConfigFormat::Yaml => remove_yaml(path, key_path, entry_name),
        ConfigFormat::Toml => remove_toml(path, key_path, entry_name),
    }
}

fn ensure_object_path<'a>(
    root: &'a mut Value,
    key_path: &str,
    path: &Path,
) -> Result<&'a mut Map<String, Value>> {
    let not_object = || SyncError::KeyPathNotObject {
        file: path.display().to_string(),
        key_path: key_path.to_string(),
    };

    let mut current = root;
    if !current.is_object() {
        return Err(not_object().into());
    }
    for segment in key_segments(key_path) {
        let map = current.as_object_mut().expect("checked above");
        current = map.entry(segment).or_insert_with(|| json!({}));
        if !current.is_object() {
            return Err(not_object().into());
        }
    }
    Ok(current.as_object_mut().expect("checked above"))
}

fn remove_from_value(root: &mut Value, key_path: &str, entry_name: &str) -> bool {
    let mut current = root;
    for segment in key_segments(key_path) {
        match current.as_object_mut().and_then(|m| m.get_mut(segment)) {
            Some(next) => current = next,
            None => return false,
        }
    }
    current.as_object_mut().and_then(|m| m.remove(entry_name)).is_some()
}

// JSON

fn write_json(path: &Path, key_path: &str, entry_name: &str, entry_value: &Value) -> Result<()> {
    let mut root = read_or_empty(path, ConfigFormat::Json)?;
    let section = ensure_object_path(&mut root, key_path, path)?;
    section.insert(entry_name.to_string(), entry_value.clone());
    save_json(path, &root)
}

fn remove_json(path: &Path, key_path: &str, entry_name: &str) -> Result<bool> {
    let mut root = read(path, ConfigFormat::Json)?;
    let removed = remove_from_value(&mut root, key_path, entry_name);
    if removed {
        save_json(path, &root)?;
    }
    Ok(removed)
}

fn save_json(path: &Path, root: &Value) -> Result<()> {
    let mut content = serde_json::to_string_pretty(root)?;
    content.push('\n');
    atomic_write(path, content.as_bytes())
}

// YAML

fn write_yaml(path: &Path, key_path: &str, entry_name: &str, entry_value: &Value) -> Result<()> {
    let mut root = read_or_empty(path, ConfigFormat::Yaml)?;
    let section = ensure_object_path(&mut root, key_path, path)?;
    section.insert(entry_name.to_string(), entry_value.clone());
    save_yaml(path, &root)
}

fn remove_yaml(path: &Path, key_path: &str, entry_name: &str) -> Result<bool> {
    let mut root = read(path, ConfigFormat::Yaml)?;
    let removed = remove_from_value(&mut root, key_path, entry_name);
    if removed {
        save_yaml(path, &root)?;
    }
    Ok(removed)
}

fn save_yaml(path: &Path, root: &Value) -> Result<()> {
    let content = serde_yaml::to_string(root)
        .with_context(|| format!("Failed to serialize YAML for: {}", path.display()))?;
    atomic_write(path, content.as_bytes())
}

// TOML (format-preserving via toml_edit)

fn load_toml_document(path: &Path) -> Result<DocumentMut> {
    if !path.exists() {
        return Ok(DocumentMut::new());
    }
    let content = read_file(path)?;
    content
        .parse::<DocumentMut>()
        .map_err(|e| parse_error(path, ConfigFormat::Toml, e).into())
}

fn write_toml(path: &Path, key_path: &str, entry_name: &str, entry_value: &Value) -> Result<()> {
    let mut doc = load_toml_document(path)?;
    let not_object = || SyncError::KeyPathNotObject {
        file: path.display().to_string(),
        key_path: key_path.to_string(),
    };

    let mut table = doc.as_table_mut();
    for segment in key_segments(key_path) {
        if !table.contains_key(segment) {
            let mut implicit = toml_edit::Table::new();
            implicit.set_implicit(true);
            table.insert(segment, toml_edit::Item::Table(implicit));
        }
        table = table
            .get_mut(segment)
            .expect("just inserted")
            .as_table_mut()
            .ok_or_else(not_object)?;
    }
    table.insert(entry_name, json_to_toml_item(entry_value)?);
    atomic_write(path, doc.to_string().as_bytes())
}

fn remove_toml(path: &Path, key_path: &str, entry_name: &str) -> Result<bool> {
    let mut doc = load_toml_document(path)?;
    let mut table = doc.as_table_mut();
    for segment in key_segments(key_path) {
        match table.get_mut(segment).and_then(|item| item.as_table_mut()) {
            Some(next) => table = next,
            None => return Ok(false),
        }
    }
    let removed = table.remove(entry_name).is_some();
    if removed {
        atomic_write(path, doc.to_string().as_bytes())?;
    }
    Ok(removed)
}

fn json_to_toml_item(value: &Value) -> Result<toml_edit::Item> {
    match value {
        // Server entries serialize as explicit tables ([mcp_servers.name])
        Value::Object(map) => {
            let mut table = toml_edit::Table::new();
            for (key, val) in map {
                table.insert(key, toml_edit::Item::Value(json_to_toml_value(val)?));
            }
            Ok(toml_edit::Item::Table(table))
        }
        other => Ok(toml_edit::Item::Value(json_to_toml_value(other)?)),
    }
}

fn json_to_toml_value(value: &Value) -> Result<toml_edit::Value> {
    match value {
        Value::Null => Err(anyhow::anyhow!("TOML cannot represent null values")),
        Value::Bool(b) => Ok((*b).into()),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(i.into())
            } else if let Some(f) = n.as_f64() {
                Ok(f.into())
            } else {
                Err(anyhow::anyhow!("Number out of TOML range: {n}"))
            }
        }
        Value::String(s) => Ok(s.as_str().into()),
        Value::Array(items) => {
            let mut array = toml_edit::Array::new();
            for item in items {
                array.push(json_to_toml_value(item)?);
            }
            Ok(array.into())
        }
        Value::Object(map) => {
            let mut table = toml_edit::InlineTable::new();
            for (key, val) in map {
                table.insert(key, json_to_toml_value(val)?);
            }
            Ok(table.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_json_write_is_leaf_merge() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.json");
        fs::write(&path, r#"{"theme":"dark","mcpServers":{"existing":{"command":"old"}}}"#)
            .unwrap();

        write(&path, ConfigFormat::Json, "mcpServers", "added", &json!({"command": "new"}))
            .unwrap();

        let root = read(&path, ConfigFormat::Json).unwrap();
        assert_eq!(root["theme"], "dark");
        assert_eq!(root["mcpServers"]["existing"]["command"], "old");
        assert_eq!(root["mcpServers"]["added"]["command"], "new");
    }

    #[test]
    fn test_json_write_creates_intermediate_objects() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.json");

        write(&path, ConfigFormat::Json, "mcp.servers", "a", &json!({"command": "x"})).unwrap();

        let root = read(&path, ConfigFormat::Json).unwrap();
        assert_eq!(root["mcp"]["servers"]["a"]["command"], "x");
    }

    #[test]
    fn test_json_key_path_over_scalar_is_typed_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.json");
        fs::write(&path, r#"{"mcpServers": 42}"#).unwrap();

        let err = write(&path, ConfigFormat::Json, "mcpServers", "a", &json!({}))
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SyncError>(),
            Some(SyncError::KeyPathNotObject { .. })
        ));
    }

    #[test]
    fn test_malformed_json_is_typed_parse_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();

        let err = read(&path, ConfigFormat::Json).unwrap_err();
        assert!(matches!(err.downcast_ref::<SyncError>(), Some(SyncError::ConfigParse { .. })));
    }

    #[test]
    fn test_remove_missing_file_is_false() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("absent.json");
        assert!(!remove(&path, ConfigFormat::Json, "mcpServers", "a").unwrap());
    }

    #[test]
    fn test_remove_existing_entry() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.json");
        fs::write(&path, r#"{"mcpServers":{"a":{"command":"x"},"b":{"command":"y"}}}"#).unwrap();

        assert!(remove(&path, ConfigFormat::Json, "mcpServers", "a").unwrap());
        assert!(!remove(&path, ConfigFormat::Json, "mcpServers", "a").unwrap());

        let root = read(&path, ConfigFormat::Json).unwrap();
        assert!(root["mcpServers"].get("a").is_none());
        assert_eq!(root["mcpServers"]["b"]["command"], "y");
    }

    #[test]
    fn test_yaml_round_trip_preserves_siblings() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");
        fs::write(&path, "extensions:\n  old:\n    cmd: run\nother: true\n").unwrap();

        write(&path, ConfigFormat::Yaml, "extensions", "new", &json!({"cmd": "serve"})).unwrap();

        let root = read(&path, ConfigFormat::Yaml).unwrap();
        assert_eq!(root["other"], true);
        assert_eq!(root["extensions"]["old"]["cmd"], "run");
        assert_eq!(root["extensions"]["new"]["cmd"], "serve");
    }

    #[test]
    fn test_toml_write_preserves_comments() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(&path, "# codex settings\nmodel = \"o3\"\n\n[mcp_servers.old]\ncommand = \"run\"\n")
            .unwrap();

        write(
            &path,
            ConfigFormat::Toml,
            "mcp_servers",
            "docs",
            &json!({"command": "npx", "args": ["-y", "@example/docs"]}),
        )
        .unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("# codex settings"));
        assert!(content.contains("model = \"o3\""));

        let root = read(&path, ConfigFormat::Toml).unwrap();
        assert_eq!(root["mcp_servers"]["old"]["command"], "run");
        assert_eq!(root["mcp_servers"]["docs"]["args"][0], "-y");
    }

    #[test]
    fn test_toml_remove() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(&path, "[mcp_servers.docs]\ncommand = \"npx\"\n").unwrap();

        assert!(remove(&path, ConfigFormat::Toml, "mcp_servers", "docs").unwrap());
        let root = read(&path, ConfigFormat::Toml).unwrap();
        assert!(get_entry(&root, "mcp_servers", "docs").is_none());
    }

    #[test]
    fn test_get_entry_navigates_dot_path() {
        let root = json!({"a": {"b": {"name": {"command": "x"}}}});
        assert!(get_entry(&root, "a.b", "name").is_some());
        assert!(get_entry(&root, "a.c", "name").is_none());
    }
}
