//! Instruction-file injection.
//!
//! Instruction content is kept inside a marker-delimited block so repeated
//! syncs replace only the managed region and leave the user's own notes
//! alone. The injector reports whether it created the file, rewrote the
//! block, or found it already up to date, so callers can surface exactly
//! what happened.

use crate::utils::atomic_write;
use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::Path;

pub const BLOCK_BEGIN: &str = "<!-- mcpsync:begin -->";
pub const BLOCK_END: &str = "<!-- mcpsync:end -->";

/// What an injection actually did to the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InjectAction {
    Created,
    Updated,
    Unchanged,
}

/// Writes a managed instruction block into a file.
pub trait InstructionInjector {
    fn inject(&self, path: &Path, content: &str) -> Result<InjectAction>;
}

/// Default injector using HTML-comment markers.
#[derive(Debug, Default)]
pub struct MarkerInjector;

impl MarkerInjector {
    fn render_block(content: &str) -> String {
        format!("{BLOCK_BEGIN}\n{}\n{BLOCK_END}", content.trim_end())
    }
}

impl InstructionInjector for MarkerInjector {
    fn inject(&self, path: &Path, content: &str) -> Result<InjectAction> {
        let block = Self::render_block(content);

        if !path.exists() {
            atomic_write(path, format!("{block}\n").as_bytes())
                .with_context(|| format!("Cannot create instruction file: {}", path.display()))?;
            return Ok(InjectAction::Created);
        }

        let existing = fs::read_to_string(path)
            .with_context(|| format!("Cannot read instruction file: {}", path.display()))?;

        let updated = match (existing.find(BLOCK_BEGIN), existing.find(BLOCK_END)) {
            (Some(begin), Some(end)) if end >= begin => {
                let end = end + BLOCK_END.len();
                if existing[begin..end] == block {
                    return Ok(InjectAction::Unchanged);
                }
                format!("{}{}{}", &existing[..begin], block, &existing[end..])
            }
            _ => {
                // No managed block yet; append one
                let separator = if existing.ends_with("\n\n") {
                    ""
                } else if existing.ends_with('\n') {
                    "\n"
                } else {
                    "\n\n"
                };
                format!("{existing}{separator}{block}\n")
            }
        };

        atomic_write(path, updated.as_bytes())
            .with_context(|| format!("Cannot write instruction file: {}", path.display()))?;
        Ok(InjectAction::Updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_inject_creates_missing_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("AGENTS.md");

        let action = MarkerInjector.inject(&path, "Use the docs server.").unwrap();
        assert_eq!(action, InjectAction::Created);

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with(BLOCK_BEGIN));
        assert!(content.contains("Use the docs server."));
    }

    #[test]
    fn test_inject_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("AGENTS.md");

        MarkerInjector.inject(&path, "content").unwrap();
        let action = MarkerInjector.inject(&path, "content").unwrap();
        assert_eq!(action, InjectAction::Unchanged);
    }

    #[test]
    fn test_inject_replaces_only_managed_block() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("AGENTS.md");
        fs::write(
            &path,
            format!("# My notes\n\n{BLOCK_BEGIN}\nold\n{BLOCK_END}\n\n## More notes\n"),
        )
        .unwrap();

        let action = MarkerInjector.inject(&path, "new").unwrap();
        assert_eq!(action, InjectAction::Updated);

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("# My notes"));
        assert!(content.contains("## More notes"));
        assert!(content.contains("new"));
        assert!(!content.contains("old"));
    }

    #[test]
    fn test_inject_appends_when_no_markers() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("AGENTS.md");
        fs::write(&path, "# Existing file without markers\n").unwrap();

        let action = MarkerInjector.inject(&path, "content").unwrap();
        assert_eq!(action, InjectAction::Updated);

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("# Existing file without markers\n"));
        assert!(content.trim_end().ends_with(BLOCK_END));
    }
}
