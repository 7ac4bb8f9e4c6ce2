//! Error handling for mcpsync.
//!
//! Two layers: [`SyncError`] is the strongly-typed taxonomy raised by leaf
//! adapters and the lock-state store, and [`ErrorContext`] wraps any failure
//! with a user-facing message and an actionable suggestion for CLI display.
//!
//! Per-mutation failures inside a batch never surface here; they are
//! converted into result entries by the engine. Only structural problems
//! (guard timeout, malformed config content, unknown provider) propagate as
//! errors to the top-level caller.

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// Typed failures raised by the configuration engine.
#[derive(Debug, Clone, Error)]
pub enum SyncError {
    /// A provider config file exists but could not be parsed.
    #[error("Failed to parse {format} config file: {file}")]
    ConfigParse {
        file: String,
        format: &'static str,
        reason: String,
    },

    /// A key path segment crosses a value that is not an object/table.
    #[error("Config key path '{key_path}' crosses a non-object value in: {file}")]
    KeyPathNotObject { file: String, key_path: String },

    /// The lock guard could not be acquired within the retry budget.
    #[error("Timed out acquiring lock guard {path} after {attempts} attempts (~{waited_ms}ms)")]
    LockTimeout {
        path: String,
        attempts: u32,
        waited_ms: u64,
    },

    /// No provider matches the given identifier or alias.
    #[error("Unknown provider: {name}")]
    UnknownProvider { name: String },

    /// A provider descriptor references a transform id that is not registered.
    #[error("Provider '{provider}' references unknown config transform '{transform}'")]
    UnknownTransform { provider: String, transform: String },

    /// The home directory could not be determined.
    #[error("Could not determine home directory")]
    NoHomeDirectory,

    /// Restoring a snapshot during rollback failed.
    #[error("Rollback failed for {path}: {reason}")]
    RollbackFailed { path: String, reason: String },

    /// Catch-all for errors without a dedicated variant.
    #[error("{message}")]
    Other { message: String },
}

/// A [`SyncError`] decorated with a suggestion and optional details for
/// terminal display.
#[derive(Debug)]
pub struct ErrorContext {
    pub error: SyncError,
    pub suggestion: Option<String>,
    pub details: Option<String>,
}

impl ErrorContext {
    pub fn new(error: SyncError) -> Self {
        Self { error, suggestion: None, details: None }
    }

    #[must_use]
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Prints the error to stderr with colors.
    pub fn display(&self) {
        eprintln!("{} {}", "error:".red().bold(), self.error);
        if let Some(details) = &self.details {
            eprintln!("  {details}");
        }
        if let Some(suggestion) = &self.suggestion {
            eprintln!("{} {}", "hint:".yellow().bold(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;
        if let Some(details) = &self.details {
            write!(f, "\n{details}")?;
        }
        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nhint: {suggestion}")?;
        }
        Ok(())
    }
}

/// Converts any error into an [`ErrorContext`] with a helpful suggestion.
///
/// Walks the error chain looking for a [`SyncError`]; falls back to I/O error
/// classification, then to a generic wrapper.
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    let mut current: &dyn std::error::Error = error.as_ref();
    loop {
        if let Some(sync_error) = current.downcast_ref::<SyncError>() {
            return create_error_context(sync_error.clone());
        }
        if let Some(io_error) = current.downcast_ref::<std::io::Error>() {
            return io_error_context(io_error, &error);
        }
        match current.source() {
            Some(source) => current = source,
            None => break,
        }
    }

    ErrorContext::new(SyncError::Other { message: format!("{error:#}") })
}

fn io_error_context(io_error: &std::io::Error, original: &anyhow::Error) -> ErrorContext {
    let base = SyncError::Other { message: format!("{original:#}") };
    match io_error.kind() {
        std::io::ErrorKind::PermissionDenied => ErrorContext::new(base)
            .with_suggestion("Check file ownership or run with elevated permissions"),
        std::io::ErrorKind::NotFound => ErrorContext::new(base)
            .with_suggestion("Check that the file or directory exists and the path is correct"),
        _ => ErrorContext::new(base),
    }
}

fn create_error_context(error: SyncError) -> ErrorContext {
    match &error {
        SyncError::ConfigParse { file, .. } => {
            let file = file.clone();
            ErrorContext::new(error)
                .with_suggestion(format!(
                    "Fix the syntax error in {file}, or move the file aside and re-run"
                ))
                .with_details("The existing content was left untouched")
        }
        SyncError::KeyPathNotObject { .. } => ErrorContext::new(error).with_suggestion(
            "An existing value at this key is a scalar or array; remove it or pick another key",
        ),
        SyncError::LockTimeout { path, .. } => {
            let path = path.clone();
            ErrorContext::new(error)
                .with_suggestion(format!(
                    "Another mcpsync process may be running; if not, delete the stale guard file {path}"
                ))
                .with_details("The guard file records the owning process id")
        }
        SyncError::UnknownProvider { .. } => ErrorContext::new(error)
            .with_suggestion("Run 'mcpsync providers' to list known providers and aliases"),
        SyncError::NoHomeDirectory => ErrorContext::new(error)
            .with_suggestion("Set the MCPSYNC_HOME environment variable to a writable directory"),
        SyncError::RollbackFailed { .. } => ErrorContext::new(error)
            .with_details("The batch failed and one or more files could not be restored"),
        _ => ErrorContext::new(error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_sync_error_found_through_context_chain() {
        let err: anyhow::Error = SyncError::UnknownProvider { name: "nope".into() }.into();
        let err = err.context("while resolving targets");
        let ctx = user_friendly_error(err);
        assert!(matches!(ctx.error, SyncError::UnknownProvider { .. }));
        assert!(ctx.suggestion.is_some());
    }

    #[test]
    fn test_io_error_gets_suggestion() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = anyhow::Error::from(io).context("writing config");
        let ctx = user_friendly_error(err);
        assert!(ctx.suggestion.unwrap().contains("permissions"));
    }

    #[test]
    fn test_fallback_keeps_full_chain() {
        let err = anyhow::anyhow!("inner").context("outer");
        let ctx = user_friendly_error(err);
        match ctx.error {
            SyncError::Other { message } => {
                assert!(message.contains("outer"));
                assert!(message.contains("inner"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}
