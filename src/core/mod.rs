//! Core types and error handling.
//!
//! This module defines the vocabulary shared by every other module: scopes,
//! config formats, priority tiers, transport kinds, conflict policies, and
//! the [`SyncError`] taxonomy with its user-facing [`ErrorContext`] wrapper.

pub mod error;
mod types;

pub use error::{ErrorContext, SyncError, user_friendly_error};
pub use types::{ConfigFormat, ConflictPolicy, Priority, ProviderStatus, Scope, TransportKind};
