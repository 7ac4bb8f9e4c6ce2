//! mcpsync - MCP and instruction sync for AI coding agents
//!
//! Synchronizes MCP (Model Context Protocol) server entries and instruction
//! files across the config files of multiple AI coding agents ("providers"):
//! Claude Code, Cursor, VS Code, Codex, Gemini CLI, and others. A single
//! canonical server description fans out into each provider's native config
//! shape and format, with conflict detection, policy-driven resolution, and
//! all-or-nothing rollback across the touched files.
//!
//! # Architecture Overview
//!
//! mcpsync follows a detect/plan/apply model:
//! - Providers are static descriptors owned by an injectable registry
//! - Conflict detection is read-only and reports every finding
//! - A conflict policy (fail / skip / overwrite) turns findings into a plan
//! - The installer snapshots every target file before the first write and
//!   restores all of them if any mutation fails
//! - Successful batches are recorded in a lock-guarded state file
//!
//! ## Key Features
//!
//! - **Multi-format**: JSON, JSON-with-comments, YAML, and TOML config
//!   files, with comment preservation where the format allows it
//! - **Leaf merges**: exactly one entry is set under the provider's config
//!   key; every sibling key and surrounding formatting is left untouched
//! - **Transactional**: a failed batch leaves every file byte-identical to
//!   its prior state, including deleting files the batch created
//! - **Concurrency-safe state**: lock-state mutations are serialized across
//!   processes by an exclusive-create marker file
//! - **Shared instruction files**: providers resolving to the same
//!   instruction file (commonly `AGENTS.md`) get exactly one write
//!
//! # Core Modules
//!
//! - [`core`] - shared enums, error taxonomy, user-facing error formatting
//! - [`provider`] - provider descriptors, registry, priority selection,
//!   per-provider config transforms
//! - [`mcp`] - canonical MCP server configuration and mutations
//! - [`store`] - format-agnostic read/write/remove of one config entry
//! - [`lockstate`] - persisted install record with cross-process guard
//! - [`engine`] - conflict detection, policy execution, transactional
//!   batches, scope coordination
//! - [`instructions`] - marker-block instruction file injection
//! - [`cli`] - command-line interface
//! - [`utils`] - atomic writes and other fs helpers

pub mod cli;
pub mod core;
pub mod engine;
pub mod instructions;
pub mod lockstate;
pub mod mcp;
pub mod provider;
pub mod store;
pub mod utils;
