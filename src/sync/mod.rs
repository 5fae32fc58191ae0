//! Repository synchronization layer
//!
//! This module fetches package metadata from a Bitbucket repository, caches
//! every validated field, and falls back to files shipped with the installed
//! package when no update is pending.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  Transport  │────▶│  Resolvers  │────▶│  Validator  │
//! │   (fetch)   │     │ (normalize) │     │ (classify)  │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!        ▲                                       │
//!        │                                       ▼
//! ┌─────────────┐                         ┌─────────────┐
//! │ Repository  │◀───────────────────────▶│    Cache    │
//! │    Sync     │                         │  (storage)  │
//! └─────────────┘                         └─────────────┘
//!        │
//!        ▼
//! ┌─────────────┐
//! │  Download   │
//! │   (links)   │
//! └─────────────┘
//! ```
//!
//! # Modules
//!
//! - [`repository`]: Per-field sync facade and concurrent `sync_all`
//! - [`transport`]: Transport trait and endpoint templates
//! - [`transports`]: Concrete transports (Bitbucket Cloud and Server)
//! - [`response`]: Response classification and the `Resolved` sentinel form
//! - [`resolvers`]: Field-specific normalization of remote payloads
//! - [`validator`]: Success, recoverable and fatal verdicts
//! - [`cache`]: SQLite-backed field cache with TTL
//! - [`local`]: Files shipped with the installed package
//! - [`render`]: Changelog rendering and readme parsing
//! - [`download`]: Download link construction
//! - [`version_state`]: Ordered tags, rollback and branch links
//! - [`error`]: Error types for transport, cache and sync operations

pub mod cache;
pub mod download;
pub mod error;
pub mod local;
pub mod render;
pub mod repository;
pub mod resolvers;
pub mod response;
pub mod transport;
pub mod transports;
pub mod validator;
pub mod version_state;
