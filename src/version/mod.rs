//! Version resolution layer for Terraform modules
//!
//! This module resolves the latest published version of a module from the
//! registry that owns its source, and compares it with the declared version.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  Resolver   │────▶│  Registry   │────▶│  Outcome    │
//! │  (routing)  │     │(public/priv)│     │ (sentinels) │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!                            │                   │
//!                            ▼                   ▼
//!                     ┌─────────────┐     ┌─────────────┐
//!                     │   Latest    │     │   Checker   │
//!                     │ (selection) │     │ (freshness) │
//!                     └─────────────┘     └─────────────┘
//! ```
//!
//! # Modules
//!
//! - [`checker`]: Freshness verdict and `FreshnessRecord`
//! - [`error`]: Error types for registry operations
//! - [`latest`]: Latest-version selection from a version listing
//! - [`registry`]: Registry trait for resolving versions from remote sources
//! - [`registries`]: Concrete registry implementations (public, private)
//! - [`resolver`]: Routes a module source to its registry
//! - [`types`]: `VersionOutcome` and `RegistryKind`

pub mod checker;
pub mod error;
pub mod latest;
pub mod registries;
pub mod registry;
pub mod resolver;
pub mod types;
