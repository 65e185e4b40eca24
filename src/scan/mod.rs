//! Repository scanning layer
//!
//! - [`source`]: Lists repositories (GitHub organization or explicit list)
//! - [`fetcher`]: Acquires a temporary working copy of a repository
//! - [`worker`]: Extracts and resolves modules within one working copy
//! - [`orchestrator`]: Runs workers over many repositories with bounded concurrency

pub mod fetcher;
pub mod orchestrator;
pub mod source;
pub mod worker;
