//! Shared test utilities for integration tests

#![allow(dead_code)]

mod fixture;
mod registry;

pub use fixture::*;
pub use registry::*;
