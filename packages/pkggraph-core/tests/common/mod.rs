//! Shared utilities for integration tests.

mod builders;

pub use builders::*;
