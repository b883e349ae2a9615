//! Shared test utilities for encoder integration tests.
//!
//! This module provides:
//! - `TestHarness`, an isolated staging/remote layout with an orchestrator
//! - Test doubles for the repository, media stages and transfer store

pub mod doubles;
pub mod harness;

pub use doubles::*;
pub use harness::TestHarness;
