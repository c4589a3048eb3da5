//! Core types and utilities for hookflow
//!
//! This is the foundation crate that all other hookflow crates depend on.
//! It provides:
//! - Base error types
//! - Behavioral traits for the auxiliary services (cache, smart filter, background queue)
//!
//! This crate has no dependencies on other hookflow crates.

pub mod error;
pub mod traits;

pub use error::{Error, Result};
pub use traits::{BackgroundQueue, CacheService, GroupHooks, HookFilter, NoCache};
