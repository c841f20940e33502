//! Shared utilities for the pomsolve workspace.
//!
//! Cross-cutting concerns used by every other crate: the unified error
//! type and `${…}` placeholder substitution.

pub mod errors;
pub mod placeholder;
