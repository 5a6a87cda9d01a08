//! Error types for the cache engine
//!
//! Provides unified error handling using thiserror.
//!
//! Absence of a key is never an error anywhere in the engine; operations
//! report it as a `None`/`false` result to keep hot-path checks branch-free.
//! Errors only arise from mutating a closed cache or from a caller-supplied
//! value generator.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for cache operations.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Mutating operation attempted on a closed cache
    #[error("invalid operation: cache is closed")]
    Closed,

    /// A value generator failed; the error is propagated verbatim and the
    /// key is left untouched
    #[error("value generator failed: {0}")]
    Generator(#[source] anyhow::Error),
}

// == Result Type Alias ==
/// Convenience Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;
