//! Error types for the urlstate crate.
//!
//! This module defines the centralized error type [`UrlStateError`] and a type alias
//! [`Result`] for convenient error handling throughout the crate. All errors are
//! implemented using the `thiserror` crate for automatic `Error` trait implementation.
//!
//! The synchronizer core itself is infallible by design: rejected and duplicate
//! transitions are silent no-ops. Errors only arise in the persistence layer
//! ([`crate::store`]), where I/O and serialization can fail.

use thiserror::Error;

/// The main error type for urlstate operations.
///
/// This enum consolidates the error conditions that can occur in the fallible
/// parts of the crate, which is almost entirely the persistence backends.
/// Variants either wrap underlying errors from external crates using `#[from]`
/// or carry a description of what went wrong.
///
/// # Examples
///
/// ```
/// use urlstate::{Result, UrlStateError};
///
/// fn reject_empty_key(key: &str) -> Result<()> {
///     if key.is_empty() {
///         return Err(UrlStateError::Storage("empty store key".to_string()));
///     }
///     Ok(())
/// }
///
/// assert!(reject_empty_key("").is_err());
/// ```
#[derive(Debug, Error)]
pub enum UrlStateError {
    /// Storage operation failed.
    ///
    /// Occurs when reading from or writing to a store backend fails for a
    /// reason other than raw I/O, such as a malformed container file.
    /// The string contains a description of what went wrong.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Filesystem or I/O operation failed.
    ///
    /// Wraps errors from standard library I/O operations. Automatically converts
    /// from `std::io::Error` using the `#[from]` attribute.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Encoding or decoding of a stored value failed.
    ///
    /// Occurs when a typed value cannot be serialized for storage, or when a
    /// stored string cannot be deserialized back into its typed form.
    #[error("Codec error: {0}")]
    Codec(String),
}

/// A specialized `Result` type for urlstate operations.
///
/// This is a type alias for `std::result::Result<T, UrlStateError>` that simplifies
/// function signatures throughout the codebase.
pub type Result<T> = std::result::Result<T, UrlStateError>;
