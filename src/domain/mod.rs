//! Core domain types shared across the crate.

pub mod error;
pub mod value;

pub use error::{Result, UrlStateError};
pub use value::{StateObject, Update};
