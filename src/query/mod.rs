//! Query-string port: parsing, serialization, and the decoded map types.

pub mod codec;

pub use codec::{parse, stringify, to_state_object, QueryMap, QueryValue};
