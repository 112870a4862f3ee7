//! Credential handling and validated identifiers.

pub mod credential;
pub mod id;

pub use credential::*;
pub use id::*;
