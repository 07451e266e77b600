//! Caller side of the proxy
//!
//! Credential storage for the access screen and a typed client that sends
//! those credentials the way the access gate expects.

pub mod access;
pub mod api;

pub use access::{AccessCredential, AccessStore};
pub use api::{ClientError, ClientResult, ProxyClient};
