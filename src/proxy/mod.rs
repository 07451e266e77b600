//! Proxy module
//!
//! Path allow-listing, request forwarding, and response shaping for the
//! upstream LLM API.

pub mod headers;
pub mod logging;
pub mod models;
pub mod paths;
pub mod upstream;

pub use logging::RequestContext;
pub use models::{ModelDescriptor, ModelList};
pub use paths::{AllowList, OpenAiPath};
pub use upstream::{OpenAiUpstream, Upstream, UpstreamFailure, UpstreamRequest, UpstreamResponse};
