//! Upstream operations the proxy is willing to forward

use std::collections::HashSet;
use std::fmt;

/// Upstream API operations reachable through `/api/openai/*`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpenAiPath {
    Chat,
    Usage,
    Subscription,
    ListModels,
}

impl OpenAiPath {
    pub const ALL: [OpenAiPath; 4] = [
        OpenAiPath::Chat,
        OpenAiPath::Usage,
        OpenAiPath::Subscription,
        OpenAiPath::ListModels,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OpenAiPath::Chat => "v1/chat/completions",
            OpenAiPath::Usage => "dashboard/billing/usage",
            OpenAiPath::Subscription => "dashboard/billing/subscription",
            OpenAiPath::ListModels => "v1/models",
        }
    }

    /// Exact, case-sensitive lookup
    pub fn from_subpath(subpath: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.as_str() == subpath)
    }
}

impl fmt::Display for OpenAiPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable set of permitted sub-paths, built once at startup
#[derive(Debug, Clone)]
pub struct AllowList {
    paths: HashSet<&'static str>,
}

impl AllowList {
    pub fn new() -> Self {
        Self {
            paths: OpenAiPath::ALL.iter().map(|p| p.as_str()).collect(),
        }
    }

    pub fn is_allowed(&self, subpath: &str) -> bool {
        self.paths.contains(subpath)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl Default for AllowList {
    fn default() -> Self {
        Self::new()
    }
}
