use serde::{Deserialize, Serialize};

/// Configuration for the users_info module
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UsersInfoConfig {
    /// Page size used when a list request carries no `limit`.
    #[serde(default = "default_page_size")]
    pub default_page_size: u64,
    /// Upper bound applied to any requested `limit`.
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u64,
    /// Enrichment tasks allowed to run at once per list call; 0 = unbounded.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    /// Abort in-flight enrichment tasks once one of them fails.
    #[serde(default = "default_cancel_on_error")]
    pub cancel_on_error: bool,
    /// Length of the generated short token.
    #[serde(default = "default_token_length")]
    pub token_length: usize,
}

impl Default for UsersInfoConfig {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
            max_concurrency: default_max_concurrency(),
            cancel_on_error: default_cancel_on_error(),
            token_length: default_token_length(),
        }
    }
}

fn default_page_size() -> u64 {
    50
}

fn default_max_page_size() -> u64 {
    1000
}

fn default_max_concurrency() -> usize {
    64
}

fn default_cancel_on_error() -> bool {
    true
}

fn default_token_length() -> usize {
    9
}
