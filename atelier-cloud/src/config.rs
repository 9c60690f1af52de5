//! Shared-project client configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the shared-project registry client.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CloudConfig {
    /// Base URL of the registry service (e.g., "https://bipes.net.br/api").
    pub api_base_url: String,

    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Page size of the first, silent fetch when a tab starts.
    pub initial_page_size: u32,

    /// Page size of each "load older" fetch.
    pub older_page_size: u32,
}

impl Default for CloudConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://bipes.net.br/api".to_string(),
            request_timeout_secs: 30,
            initial_page_size: 5,
            older_page_size: 10,
        }
    }
}

impl CloudConfig {
    /// Creates a config pointing at a local test server.
    #[cfg(test)]
    pub fn test() -> Self {
        Self {
            api_base_url: "http://localhost:3002".to_string(),
            request_timeout_secs: 5,
            initial_page_size: 5,
            older_page_size: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_is_local() {
        assert!(CloudConfig::test().api_base_url.starts_with("http://localhost"));
    }
}
