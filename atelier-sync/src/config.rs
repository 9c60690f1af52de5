//! Registry configuration.

use atelier_types::{DefaultProjectConfig, ProjectUid};
use serde::{Deserialize, Serialize};

/// Configuration for a tab's project registry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Store key prefix for project documents (e.g., "project-").
    pub key_prefix: String,

    /// Template for freshly created empty projects.
    pub default_project: DefaultProjectConfig,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            key_prefix: "project-".to_string(),
            default_project: DefaultProjectConfig::default(),
        }
    }
}

impl RegistryConfig {
    /// Store key for a project.
    pub fn key_for(&self, uid: &ProjectUid) -> String {
        format!("{}{}", self.key_prefix, uid)
    }

    /// Recovers the project uid from a store key, if it has the prefix.
    pub fn uid_from_key(&self, key: &str) -> Option<ProjectUid> {
        key.strip_prefix(&self.key_prefix)
            .filter(|rest| !rest.is_empty())
            .map(ProjectUid::from)
    }
}
