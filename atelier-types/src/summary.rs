use crate::document::ProjectMeta;
use serde::{Deserialize, Serialize};

/// Remote-registry view of a shared project, as returned by `ls`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedProjectSummary {
    pub uid: String,
    pub name: String,
    #[serde(default)]
    pub author: String,
    pub last_edited: i64,
}

impl SharedProjectSummary {
    /// Builds the summary of a local project that was just shared as `shared_uid`.
    pub fn from_meta(shared_uid: impl Into<String>, meta: &ProjectMeta) -> Self {
        Self {
            uid: shared_uid.into(),
            name: meta.name.clone(),
            author: meta.author.clone(),
            last_edited: meta.last_edited,
        }
    }
}
