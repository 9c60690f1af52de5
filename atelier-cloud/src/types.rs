//! Wire types for the shared-project registry.

use atelier_types::{ProjectDocument, SharedProjectSummary};
use serde::{Deserialize, Serialize};

/// Window arguments for `ls`. Both unset requests the newest batch.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// Only entries edited at or before this epoch-millis timestamp.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

impl PageRequest {
    pub fn newest() -> Self {
        Self::default()
    }

    /// Up to `limit` entries edited at or before `from`.
    pub fn window(from: i64, limit: u32) -> Self {
        Self {
            from: Some(from),
            limit: Some(limit),
        }
    }
}

/// `ls` response.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ListResponse {
    #[serde(default)]
    pub projects: Vec<SharedProjectSummary>,
}

/// `o` response. A missing `projects` key means the shared project is gone.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OpenResponse {
    #[serde(default)]
    pub projects: Option<Vec<OpenedProject>>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OpenedProject {
    pub data: ProjectDocument,
}

/// `cp` response: the new shared identity of a project.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareReceipt {
    pub uid: String,
    pub token: String,
}

/// `w` and `rm` response: the shared uid the server acted on.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UidResponse {
    pub uid: String,
}

/// User-visible conditions raised by remote operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notice {
    /// An explicit "load older" returned nothing new.
    NoOlderSharedProjects,
    /// A shared project could not be cloned because it no longer exists.
    SharedProjectGone { uid: String },
}
