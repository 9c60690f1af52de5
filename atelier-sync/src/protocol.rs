//! Messages exchanged between tabs over the broadcast bus.

use atelier_types::{ProjectDocument, ProjectPatch, ProjectUid, TabId};
use serde::{Deserialize, Serialize};

/// A registry mutation, applied identically by every tab.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum RegistryAction {
    New {
        uid: ProjectUid,
        document: ProjectDocument,
    },
    Remove {
        uid: ProjectUid,
    },
    Update {
        uid: ProjectUid,
        patch: ProjectPatch,
    },
}

impl RegistryAction {
    pub fn uid(&self) -> &ProjectUid {
        match self {
            RegistryAction::New { uid, .. }
            | RegistryAction::Remove { uid }
            | RegistryAction::Update { uid, .. } => uid,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            RegistryAction::New { .. } => "new",
            RegistryAction::Remove { .. } => "remove",
            RegistryAction::Update { .. } => "update",
        }
    }
}

/// An action plus the tab that originated it.
///
/// Only the originating tab persists the result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub origin: TabId,
    #[serde(flatten)]
    pub action: RegistryAction,
}

impl Envelope {
    pub fn new(origin: TabId, action: RegistryAction) -> Self {
        Self { origin, action }
    }

    pub fn is_from(&self, tab: TabId) -> bool {
        self.origin == tab
    }
}
