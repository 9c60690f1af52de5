//! Remote calls as values.
//!
//! A `RemoteRequest` captures everything a call needs, including the
//! identifiers its response must still match when it comes back. Executing it
//! yields a `RemoteOutcome`, which the owning tab applies on its own loop.

use crate::api::RemoteProjectApi;
use crate::error::CloudResult;
use crate::types::{PageRequest, ShareReceipt};
use atelier_types::{ProjectDocument, ProjectUid, SharedProjectSummary, SharedRef};
use tracing::debug;

#[derive(Debug, Clone)]
pub enum RemoteRequest {
    List {
        request: PageRequest,
        notify: bool,
    },
    Open {
        shared_uid: String,
    },
    Share {
        uid: ProjectUid,
        document: ProjectDocument,
    },
    UpdateShared {
        uid: ProjectUid,
        document: ProjectDocument,
    },
    Unshare {
        uid: ProjectUid,
        shared: SharedRef,
    },
}

#[derive(Debug)]
pub enum RemoteOutcome {
    Page {
        notify: bool,
        result: CloudResult<Vec<SharedProjectSummary>>,
    },
    Opened {
        shared_uid: String,
        result: CloudResult<Option<ProjectDocument>>,
    },
    Shared {
        uid: ProjectUid,
        result: CloudResult<ShareReceipt>,
    },
    SharedUpdated {
        uid: ProjectUid,
        /// Shared uid the project had when the call was issued.
        expected: String,
        result: CloudResult<String>,
    },
    Unshared {
        uid: ProjectUid,
        /// Shared uid the project had when the call was issued.
        expected: String,
        result: CloudResult<String>,
    },
}

impl RemoteRequest {
    pub fn name(&self) -> &'static str {
        match self {
            RemoteRequest::List { .. } => "ls",
            RemoteRequest::Open { .. } => "o",
            RemoteRequest::Share { .. } => "cp",
            RemoteRequest::UpdateShared { .. } => "w",
            RemoteRequest::Unshare { .. } => "rm",
        }
    }

    /// Runs the call to completion. Never fails; errors travel in the outcome.
    pub async fn execute(self, api: &dyn RemoteProjectApi, cors_token: &str) -> RemoteOutcome {
        debug!("remote call {}", self.name());
        match self {
            RemoteRequest::List { request, notify } => RemoteOutcome::Page {
                notify,
                result: api.list(&request).await,
            },
            RemoteRequest::Open { shared_uid } => {
                let result = api.open(&shared_uid).await;
                RemoteOutcome::Opened { shared_uid, result }
            }
            RemoteRequest::Share { uid, document } => RemoteOutcome::Shared {
                uid,
                result: api.copy(cors_token, &document).await,
            },
            RemoteRequest::UpdateShared { uid, document } => {
                let expected = document.project.shared.uid.clone();
                let result = api.write(cors_token, &document).await;
                RemoteOutcome::SharedUpdated {
                    uid,
                    expected,
                    result,
                }
            }
            RemoteRequest::Unshare { uid, shared } => {
                let result = api.remove(&shared, cors_token).await;
                RemoteOutcome::Unshared {
                    uid,
                    expected: shared.uid,
                    result,
                }
            }
        }
    }
}
