use crate::error::CloudResult;
use crate::types::{PageRequest, ShareReceipt};
use async_trait::async_trait;
use atelier_types::{ProjectDocument, SharedProjectSummary, SharedRef};

/// Request/response contract of the shared-project registry.
///
/// Calls may complete in any order relative to each other and to local
/// registry operations.
#[async_trait]
pub trait RemoteProjectApi: Send + Sync {
    /// `ls`: a page of summaries.
    async fn list(&self, request: &PageRequest) -> CloudResult<Vec<SharedProjectSummary>>;

    /// `o`: the full document of a shared project, `None` if it no longer exists.
    async fn open(&self, shared_uid: &str) -> CloudResult<Option<ProjectDocument>>;

    /// `cp`: publish a project, returning its new shared identity.
    async fn copy(&self, cors_token: &str, data: &ProjectDocument) -> CloudResult<ShareReceipt>;

    /// `w`: overwrite the shared copy of a project. Returns the shared uid written.
    async fn write(&self, cors_token: &str, data: &ProjectDocument) -> CloudResult<String>;

    /// `rm`: delete a shared project. Returns the shared uid removed.
    async fn remove(&self, shared: &SharedRef, cors_token: &str) -> CloudResult<String>;
}
