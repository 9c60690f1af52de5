//! Share workflow: share, update shared copy, unshare.
//!
//! A project is `Private` while `shared.uid` is empty and `Shared` otherwise.
//! Requests are only built from the matching state. Responses are applied
//! against the registry as it is when they arrive; one whose uid no longer
//! matches the project's recorded shared uid is discarded.

use crate::cache::SharedProjectCache;
use crate::error::{CloudError, CloudResult};
use crate::remote::RemoteRequest;
use crate::types::ShareReceipt;
use atelier_sync::{ProjectRegistry, SyncError};
use atelier_types::{ProjectPatch, ProjectUid, Section, SharedProjectSummary, SharedRef};
use tracing::{debug, error, info, warn};

fn shared_ref(registry: &ProjectRegistry, uid: &ProjectUid) -> CloudResult<SharedRef> {
    registry
        .get(uid)
        .map(|doc| doc.project.shared.clone())
        .ok_or_else(|| CloudError::Sync(SyncError::UnknownProject(uid.clone())))
}

/// `cp` request for a private project.
pub fn share_request(registry: &ProjectRegistry, uid: &ProjectUid) -> CloudResult<RemoteRequest> {
    if shared_ref(registry, uid)?.is_shared() {
        return Err(CloudError::InvalidState(format!("project {uid} is already shared")));
    }
    let document = registry.get(uid).cloned().ok_or_else(|| SyncError::UnknownProject(uid.clone()))?;
    Ok(RemoteRequest::Share {
        uid: uid.clone(),
        document,
    })
}

/// `w` request for a shared project.
pub fn update_shared_request(registry: &ProjectRegistry, uid: &ProjectUid) -> CloudResult<RemoteRequest> {
    if !shared_ref(registry, uid)?.is_shared() {
        return Err(CloudError::InvalidState(format!("project {uid} is not shared")));
    }
    let document = registry.get(uid).cloned().ok_or_else(|| SyncError::UnknownProject(uid.clone()))?;
    Ok(RemoteRequest::UpdateShared {
        uid: uid.clone(),
        document,
    })
}

/// `rm` request for a shared project.
pub fn unshare_request(registry: &ProjectRegistry, uid: &ProjectUid) -> CloudResult<RemoteRequest> {
    let shared = shared_ref(registry, uid)?;
    if !shared.is_shared() {
        return Err(CloudError::InvalidState(format!("project {uid} is not shared")));
    }
    Ok(RemoteRequest::Unshare {
        uid: uid.clone(),
        shared,
    })
}

/// Records a new shared identity and puts its card first in the cache.
pub fn apply_share(
    registry: &mut ProjectRegistry,
    cache: &mut SharedProjectCache,
    uid: &ProjectUid,
    result: CloudResult<ShareReceipt>,
) -> bool {
    let receipt = match result {
        Ok(receipt) => receipt,
        Err(e) => {
            error!("share of {uid} failed: {e}");
            return false;
        }
    };

    let Some(doc) = registry.get(uid) else {
        warn!("shared {} for project {uid}, which no longer exists", receipt.uid);
        return false;
    };
    if doc.project.shared.is_shared() {
        warn!(
            "discarding share {} for {uid}, already shared as {}",
            receipt.uid, doc.project.shared.uid
        );
        return false;
    }

    let mut meta = doc.project.clone();
    meta.shared = SharedRef::new(receipt.uid.clone(), receipt.token);
    if let Err(e) = registry.update(ProjectPatch::new().with(Section::Project(meta)), Some(uid)) {
        error!("failed to record share of {uid}: {e}");
        return false;
    }

    if let Some(doc) = registry.get(uid) {
        cache.insert_front(SharedProjectSummary::from_meta(receipt.uid.clone(), &doc.project));
    }
    info!("shared project {uid} as {}", receipt.uid);
    true
}

/// Refreshes the cached card after the shared copy was overwritten.
pub fn apply_update_shared(
    registry: &ProjectRegistry,
    cache: &mut SharedProjectCache,
    uid: &ProjectUid,
    expected: &str,
    result: CloudResult<String>,
) -> bool {
    let returned = match result {
        Ok(returned) => returned,
        Err(e) => {
            error!("update of shared project {expected} failed: {e}");
            return false;
        }
    };

    let Some(doc) = registry.get(uid) else {
        debug!("shared update for removed project {uid} ignored");
        return false;
    };
    if returned != expected || doc.project.shared.uid != returned {
        debug!(
            "stale shared update response {returned} for {uid} (expected {expected}, now {})",
            doc.project.shared.uid
        );
        return false;
    }

    let meta = &doc.project;
    cache.update_entry(&returned, &meta.name, &meta.author, meta.last_edited);
    info!("updated shared project {returned}");
    true
}

/// Clears the shared identity and drops its card from the cache.
///
/// If the project was removed locally in the meantime, only the cache entry
/// is dropped.
pub fn apply_unshare(
    registry: &mut ProjectRegistry,
    cache: &mut SharedProjectCache,
    uid: &ProjectUid,
    expected: &str,
    result: CloudResult<String>,
) -> bool {
    let returned = match result {
        Ok(returned) => returned,
        Err(e) => {
            error!("unshare of {expected} failed: {e}");
            return false;
        }
    };
    if returned != expected {
        debug!("stale unshare response {returned} for {uid} (expected {expected})");
        return false;
    }

    if let Some(doc) = registry.get(uid) {
        if doc.project.shared.uid != returned {
            debug!(
                "unshare response {returned} for {uid} ignored, now shared as {}",
                doc.project.shared.uid
            );
            return false;
        }
        let mut meta = doc.project.clone();
        meta.shared = SharedRef::default();
        if let Err(e) = registry.update(ProjectPatch::new().with(Section::Project(meta)), Some(uid)) {
            warn!("failed to clear shared state of {uid}: {e}");
        }
    }

    cache.remove(&returned);
    info!("unshared {returned}");
    true
}
