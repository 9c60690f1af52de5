//! Shared test helpers: a scripted in-memory registry service.

#![allow(dead_code)]

use async_trait::async_trait;
use atelier_cloud::{CloudError, CloudResult, PageRequest, RemoteProjectApi, ShareReceipt};
use atelier_types::{ProjectDocument, SharedProjectSummary, SharedRef};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

/// Scripted `RemoteProjectApi`.
///
/// `list` pops queued pages (an empty page once the queue runs out); `cp`
/// hands out `s1/t1`, `s2/t2`, ...; `w` and `rm` echo the shared uid unless
/// an override is set.
#[derive(Default)]
pub struct MockApi {
    pages: Mutex<VecDeque<CloudResult<Vec<SharedProjectSummary>>>>,
    pub list_requests: Mutex<Vec<PageRequest>>,
    documents: Mutex<HashMap<String, ProjectDocument>>,
    shares: AtomicUsize,
    pub copied: Mutex<Vec<(String, ProjectDocument)>>,
    pub removed: Mutex<Vec<(SharedRef, String)>>,
    echo_override: Mutex<Option<String>>,
    failing: AtomicBool,
}

impl MockApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_page(&self, page: Vec<SharedProjectSummary>) {
        self.pages.lock().unwrap().push_back(Ok(page));
    }

    pub fn push_failure(&self) {
        self.pages
            .lock()
            .unwrap()
            .push_back(Err(CloudError::Api("500 Internal Server Error".into())));
    }

    pub fn publish(&self, shared_uid: &str, document: ProjectDocument) {
        self.documents
            .lock()
            .unwrap()
            .insert(shared_uid.to_string(), document);
    }

    pub fn echo_uid(&self, uid: &str) {
        *self.echo_override.lock().unwrap() = Some(uid.to_string());
    }

    pub fn fail_writes(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn requests(&self) -> Vec<PageRequest> {
        self.list_requests.lock().unwrap().clone()
    }

    fn check(&self) -> CloudResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(CloudError::Api("503 Service Unavailable".into()));
        }
        Ok(())
    }

    fn echo(&self, uid: &str) -> String {
        self.echo_override
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| uid.to_string())
    }
}

#[async_trait]
impl RemoteProjectApi for MockApi {
    async fn list(&self, request: &PageRequest) -> CloudResult<Vec<SharedProjectSummary>> {
        self.list_requests.lock().unwrap().push(request.clone());
        self.pages
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn open(&self, shared_uid: &str) -> CloudResult<Option<ProjectDocument>> {
        self.check()?;
        Ok(self.documents.lock().unwrap().get(shared_uid).cloned())
    }

    async fn copy(&self, cors_token: &str, data: &ProjectDocument) -> CloudResult<ShareReceipt> {
        self.check()?;
        let n = self.shares.fetch_add(1, Ordering::SeqCst) + 1;
        self.copied
            .lock()
            .unwrap()
            .push((cors_token.to_string(), data.clone()));
        Ok(ShareReceipt {
            uid: format!("s{n}"),
            token: format!("t{n}"),
        })
    }

    async fn write(&self, _cors_token: &str, data: &ProjectDocument) -> CloudResult<String> {
        self.check()?;
        Ok(self.echo(&data.project.shared.uid))
    }

    async fn remove(&self, shared: &SharedRef, cors_token: &str) -> CloudResult<String> {
        self.check()?;
        self.removed
            .lock()
            .unwrap()
            .push((shared.clone(), cors_token.to_string()));
        Ok(self.echo(&shared.uid))
    }
}

/// Routes `tracing` output to the test harness. `RUST_LOG` overrides the filter.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("atelier_cloud=debug,atelier_sync=debug")),
        )
        .with_test_writer()
        .try_init();
}

pub fn summary(uid: &str, last_edited: i64) -> SharedProjectSummary {
    SharedProjectSummary {
        uid: uid.to_string(),
        name: format!("Project {uid}"),
        author: "someone".to_string(),
        last_edited,
    }
}
