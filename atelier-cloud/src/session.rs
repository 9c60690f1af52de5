//! Tab session: one tab's registry plus optional shared-project support.
//!
//! The session owns every piece of tab state. Remote calls run on spawned
//! tasks and report back as `RemoteOutcome`s, which are applied here one at a
//! time, interleaved with bus envelopes and UI commands, so each mutation is
//! atomic with respect to the tab.

use crate::api::RemoteProjectApi;
use crate::cache::{PageOutcome, SharedProjectCache};
use crate::config::CloudConfig;
use crate::error::{CloudError, CloudResult};
use crate::remote::{RemoteOutcome, RemoteRequest};
use crate::sharing;
use crate::types::{Notice, PageRequest};
use atelier_storage::{PersistentStore, StoredSettings};
use atelier_sync::{BroadcastBus, ProjectRegistry, RegistryConfig};
use atelier_types::{now_millis, ProjectDocument, ProjectPatch, ProjectUid};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

/// Remote-registry state of a networked tab.
pub struct NetworkedState {
    api: Arc<dyn RemoteProjectApi>,
    cache: SharedProjectCache,
    cors_token: String,
    config: CloudConfig,
}

impl NetworkedState {
    pub fn new(api: Arc<dyn RemoteProjectApi>, cors_token: impl Into<String>, config: CloudConfig) -> Self {
        Self {
            api,
            cache: SharedProjectCache::new(),
            cors_token: cors_token.into(),
            config,
        }
    }

    pub fn cache(&self) -> &SharedProjectCache {
        &self.cache
    }
}

/// Whether this tab talks to a shared-project registry. Fixed at construction.
pub enum RegistryMode {
    LocalOnly,
    Networked(NetworkedState),
}

/// Commands sent to a running tab session.
#[derive(Debug)]
pub enum TabCommand {
    Create {
        document: Option<ProjectDocument>,
        reply: oneshot::Sender<CloudResult<ProjectUid>>,
    },
    Remove { uid: ProjectUid },
    Update { uid: Option<ProjectUid>, patch: ProjectPatch },
    Select { uid: ProjectUid },
    Share { uid: ProjectUid },
    UpdateShared { uid: ProjectUid },
    Unshare { uid: ProjectUid },
    FetchOlder,
    CloneShared { shared_uid: String },
    Shutdown,
}

/// Handle to send commands to a running session.
#[derive(Clone)]
pub struct TabHandle {
    command_tx: mpsc::Sender<TabCommand>,
}

impl TabHandle {
    pub async fn send(&self, cmd: TabCommand) -> CloudResult<()> {
        self.command_tx
            .send(cmd)
            .await
            .map_err(|_| CloudError::ChannelClosed)
    }

    /// Creates a project (empty when `document` is `None`) and returns its uid.
    pub async fn create(&self, document: Option<ProjectDocument>) -> CloudResult<ProjectUid> {
        let (reply, rx) = oneshot::channel();
        self.send(TabCommand::Create { document, reply }).await?;
        rx.await.map_err(|_| CloudError::ChannelClosed)?
    }

    pub async fn remove(&self, uid: ProjectUid) -> CloudResult<()> {
        self.send(TabCommand::Remove { uid }).await
    }

    pub async fn share(&self, uid: ProjectUid) -> CloudResult<()> {
        self.send(TabCommand::Share { uid }).await
    }

    pub async fn unshare(&self, uid: ProjectUid) -> CloudResult<()> {
        self.send(TabCommand::Unshare { uid }).await
    }

    pub async fn fetch_older(&self) -> CloudResult<()> {
        self.send(TabCommand::FetchOlder).await
    }

    pub async fn shutdown(&self) -> CloudResult<()> {
        self.send(TabCommand::Shutdown).await
    }
}

/// One tab: registry, mode and in-flight remote calls.
pub struct TabSession {
    registry: ProjectRegistry,
    mode: RegistryMode,
    completion_tx: mpsc::UnboundedSender<Completion>,
    completion_rx: Option<mpsc::UnboundedReceiver<Completion>>,
    in_flight: usize,
    notice_tx: Option<mpsc::UnboundedSender<Notice>>,
}

/// What a spawned remote call reports back.
enum Completion {
    Finished(RemoteOutcome),
    /// The task ended without an outcome (it panicked or was cancelled).
    Lost(&'static str),
}

/// Sends `Lost` on drop unless [`finish`](Self::finish) ran first.
struct CompletionGuard {
    tx: mpsc::UnboundedSender<Completion>,
    name: &'static str,
    done: bool,
}

impl CompletionGuard {
    fn finish(mut self, outcome: RemoteOutcome) {
        self.done = true;
        let _ = self.tx.send(Completion::Finished(outcome));
    }
}

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        if !self.done {
            let _ = self.tx.send(Completion::Lost(self.name));
        }
    }
}

/// Creates a session and the handle used to drive its [`TabSession::run`] loop.
pub fn create_tab_session(registry: ProjectRegistry, mode: RegistryMode) -> (TabHandle, mpsc::Receiver<TabCommand>, TabSession) {
    let (command_tx, command_rx) = mpsc::channel(64);
    (TabHandle { command_tx }, command_rx, TabSession::new(registry, mode))
}

impl TabSession {
    pub fn new(registry: ProjectRegistry, mode: RegistryMode) -> Self {
        let (completion_tx, completion_rx) = mpsc::unbounded_channel();
        Self {
            registry,
            mode,
            completion_tx,
            completion_rx: Some(completion_rx),
            in_flight: 0,
            notice_tx: None,
        }
    }

    /// Opens a tab on a shared store and bus, reading the author and CORS
    /// token from the stored settings. `remote` selects networked mode.
    pub fn open(
        store: Arc<dyn PersistentStore>,
        bus: Arc<dyn BroadcastBus>,
        registry_config: RegistryConfig,
        remote: Option<(Arc<dyn RemoteProjectApi>, CloudConfig)>,
    ) -> CloudResult<Self> {
        let settings = StoredSettings::load_or_init(store.as_ref()).map_err(atelier_sync::SyncError::from)?;
        let registry = ProjectRegistry::open(store, bus, registry_config, settings.username)?;
        let mode = match remote {
            Some((api, config)) => RegistryMode::Networked(NetworkedState::new(api, settings.cors_token, config)),
            None => RegistryMode::LocalOnly,
        };
        Ok(Self::new(registry, mode))
    }

    pub fn registry(&self) -> &ProjectRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ProjectRegistry {
        &mut self.registry
    }

    pub fn is_networked(&self) -> bool {
        matches!(self.mode, RegistryMode::Networked(_))
    }

    /// The shared-project cache, in networked mode.
    pub fn cache(&self) -> Option<&SharedProjectCache> {
        match &self.mode {
            RegistryMode::Networked(net) => Some(&net.cache),
            RegistryMode::LocalOnly => None,
        }
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn subscribe_notices(&mut self) -> mpsc::UnboundedReceiver<Notice> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.notice_tx = Some(tx);
        rx
    }

    fn notify(&self, notice: Notice) {
        info!("notice: {:?}", notice);
        if let Some(tx) = &self.notice_tx {
            let _ = tx.send(notice);
        }
    }

    /// Selects the most recent project and, when networked, starts the first
    /// silent page fetch.
    pub fn init(&mut self) -> Option<ProjectUid> {
        let selected = self.registry.init();
        if let RegistryMode::Networked(net) = &self.mode {
            let request = PageRequest::window(now_millis(), net.config.initial_page_size);
            self.spawn(RemoteRequest::List {
                request,
                notify: false,
            });
        }
        selected
    }

    // ── Registry operations ──

    pub fn create(&mut self, document: Option<ProjectDocument>) -> CloudResult<ProjectUid> {
        Ok(self.registry.create(document)?)
    }

    pub fn update(&mut self, patch: ProjectPatch, uid: Option<&ProjectUid>) -> CloudResult<()> {
        Ok(self.registry.update(patch, uid)?)
    }

    pub fn select(&mut self, uid: &ProjectUid) -> bool {
        self.registry.select(uid)
    }

    /// Removes a project, first asking the remote registry to unshare it.
    ///
    /// The unshare is best-effort; local removal does not wait for it.
    pub fn remove(&mut self, uid: &ProjectUid) -> CloudResult<()> {
        let shared = self
            .registry
            .get(uid)
            .is_some_and(|doc| doc.project.shared.is_shared());
        if shared && self.is_networked() {
            match sharing::unshare_request(&self.registry, uid) {
                Ok(request) => self.spawn(request),
                Err(e) => warn!("not unsharing {uid} before removal: {e}"),
            }
        }
        Ok(self.registry.remove(uid)?)
    }

    /// Applies envelopes other tabs have sent since the last call.
    pub fn sync_pending(&mut self) -> usize {
        self.registry.sync_pending()
    }

    // ── Shared projects ──

    pub fn share(&mut self, uid: &ProjectUid) -> CloudResult<()> {
        if !self.is_networked() {
            debug!("share ignored in local-only mode");
            return Ok(());
        }
        let request = sharing::share_request(&self.registry, uid)?;
        self.spawn(request);
        Ok(())
    }

    pub fn update_shared(&mut self, uid: &ProjectUid) -> CloudResult<()> {
        if !self.is_networked() {
            debug!("update_shared ignored in local-only mode");
            return Ok(());
        }
        let request = sharing::update_shared_request(&self.registry, uid)?;
        self.spawn(request);
        Ok(())
    }

    pub fn unshare(&mut self, uid: &ProjectUid) -> CloudResult<()> {
        if !self.is_networked() {
            debug!("unshare ignored in local-only mode");
            return Ok(());
        }
        let request = sharing::unshare_request(&self.registry, uid)?;
        self.spawn(request);
        Ok(())
    }

    /// Requests the page just older than the oldest cached summary.
    pub fn fetch_older(&mut self) {
        let RegistryMode::Networked(net) = &self.mode else {
            debug!("fetch_older ignored in local-only mode");
            return;
        };
        let request = net.cache.older_page_request(net.config.older_page_size);
        self.spawn(RemoteRequest::List {
            request,
            notify: true,
        });
    }

    /// Requests a page with explicit window arguments.
    pub fn fetch_page(&mut self, request: PageRequest, notify: bool) {
        if !self.is_networked() {
            debug!("fetch_page ignored in local-only mode");
            return;
        }
        self.spawn(RemoteRequest::List { request, notify });
    }

    /// Imports a shared project as a new local project.
    pub fn clone_shared(&mut self, shared_uid: &str) {
        if !self.is_networked() {
            debug!("clone ignored in local-only mode");
            return;
        }
        self.spawn(RemoteRequest::Open {
            shared_uid: shared_uid.to_string(),
        });
    }

    fn spawn(&mut self, request: RemoteRequest) {
        let RegistryMode::Networked(net) = &self.mode else {
            return;
        };
        let api = net.api.clone();
        let cors_token = net.cors_token.clone();
        let guard = CompletionGuard {
            tx: self.completion_tx.clone(),
            name: request.name(),
            done: false,
        };
        self.in_flight += 1;
        tokio::spawn(async move {
            let outcome = request.execute(api.as_ref(), &cors_token).await;
            guard.finish(outcome);
        });
    }

    // ── Completions ──

    /// Waits for every in-flight remote call and applies its outcome.
    pub async fn settle(&mut self) {
        let Some(mut rx) = self.completion_rx.take() else {
            return;
        };
        while self.in_flight > 0 {
            match rx.recv().await {
                Some(completion) => self.complete(completion),
                None => break,
            }
        }
        self.completion_rx = Some(rx);
    }

    fn complete(&mut self, completion: Completion) {
        self.in_flight = self.in_flight.saturating_sub(1);
        match completion {
            Completion::Finished(outcome) => {
                self.apply_outcome(outcome);
            }
            Completion::Lost(name) => error!("remote call {name} ended without a result"),
        }
    }

    /// Applies a completed remote call to this tab. Returns true if any
    /// local state changed.
    pub fn apply_outcome(&mut self, outcome: RemoteOutcome) -> bool {
        let RegistryMode::Networked(net) = &mut self.mode else {
            warn!("remote outcome in local-only mode dropped");
            return false;
        };

        match outcome {
            RemoteOutcome::Page { notify, result } => match net.cache.apply_page(result, notify) {
                PageOutcome::Added(_) => true,
                PageOutcome::NothingNew { notify } => {
                    if notify {
                        self.notify(Notice::NoOlderSharedProjects);
                    }
                    false
                }
                PageOutcome::Failed => false,
            },
            RemoteOutcome::Opened { shared_uid, result } => match result {
                Ok(Some(document)) => match self.registry.create(Some(document)) {
                    Ok(uid) => {
                        info!("cloned shared project {shared_uid} as {uid}");
                        true
                    }
                    Err(e) => {
                        error!("failed to store clone of {shared_uid}: {e}");
                        false
                    }
                },
                Ok(None) => {
                    self.notify(Notice::SharedProjectGone { uid: shared_uid });
                    false
                }
                Err(e) => {
                    error!("clone of {shared_uid} failed: {e}");
                    false
                }
            },
            RemoteOutcome::Shared { uid, result } => {
                sharing::apply_share(&mut self.registry, &mut net.cache, &uid, result)
            }
            RemoteOutcome::SharedUpdated { uid, expected, result } => {
                sharing::apply_update_shared(&self.registry, &mut net.cache, &uid, &expected, result)
            }
            RemoteOutcome::Unshared { uid, expected, result } => {
                sharing::apply_unshare(&mut self.registry, &mut net.cache, &uid, &expected, result)
            }
        }
    }

    // ── Event loop ──

    /// Runs the tab until `Shutdown` or until every handle is dropped.
    ///
    /// Returns the session so its final state can be inspected.
    pub async fn run(mut self, mut command_rx: mpsc::Receiver<TabCommand>) -> Self {
        let mut inbox = self.registry.take_inbox();
        let mut completions = self.completion_rx.take();
        info!("tab {} session started", self.registry.tab_id());

        loop {
            tokio::select! {
                cmd = command_rx.recv() => {
                    match cmd {
                        Some(TabCommand::Shutdown) | None => {
                            info!("tab {} session shutting down", self.registry.tab_id());
                            break;
                        }
                        Some(cmd) => self.handle_command(cmd),
                    }
                }
                Some(envelope) = recv_opt(&mut inbox) => {
                    self.registry.apply_envelope(&envelope);
                }
                Some(completion) = recv_opt(&mut completions) => {
                    self.complete(completion);
                }
            }
        }

        if let Some(inbox) = inbox {
            self.registry.restore_inbox(inbox);
        }
        self.completion_rx = completions;
        self
    }

    fn handle_command(&mut self, cmd: TabCommand) {
        debug!("tab command: {:?}", cmd);
        let result = match cmd {
            TabCommand::Create { document, reply } => {
                let _ = reply.send(self.create(document));
                Ok(())
            }
            TabCommand::Remove { uid } => self.remove(&uid),
            TabCommand::Update { uid, patch } => self.update(patch, uid.as_ref()),
            TabCommand::Select { uid } => {
                self.select(&uid);
                Ok(())
            }
            TabCommand::Share { uid } => self.share(&uid),
            TabCommand::UpdateShared { uid } => self.update_shared(&uid),
            TabCommand::Unshare { uid } => self.unshare(&uid),
            TabCommand::FetchOlder => {
                self.fetch_older();
                Ok(())
            }
            TabCommand::CloneShared { shared_uid } => {
                self.clone_shared(&shared_uid);
                Ok(())
            }
            TabCommand::Shutdown => Ok(()),
        };
        if let Err(e) = result {
            warn!("tab command failed: {e}");
        }
    }
}

async fn recv_opt<T>(rx: &mut Option<mpsc::UnboundedReceiver<T>>) -> Option<T> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}
