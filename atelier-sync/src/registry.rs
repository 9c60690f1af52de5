//! Per-tab project registry.
//!
//! Holds this tab's copy of every project document. All mutations that must
//! reach other tabs go through [`ProjectRegistry::dispatch`], which applies the
//! action locally before handing it to the bus; envelopes coming back from the
//! bus are applied through the same [`ProjectRegistry::apply`] path.

use crate::bus::BroadcastBus;
use crate::config::RegistryConfig;
use crate::error::{SyncError, SyncResult};
use crate::events::RegistryEvent;
use crate::protocol::{Envelope, RegistryAction};
use atelier_storage::PersistentStore;
use atelier_types::{now_millis, ProjectDocument, ProjectPatch, ProjectUid, Section, SectionTag, TabId};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Authoritative in-memory project map for one tab.
pub struct ProjectRegistry {
    tab_id: TabId,
    config: RegistryConfig,
    /// Author recorded on new empty projects.
    author: String,
    store: Arc<dyn PersistentStore>,
    bus: Arc<dyn BroadcastBus>,
    /// Envelopes from the bus not yet applied.
    inbox: Option<mpsc::UnboundedReceiver<Envelope>>,
    projects: HashMap<ProjectUid, ProjectDocument>,
    /// Tab-local selection, never broadcast.
    current: Option<ProjectUid>,
    event_tx: Option<mpsc::UnboundedSender<RegistryEvent>>,
}

impl ProjectRegistry {
    /// Opens the registry for a new tab.
    ///
    /// Subscribes to the bus, loads every project document from the store
    /// (unparseable entries are logged and skipped) and creates an empty
    /// project if none could be loaded.
    pub fn open(
        store: Arc<dyn PersistentStore>,
        bus: Arc<dyn BroadcastBus>,
        config: RegistryConfig,
        author: impl Into<String>,
    ) -> SyncResult<Self> {
        let tab_id = TabId::new();
        let inbox = bus.subscribe(tab_id);
        let mut registry = Self {
            tab_id,
            config,
            author: author.into(),
            store,
            bus,
            inbox: Some(inbox),
            projects: HashMap::new(),
            current: None,
            event_tx: None,
        };

        registry.load_from_store()?;
        if registry.projects.is_empty() {
            let uid = registry.create(None)?;
            info!("[REGISTRY] No stored projects, created {}", uid);
        }

        info!(
            "[REGISTRY] Tab {} opened with {} projects",
            registry.tab_id,
            registry.projects.len()
        );
        Ok(registry)
    }

    fn load_from_store(&mut self) -> SyncResult<()> {
        for key in self.store.keys(&self.config.key_prefix)? {
            let Some(uid) = self.config.uid_from_key(&key) else {
                continue;
            };
            let Some(text) = self.store.fetch(&key)? else {
                continue;
            };
            match ProjectDocument::from_json(&text) {
                Ok(doc) => {
                    self.projects.insert(uid, doc);
                }
                Err(e) => {
                    warn!("[REGISTRY] Skipping unreadable project {}: {}", key, e);
                }
            }
        }
        Ok(())
    }

    /// Returns a channel of change notifications for this tab.
    ///
    /// Replaces any earlier subscriber.
    pub fn subscribe_events(&mut self) -> mpsc::UnboundedReceiver<RegistryEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.event_tx = Some(tx);
        rx
    }

    fn emit(&self, event: RegistryEvent) {
        if let Some(tx) = &self.event_tx {
            let _ = tx.send(event);
        }
    }

    // ── Accessors ──

    pub fn tab_id(&self) -> TabId {
        self.tab_id
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    pub fn current(&self) -> Option<&ProjectUid> {
        self.current.as_ref()
    }

    pub fn get(&self, uid: &ProjectUid) -> Option<&ProjectDocument> {
        self.projects.get(uid)
    }

    pub fn contains(&self, uid: &ProjectUid) -> bool {
        self.projects.contains_key(uid)
    }

    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    pub fn uids(&self) -> Vec<ProjectUid> {
        self.projects.keys().cloned().collect()
    }

    /// Project with the greatest `lastEdited`. Tie order is unspecified.
    pub fn most_recent(&self) -> Option<ProjectUid> {
        self.projects
            .iter()
            .max_by_key(|(_, doc)| doc.project.last_edited)
            .map(|(uid, _)| uid.clone())
    }

    fn resolve(&self, uid: Option<&ProjectUid>) -> SyncResult<ProjectUid> {
        let uid = match uid {
            Some(uid) => uid.clone(),
            None => self.current.clone().ok_or(SyncError::NoSelection)?,
        };
        if !self.projects.contains_key(&uid) {
            return Err(SyncError::UnknownProject(uid));
        }
        Ok(uid)
    }

    fn fresh_uid(&self) -> ProjectUid {
        loop {
            let uid = ProjectUid::new();
            if !self.projects.contains_key(&uid) {
                return uid;
            }
        }
    }

    // ── Selection ──

    /// Selects the most recently edited project.
    pub fn init(&mut self) -> Option<ProjectUid> {
        let uid = self.most_recent()?;
        self.select(&uid);
        Some(uid)
    }

    /// Makes `uid` this tab's current project.
    ///
    /// Returns false for the already selected project or an unknown uid.
    pub fn select(&mut self, uid: &ProjectUid) -> bool {
        if self.current.as_ref() == Some(uid) || !self.projects.contains_key(uid) {
            return false;
        }
        if let Some(previous) = self.current.take() {
            self.emit(RegistryEvent::Unloaded { uid: previous });
        }
        self.current = Some(uid.clone());
        self.emit(RegistryEvent::Loaded { uid: uid.clone() });
        debug!("[REGISTRY] Selected {}", uid);
        true
    }

    // ── Mutations ──

    /// Creates a project and returns its uid.
    ///
    /// Without a document, an empty project is built from the configured
    /// template. A given document is adopted as-is under the new uid.
    pub fn create(&mut self, document: Option<ProjectDocument>) -> SyncResult<ProjectUid> {
        let uid = self.fresh_uid();
        let document = document
            .unwrap_or_else(|| self.config.default_project.build(&self.author, now_millis()));
        let json = document.to_json()?;

        self.dispatch(RegistryAction::New {
            uid: uid.clone(),
            document,
        });
        self.store.set(&self.config.key_for(&uid), &json)?;

        info!("[REGISTRY] Created project {}", uid);
        Ok(uid)
    }

    /// Parses an exported document and creates it as a new project.
    pub fn import(&mut self, text: &str) -> SyncResult<ProjectUid> {
        let document = ProjectDocument::from_json(text)?;
        self.create(Some(document))
    }

    /// Removes a project from every tab.
    ///
    /// Removing the last project first creates and selects a replacement, so
    /// the registry is never empty.
    pub fn remove(&mut self, uid: &ProjectUid) -> SyncResult<()> {
        if !self.projects.contains_key(uid) {
            return Err(SyncError::UnknownProject(uid.clone()));
        }
        if self.projects.len() == 1 {
            let replacement = self.create(None)?;
            self.select(&replacement);
        }

        self.dispatch(RegistryAction::Remove { uid: uid.clone() });
        self.store.remove(&self.config.key_for(uid))?;

        info!("[REGISTRY] Removed project {}", uid);
        Ok(())
    }

    /// Replaces the sections in `patch` on every tab and persists the result.
    ///
    /// A `project` section is synthesized from the current metadata when
    /// missing; its `lastEdited` is always bumped and `createdAt` preserved.
    pub fn update(&mut self, mut patch: ProjectPatch, uid: Option<&ProjectUid>) -> SyncResult<()> {
        let uid = self.resolve(uid)?;
        let existing = &self.projects[&uid].project;
        let last_edited = now_millis().max(existing.last_edited);
        let created_at = existing.created_at;

        if !patch.has(SectionTag::Project) {
            patch.set(Section::Project(existing.clone()));
        }
        if let Some(meta) = patch.project_mut() {
            meta.last_edited = last_edited;
            meta.created_at = created_at;
        }

        self.dispatch(RegistryAction::Update {
            uid: uid.clone(),
            patch,
        });
        self.write(Some(&uid))
    }

    /// Renames a project. Empty names are ignored.
    pub fn rename(&mut self, uid: &ProjectUid, name: &str) -> SyncResult<()> {
        if name.is_empty() {
            return Ok(());
        }
        let uid = self.resolve(Some(uid))?;
        let mut meta = self.projects[&uid].project.clone();
        meta.name = name.to_string();
        self.update(ProjectPatch::new().with(Section::Project(meta)), Some(&uid))
    }

    /// Merges sections into this tab's copy only. Nothing is broadcast or
    /// persisted; call [`write`](Self::write) or [`update`](Self::update)
    /// afterwards when durability is needed.
    pub fn set(&mut self, patch: &ProjectPatch, uid: Option<&ProjectUid>) -> SyncResult<()> {
        let uid = self.resolve(uid)?;
        if let Some(doc) = self.projects.get_mut(&uid) {
            doc.merge(patch);
        }
        Ok(())
    }

    /// Persists this tab's copy of a project.
    pub fn write(&self, uid: Option<&ProjectUid>) -> SyncResult<()> {
        let uid = self.resolve(uid)?;
        let json = self.projects[&uid].to_json()?;
        self.store.set(&self.config.key_for(&uid), &json)?;
        Ok(())
    }

    /// Bumps `lastEdited` on this tab's copy and persists it.
    pub fn save(&mut self, uid: Option<&ProjectUid>) -> SyncResult<()> {
        let uid = self.resolve(uid)?;
        if let Some(doc) = self.projects.get_mut(&uid) {
            doc.project.last_edited = now_millis().max(doc.project.last_edited);
        }
        self.write(Some(&uid))
    }

    /// Serializes a project for download, without sharing credentials.
    ///
    /// Returns `(file_name, contents)`.
    pub fn export(&self, uid: &ProjectUid) -> SyncResult<(String, String)> {
        let uid = self.resolve(Some(uid))?;
        let doc = self.projects[&uid].stripped_for_export();
        let file_name = format!("{}.atelier.json", doc.project.name);
        Ok((file_name, doc.to_json()?))
    }

    // ── Replication ──

    /// Applies an action locally, then sends it to the other tabs.
    fn dispatch(&mut self, action: RegistryAction) {
        let envelope = Envelope::new(self.tab_id, action);
        self.apply(&envelope);
        self.bus.dispatch(envelope);
    }

    /// Applies an envelope received from the bus.
    ///
    /// Envelopes this tab originated were applied when dispatched and are
    /// skipped. Returns true if the envelope changed local state.
    pub fn apply_envelope(&mut self, envelope: &Envelope) -> bool {
        if envelope.is_from(self.tab_id) {
            return false;
        }
        debug!(
            "[REGISTRY] Tab {} applying {} for {} from {}",
            self.tab_id,
            envelope.action.name(),
            envelope.action.uid(),
            envelope.origin
        );
        self.apply(envelope)
    }

    /// Drains and applies every pending envelope. Returns how many changed state.
    pub fn sync_pending(&mut self) -> usize {
        let mut pending = Vec::new();
        if let Some(inbox) = self.inbox.as_mut() {
            while let Ok(envelope) = inbox.try_recv() {
                pending.push(envelope);
            }
        }
        pending
            .iter()
            .filter(|envelope| self.apply_envelope(envelope))
            .count()
    }

    /// Hands the bus receiver to an external event loop.
    ///
    /// After this, [`sync_pending`](Self::sync_pending) is a no-op and the
    /// loop must call [`apply_envelope`](Self::apply_envelope) itself.
    pub fn take_inbox(&mut self) -> Option<mpsc::UnboundedReceiver<Envelope>> {
        self.inbox.take()
    }

    /// Gives back a receiver previously obtained from [`take_inbox`](Self::take_inbox).
    pub fn restore_inbox(&mut self, inbox: mpsc::UnboundedReceiver<Envelope>) {
        self.inbox = Some(inbox);
    }

    fn apply(&mut self, envelope: &Envelope) -> bool {
        match &envelope.action {
            RegistryAction::New { uid, document } => {
                self.projects.insert(uid.clone(), document.clone());
                self.emit(RegistryEvent::Created { uid: uid.clone() });
                true
            }
            RegistryAction::Remove { uid } => {
                if self.projects.remove(uid).is_none() {
                    debug!("[REGISTRY] Remove for unknown project {}", uid);
                    return false;
                }
                self.emit(RegistryEvent::Removed { uid: uid.clone() });

                let was_current = self.current.as_ref() == Some(uid);
                if was_current {
                    self.current = None;
                }
                // Concurrent removes from several tabs can each pass the
                // last-project check and still empty the map together.
                let mut replaced = false;
                if self.projects.is_empty() {
                    match self.create(None) {
                        Ok(replacement) => {
                            info!("[REGISTRY] Last project removed remotely, created {}", replacement);
                        }
                        Err(e) => warn!("[REGISTRY] Failed to persist replacement project: {}", e),
                    }
                    replaced = true;
                }
                if was_current || (replaced && self.current.is_none()) {
                    if let Some(next) = self.most_recent() {
                        self.select(&next);
                    }
                }
                true
            }
            RegistryAction::Update { uid, patch } => {
                let Some(doc) = self.projects.get_mut(uid) else {
                    warn!("[REGISTRY] Update for unknown project {}", uid);
                    return false;
                };
                doc.merge(patch);
                self.emit(RegistryEvent::Updated {
                    uid: uid.clone(),
                    sections: patch.tags(),
                    origin: envelope.origin,
                    notify: patch.notify(),
                });
                true
            }
        }
    }
}
