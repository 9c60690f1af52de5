use atelier_types::{ProjectUid, SectionTag, TabId};

/// Notifications for dependent systems (views, editors) of one tab.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryEvent {
    /// A project was added, by this tab or another one.
    Created { uid: ProjectUid },
    /// A project was removed.
    Removed { uid: ProjectUid },
    /// Sections of a project were replaced.
    ///
    /// `notify == false` means the change was persisted but dependents should
    /// not reload from it.
    Updated {
        uid: ProjectUid,
        sections: Vec<SectionTag>,
        origin: TabId,
        notify: bool,
    },
    /// The tab selected a project; dependents should load it.
    Loaded { uid: ProjectUid },
    /// The previous selection was released.
    Unloaded { uid: ProjectUid },
}
