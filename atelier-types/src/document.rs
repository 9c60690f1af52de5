//! Project document model.
//!
//! A document is made of four named top-level sections. Updates replace whole
//! sections (last writer wins per section), never individual fields inside one.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Remote sharing credentials for a project. Empty strings mean "not shared".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedRef {
    #[serde(default)]
    pub uid: String,
    #[serde(default)]
    pub token: String,
}

impl SharedRef {
    pub fn new(uid: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            token: token.into(),
        }
    }

    /// Returns true if the project has a remote counterpart.
    pub fn is_shared(&self) -> bool {
        !self.uid.is_empty()
    }
}

/// Project metadata section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectMeta {
    pub name: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub shared: SharedRef,
    /// Epoch millis, immutable after creation.
    pub created_at: i64,
    /// Epoch millis, bumped on every persisted write.
    pub last_edited: i64,
}

/// A complete project document as stored under `project-<uid>`.
///
/// `device`, `blocks` and `files` are opaque to the sync engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectDocument {
    pub device: Value,
    pub blocks: Value,
    pub files: Value,
    pub project: ProjectMeta,
}

impl ProjectDocument {
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Returns a copy of the given section.
    pub fn section(&self, tag: SectionTag) -> Section {
        match tag {
            SectionTag::Device => Section::Device(self.device.clone()),
            SectionTag::Blocks => Section::Blocks(self.blocks.clone()),
            SectionTag::Files => Section::Files(self.files.clone()),
            SectionTag::Project => Section::Project(self.project.clone()),
        }
    }

    /// Replaces one section wholesale.
    pub fn replace(&mut self, section: Section) {
        match section {
            Section::Device(v) => self.device = v,
            Section::Blocks(v) => self.blocks = v,
            Section::Files(v) => self.files = v,
            Section::Project(meta) => self.project = meta,
        }
    }

    /// Applies every section of a patch. The patch's notify flag is ignored here.
    pub fn merge(&mut self, patch: &ProjectPatch) {
        for section in patch.sections() {
            self.replace(section.clone());
        }
    }

    /// Copy of the document with sharing credentials blanked, for export.
    pub fn stripped_for_export(&self) -> Self {
        let mut doc = self.clone();
        doc.project.shared = SharedRef::default();
        doc
    }
}

/// Names of the top-level document sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionTag {
    Device,
    Blocks,
    Files,
    Project,
}

/// One top-level section with its new value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "section", content = "value", rename_all = "lowercase")]
pub enum Section {
    Device(Value),
    Blocks(Value),
    Files(Value),
    Project(ProjectMeta),
}

impl Section {
    pub fn tag(&self) -> SectionTag {
        match self {
            Section::Device(_) => SectionTag::Device,
            Section::Blocks(_) => SectionTag::Blocks,
            Section::Files(_) => SectionTag::Files,
            Section::Project(_) => SectionTag::Project,
        }
    }
}

/// A partial document: a set of sections to replace, plus whether dependent
/// systems should be told to reload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectPatch {
    sections: Vec<Section>,
    notify: bool,
}

impl ProjectPatch {
    pub fn new() -> Self {
        Self {
            sections: Vec::new(),
            notify: true,
        }
    }

    /// Adds a section, replacing any earlier section with the same tag.
    pub fn with(mut self, section: Section) -> Self {
        self.set(section);
        self
    }

    pub fn set(&mut self, section: Section) {
        let tag = section.tag();
        match self.sections.iter_mut().find(|s| s.tag() == tag) {
            Some(existing) => *existing = section,
            None => self.sections.push(section),
        }
    }

    /// Persist and propagate, but do not ask dependent systems to reload.
    pub fn silent(mut self) -> Self {
        self.notify = false;
        self
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn tags(&self) -> Vec<SectionTag> {
        self.sections.iter().map(Section::tag).collect()
    }

    pub fn notify(&self) -> bool {
        self.notify
    }

    pub fn has(&self, tag: SectionTag) -> bool {
        self.sections.iter().any(|s| s.tag() == tag)
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn project_mut(&mut self) -> Option<&mut ProjectMeta> {
        self.sections.iter_mut().find_map(|s| match s {
            Section::Project(meta) => Some(meta),
            _ => None,
        })
    }
}

impl Default for ProjectPatch {
    fn default() -> Self {
        Self::new()
    }
}
