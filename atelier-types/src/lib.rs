//! Core types for Atelier.
//!
//! Defines the project document model shared by every tab:
//! - Identifiers (`ProjectUid`, `TabId`)
//! - The sectioned `ProjectDocument` and `ProjectPatch`
//! - Remote shared-project summaries
//! - Small dedup/merge helpers used by caches and bootstrap

pub mod collections;
mod document;
mod ids;
mod summary;
mod template;
mod timestamp;

pub use collections::{min_by_key, push_unique};
pub use document::{ProjectDocument, ProjectMeta, ProjectPatch, Section, SectionTag, SharedRef};
pub use ids::{ProjectUid, TabId};
pub use summary::SharedProjectSummary;
pub use template::DefaultProjectConfig;
pub use timestamp::now_millis;
