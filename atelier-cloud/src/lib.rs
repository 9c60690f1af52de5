//! Shared-project support for Atelier.
//!
//! Provides:
//! - `RemoteProjectApi`, the shared-project registry contract, and its HTTP client
//! - `SharedProjectCache`, a deduplicated, watermark-paginated accumulation of
//!   remote summaries
//! - The share / update / unshare / clone workflow with stale-response checks
//! - `TabSession`, which ties a tab's registry to an optional remote registry
//!   and applies remote completions on the tab's own loop

pub mod api;
pub mod api_client;
pub mod cache;
pub mod config;
pub mod error;
pub mod remote;
pub mod session;
pub mod sharing;
pub mod types;

pub use api::RemoteProjectApi;
pub use api_client::HttpProjectApi;
pub use cache::{PageOutcome, SharedProjectCache};
pub use config::CloudConfig;
pub use error::{CloudError, CloudResult};
pub use remote::{RemoteOutcome, RemoteRequest};
pub use session::{create_tab_session, NetworkedState, RegistryMode, TabCommand, TabHandle, TabSession};
pub use types::*;
