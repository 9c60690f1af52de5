//! Cross-tab synchronization of the project registry.
//!
//! Every tab holds its own `ProjectRegistry`. Mutations follow a fixed
//! two-phase protocol:
//! 1. The initiating tab wraps the mutation in an `Envelope`, applies it
//!    locally and dispatches it on the `BroadcastBus`; every other tab
//!    applies it through the same code path.
//! 2. Only the initiating tab writes the result to the `PersistentStore`.
//!
//! The store is read once at startup; afterwards the bus is the only
//! channel between tabs.

pub mod bus;
pub mod config;
pub mod error;
pub mod events;
pub mod protocol;
pub mod registry;

pub use bus::{BroadcastBus, LocalBus};
pub use config::RegistryConfig;
pub use error::{SyncError, SyncResult};
pub use events::RegistryEvent;
pub use protocol::{Envelope, RegistryAction};
pub use registry::ProjectRegistry;
