//! Origin-wide settings kept next to the project documents.

use crate::error::StorageResult;
use crate::store::PersistentStore;
use atelier_types::ProjectUid;
use tracing::debug;

const CORS_TOKEN_KEY: &str = "cors_token";
const USERNAME_KEY: &str = "username";
const CORS_TOKEN_LEN: usize = 12;
const DEFAULT_USERNAME: &str = "a user";

/// Settings shared by every tab of one origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredSettings {
    /// Anonymous client token sent with remote write calls.
    pub cors_token: String,
    /// Author name for new projects.
    pub username: String,
}

impl StoredSettings {
    /// Reads the settings, writing defaults for any that are missing.
    pub fn load_or_init(store: &dyn PersistentStore) -> StorageResult<Self> {
        let cors_token = match store.fetch(CORS_TOKEN_KEY)? {
            Some(token) => token,
            None => {
                let token: String = ProjectUid::new().as_str().chars().take(CORS_TOKEN_LEN).collect();
                store.set(CORS_TOKEN_KEY, &token)?;
                debug!("initialized cors token");
                token
            }
        };

        let username = match store.fetch(USERNAME_KEY)? {
            Some(name) => name,
            None => {
                store.set(USERNAME_KEY, DEFAULT_USERNAME)?;
                DEFAULT_USERNAME.to_string()
            }
        };

        Ok(Self { cors_token, username })
    }

    /// Changes the username for this and later sessions.
    pub fn set_username(&mut self, store: &dyn PersistentStore, username: &str) -> StorageResult<()> {
        store.set(USERNAME_KEY, username)?;
        self.username = username.to_string();
        Ok(())
    }
}
