use crate::error::StorageResult;

/// Durable key/value storage shared by every tab of one origin.
///
/// Implementations must be safe to share between tabs; each call is atomic
/// on its own, there are no multi-key transactions.
pub trait PersistentStore: Send + Sync {
    fn has(&self, key: &str) -> StorageResult<bool> {
        Ok(self.fetch(key)?.is_some())
    }

    fn fetch(&self, key: &str) -> StorageResult<Option<String>>;

    fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    fn remove(&self, key: &str) -> StorageResult<()>;

    /// Lists every key starting with `prefix`, in key order.
    fn keys(&self, prefix: &str) -> StorageResult<Vec<String>>;
}
