//! Key-value backend trait that every trust-core entity is persisted through.

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::result::AppResult;
use crate::types::Ttl;

/// Trait for key-value storage backends.
///
/// Values are JSON strings. Expired keys behave exactly like absent keys for
/// every operation. Implementations surface their own failures as
/// [`ErrorKind::Storage`](crate::error::ErrorKind::Storage) and never retry
/// internally.
#[async_trait]
pub trait Backend: Send + Sync + std::fmt::Debug + 'static {
    /// Get a value by key. Returns `None` if the key does not exist or has expired.
    async fn get(&self, key: &str) -> AppResult<Option<String>>;

    /// Insert or overwrite a value.
    async fn put(&self, key: &str, value: &str, ttl: Ttl) -> AppResult<()>;

    /// Insert a value only if the key is absent.
    /// Returns `true` if the value was written.
    async fn create(&self, key: &str, value: &str, ttl: Ttl) -> AppResult<bool>;

    /// Atomically replace the value if the current one equals `expected`
    /// (`None` meaning "absent"). Returns `true` if the swap happened.
    async fn compare_and_swap(
        &self,
        key: &str,
        expected: Option<&str>,
        value: &str,
        ttl: Ttl,
    ) -> AppResult<bool>;

    /// Atomically remove a key and return the value it held.
    async fn take(&self, key: &str) -> AppResult<Option<String>>;

    /// Delete a key. Returns `true` if a live key was removed.
    async fn delete(&self, key: &str) -> AppResult<bool>;

    /// List all live keys starting with `prefix`, ordered by key.
    async fn list(&self, prefix: &str) -> AppResult<Vec<(String, String)>>;

    /// Check that the backend is reachable.
    async fn health_check(&self) -> AppResult<bool>;
}

/// Typed JSON helpers available on every [`Backend`], including trait objects.
#[async_trait]
pub trait BackendExt {
    /// Get a typed value by deserializing from JSON.
    async fn get_json<T: DeserializeOwned + Send>(&self, key: &str) -> AppResult<Option<T>>;

    /// Store a typed value by serializing to JSON.
    async fn put_json<T: Serialize + Sync>(&self, key: &str, value: &T, ttl: Ttl) -> AppResult<()>;

    /// List and deserialize every value under `prefix`.
    async fn list_json<T: DeserializeOwned + Send>(&self, prefix: &str) -> AppResult<Vec<T>>;
}

#[async_trait]
impl<B: Backend + ?Sized> BackendExt for B {
    async fn get_json<T: DeserializeOwned + Send>(&self, key: &str) -> AppResult<Option<T>> {
        match self.get(key).await? {
            Some(value) => Ok(Some(serde_json::from_str(&value)?)),
            None => Ok(None),
        }
    }

    async fn put_json<T: Serialize + Sync>(&self, key: &str, value: &T, ttl: Ttl) -> AppResult<()> {
        let json = serde_json::to_string(value)?;
        self.put(key, &json, ttl).await
    }

    async fn list_json<T: DeserializeOwned + Send>(&self, prefix: &str) -> AppResult<Vec<T>> {
        self.list(prefix)
            .await?
            .into_iter()
            .map(|(_, value)| serde_json::from_str(&value).map_err(Into::into))
            .collect()
    }
}
