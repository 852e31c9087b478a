//! Backend manager that dispatches to the configured provider.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use bastion_core::config::BackendConfig;
use bastion_core::error::AppError;
use bastion_core::result::AppResult;
use bastion_core::traits::{Backend, Clock};
use bastion_core::types::Ttl;

/// Wraps the configured backend provider.
#[derive(Debug, Clone)]
pub struct BackendManager {
    /// The inner backend.
    inner: Arc<dyn Backend>,
    /// Set when the in-memory provider is active, for expiry sweeps.
    #[cfg(feature = "memory")]
    memory: Option<crate::memory::MemoryBackend>,
}

impl BackendManager {
    /// Create a backend from configuration. Expiry is judged by `clock`.
    pub fn new(config: &BackendConfig, clock: Arc<dyn Clock>) -> AppResult<Self> {
        match config.provider.as_str() {
            #[cfg(feature = "memory")]
            "memory" => {
                info!("Initializing in-memory backend");
                let memory = crate::memory::MemoryBackend::new(clock);
                Ok(Self {
                    inner: Arc::new(memory.clone()),
                    memory: Some(memory),
                })
            }
            other => {
                let _ = clock;
                Err(AppError::configuration(format!(
                    "Unknown backend provider: '{other}'. Supported: memory"
                )))
            }
        }
    }

    /// Create a manager from an existing backend (for testing).
    pub fn from_backend(backend: Arc<dyn Backend>) -> Self {
        Self {
            inner: backend,
            #[cfg(feature = "memory")]
            memory: None,
        }
    }

    /// Start sweeping expired keys every `interval`, if the provider needs it.
    pub fn spawn_purge_task(&self, interval: Duration) -> Option<tokio::task::JoinHandle<()>> {
        #[cfg(feature = "memory")]
        if let Some(memory) = &self.memory {
            info!(interval_secs = interval.as_secs(), "Starting expired key sweeper");
            return Some(memory.spawn_purge_task(interval));
        }
        let _ = interval;
        None
    }

    /// Shared handle to the inner backend.
    pub fn backend(&self) -> Arc<dyn Backend> {
        Arc::clone(&self.inner)
    }
}

#[async_trait]
impl Backend for BackendManager {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        self.inner.get(key).await
    }

    async fn put(&self, key: &str, value: &str, ttl: Ttl) -> AppResult<()> {
        self.inner.put(key, value, ttl).await
    }

    async fn create(&self, key: &str, value: &str, ttl: Ttl) -> AppResult<bool> {
        self.inner.create(key, value, ttl).await
    }

    async fn compare_and_swap(
        &self,
        key: &str,
        expected: Option<&str>,
        value: &str,
        ttl: Ttl,
    ) -> AppResult<bool> {
        self.inner.compare_and_swap(key, expected, value, ttl).await
    }

    async fn take(&self, key: &str) -> AppResult<Option<String>> {
        self.inner.take(key).await
    }

    async fn delete(&self, key: &str) -> AppResult<bool> {
        self.inner.delete(key).await
    }

    async fn list(&self, prefix: &str) -> AppResult<Vec<(String, String)>> {
        self.inner.list(prefix).await
    }

    async fn health_check(&self) -> AppResult<bool> {
        self.inner.health_check().await
    }
}
