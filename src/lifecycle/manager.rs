//! Lifecycle Manager
//!
//! Runs registered hooks in order and reports failures by service name.

use super::{LifecycleError, OnApplicationBootstrap, OnModuleDestroy, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

struct LifecycleHook<T: ?Sized> {
    service: Arc<RwLock<T>>,
    name: String,
}

impl<T: ?Sized> LifecycleHook<T> {
    fn new(service: Arc<RwLock<T>>, name: impl Into<String>) -> Self {
        Self {
            service,
            name: name.into(),
        }
    }
}

/// Holds the bootstrap and destroy hooks for all registered services
///
/// Bootstrap hooks run in registration order and the first failure aborts
/// startup. Destroy hooks run in reverse order and failures are logged but do
/// not stop the remaining hooks.
#[derive(Default)]
pub struct LifecycleManager {
    on_bootstrap_hooks: Vec<LifecycleHook<dyn OnApplicationBootstrap>>,
    on_destroy_hooks: Vec<LifecycleHook<dyn OnModuleDestroy>>,
}

impl LifecycleManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_bootstrap<T>(&mut self, service: Arc<RwLock<T>>, name: impl Into<String>)
    where
        T: OnApplicationBootstrap + 'static,
    {
        self.on_bootstrap_hooks
            .push(LifecycleHook::new(service, name));
    }

    pub fn register_destroy<T>(&mut self, service: Arc<RwLock<T>>, name: impl Into<String>)
    where
        T: OnModuleDestroy + 'static,
    {
        self.on_destroy_hooks.push(LifecycleHook::new(service, name));
    }

    pub async fn call_application_bootstrap(&self) -> Result<()> {
        tracing::info!("Calling OnApplicationBootstrap hooks...");

        for hook in &self.on_bootstrap_hooks {
            tracing::debug!(service = %hook.name, "Bootstrapping");
            let mut service = hook.service.write().await;
            service.on_application_bootstrap().await.map_err(|e| {
                tracing::error!(service = %hook.name, error = %e, "OnApplicationBootstrap failed");
                LifecycleError::hook_failed(&hook.name, e.to_string())
            })?;
        }

        tracing::info!(
            hooks = self.on_bootstrap_hooks.len(),
            "OnApplicationBootstrap complete"
        );
        Ok(())
    }

    pub async fn call_application_bootstrap_with_timeout(&self, timeout: Duration) -> Result<()> {
        tokio::time::timeout(timeout, self.call_application_bootstrap())
            .await
            .map_err(|_| {
                LifecycleError::timeout(
                    "OnApplicationBootstrap",
                    format!("Timeout after {:?}", timeout),
                )
            })?
    }

    pub async fn call_module_destroy(&self) -> Result<()> {
        tracing::info!("Calling OnModuleDestroy hooks...");

        for hook in self.on_destroy_hooks.iter().rev() {
            tracing::debug!(service = %hook.name, "Destroying");
            let mut service = hook.service.write().await;
            if let Err(e) = service.on_module_destroy().await {
                tracing::error!(service = %hook.name, error = %e, "OnModuleDestroy failed");
            }
        }

        tracing::info!(
            hooks = self.on_destroy_hooks.len(),
            "OnModuleDestroy complete"
        );
        Ok(())
    }

    pub async fn call_module_destroy_with_timeout(&self, timeout: Duration) -> Result<()> {
        tokio::time::timeout(timeout, self.call_module_destroy())
            .await
            .map_err(|_| {
                LifecycleError::timeout("OnModuleDestroy", format!("Timeout after {:?}", timeout))
            })?
    }
}
