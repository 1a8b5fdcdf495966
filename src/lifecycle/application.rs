//! Application bootstrap
//!
//! Ties the container to the lifecycle hooks of the services it holds.

use super::{LifecycleError, LifecycleManager, OnApplicationBootstrap, OnModuleDestroy, Result};
use crate::di::Container;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// A bootstrapped application: the shared container plus the hooks to run on
/// shutdown.
///
/// ```rust,ignore
/// let app = Application::builder()
///     .container(container)
///     .register_lifecycle(Arc::new(RwLock::new(database.clone())), "Database")
///     .build()
///     .await?;
///
/// // serve...
///
/// app.shutdown().await?;
/// ```
pub struct Application {
    container: Arc<Container>,
    lifecycle_manager: Arc<LifecycleManager>,
    destroy_timeout: Option<Duration>,
}

impl Application {
    pub fn builder() -> ApplicationBuilder {
        ApplicationBuilder::new()
    }

    pub fn container(&self) -> &Arc<Container> {
        &self.container
    }

    /// Runs the OnModuleDestroy hooks.
    pub async fn shutdown(&self) -> Result<()> {
        tracing::info!("Shutting down application...");

        match self.destroy_timeout {
            Some(timeout) => {
                self.lifecycle_manager
                    .call_module_destroy_with_timeout(timeout)
                    .await?
            }
            None => self.lifecycle_manager.call_module_destroy().await?,
        }

        tracing::info!("Application shutdown complete");
        Ok(())
    }
}

#[derive(Default)]
pub struct ApplicationBuilder {
    container: Option<Container>,
    lifecycle_manager: LifecycleManager,
    bootstrap_timeout: Option<Duration>,
    destroy_timeout: Option<Duration>,
}

impl ApplicationBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn container(mut self, container: Container) -> Self {
        self.container = Some(container);
        self
    }

    pub fn bootstrap_timeout(mut self, timeout: Duration) -> Self {
        self.bootstrap_timeout = Some(timeout);
        self
    }

    pub fn destroy_timeout(mut self, timeout: Duration) -> Self {
        self.destroy_timeout = Some(timeout);
        self
    }

    pub fn on_bootstrap<T>(mut self, service: Arc<RwLock<T>>, name: impl Into<String>) -> Self
    where
        T: OnApplicationBootstrap + 'static,
    {
        self.lifecycle_manager.register_bootstrap(service, name);
        self
    }

    pub fn on_destroy<T>(mut self, service: Arc<RwLock<T>>, name: impl Into<String>) -> Self
    where
        T: OnModuleDestroy + 'static,
    {
        self.lifecycle_manager.register_destroy(service, name);
        self
    }

    /// Register a service for both bootstrap and destroy hooks
    pub fn register_lifecycle<T>(self, service: Arc<RwLock<T>>, name: impl Into<String>) -> Self
    where
        T: OnApplicationBootstrap + OnModuleDestroy + 'static,
    {
        let name = name.into();
        self.on_bootstrap(Arc::clone(&service), name.clone())
            .on_destroy(service, name)
    }

    /// Run the bootstrap hooks and produce the application.
    ///
    /// # Errors
    ///
    /// Returns an error if no container was supplied or a bootstrap hook fails.
    pub async fn build(self) -> Result<Application> {
        let container = self
            .container
            .ok_or_else(|| LifecycleError::init_failed("Container not provided"))?;

        tracing::info!("Starting application initialization...");

        match self.bootstrap_timeout {
            Some(timeout) => {
                self.lifecycle_manager
                    .call_application_bootstrap_with_timeout(timeout)
                    .await?
            }
            None => self.lifecycle_manager.call_application_bootstrap().await?,
        }

        tracing::info!("Application initialization complete");

        Ok(Application {
            container: Arc::new(container),
            lifecycle_manager: Arc::new(self.lifecycle_manager),
            destroy_timeout: self.destroy_timeout,
        })
    }
}
