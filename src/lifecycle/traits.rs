//! Lifecycle hook traits

use super::LifecycleError;
use async_trait::async_trait;

/// Called once the container is built, before the listener starts.
///
/// Hooks must not block startup on external services; spawn long-running
/// work instead.
///
/// # Example
///
/// ```rust,ignore
/// #[async_trait]
/// impl OnApplicationBootstrap for Database {
///     async fn on_application_bootstrap(&mut self) -> Result<(), LifecycleError> {
///         self.spawn_connect();
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait OnApplicationBootstrap: Send + Sync {
    async fn on_application_bootstrap(&mut self) -> Result<(), LifecycleError>;
}

/// Called during graceful shutdown after the listener has stopped.
///
/// Use this to release connections and abort background tasks.
#[async_trait]
pub trait OnModuleDestroy: Send + Sync {
    async fn on_module_destroy(&mut self) -> Result<(), LifecycleError>;
}
