//! Lifecycle hooks
//!
//! ```text
//! 1. Configuration loading
//!    ↓
//! 2. Container creation and module registration
//!    ↓
//! 3. Route binding validation
//!    ↓
//! 4. OnApplicationBootstrap        ← database connect task spawned here
//!    ↓
//! 5. Server start
//!    ↓
//! [Running...]
//!    ↓
//! 6. Shutdown signal (SIGTERM/SIGINT)
//!    ↓
//! 7. OnModuleDestroy (reverse order)
//! ```

mod application;
mod error;
mod manager;
mod shutdown;
mod traits;

pub use application::{Application, ApplicationBuilder};
pub use error::{LifecycleError, Result};
pub use manager::LifecycleManager;
pub use shutdown::shutdown_signal;
pub use traits::{OnApplicationBootstrap, OnModuleDestroy};
