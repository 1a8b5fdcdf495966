//! # data-api
//!
//! HTTP data and user API built on axum.
//!
//! - **Startup-validated routing**: routes name their handlers; the whole
//!   table is checked against the handler registry before the server starts.
//! - **Explicit context**: the database handle, repository binding and
//!   controllers live in a [`Container`] passed through router state.
//! - **Managed database handle**: connection state is explicit
//!   (`disconnected | connecting | connected`) and the initial connection is
//!   retried with bounded exponential backoff without gating startup.
//!
//! ## Endpoints
//!
//! | Method | Path | Response |
//! |---|---|---|
//! | GET | `/api/data` | 200 `{"message":"Data retrieved successfully"}` |
//! | POST | `/api/data` | 201 `{"message":"Data saved successfully"}` |
//! | GET, POST, PATCH | `/api/users` | user envelope |
//! | GET, DELETE | `/api/users/{id}` | user envelope |
//! | GET | `/health` | liveness and database state |
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use data_api::app::{self, App};
//! use data_api::config::AppConfig;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = AppConfig::load()?;
//!     let app = App::build(&config).await?;
//!     let listener = app::bind(&config.server).await?;
//!     app.serve(listener).await?;
//!     Ok(())
//! }
//! ```

pub mod app;
pub mod common;
pub mod config;
pub mod di;
pub mod error;
pub mod infrastructure;
pub mod lifecycle;
pub mod middleware;
pub mod module;
pub mod modules;
pub mod router;
pub mod state;

pub use common::ApiResponse;
pub use di::{Container, ContainerBuilder, HasContainer, Inject, Injectable};
pub use error::{ApiError, DataApiError, ErrorKind, Result};
pub use module::Module;
pub use state::AppState;

pub use async_trait::async_trait;
pub use axum;

/// Prelude module for convenient imports
///
/// ```
/// use data_api::prelude::*;
/// ```
pub mod prelude {
    pub use crate::common::{ApiResponse, Message};
    pub use crate::di::{Container, ContainerBuilder, HasContainer, Inject, Injectable};
    pub use crate::error::{ApiError, DataApiError, ErrorKind, Result};
    pub use crate::middleware::Payload;
    pub use crate::module::Module;
    pub use async_trait::async_trait;
    pub use axum::{
        Json, Router,
        extract::{Path, State},
        http::StatusCode,
        response::{IntoResponse, Response},
    };
    pub use std::sync::Arc;
}
