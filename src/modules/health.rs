use chrono::Utc;
use serde::Serialize;

use crate::infrastructure::{ConnectionState, Database};
use crate::prelude::*;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub database: ConnectionState,
    pub timestamp: String,
}

/// Reports process liveness and the database connection state.
pub async fn health(Inject(db): Inject<Database>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        database: db.state(),
        timestamp: Utc::now().to_rfc3339(),
    })
}
