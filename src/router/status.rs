//! Public instance status for front-end identification.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use crate::config::Configuration;

#[derive(Debug, Serialize)]
pub struct Status {
    name: String,
    url: String,
    version: String,
}

/// Public server status.
pub async fn handler(State(config): State<Arc<Configuration>>) -> Json<Status> {
    Json(Status {
        name: if config.name.is_empty() {
            env!("CARGO_PKG_NAME").into()
        } else {
            config.name.clone()
        },
        url: config.url.clone(),
        version: config.version().to_owned(),
    })
}
