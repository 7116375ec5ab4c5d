//! Account management HTTP API. Authorization required.
mod create;
mod get;
mod update;

use axum::Router;
use axum::routing::{get, post};

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        // `POST /users` goes to `create`.
        .route("/", post(create::handler))
        // `GET /users/{id}` goes to `get`, `PATCH` to `update`.
        .route("/{id}", get(get::handler).patch(update::handler))
}
