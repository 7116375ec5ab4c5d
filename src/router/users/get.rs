use axum::Json;
use axum::extract::{Path, State};

use crate::AppState;
use crate::account::AccountView;
use crate::error::Result;
use crate::router::Bearer;

/// Handler returning an account. Users only see themselves.
pub async fn handler(
    State(state): State<AppState>,
    Bearer(token): Bearer,
    Path(id): Path<i64>,
) -> Result<Json<AccountView>> {
    let account = state.service.account_as(&token, id).await?;

    Ok(Json(account.into()))
}
