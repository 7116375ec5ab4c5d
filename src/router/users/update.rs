use axum::Json;
use axum::extract::{Path, State};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::AppState;
use crate::account::{ProfileUpdate, Role, StatusResponse};
use crate::error::Result;
use crate::router::{Bearer, Valid};

#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Body {
    #[validate(length(
        min = 1,
        max = 50,
        message = "First name must contain between 1 and 50 characters."
    ))]
    pub first_name: String,
    #[validate(length(
        min = 1,
        max = 50,
        message = "Last name must contain between 1 and 50 characters."
    ))]
    pub last_name: String,
    pub role: Role,
}

/// Handler to update names and role of an account.
pub async fn handler(
    State(state): State<AppState>,
    Bearer(token): Bearer,
    Path(id): Path<i64>,
    Valid(body): Valid<Body>,
) -> Result<Json<StatusResponse>> {
    let response = state
        .service
        .update_profile_as(
            &token,
            id,
            ProfileUpdate {
                first_name: body.first_name,
                last_name: body.last_name,
                role: body.role,
            },
        )
        .await?;

    Ok(Json(response))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use crate::account::{AccountStore, Role, TokenService, USER_UPDATED};
    use crate::router::tests::{json_body, state};
    use crate::{app, make_request};

    #[tokio::test]
    async fn test_update_handler() {
        let (state, db, admin_token) = state().await;

        let response = make_request(
            None,
            app(state.clone()),
            Method::POST,
            "/create",
            json!({
                "firstName": "Ana",
                "lastName": "Lopez",
                "email": "ana@x.com",
                "password": "pw123",
            })
            .to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let ana = db.accounts().find_by_email("ana@x.com").await.unwrap().unwrap();
        let ana_token = db.tokens().lookup(&ana).await.unwrap().unwrap().value;
        let path = format!("/users/{}", ana.id);

        // Customers cannot promote themselves.
        let response = make_request(
            Some(ana_token.as_str()),
            app(state.clone()),
            Method::PATCH,
            &path,
            json!({ "firstName": "Ana", "lastName": "Lopez", "role": "admin" })
                .to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = make_request(
            Some(admin_token.as_str()),
            app(state),
            Method::PATCH,
            &path,
            json!({ "firstName": "Ana", "lastName": "Lopez", "role": "manager" })
                .to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["message"], USER_UPDATED);

        let ana = db.accounts().find_by_id(ana.id).await.unwrap().unwrap();
        assert_eq!(ana.role, Role::Manager);
    }

    #[tokio::test]
    async fn test_update_with_empty_name() {
        let (state, _, admin_token) = state().await;

        let response = make_request(
            Some(admin_token.as_str()),
            app(state),
            Method::PATCH,
            "/users/1",
            json!({ "firstName": "", "lastName": "Admin", "role": "admin" })
                .to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = json_body(response).await;
        assert_eq!(body["errors"][0]["field"], "first_name");
        assert_eq!(
            body["errors"][0]["message"],
            "First name must contain between 1 and 50 characters."
        );
    }

    #[tokio::test]
    async fn test_update_with_unknown_role() {
        let (state, _, admin_token) = state().await;

        let response = make_request(
            Some(admin_token.as_str()),
            app(state),
            Method::PATCH,
            "/users/1",
            json!({ "firstName": "Root", "lastName": "Admin", "role": "owner" })
                .to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
