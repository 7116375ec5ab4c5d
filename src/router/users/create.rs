use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::AppState;
use crate::account::{CreateAccountRequest, Role, StatusResponse};
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
    #[validate(email(message = "Email must be formatted."))]
    pub email: String,
    pub role: Role,
    #[validate(length(
        min = 1,
        max = 255,
        message = "Password must contain between 1 and 255 characters."
    ))]
    pub password: String,
}

/// Handler for admins to create an account with any role.
pub async fn handler(
    State(state): State<AppState>,
    Bearer(token): Bearer,
    Valid(body): Valid<Body>,
) -> Result<(StatusCode, Json<StatusResponse>)> {
    let response = state
        .service
        .create_privileged(
            &token,
            CreateAccountRequest {
                first_name: body.first_name,
                last_name: body.last_name,
                email: body.email,
                role: body.role,
                password: body.password,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(response)))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use super::*;
    use crate::account::AccountStore;
    use crate::router::tests::state;
    use crate::{app, make_request};

    fn manager() -> String {
        json!(Body {
            first_name: "Mia".into(),
            last_name: "Stone".into(),
            email: "mia@x.com".into(),
            role: Role::Manager,
            password: "pw456".into(),
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_create_as_admin() {
        let (state, db, admin_token) = state().await;

        let response = make_request(
            Some(admin_token.as_str()),
            app(state),
            Method::POST,
            "/users",
            manager(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let mia = db.accounts().find_by_email("mia@x.com").await.unwrap().unwrap();
        assert_eq!(mia.role, Role::Manager);
    }

    #[tokio::test]
    async fn test_create_without_token() {
        let (state, _, _) = state().await;

        let response =
            make_request(None, app(state), Method::POST, "/users", manager()).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_create_with_unknown_token() {
        let (state, _, _) = state().await;

        let response = make_request(
            Some("Bearer 00ff"),
            app(state),
            Method::POST,
            "/users",
            manager(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_create_as_customer() {
        let (state, _, _) = state().await;

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

        let response = make_request(
            None,
            app(state.clone()),
            Method::POST,
            "/login",
            json!({ "email": "ana@x.com", "password": "pw123" }).to_string(),
        )
        .await;
        let token = crate::router::tests::json_body(response).await["token"]
            .as_str()
            .unwrap()
            .to_owned();

        let response = make_request(
            Some(token.as_str()),
            app(state),
            Method::POST,
            "/users",
            manager(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
