use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::AppState;
use crate::account::{SignInRequest, SignInResponse};
use crate::error::Result;
use crate::router::Valid;

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct Body {
    #[validate(email(message = "Email must be formatted."))]
    pub email: String,
    #[validate(length(
        min = 1,
        max = 255,
        message = "Password must contain between 1 and 255 characters."
    ))]
    pub password: String,
}

/// Handler to sign in and get back the bearer token.
pub async fn handler(
    State(state): State<AppState>,
    Valid(body): Valid<Body>,
) -> Result<Json<SignInResponse>> {
    let response = state
        .service
        .sign_in(SignInRequest {
            email: body.email,
            password: body.password,
        })
        .await?;

    Ok(Json(response))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use super::*;
    use crate::router::tests::{json_body, state};
    use crate::{app, make_request};

    fn login(password: &str) -> String {
        json!(Body {
            email: "admin@store.local".into(),
            password: password.into(),
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_login_handler() {
        let (state, _, admin_token) = state().await;

        let response =
            make_request(None, app(state), Method::POST, "/login", login("admin-pw"))
                .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["status"], "success");
        assert_eq!(body["token"], admin_token);
    }

    #[tokio::test]
    async fn test_login_with_wrong_password() {
        let (state, _, _) = state().await;

        let response =
            make_request(None, app(state), Method::POST, "/login", login("nope"))
                .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body = json_body(response).await;
        assert_eq!(body["status"], 401);
        assert!(body.get("token").is_none());
    }

    #[tokio::test]
    async fn test_login_with_empty_password() {
        let (state, _, _) = state().await;

        let response =
            make_request(None, app(state), Method::POST, "/login", login("")).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = json_body(response).await;
        assert_eq!(
            body["errors"][0]["message"],
            "Password must contain between 1 and 255 characters."
        );
    }

    #[tokio::test]
    async fn test_login_unknown_account() {
        let (state, _, _) = state().await;

        let wrong_password = make_request(
            None,
            app(state.clone()),
            Method::POST,
            "/login",
            login("nope"),
        )
        .await;

        let response = make_request(
            None,
            app(state),
            Method::POST,
            "/login",
            json!({ "email": "ghost@store.local", "password": "pw" }).to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        // Unknown emails and wrong passwords look the same.
        assert_eq!(json_body(response).await, json_body(wrong_password).await);
    }
}
