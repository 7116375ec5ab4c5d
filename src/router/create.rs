use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::AppState;
use crate::account::{SignUpRequest, StatusResponse};
use crate::error::Result;
use crate::router::Valid;

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
    #[validate(length(
        min = 1,
        max = 255,
        message = "Password must contain between 1 and 255 characters."
    ))]
    pub password: String,
}

/// Handler to register a customer.
pub async fn handler(
    State(state): State<AppState>,
    Valid(body): Valid<Body>,
) -> Result<(StatusCode, Json<StatusResponse>)> {
    let response = state
        .service
        .register(SignUpRequest {
            first_name: body.first_name,
            last_name: body.last_name,
            email: body.email,
            password: body.password,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(response)))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use super::*;
    use crate::account::{AccountStore, USER_CREATED};
    use crate::router::tests::{json_body, state};
    use crate::{app, make_request};

    fn ana() -> Body {
        Body {
            first_name: "Ana".into(),
            last_name: "Lopez".into(),
            email: "ana@x.com".into(),
            password: "pw123".into(),
        }
    }

    #[tokio::test]
    async fn test_create_handler() {
        let (state, db, _) = state().await;

        let response = make_request(
            None,
            app(state.clone()),
            Method::POST,
            "/create",
            json!(ana()).to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let body = json_body(response).await;
        assert_eq!(body["status"], "success");
        assert_eq!(body["message"], USER_CREATED);

        assert!(db.accounts().find_by_email("ana@x.com").await.unwrap().is_some());

        let response = make_request(
            None,
            app(state),
            Method::POST,
            "/create",
            json!(ana()).to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_create_with_invalid_body() {
        let (state, _, _) = state().await;

        let mut body = ana();
        body.email = "not-an-email".into();
        body.first_name = String::default();

        let response = make_request(
            None,
            app(state),
            Method::POST,
            "/create",
            json!(body).to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = json_body(response).await;
        let fields: Vec<&str> = body["errors"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["field"].as_str().unwrap())
            .collect();
        assert!(fields.contains(&"email"));
        assert!(fields.contains(&"first_name"));
    }
}
