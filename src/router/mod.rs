//! HTTP handlers.
pub mod create;
pub mod login;
pub mod metrics;
pub mod status;
pub mod users;

use axum::extract::{FromRequest, FromRequestParts, Json, Request};
use axum::extract::rejection::JsonRejection;
use axum::http::header;
use axum::http::request::Parts;
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::error::ServerError;

const BEARER: &str = "bearer ";

/// JSON body extractor that runs [`Validate`] before the handler.
#[derive(Debug, Clone, Copy, Default)]
pub struct Valid<T>(pub T);

impl<T, S> FromRequest<S> for Valid<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = ServerError;

    async fn from_request(
        req: Request,
        state: &S,
    ) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        value.validate()?;
        Ok(Valid(value))
    }
}

/// Token read from the `Authorization` header.
///
/// The `Bearer ` prefix is optional and matched case-insensitively.
pub struct Bearer(pub String);

impl<S> FromRequestParts<S> for Bearer
where
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|header| header.to_str().ok())
            .ok_or(ServerError::Unauthorized)?;

        let token = match value.get(..BEARER.len()) {
            Some(scheme) if scheme.eq_ignore_ascii_case(BEARER) => {
                &value[BEARER.len()..]
            },
            _ => value,
        }
        .trim();
        if token.is_empty() {
            return Err(ServerError::Unauthorized);
        }

        Ok(Bearer(token.to_owned()))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use axum::body::Body;
    use axum::http::{Method, Response, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::{Value, json};

    use crate::account::service::tests::seed_admin;
    use crate::repository::memory::MemoryDatabase;
    use crate::{AppState, app, make_request};

    /// Application backed by in-memory stores, with an admin token.
    pub async fn state() -> (AppState, MemoryDatabase, String) {
        let db = MemoryDatabase::default();
        let admin_token = seed_admin(&db).await;
        (AppState::in_memory(&db), db, admin_token)
    }

    pub async fn json_body(response: Response<Body>) -> Value {
        let body = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_bearer_prefix_is_optional() {
        let (state, _, admin_token) = state().await;

        for header in [
            format!("Bearer {admin_token}"),
            format!("bearer {admin_token}"),
            format!("BEARER {admin_token}"),
            admin_token.clone(),
        ] {
            let response = make_request(
                Some(header.as_str()),
                app(state.clone()),
                Method::GET,
                "/users/1",
                String::default(),
            )
            .await;
            assert_eq!(response.status(), StatusCode::OK);
        }
    }

    #[tokio::test]
    async fn test_empty_bearer() {
        let (state, _, _) = state().await;

        let response = make_request(
            Some("Bearer "),
            app(state),
            Method::GET,
            "/users/1",
            String::default(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_malformed_json() {
        let (state, _, _) = state().await;

        let response = make_request(
            None,
            app(state),
            Method::POST,
            "/create",
            json!({ "email": "ana@x.com" }).to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = json_body(response).await;
        assert_eq!(body["status"], 400);
    }
}
