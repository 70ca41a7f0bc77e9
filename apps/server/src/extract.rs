//! # Request Extractors
//!
//! Wrappers around axum's `Json`, `Path` and `Query` whose rejections are
//! [`ApiError`]s, so a malformed body, path or query string gets the same
//! `{ "code", "message" }` shape as every other failure.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ApiJson<T>   ── Json<T>   ── JsonRejection  ──┐                        │
//! │  ApiPath<T>   ── Path<T>   ── PathRejection  ──┼──► ApiError (400)      │
//! │  ApiQuery<T>  ── Query<T>  ── QueryRejection ──┘    INVALID_REQUEST     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts, Path, Query, Request};
use axum::http::request::Parts;
use axum::Json;

use crate::error::ApiError;

/// JSON request body.
#[derive(Debug, Clone)]
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(ApiJson(value))
    }
}

/// Generates a wrapper over a parts extractor with an `ApiError` rejection.
macro_rules! parts_extractor {
    ($(#[$doc:meta])* $name:ident, $inner:ident, $rejection:ty) => {
        $(#[$doc])*
        #[derive(Debug, Clone)]
        pub struct $name<T>(pub T);

        impl<S, T> FromRequestParts<S> for $name<T>
        where
            $inner<T>: FromRequestParts<S, Rejection = $rejection>,
            S: Send + Sync,
        {
            type Rejection = ApiError;

            async fn from_request_parts(
                parts: &mut Parts,
                state: &S,
            ) -> Result<Self, Self::Rejection> {
                let $inner(value) = $inner::<T>::from_request_parts(parts, state).await?;
                Ok($name(value))
            }
        }
    };
}

parts_extractor!(
    /// Path parameters, such as the `{id}` segment.
    ApiPath,
    Path,
    PathRejection
);

parts_extractor!(
    /// Query string parameters.
    ApiQuery,
    Query,
    QueryRejection
);

#[cfg(test)]
mod tests {
    use crate::test_support::spawn_server;
    use serde_json::Value;

    #[tokio::test]
    async fn test_malformed_input_is_json_error() {
        let (base, _db) = spawn_server().await;
        let client = reqwest::Client::new();

        // Not JSON at all
        let resp = client
            .post(format!("{}/api/checkout", base))
            .header("content-type", "application/json")
            .body("{ not json")
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["code"], "INVALID_REQUEST");
        assert!(body["message"].is_string());

        // Wrong field type
        let resp = client
            .post(format!("{}/api/categories", base))
            .header("content-type", "application/json")
            .body(r#"{ "name": 42 }"#)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["code"], "INVALID_REQUEST");

        // Missing content type
        let resp = client
            .post(format!("{}/api/products", base))
            .body("{}")
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["code"], "INVALID_REQUEST");

        // Non-numeric id and query value
        let resp = client
            .get(format!("{}/api/products/abc", base))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["code"], "INVALID_REQUEST");

        let resp = client
            .get(format!("{}/api/products?category_id=abc", base))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["code"], "INVALID_REQUEST");
    }
}
