//! Request body extraction that answers in the API envelope.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::AppError;

/// `Json<T>` whose rejection is a 400 `{ success: false, message }` reply
/// instead of axum's plain-text 415/422.
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        Json::<T>::from_request(req, state)
            .await
            .map(|Json(body)| ApiJson(body))
            .map_err(|rejection| {
                debug!(%rejection, "request body rejected");
                AppError::Validation("Invalid request body".into())
            })
    }
}

/// Unwrap a body extracted as `Result<Json<T>, JsonRejection>`, replacing a
/// rejection with the endpoint's own failure.
pub fn body_or<T>(
    body: Result<Json<T>, JsonRejection>,
    op: &'static str,
    failed: impl FnOnce() -> AppError,
) -> Result<T, AppError> {
    match body {
        Ok(Json(body)) => Ok(body),
        Err(rejection) => {
            debug!(op, %rejection, "request body rejected");
            Err(failed())
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{self, StatusCode, header};
    use axum::response::IntoResponse;
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Deserialize)]
    struct Title {
        title: String,
    }

    fn request(content_type: Option<&str>, body: &'static str) -> Request {
        let mut req = http::Request::builder().method("POST").uri("/");
        if let Some(ct) = content_type {
            req = req.header(header::CONTENT_TYPE, ct);
        }
        req.body(Body::from(body)).unwrap()
    }

    #[tokio::test]
    async fn accepts_well_formed_body() {
        let req = request(Some("application/json"), r#"{"title":"Algorithms"}"#);
        let ApiJson(body) = ApiJson::<Title>::from_request(req, &()).await.unwrap();
        assert_eq!(body.title, "Algorithms");
    }

    #[tokio::test]
    async fn missing_field_and_content_type_are_400() {
        for req in [
            request(Some("application/json"), "{}"),
            request(None, r#"{"title":"Algorithms"}"#),
            request(Some("application/json"), "{not json"),
        ] {
            let err = match ApiJson::<Title>::from_request(req, &()).await {
                Err(err) => err,
                Ok(_) => panic!("body should be rejected"),
            };
            assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
        }
    }
}
