use axum::{
    body::{Body, to_bytes},
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use http_body_util::LengthLimitError;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::error::Error as StdError;
use std::sync::Arc;

use crate::error::ApiError;

/// Maximum accepted request body size in bytes.
#[derive(Debug, Clone, Copy)]
pub struct BodyLimit(pub usize);

/// The parsed JSON body, attached to the request by [`parse_json_body`].
#[derive(Debug, Clone)]
pub struct JsonBody(pub Arc<Value>);

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .map(|mime| {
            let mime = mime.trim().to_ascii_lowercase();
            mime == "application/json" || mime.ends_with("+json")
        })
        .unwrap_or(false)
}

/// True when the read failed because the body went over the limit, as
/// opposed to the client stream breaking.
fn exceeded_limit(err: &(dyn StdError + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(err) = current {
        if err.is::<LengthLimitError>() {
            return true;
        }
        current = err.source();
    }
    false
}

fn declared_length(headers: &HeaderMap) -> Option<usize> {
    headers
        .get(header::CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse().ok())
}

/// Buffers the body, parses it when it is JSON, and forwards the request.
///
/// Empty bodies and non-JSON content types pass through untouched, so routes
/// that take no payload accept requests with or without one.
pub async fn parse_json_body(
    State(BodyLimit(limit)): State<BodyLimit>,
    request: Request,
    next: Next,
) -> Response {
    let (mut parts, body) = request.into_parts();

    if declared_length(&parts.headers).is_some_and(|len| len > limit) {
        return ApiError::PayloadTooLarge { limit }.into_response();
    }

    let bytes = match to_bytes(body, limit).await {
        Ok(bytes) => bytes,
        Err(err) => {
            let err = err.into_inner();
            if exceeded_limit(err.as_ref()) {
                return ApiError::PayloadTooLarge { limit }.into_response();
            }
            tracing::debug!(error = %err, "Failed to read request body");
            return ApiError::bad_request("Failed to read request body").into_response();
        }
    };

    let blank = bytes.iter().all(u8::is_ascii_whitespace);
    if !blank && is_json(&parts.headers) {
        match serde_json::from_slice::<Value>(&bytes) {
            Ok(value) => {
                parts.extensions.insert(JsonBody(Arc::new(value)));
            }
            Err(err) => {
                return ApiError::bad_request(format!("Malformed JSON body: {}", err))
                    .into_response();
            }
        }
    }

    next.run(Request::from_parts(parts, Body::from(bytes))).await
}

/// Extracts a typed payload from the parsed JSON body.
///
/// Rejects with 400 when no JSON body was sent or required fields are
/// missing.
pub struct Payload<T>(pub T);

impl<S, T> FromRequestParts<S> for Payload<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let JsonBody(value) = parts
            .extensions
            .get::<JsonBody>()
            .cloned()
            .ok_or_else(|| ApiError::bad_request("Request body required"))?;

        serde_json::from_value(value.as_ref().clone())
            .map(Payload)
            .map_err(|e| ApiError::bad_request(format!("Invalid request body: {}", e)))
    }
}
