use axum::body::{Body, to_bytes};
use axum::extract::Request;
use axum::http::{StatusCode, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::error::ErrorBody;

/// Upper bound on a framework rejection body we are willing to buffer.
const REJECTION_BODY_LIMIT: usize = 16 * 1024;

/// Middleware that stamps the request path into error bodies.
///
/// Errors raised by handlers carry an `ErrorBody` extension. Plain-text
/// rejections produced by extractors (malformed JSON, bad query strings)
/// are rewrapped so every error response has the same shape.
pub async fn error_envelope(req: Request, next: Next) -> Response {
    let path = req.uri().path().to_string();
    let response = next.run(req).await;

    let status = response.status();
    if !(status.is_client_error() || status.is_server_error()) {
        return response;
    }

    let (mut parts, body) = response.into_parts();

    let mut envelope = match parts.extensions.remove::<ErrorBody>() {
        Some(envelope) => envelope,
        None => {
            let message = match to_bytes(body, REJECTION_BODY_LIMIT).await {
                Ok(bytes) if !bytes.is_empty() => String::from_utf8_lossy(&bytes).into_owned(),
                _ => status
                    .canonical_reason()
                    .unwrap_or("Request failed")
                    .to_string(),
            };
            ErrorBody::new(status, message)
        }
    };
    envelope.path = path;

    let json = match serde_json::to_vec(&envelope) {
        Ok(json) => json,
        Err(e) => {
            tracing::error!("Failed to serialize error body: {e}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    parts.headers.remove(header::CONTENT_LENGTH);
    parts.headers.insert(
        header::CONTENT_TYPE,
        header::HeaderValue::from_static("application/json"),
    );
    Response::from_parts(parts, Body::from(json))
}
