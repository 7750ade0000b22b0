pub mod auth;
pub mod categories;
pub mod products;
pub mod users;

use axum::Json;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::Router;
use serde::Serialize;

use crate::state::SharedState;

pub fn api_routes() -> Router<SharedState> {
    Router::new()
        // Auth
        .route("/auth/login", post(auth::login))
        .route("/auth/recover-token", post(auth::create_recover_token))
        .route("/auth/new-password", put(auth::save_new_password))
        // Categories
        .route("/categories", get(categories::list).post(categories::create))
        .route(
            "/categories/{id}",
            get(categories::get)
                .put(categories::update)
                .delete(categories::delete),
        )
        // Products
        .route("/products", get(products::list).post(products::create))
        .route(
            "/products/{id}",
            get(products::get)
                .put(products::update)
                .delete(products::delete),
        )
        // Users
        .route("/users", get(users::list).post(users::create))
        .route("/users/me", get(users::me))
        .route(
            "/users/{id}",
            get(users::get).put(users::update).delete(users::delete),
        )
}

/// 201 response with a Location header pointing at the new resource.
/// A base URL that does not form a valid header value just omits the header.
pub(crate) fn created<T: Serialize>(base_url: &str, path: &str, body: T) -> Response {
    let mut response = (StatusCode::CREATED, Json(body)).into_response();
    let location = format!("{}{path}", base_url.trim_end_matches('/'));
    match HeaderValue::from_str(&location) {
        Ok(value) => {
            response.headers_mut().insert(header::LOCATION, value);
        }
        Err(e) => tracing::debug!("Skipping Location header for {path}: {e}"),
    }
    response
}
