use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Response;
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::auth::extractor::AuthUser;
use crate::db;
use crate::error::{AppError, ErrorBody, integrity_violation, not_found_on_missing_row};
use crate::models::Category;
use crate::routes::created;
use crate::state::SharedState;

#[derive(Deserialize, Validate, ToSchema)]
pub struct CategoryRequest {
    #[validate(custom(function = "crate::validation::not_blank"))]
    pub name: String,
}

/// All categories, ordered by name.
#[utoipa::path(
    get,
    path = "/categories",
    tag = "Categories",
    operation_id = "list_categories",
    responses((status = 200, description = "All categories", body = Vec<Category>))
)]
pub async fn list(State(state): State<SharedState>) -> Result<Json<Vec<Category>>, AppError> {
    let categories = db::categories::list_all(&state.pool).await?;
    Ok(Json(categories))
}

#[utoipa::path(
    get,
    path = "/categories/{id}",
    tag = "Categories",
    operation_id = "get_category",
    params(("id" = i64, Path, description = "Category id")),
    responses(
        (status = 200, description = "The category", body = Category),
        (status = 404, description = "Category not found", body = ErrorBody),
    )
)]
pub async fn get(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<Json<Category>, AppError> {
    let category = db::categories::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Category not found: {id}")))?;
    Ok(Json(category))
}

#[utoipa::path(
    post,
    path = "/categories",
    tag = "Categories",
    operation_id = "create_category",
    request_body = CategoryRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Category created", body = Category),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
        (status = 403, description = "Caller lacks a staff role", body = ErrorBody),
        (status = 422, description = "Validation failed", body = ErrorBody),
    )
)]
pub async fn create(
    auth: AuthUser,
    State(state): State<SharedState>,
    Json(req): Json<CategoryRequest>,
) -> Result<Response, AppError> {
    auth.require_staff()?;
    req.validate()?;

    let category = db::categories::create(&state.pool, req.name.trim()).await?;
    tracing::info!("Category {} created by user {}", category.id, auth.user_id);

    let path = format!("/categories/{}", category.id);
    Ok(created(&state.config.base_url, &path, category))
}

#[utoipa::path(
    put,
    path = "/categories/{id}",
    tag = "Categories",
    operation_id = "update_category",
    params(("id" = i64, Path, description = "Category id")),
    request_body = CategoryRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Category updated", body = Category),
        (status = 404, description = "Category not found", body = ErrorBody),
        (status = 422, description = "Validation failed", body = ErrorBody),
    )
)]
pub async fn update(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Json(req): Json<CategoryRequest>,
) -> Result<Json<Category>, AppError> {
    auth.require_staff()?;
    req.validate()?;

    let category = db::categories::update(&state.pool, id, req.name.trim())
        .await
        .map_err(|e| not_found_on_missing_row(e, "Category"))?;
    Ok(Json(category))
}

#[utoipa::path(
    delete,
    path = "/categories/{id}",
    tag = "Categories",
    operation_id = "delete_category",
    params(("id" = i64, Path, description = "Category id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 204, description = "Category deleted"),
        (status = 400, description = "Category is still referenced by products", body = ErrorBody),
        (status = 404, description = "Category not found", body = ErrorBody),
    )
)]
pub async fn delete(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    auth.require_staff()?;

    let deleted = db::categories::delete(&state.pool, id)
        .await
        .map_err(integrity_violation)?;
    if deleted == 0 {
        return Err(AppError::NotFound(format!("Category not found: {id}")));
    }

    tracing::info!("Category {id} deleted by user {}", auth.user_id);
    Ok(StatusCode::NO_CONTENT)
}
