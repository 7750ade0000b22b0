use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Response;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use sqlx::PgPool;
use validator::Validate;

use crate::auth::extractor::AuthUser;
use crate::db;
use crate::db::products::ProductFields;
use crate::error::{AppError, ErrorBody, integrity_violation, not_found_on_missing_row};
use crate::listing;
use crate::listing::filter::{ALL_CATEGORIES, ProductFilter};
use crate::listing::page::{Page, PageParams, PageRequest, Sort};
use crate::models::{Product, ProductView, with_categories};
use crate::routes::created;
use crate::state::SharedState;

const DEFAULT_PAGE_SIZE: i64 = 12;

#[derive(Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ListQuery {
    /// Case-insensitive name fragment.
    #[serde(default)]
    pub name: String,
    /// Comma-separated category ids; `0` means all categories.
    pub category_id: Option<String>,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct CategoryId {
    pub id: i64,
}

#[derive(Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductRequest {
    #[validate(custom(function = "crate::validation::product_name"))]
    pub name: String,
    #[validate(custom(function = "crate::validation::not_blank"))]
    pub description: String,
    #[validate(custom(function = "crate::validation::positive"))]
    #[schema(value_type = f64, example = 800.0)]
    pub price: Decimal,
    #[serde(default)]
    pub img_url: String,
    #[validate(custom(function = "crate::validation::not_in_future"))]
    pub date: DateTime<Utc>,
    #[validate(length(min = 1, message = "Product must have at least one category"))]
    pub categories: Vec<CategoryId>,
}

impl From<ProductRequest> for ProductFields {
    fn from(req: ProductRequest) -> Self {
        ProductFields {
            name: req.name.trim().to_string(),
            description: req.description,
            price: req.price,
            img_url: req.img_url,
            date: req.date,
            category_ids: req.categories.into_iter().map(|c| c.id).collect(),
        }
    }
}

/// One page of products matching the name and category filters.
#[utoipa::path(
    get,
    path = "/products",
    tag = "Products",
    operation_id = "list_products",
    params(ListQuery, PageParams),
    responses(
        (status = 200, description = "Page of products", body = Page<ProductView>),
        (status = 400, description = "Malformed category id or sort", body = ErrorBody),
    )
)]
pub async fn list(
    State(state): State<SharedState>,
    Query(query): Query<ListQuery>,
    Query(paging): Query<PageParams>,
) -> Result<Json<Page<ProductView>>, AppError> {
    let filter = ProductFilter::parse(
        &query.name,
        query.category_id.as_deref().unwrap_or(ALL_CATEGORIES),
    )?;
    let request = PageRequest::from_params(
        &paging,
        DEFAULT_PAGE_SIZE,
        Sort::asc("p.id"),
        db::products::SORT_COLUMNS,
    )?;

    let page = listing::find_products(&state.pool, &filter, &request).await?;
    Ok(Json(page))
}

#[utoipa::path(
    get,
    path = "/products/{id}",
    tag = "Products",
    operation_id = "get_product",
    params(("id" = i64, Path, description = "Product id")),
    responses(
        (status = 200, description = "The product with its categories", body = ProductView),
        (status = 404, description = "Product not found", body = ErrorBody),
    )
)]
pub async fn get(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<Json<ProductView>, AppError> {
    let product = db::products::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Product not found: {id}")))?;
    Ok(Json(hydrate(&state.pool, product).await?))
}

#[utoipa::path(
    post,
    path = "/products",
    tag = "Products",
    operation_id = "create_product",
    request_body = ProductRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Product created", body = ProductView),
        (status = 404, description = "Unknown category id", body = ErrorBody),
        (status = 422, description = "Validation failed", body = ErrorBody),
    )
)]
pub async fn create(
    auth: AuthUser,
    State(state): State<SharedState>,
    Json(req): Json<ProductRequest>,
) -> Result<Response, AppError> {
    auth.require_staff()?;
    req.validate()?;
    let fields = ProductFields::from(req);

    let mut tx = state.pool.begin().await?;
    ensure_categories_exist(&mut tx, &fields.category_ids).await?;
    let product = db::products::create(&mut *tx, &fields).await?;
    db::products::replace_categories(&mut tx, product.id, &fields.category_ids).await?;
    tx.commit().await?;

    tracing::info!("Product {} created by user {}", product.id, auth.user_id);

    let path = format!("/products/{}", product.id);
    let view = hydrate(&state.pool, product).await?;
    Ok(created(&state.config.base_url, &path, view))
}

#[utoipa::path(
    put,
    path = "/products/{id}",
    tag = "Products",
    operation_id = "update_product",
    params(("id" = i64, Path, description = "Product id")),
    request_body = ProductRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Product updated; categories replaced", body = ProductView),
        (status = 404, description = "Product or category not found", body = ErrorBody),
        (status = 422, description = "Validation failed", body = ErrorBody),
    )
)]
pub async fn update(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Json(req): Json<ProductRequest>,
) -> Result<Json<ProductView>, AppError> {
    auth.require_staff()?;
    req.validate()?;
    let fields = ProductFields::from(req);

    let mut tx = state.pool.begin().await?;
    let product = db::products::update(&mut *tx, id, &fields)
        .await
        .map_err(|e| not_found_on_missing_row(e, "Product"))?;
    ensure_categories_exist(&mut tx, &fields.category_ids).await?;
    db::products::replace_categories(&mut tx, product.id, &fields.category_ids).await?;
    tx.commit().await?;

    Ok(Json(hydrate(&state.pool, product).await?))
}

#[utoipa::path(
    delete,
    path = "/products/{id}",
    tag = "Products",
    operation_id = "delete_product",
    params(("id" = i64, Path, description = "Product id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 204, description = "Product deleted"),
        (status = 404, description = "Product not found", body = ErrorBody),
    )
)]
pub async fn delete(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    auth.require_staff()?;

    let deleted = db::products::delete(&state.pool, id)
        .await
        .map_err(integrity_violation)?;
    if deleted == 0 {
        return Err(AppError::NotFound(format!("Product not found: {id}")));
    }

    tracing::info!("Product {id} deleted by user {}", auth.user_id);
    Ok(StatusCode::NO_CONTENT)
}

async fn ensure_categories_exist(
    conn: &mut sqlx::PgConnection,
    ids: &[i64],
) -> Result<(), AppError> {
    let missing = db::categories::find_missing(&mut *conn, ids).await?;
    if let Some(id) = missing.first() {
        return Err(AppError::NotFound(format!("Category not found: {id}")));
    }
    Ok(())
}

async fn hydrate(pool: &PgPool, product: Product) -> Result<ProductView, AppError> {
    let rows = db::products::category_rows(pool, &[product.id]).await?;
    with_categories(vec![product], rows)
        .pop()
        .ok_or_else(|| AppError::Internal("Product vanished while loading categories".to_string()))
}
