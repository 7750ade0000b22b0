use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Response;
use serde::Deserialize;
use utoipa::ToSchema;
use sqlx::PgPool;
use validator::Validate;

use crate::auth::extractor::AuthUser;
use crate::auth::{ROLE_ADMIN, ROLE_OPERATOR, password};
use crate::db;
use crate::db::users::UserFields;
use crate::error::{AppError, ErrorBody, FieldMessage, integrity_violation, not_found_on_missing_row};
use crate::listing::page::{Page, PageParams, PageRequest, Sort};
use crate::models::{User, UserView, with_roles};
use crate::routes::created;
use crate::state::SharedState;

const DEFAULT_PAGE_SIZE: i64 = 20;

#[derive(Deserialize, ToSchema)]
pub struct RoleId {
    pub id: i64,
}

#[derive(Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserInsertRequest {
    #[validate(custom(function = "crate::validation::not_blank"))]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[validate(email(message = "Invalid email"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must have at least 8 characters"))]
    pub password: String,
    #[serde(default)]
    pub roles: Vec<RoleId>,
}

#[derive(Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdateRequest {
    #[validate(custom(function = "crate::validation::not_blank"))]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[validate(email(message = "Invalid email"))]
    pub email: String,
    #[serde(default)]
    pub roles: Vec<RoleId>,
}

impl From<UserUpdateRequest> for UserFields {
    fn from(req: UserUpdateRequest) -> Self {
        UserFields {
            first_name: req.first_name.trim().to_string(),
            last_name: req.last_name.trim().to_string(),
            email: req.email.trim().to_string(),
            role_ids: req.roles.into_iter().map(|r| r.id).collect(),
        }
    }
}

#[utoipa::path(
    get,
    path = "/users",
    tag = "Users",
    operation_id = "list_users",
    params(PageParams),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Page of users", body = Page<UserView>),
        (status = 403, description = "Caller lacks a staff role", body = ErrorBody),
    )
)]
pub async fn list(
    auth: AuthUser,
    State(state): State<SharedState>,
    Query(paging): Query<PageParams>,
) -> Result<Json<Page<UserView>>, AppError> {
    auth.require_staff()?;
    let request = PageRequest::from_params(
        &paging,
        DEFAULT_PAGE_SIZE,
        Sort::asc("id"),
        db::users::SORT_COLUMNS,
    )?;

    let total = db::users::count_all(&state.pool).await?;
    let users = db::users::list_page(&state.pool, &request).await?;
    let ids: Vec<i64> = users.iter().map(|u| u.id).collect();
    let rows = db::roles::rows_for_users(&state.pool, &ids).await?;

    Ok(Json(Page::new(with_roles(users, rows), &request, total)))
}

#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "Users",
    operation_id = "get_user",
    params(("id" = i64, Path, description = "User id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "The user", body = UserView),
        (status = 404, description = "User not found", body = ErrorBody),
    )
)]
pub async fn get(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<Json<UserView>, AppError> {
    auth.require_staff()?;
    let user = db::users::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User not found: {id}")))?;
    Ok(Json(hydrate(&state.pool, user).await?))
}

#[utoipa::path(
    get,
    path = "/users/me",
    tag = "Users",
    operation_id = "current_user",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "The authenticated user", body = UserView),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
    )
)]
pub async fn me(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<UserView>, AppError> {
    auth.require_staff()?;
    let user = db::users::find_by_id(&state.pool, auth.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    Ok(Json(hydrate(&state.pool, user).await?))
}

#[utoipa::path(
    post,
    path = "/users",
    tag = "Users",
    operation_id = "create_user",
    request_body = UserInsertRequest,
    responses(
        (status = 201, description = "User registered", body = UserView),
        (status = 422, description = "Validation failed or email already exists", body = ErrorBody),
    )
)]
/// Public sign-up. Requested roles are honored only for admin callers;
/// everyone else starts as an operator.
pub async fn create(
    auth: Option<AuthUser>,
    State(state): State<SharedState>,
    Json(req): Json<UserInsertRequest>,
) -> Result<Response, AppError> {
    req.validate()?;
    ensure_email_free(&state.pool, &req.email, None).await?;

    let caller_is_admin = auth.as_ref().is_some_and(|a| a.has_role(ROLE_ADMIN));
    let role_ids = if caller_is_admin && !req.roles.is_empty() {
        req.roles.iter().map(|r| r.id).collect()
    } else {
        let operator = db::roles::find_by_authority(&state.pool, ROLE_OPERATOR)
            .await?
            .ok_or_else(|| AppError::Internal("Operator role is not seeded".to_string()))?;
        vec![operator.id]
    };

    let fields = UserFields {
        first_name: req.first_name.trim().to_string(),
        last_name: req.last_name.trim().to_string(),
        email: req.email.trim().to_string(),
        role_ids,
    };
    let pw_hash = password::hash(&req.password).map_err(AppError::Internal)?;

    let mut tx = state.pool.begin().await?;
    ensure_roles_exist(&mut tx, &fields.role_ids).await?;
    let user = db::users::create(&mut *tx, &fields, &pw_hash)
        .await
        .map_err(email_conflict)?;
    db::roles::replace_for_user(&mut tx, user.id, &fields.role_ids).await?;
    tx.commit().await?;

    tracing::info!("User {} registered", user.id);

    let path = format!("/users/{}", user.id);
    let view = hydrate(&state.pool, user).await?;
    Ok(created(&state.config.base_url, &path, view))
}

#[utoipa::path(
    put,
    path = "/users/{id}",
    tag = "Users",
    operation_id = "update_user",
    params(("id" = i64, Path, description = "User id")),
    request_body = UserUpdateRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "User updated", body = UserView),
        (status = 403, description = "Caller is not an operator", body = ErrorBody),
        (status = 404, description = "User not found", body = ErrorBody),
        (status = 422, description = "Validation failed or email already exists", body = ErrorBody),
    )
)]
/// Profile edits are open to operators. The role set is replaced wholesale,
/// and only when an admin asks for a non-empty one.
pub async fn update(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Json(req): Json<UserUpdateRequest>,
) -> Result<Json<UserView>, AppError> {
    auth.require_operator()?;
    req.validate()?;
    let fields = UserFields::from(req);
    ensure_email_free(&state.pool, &fields.email, Some(id)).await?;

    let replace_roles = auth.has_role(ROLE_ADMIN) && !fields.role_ids.is_empty();
    if !replace_roles && !fields.role_ids.is_empty() {
        tracing::warn!(
            "Ignoring role change for user {id} requested by non-admin user {}",
            auth.user_id
        );
    }

    let mut tx = state.pool.begin().await?;
    let user = db::users::update(&mut *tx, id, &fields)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => not_found_on_missing_row(e, "User"),
            other => email_conflict(other),
        })?;
    if replace_roles {
        ensure_roles_exist(&mut tx, &fields.role_ids).await?;
        db::roles::replace_for_user(&mut tx, user.id, &fields.role_ids).await?;
    }
    tx.commit().await?;

    Ok(Json(hydrate(&state.pool, user).await?))
}

#[utoipa::path(
    delete,
    path = "/users/{id}",
    tag = "Users",
    operation_id = "delete_user",
    params(("id" = i64, Path, description = "User id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 204, description = "User deleted"),
        (status = 403, description = "Caller is not an operator", body = ErrorBody),
        (status = 404, description = "User not found", body = ErrorBody),
    )
)]
pub async fn delete(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    auth.require_operator()?;

    let deleted = db::users::delete(&state.pool, id)
        .await
        .map_err(integrity_violation)?;
    if deleted == 0 {
        return Err(AppError::NotFound(format!("User not found: {id}")));
    }

    tracing::info!("User {id} deleted by user {}", auth.user_id);
    Ok(StatusCode::NO_CONTENT)
}

fn email_exists() -> AppError {
    AppError::Validation(vec![FieldMessage {
        field_name: "email".to_string(),
        message: "Email already exists".to_string(),
    }])
}

/// A concurrent insert can still win the unique index after the pre-check.
fn email_conflict(err: sqlx::Error) -> AppError {
    match err {
        sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => email_exists(),
        _ => AppError::Database(err),
    }
}

async fn ensure_email_free(
    pool: &PgPool,
    email: &str,
    except_id: Option<i64>,
) -> Result<(), AppError> {
    if db::users::email_taken(pool, email.trim(), except_id).await? {
        return Err(email_exists());
    }
    Ok(())
}

async fn ensure_roles_exist(conn: &mut sqlx::PgConnection, ids: &[i64]) -> Result<(), AppError> {
    let missing = db::roles::find_missing(&mut *conn, ids).await?;
    if let Some(id) = missing.first() {
        return Err(AppError::NotFound(format!("Role not found: {id}")));
    }
    Ok(())
}

async fn hydrate(pool: &PgPool, user: User) -> Result<UserView, AppError> {
    let roles = db::roles::for_user(pool, user.id).await?;
    Ok(UserView::new(user, roles))
}
