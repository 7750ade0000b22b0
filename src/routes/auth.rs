use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::auth::jwt::{Claims, encode_token};
use crate::auth::password;
use crate::db;
use crate::error::{AppError, ErrorBody};
use crate::recovery;
use crate::state::SharedState;

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, ToSchema)]
pub struct TokenResponse {
    pub access_token: String,
    #[schema(value_type = String, example = "Bearer")]
    pub token_type: &'static str,
    pub expires_in: i64,
}

#[derive(Deserialize, Validate, ToSchema)]
pub struct EmailRequest {
    #[validate(email(message = "Invalid email"))]
    pub email: String,
}

#[derive(Deserialize, Validate, ToSchema)]
pub struct NewPasswordRequest {
    #[validate(custom(function = "crate::validation::not_blank"))]
    pub token: String,
    #[validate(length(min = 8, message = "Password must have at least 8 characters"))]
    pub password: String,
}

#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Bearer access token", body = TokenResponse),
        (status = 401, description = "Invalid credentials", body = ErrorBody),
        (status = 429, description = "Too many failed attempts", body = ErrorBody),
    )
)]
pub async fn login(
    State(state): State<SharedState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let email = req.email.trim();
    if state.login_limiter.check(email).is_err() {
        return Err(AppError::RateLimited(
            "Too many login attempts. Please try again later.".to_string(),
        ));
    }

    let Some(user) = db::users::find_by_email(&state.pool, email).await? else {
        state.login_limiter.record(email);
        return Err(AppError::Unauthorized("Invalid credentials".to_string()));
    };

    let valid = password::verify(&req.password, &user.password_hash).map_err(AppError::Internal)?;
    if !valid {
        state.login_limiter.record(email);
        return Err(AppError::Unauthorized("Invalid credentials".to_string()));
    }

    let authorities = db::roles::for_user(&state.pool, user.id)
        .await?
        .into_iter()
        .map(|r| r.authority)
        .collect();

    let minutes = state.config.jwt_minutes;
    let claims = Claims::new(user.id, user.email, authorities, minutes);
    let access_token =
        encode_token(&claims, &state.config.jwt_secret).map_err(AppError::Internal)?;

    tracing::info!("User {} logged in", user.id);

    Ok(Json(TokenResponse {
        access_token,
        token_type: "Bearer",
        expires_in: minutes * 60,
    }))
}

/// Mail a password recovery link to the account owner.
#[utoipa::path(
    post,
    path = "/auth/recover-token",
    tag = "Auth",
    request_body = EmailRequest,
    responses(
        (status = 204, description = "Recovery token issued"),
        (status = 404, description = "Email not found", body = ErrorBody),
        (status = 429, description = "Too many recovery requests", body = ErrorBody),
    )
)]
pub async fn create_recover_token(
    State(state): State<SharedState>,
    Json(req): Json<EmailRequest>,
) -> Result<StatusCode, AppError> {
    req.validate()?;
    let email = req.email.trim();

    if state.recovery_limiter.check(email).is_err() {
        return Err(AppError::RateLimited(
            "Too many recovery requests. Please try again later.".to_string(),
        ));
    }
    state.recovery_limiter.record(email);

    recovery::create_recover_token(
        &state.pool,
        state.system_mailer.clone(),
        &state.config.recover,
        email,
    )
    .await?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    put,
    path = "/auth/new-password",
    tag = "Auth",
    request_body = NewPasswordRequest,
    responses(
        (status = 204, description = "Password replaced"),
        (status = 404, description = "Invalid or expired token", body = ErrorBody),
        (status = 422, description = "Validation failed", body = ErrorBody),
    )
)]
pub async fn save_new_password(
    State(state): State<SharedState>,
    Json(req): Json<NewPasswordRequest>,
) -> Result<StatusCode, AppError> {
    req.validate()?;
    recovery::save_new_password(&state.pool, req.token.trim(), &req.password).await?;
    Ok(StatusCode::NO_CONTENT)
}
