use axum::extract::{FromRequestParts, OptionalFromRequestParts};
use axum::http::header;
use axum::http::request::Parts;
use axum_extra::TypedHeader;
use axum_extra::headers::Authorization;
use axum_extra::headers::authorization::Bearer;

use crate::auth::jwt;
use crate::auth::{ROLE_ADMIN, ROLE_OPERATOR};
use crate::error::AppError;
use crate::state::SharedState;

/// The authenticated caller, decoded from the bearer token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: i64,
    pub authorities: Vec<String>,
}

impl AuthUser {
    pub fn has_role(&self, role: &str) -> bool {
        self.authorities.iter().any(|a| a == role)
    }

    pub fn require_any_role(&self, roles: &[&str]) -> Result<(), AppError> {
        if roles.iter().any(|role| self.has_role(role)) {
            Ok(())
        } else {
            Err(AppError::Forbidden("Access denied".to_string()))
        }
    }

    /// Catalog mutations are open to operators and admins.
    pub fn require_staff(&self) -> Result<(), AppError> {
        self.require_any_role(&[ROLE_ADMIN, ROLE_OPERATOR])
    }

    pub fn require_operator(&self) -> Result<(), AppError> {
        self.require_any_role(&[ROLE_OPERATOR])
    }
}

impl FromRequestParts<SharedState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            <TypedHeader<Authorization<Bearer>> as FromRequestParts<SharedState>>::from_request_parts(
                parts, state,
            )
            .await
            .map_err(|_| AppError::Unauthorized("Missing authentication token".to_string()))?;

        let claims = jwt::decode_token(bearer.token(), &state.config.jwt_secret)
            .map_err(|_| AppError::Unauthorized("Invalid or expired token".to_string()))?;

        Ok(AuthUser {
            user_id: claims.sub,
            authorities: claims.authorities,
        })
    }
}

/// Anonymous callers extract as `None`; a present but invalid token is
/// still rejected.
impl OptionalFromRequestParts<SharedState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Option<Self>, Self::Rejection> {
        if !parts.headers.contains_key(header::AUTHORIZATION) {
            return Ok(None);
        }
        <AuthUser as FromRequestParts<SharedState>>::from_request_parts(parts, state)
            .await
            .map(Some)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::http::Request;
    use sqlx::postgres::PgPoolOptions;

    use super::*;
    use crate::auth::jwt::{Claims, encode_token};
    use crate::config::Config;
    use crate::rate_limit::AttemptLimiter;
    use crate::state::AppState;

    fn state() -> SharedState {
        let config = Config::for_tests();
        let pool = PgPoolOptions::new()
            .connect_lazy(&config.database_url)
            .unwrap();
        Arc::new(AppState {
            pool,
            config,
            system_mailer: None,
            login_limiter: AttemptLimiter::for_login(),
            recovery_limiter: AttemptLimiter::for_recovery(),
        })
    }

    fn parts(authorization: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/users/me");
        if let Some(value) = authorization {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    fn user(authorities: &[&str]) -> AuthUser {
        AuthUser {
            user_id: 1,
            authorities: authorities.iter().map(|a| a.to_string()).collect(),
        }
    }

    #[test]
    fn staff_check_accepts_either_role() {
        assert!(user(&[ROLE_ADMIN]).require_staff().is_ok());
        assert!(user(&[ROLE_OPERATOR]).require_staff().is_ok());
        assert!(matches!(user(&[]).require_staff(), Err(AppError::Forbidden(_))));
    }

    #[test]
    fn operator_check_rejects_admin_only() {
        assert!(user(&[ROLE_ADMIN]).require_operator().is_err());
        assert!(user(&[ROLE_ADMIN, ROLE_OPERATOR]).require_operator().is_ok());
    }

    #[tokio::test]
    async fn bearer_token_extracts_caller() {
        let state = state();
        let claims = Claims::new(7, "ana@example.com".into(), vec![ROLE_OPERATOR.into()], 5);
        let token = encode_token(&claims, &state.config.jwt_secret).unwrap();
        let mut parts = parts(Some(&format!("Bearer {token}")));

        let user = <AuthUser as FromRequestParts<SharedState>>::from_request_parts(&mut parts, &state)
            .await
            .unwrap();
        assert_eq!(user.user_id, 7);
        assert!(user.has_role(ROLE_OPERATOR));
    }

    #[tokio::test]
    async fn missing_or_bad_token_is_unauthorized() {
        let state = state();

        let mut anonymous = parts(None);
        let err = <AuthUser as FromRequestParts<SharedState>>::from_request_parts(&mut anonymous, &state)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(msg) if msg == "Missing authentication token"));

        let mut forged = parts(Some("Bearer not-a-jwt"));
        let err = <AuthUser as FromRequestParts<SharedState>>::from_request_parts(&mut forged, &state)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(msg) if msg == "Invalid or expired token"));
    }

    #[tokio::test]
    async fn optional_extractor_allows_anonymous_only() {
        let state = state();

        let mut anonymous = parts(None);
        let user = <AuthUser as OptionalFromRequestParts<SharedState>>::from_request_parts(
            &mut anonymous,
            &state,
        )
        .await
        .unwrap();
        assert!(user.is_none());

        let mut forged = parts(Some("Bearer not-a-jwt"));
        let result = <AuthUser as OptionalFromRequestParts<SharedState>>::from_request_parts(
            &mut forged,
            &state,
        )
        .await;
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }
}
