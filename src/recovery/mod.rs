//! Password recovery: token issuance and redemption.

pub mod token;

use std::sync::Arc;

use chrono::{Duration, Utc};
use sqlx::PgPool;

use crate::auth::password;
use crate::config::RecoverConfig;
use crate::db;
use crate::email::SystemMailer;
use crate::error::AppError;

/// Issue a recovery token for `email` and mail the redemption link.
///
/// The token row is committed before the mail is handed to a background
/// task; a failed send is logged and does not undo the token.
pub async fn create_recover_token(
    pool: &PgPool,
    mailer: Option<Arc<SystemMailer>>,
    config: &RecoverConfig,
    email: &str,
) -> Result<(), AppError> {
    let user = db::users::find_by_email(pool, email)
        .await?
        .ok_or_else(|| AppError::NotFound("Email not found".to_string()))?;

    let raw_token = token::generate();
    let expires_at = Utc::now() + Duration::minutes(config.token_minutes);

    db::password_recover_tokens::create(
        pool,
        &token::digest(&raw_token),
        email,
        user.id,
        expires_at,
    )
    .await?;

    tracing::info!("Password recovery token issued for user {}", user.id);

    let recover_url = format!("{}{}", config.uri, raw_token);
    let minutes = config.token_minutes;
    let to = user.email;

    tokio::spawn(async move {
        match mailer {
            Some(mailer) => {
                if let Err(e) = mailer.send_password_recover(&to, &recover_url, minutes).await {
                    tracing::error!("Failed to send password recovery email: {e}");
                }
            }
            None => {
                tracing::warn!("System SMTP not configured. Password recovery link: {recover_url}");
            }
        }
    });

    Ok(())
}

/// Redeem a recovery token and replace the owner's password.
pub async fn save_new_password(
    pool: &PgPool,
    raw_token: &str,
    new_password: &str,
) -> Result<(), AppError> {
    let now = Utc::now();
    let mut tx = pool.begin().await?;

    let recover_token =
        db::password_recover_tokens::find_valid_for_update(&mut *tx, &token::digest(raw_token), now)
            .await?
            .into_iter()
            .find(|t| t.is_redeemable_at(now))
            .ok_or_else(|| AppError::NotFound("Invalid or expired token".to_string()))?;

    let user = db::users::find_by_id(&mut *tx, recover_token.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let pw_hash = password::hash(new_password).map_err(AppError::Internal)?;
    db::users::update_password(&mut *tx, user.id, &pw_hash).await?;
    db::password_recover_tokens::consume_all_for_user(&mut *tx, user.id, now).await?;

    tx.commit().await?;

    tracing::info!("Password reset via recovery token for user {}", user.id);
    Ok(())
}
