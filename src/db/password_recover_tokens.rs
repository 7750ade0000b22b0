use chrono::{DateTime, Utc};

use crate::models::PasswordRecoverToken;

pub async fn create<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    token_hash: &str,
    email: &str,
    user_id: i64,
    expires_at: DateTime<Utc>,
) -> Result<PasswordRecoverToken, sqlx::Error> {
    sqlx::query_as::<_, PasswordRecoverToken>(
        "INSERT INTO password_recover_tokens (token_hash, email, user_id, expires_at)
         VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(token_hash)
    .bind(email)
    .bind(user_id)
    .bind(expires_at)
    .fetch_one(executor)
    .await
}

/// Unredeemed tokens with this digest that are still valid at `now`, oldest
/// first. Rows are locked until the surrounding transaction ends.
pub async fn find_valid_for_update<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    token_hash: &str,
    now: DateTime<Utc>,
) -> Result<Vec<PasswordRecoverToken>, sqlx::Error> {
    sqlx::query_as::<_, PasswordRecoverToken>(
        "SELECT * FROM password_recover_tokens
         WHERE token_hash = $1 AND used_at IS NULL AND expires_at >= $2
         ORDER BY created_at, id
         FOR UPDATE",
    )
    .bind(token_hash)
    .bind(now)
    .fetch_all(executor)
    .await
}

/// Mark every outstanding token of a user as redeemed.
pub async fn consume_all_for_user<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    user_id: i64,
    now: DateTime<Utc>,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE password_recover_tokens SET used_at = $2
         WHERE user_id = $1 AND used_at IS NULL",
    )
    .bind(user_id)
    .bind(now)
    .execute(executor)
    .await?;
    Ok(result.rows_affected())
}

pub async fn count_for_email<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    email: &str,
) -> Result<i64, sqlx::Error> {
    let row: (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM password_recover_tokens WHERE email = $1")
            .bind(email)
            .fetch_one(executor)
            .await?;
    Ok(row.0)
}
