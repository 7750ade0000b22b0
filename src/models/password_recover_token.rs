use chrono::{DateTime, Utc};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PasswordRecoverToken {
    pub id: i64,
    pub token_hash: String,
    pub email: String,
    pub user_id: i64,
    pub expires_at: DateTime<Utc>,
    pub used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl PasswordRecoverToken {
    /// A token is redeemable up to and including its expiration instant,
    /// and only once.
    pub fn is_redeemable_at(&self, now: DateTime<Utc>) -> bool {
        self.used_at.is_none() && now <= self.expires_at
    }
}
