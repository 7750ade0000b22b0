use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, sqlx::FromRow, Serialize, PartialEq, Eq, ToSchema)]
pub struct Category {
    pub id: i64,
    pub name: String,
    #[serde(skip)]
    pub created_at: DateTime<Utc>,
    #[serde(skip)]
    pub updated_at: Option<DateTime<Utc>>,
}
