use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct Role {
    pub id: i64,
    pub authority: String,
}

/// One `user_roles` edge joined with the role authority.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRoleRow {
    pub user_id: i64,
    pub role_id: i64,
    pub authority: String,
}

/// Output record for a user. Never carries the password hash.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub roles: Vec<Role>,
}

impl UserView {
    pub fn new(user: User, roles: Vec<Role>) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            roles,
        }
    }
}

/// Attach role rows to their users, keeping the order of `users`.
pub fn with_roles(users: Vec<User>, rows: Vec<UserRoleRow>) -> Vec<UserView> {
    let mut by_user: HashMap<i64, Vec<Role>> = HashMap::new();
    for row in rows {
        by_user.entry(row.user_id).or_default().push(Role {
            id: row.role_id,
            authority: row.authority,
        });
    }

    users
        .into_iter()
        .map(|user| {
            let roles = by_user.remove(&user.id).unwrap_or_default();
            UserView::new(user, roles)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: i64) -> User {
        User {
            id,
            first_name: "Ana".to_string(),
            last_name: "Lima".to_string(),
            email: format!("user{id}@example.com"),
            password_hash: "$argon2id$secret".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn view_never_exposes_password_hash() {
        let view = UserView::new(user(1), vec![]);
        let json = serde_json::to_string(&view).unwrap();
        assert!(!json.contains("argon2"));
        assert!(json.contains("\"firstName\":\"Ana\""));
    }

    #[test]
    fn roles_attach_to_owning_user() {
        let rows = vec![
            UserRoleRow {
                user_id: 2,
                role_id: 1,
                authority: "ROLE_OPERATOR".to_string(),
            },
            UserRoleRow {
                user_id: 2,
                role_id: 2,
                authority: "ROLE_ADMIN".to_string(),
            },
        ];
        let views = with_roles(vec![user(1), user(2)], rows);
        assert!(views[0].roles.is_empty());
        assert_eq!(views[1].roles.len(), 2);
    }
}
