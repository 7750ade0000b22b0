use crate::models::{Role, UserRoleRow};

pub async fn find_by_authority<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    authority: &str,
) -> Result<Option<Role>, sqlx::Error> {
    sqlx::query_as::<_, Role>("SELECT * FROM roles WHERE authority = $1")
        .bind(authority)
        .fetch_optional(executor)
        .await
}

pub async fn for_user<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    user_id: i64,
) -> Result<Vec<Role>, sqlx::Error> {
    sqlx::query_as::<_, Role>(
        "SELECT r.* FROM roles r
         JOIN user_roles ur ON ur.role_id = r.id
         WHERE ur.user_id = $1
         ORDER BY r.id",
    )
    .bind(user_id)
    .fetch_all(executor)
    .await
}

pub async fn rows_for_users<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    user_ids: &[i64],
) -> Result<Vec<UserRoleRow>, sqlx::Error> {
    sqlx::query_as::<_, UserRoleRow>(
        "SELECT ur.user_id, r.id AS role_id, r.authority
         FROM user_roles ur
         JOIN roles r ON r.id = ur.role_id
         WHERE ur.user_id = ANY($1)
         ORDER BY r.id",
    )
    .bind(user_ids)
    .fetch_all(executor)
    .await
}

/// Ids from `ids` that have no role row.
pub async fn find_missing<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    ids: &[i64],
) -> Result<Vec<i64>, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT ids.id FROM unnest($1::bigint[]) AS ids(id)
         WHERE NOT EXISTS (SELECT 1 FROM roles r WHERE r.id = ids.id)",
    )
    .bind(ids)
    .fetch_all(executor)
    .await
}

/// Replace the whole role set of a user.
pub async fn replace_for_user(
    conn: &mut sqlx::PgConnection,
    user_id: i64,
    role_ids: &[i64],
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM user_roles WHERE user_id = $1")
        .bind(user_id)
        .execute(&mut *conn)
        .await?;

    sqlx::query(
        "INSERT INTO user_roles (user_id, role_id)
         SELECT $1, ids.id FROM (SELECT DISTINCT unnest($2::bigint[]) AS id) AS ids",
    )
    .bind(user_id)
    .bind(role_ids)
    .execute(&mut *conn)
    .await?;

    Ok(())
}
