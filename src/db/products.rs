use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::listing::filter::ProductFilter;
use crate::listing::page::PageRequest;
use crate::models::{Product, ProductCategoryRow, ProductProjection};

/// Sortable request properties and their columns.
pub const SORT_COLUMNS: &[(&str, &str)] = &[
    ("id", "p.id"),
    ("name", "p.name"),
    ("price", "p.price"),
    ("date", "p.date"),
];

/// Column values for insert and update.
#[derive(Debug, Clone)]
pub struct ProductFields {
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub img_url: String,
    pub date: DateTime<Utc>,
    pub category_ids: Vec<i64>,
}

const MATCHES_FILTER: &str = "strpos(lower(p.name), lower($1)) > 0
    AND (cardinality($2::bigint[]) = 0 OR EXISTS (
        SELECT 1 FROM product_categories pc
        WHERE pc.product_id = p.id AND pc.category_id = ANY($2)
    ))";

/// Projection page: ids (and names) of matching products, sorted and paginated.
pub async fn search_projection<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    filter: &ProductFilter,
    page: &PageRequest,
) -> Result<Vec<ProductProjection>, sqlx::Error> {
    sqlx::query_as::<_, ProductProjection>(&format!(
        "SELECT p.id, p.name FROM products p
         WHERE {MATCHES_FILTER}
         ORDER BY {} LIMIT $3 OFFSET $4",
        page.sort.to_sql()
    ))
    .bind(&filter.name)
    .bind(filter.category_ids.as_slice())
    .bind(page.size)
    .bind(page.offset())
    .fetch_all(executor)
    .await
}

pub async fn count_matching<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    filter: &ProductFilter,
) -> Result<i64, sqlx::Error> {
    let row: (i64,) = sqlx::query_as(&format!(
        "SELECT COUNT(*) FROM products p WHERE {MATCHES_FILTER}"
    ))
    .bind(&filter.name)
    .bind(filter.category_ids.as_slice())
    .fetch_one(executor)
    .await?;
    Ok(row.0)
}

/// Full rows for `ids`, in no particular order.
pub async fn find_by_ids<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    ids: &[i64],
) -> Result<Vec<Product>, sqlx::Error> {
    sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = ANY($1)")
        .bind(ids)
        .fetch_all(executor)
        .await
}

pub async fn category_rows<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    product_ids: &[i64],
) -> Result<Vec<ProductCategoryRow>, sqlx::Error> {
    sqlx::query_as::<_, ProductCategoryRow>(
        "SELECT pc.product_id, c.id AS category_id, c.name AS category_name
         FROM product_categories pc
         JOIN categories c ON c.id = pc.category_id
         WHERE pc.product_id = ANY($1)
         ORDER BY c.id",
    )
    .bind(product_ids)
    .fetch_all(executor)
    .await
}

pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Product>, sqlx::Error> {
    sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn create<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    fields: &ProductFields,
) -> Result<Product, sqlx::Error> {
    sqlx::query_as::<_, Product>(
        "INSERT INTO products (name, description, price, img_url, date)
         VALUES ($1, $2, $3, $4, $5) RETURNING *",
    )
    .bind(&fields.name)
    .bind(&fields.description)
    .bind(fields.price)
    .bind(&fields.img_url)
    .bind(fields.date)
    .fetch_one(executor)
    .await
}

pub async fn update<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    id: i64,
    fields: &ProductFields,
) -> Result<Product, sqlx::Error> {
    sqlx::query_as::<_, Product>(
        "UPDATE products
         SET name = $2, description = $3, price = $4, img_url = $5, date = $6, updated_at = now()
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(&fields.name)
    .bind(&fields.description)
    .bind(fields.price)
    .bind(&fields.img_url)
    .bind(fields.date)
    .fetch_one(executor)
    .await
}

/// Replace the whole category set of a product.
pub async fn replace_categories(
    conn: &mut sqlx::PgConnection,
    product_id: i64,
    category_ids: &[i64],
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM product_categories WHERE product_id = $1")
        .bind(product_id)
        .execute(&mut *conn)
        .await?;

    sqlx::query(
        "INSERT INTO product_categories (product_id, category_id)
         SELECT $1, ids.id FROM (SELECT DISTINCT unnest($2::bigint[]) AS id) AS ids",
    )
    .bind(product_id)
    .bind(category_ids)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

pub async fn delete(pool: &PgPool, id: i64) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM products WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
