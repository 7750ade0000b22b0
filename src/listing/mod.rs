//! Filtered, paginated product listing.
//!
//! A projection query selects and orders the ids of one page; the full rows
//! and their categories are then fetched for exactly those ids and put back
//! into projection order before mapping to output records.

pub mod filter;
pub mod page;
pub mod reorder;

use sqlx::PgPool;

use crate::db;
use crate::error::AppError;
use crate::models::{Product, ProductProjection, ProductView, with_categories};

use self::filter::ProductFilter;
use self::page::{Page, PageRequest};
use self::reorder::{Identified, reorder_by_reference};

impl Identified for ProductProjection {
    fn id(&self) -> i64 {
        self.id
    }
}

impl Identified for Product {
    fn id(&self) -> i64 {
        self.id
    }
}

pub async fn find_products(
    pool: &PgPool,
    filter: &ProductFilter,
    request: &PageRequest,
) -> Result<Page<ProductView>, AppError> {
    // One snapshot for the count, the projection and the hydration reads.
    let mut tx = pool.begin().await?;
    sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
        .execute(&mut *tx)
        .await?;

    let total = db::products::count_matching(&mut *tx, filter).await?;
    let projection = db::products::search_projection(&mut *tx, filter, request).await?;

    if projection.is_empty() {
        tx.commit().await?;
        return Ok(Page::new(Vec::new(), request, total));
    }

    let ids: Vec<i64> = projection.iter().map(|p| p.id).collect();
    let products = db::products::find_by_ids(&mut *tx, &ids).await?;
    let category_rows = db::products::category_rows(&mut *tx, &ids).await?;
    tx.commit().await?;

    let products = reorder_by_reference(&projection, products).map_err(|missing| {
        AppError::Internal(format!("Product listing out of sync: {missing}"))
    })?;

    tracing::debug!(
        page = request.page,
        size = request.size,
        total,
        returned = products.len(),
        "Product page assembled"
    );

    Ok(Page::new(
        with_categories(products, category_rows),
        request,
        total,
    ))
}
