use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

/// A `products` row without its category associations.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub img_url: String,
    pub date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Lightweight row returned by the listing projection query.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductProjection {
    pub id: i64,
    pub name: String,
}

/// One `product_categories` edge joined with the category name.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductCategoryRow {
    pub product_id: i64,
    pub category_id: i64,
    pub category_name: String,
}

/// Output record: a product with its categories.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductView {
    pub id: i64,
    pub name: String,
    pub description: String,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64, example = 800.0)]
    pub price: Decimal,
    pub img_url: String,
    pub date: DateTime<Utc>,
    pub categories: Vec<CategoryRef>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq, ToSchema)]
pub struct CategoryRef {
    pub id: i64,
    pub name: String,
}

impl ProductView {
    pub fn new(product: Product, categories: Vec<CategoryRef>) -> Self {
        Self {
            id: product.id,
            name: product.name,
            description: product.description,
            price: product.price,
            img_url: product.img_url,
            date: product.date,
            categories,
        }
    }
}

/// Attach category rows to their products, keeping the order of `products`.
pub fn with_categories(products: Vec<Product>, rows: Vec<ProductCategoryRow>) -> Vec<ProductView> {
    let mut by_product: HashMap<i64, Vec<CategoryRef>> = HashMap::new();
    for row in rows {
        by_product.entry(row.product_id).or_default().push(CategoryRef {
            id: row.category_id,
            name: row.category_name,
        });
    }

    products
        .into_iter()
        .map(|product| {
            let categories = by_product.remove(&product.id).unwrap_or_default();
            ProductView::new(product, categories)
        })
        .collect()
}
