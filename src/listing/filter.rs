use crate::error::AppError;

/// `categoryId` value meaning "do not filter by category".
pub const ALL_CATEGORIES: &str = "0";

/// Product listing filter, parsed from the query string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductFilter {
    /// Case-insensitive substring; empty matches every name.
    pub name: String,
    /// Match products in any of these categories; empty means no filter.
    pub category_ids: Vec<i64>,
}

impl ProductFilter {
    pub fn parse(name: &str, category_id: &str) -> Result<Self, AppError> {
        Ok(Self {
            name: name.trim().to_string(),
            category_ids: parse_category_ids(category_id)?,
        })
    }
}

/// Parse a comma-separated id list such as `"2,5"`.
pub fn parse_category_ids(raw: &str) -> Result<Vec<i64>, AppError> {
    let raw = raw.trim();
    if raw.is_empty() || raw == ALL_CATEGORIES {
        return Ok(Vec::new());
    }

    raw.split(',')
        .map(|token| {
            let token = token.trim();
            token
                .parse::<i64>()
                .map_err(|_| AppError::BadRequest(format!("Invalid category id: '{token}'")))
        })
        .collect()
}
