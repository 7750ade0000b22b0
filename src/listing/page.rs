use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::error::AppError;

pub const MAX_PAGE_SIZE: i64 = 100;

/// Raw `page`, `size` and `sort` query parameters.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageParams {
    /// Zero-based page index.
    pub page: Option<i64>,
    /// Page size, clamped to 1..=100.
    pub size: Option<i64>,
    /// `property[,asc|desc]`
    pub sort: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    fn as_sql(self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

/// A whitelisted sort column. The column name is never taken from user input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort {
    pub column: &'static str,
    pub direction: Direction,
}

impl Sort {
    pub const fn asc(column: &'static str) -> Self {
        Self {
            column,
            direction: Direction::Asc,
        }
    }

    /// Parse `property[,asc|desc]`. `allowed` maps request property names to
    /// SQL columns.
    pub fn parse(raw: &str, allowed: &[(&str, &'static str)]) -> Result<Self, AppError> {
        let mut parts = raw.split(',').map(str::trim);
        let property = parts.next().unwrap_or_default();

        let column = allowed
            .iter()
            .find(|(name, _)| *name == property)
            .map(|(_, column)| *column)
            .ok_or_else(|| AppError::BadRequest(format!("Cannot sort by '{property}'")))?;

        let direction = match parts.next().map(str::to_ascii_lowercase).as_deref() {
            None | Some("") | Some("asc") => Direction::Asc,
            Some("desc") => Direction::Desc,
            Some(other) => {
                return Err(AppError::BadRequest(format!(
                    "Invalid sort direction '{other}'"
                )));
            }
        };

        Ok(Self { column, direction })
    }

    pub fn to_sql(&self) -> String {
        format!("{} {}", self.column, self.direction.as_sql())
    }
}

/// Validated pagination: zero-based page index, bounded size and sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub size: i64,
    pub sort: Sort,
}

impl PageRequest {
    pub fn from_params(
        params: &PageParams,
        default_size: i64,
        default_sort: Sort,
        allowed: &[(&str, &'static str)],
    ) -> Result<Self, AppError> {
        let page = params.page.unwrap_or(0).max(0);
        let size = params.size.unwrap_or(default_size).clamp(1, MAX_PAGE_SIZE);
        let sort = match params.sort.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => Sort::parse(raw, allowed)?,
            _ => default_sort,
        };
        Ok(Self { page, size, sort })
    }

    pub fn offset(&self) -> i64 {
        self.page.saturating_mul(self.size)
    }
}

/// Page envelope returned by listing endpoints.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    pub total_elements: i64,
    pub total_pages: i64,
    pub number: i64,
    pub size: i64,
    pub number_of_elements: usize,
    pub first: bool,
    pub last: bool,
    pub empty: bool,
}

impl<T> Page<T> {
    /// Build the envelope. Metadata comes from the request and the count
    /// query, never from `content`.
    pub fn new(content: Vec<T>, request: &PageRequest, total_elements: i64) -> Self {
        let total_pages = (total_elements + request.size - 1) / request.size;
        Self {
            number_of_elements: content.len(),
            empty: content.is_empty(),
            content,
            total_elements,
            total_pages,
            number: request.page,
            size: request.size,
            first: request.page == 0,
            last: request.page.saturating_add(1) >= total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALLOWED: &[(&str, &str)] = &[("id", "p.id"), ("name", "p.name")];

    fn request(page: Option<i64>, size: Option<i64>, sort: Option<&str>) -> Result<PageRequest, AppError> {
        let params = PageParams {
            page,
            size,
            sort: sort.map(str::to_string),
        };
        PageRequest::from_params(&params, 12, Sort::asc("p.id"), ALLOWED)
    }

    #[test]
    fn defaults_apply_when_params_absent() {
        let req = request(None, None, None).unwrap();
        assert_eq!(req.page, 0);
        assert_eq!(req.size, 12);
        assert_eq!(req.sort.to_sql(), "p.id ASC");
        assert_eq!(req.offset(), 0);
    }

    #[test]
    fn size_is_clamped_and_page_floored() {
        let req = request(Some(-3), Some(5000), None).unwrap();
        assert_eq!(req.page, 0);
        assert_eq!(req.size, MAX_PAGE_SIZE);

        let req = request(Some(2), Some(0), None).unwrap();
        assert_eq!(req.size, 1);
        assert_eq!(req.offset(), 2);
    }

    #[test]
    fn sort_accepts_direction_suffix() {
        let req = request(None, None, Some("name,desc")).unwrap();
        assert_eq!(req.sort.to_sql(), "p.name DESC");
        let req = request(None, None, Some("name")).unwrap();
        assert_eq!(req.sort.to_sql(), "p.name ASC");
    }

    #[test]
    fn unknown_sort_property_is_rejected() {
        assert!(matches!(
            request(None, None, Some("password")),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            request(None, None, Some("name,sideways")),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn envelope_metadata_from_total() {
        let req = request(Some(1), Some(10), None).unwrap();
        let page = Page::new(vec![1, 2, 3], &req, 13);
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.number_of_elements, 3);
        assert!(!page.first);
        assert!(page.last);
        assert!(!page.empty);
    }

    #[test]
    fn empty_result_has_zero_totals() {
        let req = request(None, None, None).unwrap();
        let page: Page<i64> = Page::new(vec![], &req, 0);
        assert_eq!(page.total_elements, 0);
        assert_eq!(page.total_pages, 0);
        assert!(page.first && page.last && page.empty);
    }

    #[test]
    fn huge_page_index_is_past_the_end() {
        let req = request(Some(i64::MAX), Some(12), None).unwrap();
        assert_eq!(req.offset(), i64::MAX);

        let page: Page<i64> = Page::new(vec![], &req, 5);
        assert_eq!(page.number, i64::MAX);
        assert!(page.last);
        assert!(!page.first);
        assert!(page.empty);
    }
}
