//! Pagination and sorting parameters for list endpoints.
//!
//! Two pagination styles are accepted:
//!
//! - `limit` + `offset`
//! - `limit` + `page` (1-indexed; takes precedence over `offset`)
//!
//! `limit` is clamped to `[1, 100]` and defaults to 10.
//!
//! ```ignore
//! // GET /api/collaborators?limit=20&page=3
//! let params = PaginationParams { limit: Some(20), offset: None, page: Some(3) };
//! assert_eq!(params.offset(), 40);
//! let meta = PaginationMeta::new(&params, 75);
//! assert!(meta.has_more);
//! ```

use serde::{Deserialize, Deserializer, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Empty query values (`?limit=`) are treated as absent.
fn deserialize_optional_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s {
        Some(s) if s.is_empty() => Ok(None),
        Some(s) => s.parse::<i64>().map(Some).map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PaginationMeta {
    /// Total number of matching items
    pub total: i64,
    pub limit: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<i64>,
    /// Whether items remain after this page
    pub has_more: bool,
}

impl PaginationMeta {
    pub fn new(params: &PaginationParams, total: i64) -> Self {
        let limit = params.limit();
        let offset = params.offset();
        Self {
            total,
            limit,
            offset: params.page().is_none().then_some(offset),
            page: params.page(),
            has_more: offset + limit < total,
        }
    }
}

#[derive(Debug, Clone, Default, Hash, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PaginationParams {
    /// Maximum number of items to return (1-100, default: 10)
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub limit: Option<i64>,
    /// Number of items to skip (ignored if `page` is set)
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub offset: Option<i64>,
    /// Page number (1-indexed)
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub page: Option<i64>,
}

impl PaginationParams {
    #[must_use]
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(10).clamp(1, 100)
    }

    #[must_use]
    pub fn offset(&self) -> i64 {
        match self.page {
            Some(page) => (page.max(1) - 1) * self.limit(),
            None => self.offset.unwrap_or(0).max(0),
        }
    }

    #[must_use]
    pub fn page(&self) -> Option<i64> {
        self.page.map(|p| p.max(1))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub const fn as_sql(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}
