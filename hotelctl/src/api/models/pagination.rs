//! Offset pagination shared by every list endpoint.

use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};
use utoipa::{IntoParams, ToSchema};

pub const DEFAULT_LIMIT: i64 = 20;
pub const MAX_LIMIT: i64 = 100;

/// `skip` / `limit` query parameters.
///
/// Out-of-range values are clamped rather than rejected: `skip` to at least 0, `limit` to
/// `1..=MAX_LIMIT`. Values are parsed from strings so the struct also works when flattened into
/// another query type.
#[serde_as]
#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
pub struct Pagination {
    #[param(default = 0, minimum = 0)]
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub skip: Option<i64>,

    #[param(default = 20, minimum = 1, maximum = 100)]
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub limit: Option<i64>,
}

impl Pagination {
    pub fn skip(&self) -> i64 {
        self.skip.unwrap_or(0).max(0)
    }

    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }

    /// `(skip, limit)` after clamping
    pub fn params(&self) -> (i64, i64) {
        (self.skip(), self.limit())
    }
}

/// One page of a list plus what a client needs to fetch the next one
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PaginatedResponse<T: ToSchema> {
    pub data: Vec<T>,
    /// Matching items before pagination
    pub total_count: i64,
    pub skip: i64,
    pub limit: i64,
    /// More items exist past this page
    pub has_more: bool,
}

impl<T: ToSchema> PaginatedResponse<T> {
    pub fn new(data: Vec<T>, total_count: i64, skip: i64, limit: i64) -> Self {
        let has_more = skip + (data.len() as i64) < total_count;
        Self {
            data,
            total_count,
            skip,
            limit,
            has_more,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(None, None, (0, DEFAULT_LIMIT))]
    #[case(Some(-10), Some(0), (0, 1))]
    #[case(Some(40), Some(-5), (40, 1))]
    #[case(Some(5), Some(1000), (5, MAX_LIMIT))]
    #[case(Some(20), Some(50), (20, 50))]
    fn test_params_are_clamped(#[case] skip: Option<i64>, #[case] limit: Option<i64>, #[case] expected: (i64, i64)) {
        assert_eq!(Pagination { skip, limit }.params(), expected);
    }

    #[test]
    fn test_flattened_query_parses_strings() {
        #[derive(Deserialize)]
        struct Query {
            #[serde(flatten)]
            pagination: Pagination,
            search: Option<String>,
        }

        let query: Query = serde_json::from_value(serde_json::json!({ "skip": "5", "limit": "7", "search": "hue" })).unwrap();
        assert_eq!(query.pagination.params(), (5, 7));
        assert_eq!(query.search.as_deref(), Some("hue"));
    }

    #[test]
    fn test_has_more() {
        let page = PaginatedResponse::new(vec![1, 2], 5, 0, 2);
        assert!(page.has_more);
        let last = PaginatedResponse::new(vec![5], 5, 4, 2);
        assert!(!last.has_more);
    }
}
