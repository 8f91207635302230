//! Common types used across the platform

use serde::{Deserialize, Serialize};

/// Pagination parameters for list endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

fn default_page() -> u32 {
    1
}

fn default_per_page() -> u32 {
    50
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: default_page(),
            per_page: default_per_page(),
        }
    }
}

impl Pagination {
    /// SQL OFFSET for this page
    pub fn offset(&self) -> i64 {
        i64::from(self.page.saturating_sub(1)) * i64::from(self.per_page)
    }

    /// SQL LIMIT for this page, capped at 200 rows
    pub fn limit(&self) -> i64 {
        i64::from(self.per_page.clamp(1, 200))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_defaults() {
        let p = Pagination::default();
        assert_eq!(p.offset(), 0);
        assert_eq!(p.limit(), 50);
    }

    #[test]
    fn test_pagination_offset() {
        let p = Pagination {
            page: 3,
            per_page: 25,
        };
        assert_eq!(p.offset(), 50);
        assert_eq!(p.limit(), 25);
    }

    #[test]
    fn test_pagination_limit_capped() {
        let p = Pagination {
            page: 1,
            per_page: 5000,
        };
        assert_eq!(p.limit(), 200);
    }
}
