//! Query shapes for the user store.
//!
//! Filter, sort, and pagination are expressed once in backend-neutral terms;
//! each store translates them to its native query form.

use serde::{Deserialize, Serialize};

use super::user::RoleId;

/// Filter criteria for listing users.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserFilter {
    pub roles: Vec<RoleId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UserSortField {
    Id,
    Email,
    FirstName,
    LastName,
    CreatedAt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct UserSort {
    pub field: UserSortField,
    pub order: SortOrder,
}

/// Offset pagination, 1-based page index.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u64,
    pub limit: u64,
}

impl Pagination {
    #[must_use]
    pub const fn new(page: u64, limit: u64) -> Self {
        Self { page, limit }
    }

    /// Number of records to skip for this page.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        self.page.saturating_sub(1) * self.limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_is_zero_based_from_one_based_pages() {
        assert_eq!(Pagination::new(1, 10).offset(), 0);
        assert_eq!(Pagination::new(3, 25).offset(), 50);
    }

    #[test]
    fn page_zero_clamps_to_first_page() {
        assert_eq!(Pagination::new(0, 10).offset(), 0);
    }
}
