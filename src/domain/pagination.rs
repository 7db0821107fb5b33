#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    page: i64,
    limit: i64,
}

impl Pagination {
    pub const DEFAULT_LIMIT: i64 = 10;
    pub const MAX_LIMIT: i64 = 100;
    /// Largest page whose offset still fits in an `i64`.
    pub const MAX_PAGE: i64 = i64::MAX / Self::MAX_LIMIT;

    /// Out of range values are clamped rather than rejected.
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        Self::with_default_limit(page, limit, Self::DEFAULT_LIMIT)
    }

    pub fn with_default_limit(page: Option<i64>, limit: Option<i64>, default_limit: i64) -> Self {
        let page = page.unwrap_or(1).clamp(1, Self::MAX_PAGE);
        let limit = limit.unwrap_or(default_limit).clamp(1, Self::MAX_LIMIT);
        Self { page, limit }
    }

    pub fn page(&self) -> i64 {
        self.page
    }

    pub fn limit(&self) -> i64 {
        self.limit
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.limit
    }

    pub fn page_count(&self, total: i64) -> i64 {
        (total + self.limit - 1) / self.limit
    }

    pub fn has_more(&self, total: i64) -> bool {
        self.page < self.page_count(total)
    }
}
