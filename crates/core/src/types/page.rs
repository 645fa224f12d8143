//! Pagination parameters shared by the listing endpoints.

/// `page`/`limit` query parameters.
///
/// Pages are 1-based; the backend defaults are page 1 with 20 entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    pub const DEFAULT_LIMIT: u32 = 20;

    /// Create a page request, clamping zero values to the first page and one entry.
    #[must_use]
    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            page: page.max(1),
            limit: limit.max(1),
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            limit: Self::DEFAULT_LIMIT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_page() {
        assert_eq!(PageRequest::default(), PageRequest::new(1, 20));
    }

    #[test]
    fn test_zero_values_clamped() {
        assert_eq!(PageRequest::new(0, 0), PageRequest { page: 1, limit: 1 });
    }
}
