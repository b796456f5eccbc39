//! Paging types shared by stores, search execution, and result providers.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Page size limits applied when normalizing a [`PageRequest`].
///
/// Deserializable so host applications can embed it in their own
/// configuration files.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PageConfig {
    /// Page size used when a request does not specify one.
    pub default_count: usize,
    /// Upper bound any request is clamped to.
    pub max_count: usize,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            default_count: 10,
            max_count: 100,
        }
    }
}

/// A page window requested by a caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PageRequest {
    /// Zero-based offset of the first item.
    pub offset: usize,
    /// Requested page size; `None` asks for the configured default,
    /// `Some(0)` asks for an empty page (totals only).
    pub count: Option<usize>,
}

impl PageRequest {
    /// Creates a request for `[offset, offset + count)`.
    #[must_use]
    pub fn new(offset: usize, count: usize) -> Self {
        Self {
            offset,
            count: Some(count),
        }
    }

    /// Creates a request for the first page at the configured default size.
    #[must_use]
    pub fn first() -> Self {
        Self {
            offset: 0,
            count: None,
        }
    }

    /// Resolves the request against `config`: substitutes the default page
    /// size when none was given and clamps to the maximum.
    #[must_use]
    pub fn normalize(&self, config: &PageConfig) -> (usize, usize) {
        let count = match self.count {
            Some(n) => n.min(config.max_count),
            None => config.default_count,
        };
        (self.offset, count)
    }
}

/// One page of translated results plus supplementary included resources.
///
/// `included` holds resources pulled in by include/reverse-include
/// directives. They are heterogeneous, so they stay in document form, and
/// they never count toward `total`.
#[derive(Debug, Clone, Serialize)]
pub struct PagedResult<T> {
    /// The matched resources within the requested window.
    pub items: Vec<T>,
    /// Supplementary resources referenced by (or referencing) the items.
    pub included: Vec<Value>,
    /// Total number of matches across all pages.
    pub total: usize,
    /// Offset this page starts at.
    pub offset: usize,
    /// The normalized page size the window was computed with.
    pub page_size: usize,
}

impl<T> PagedResult<T> {
    /// Creates a page without included resources.
    #[must_use]
    pub fn new(items: Vec<T>, total: usize, offset: usize, page_size: usize) -> Self {
        Self {
            items,
            included: Vec::new(),
            total,
            offset,
            page_size,
        }
    }

    /// Attaches included resources to the page.
    #[must_use]
    pub fn with_included(mut self, included: Vec<Value>) -> Self {
        self.included = included;
        self
    }

    /// Whether more matches exist beyond this page.
    #[must_use]
    pub fn has_more(&self) -> bool {
        self.offset + self.items.len() < self.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_defaults_and_clamps() {
        let config = PageConfig::default();
        assert_eq!(PageRequest::first().normalize(&config), (0, 10));
        assert_eq!(PageRequest::new(20, 25).normalize(&config), (20, 25));
        assert_eq!(PageRequest::new(0, 1000).normalize(&config), (0, 100));
        assert_eq!(PageRequest::new(0, 0).normalize(&config), (0, 0));
    }

    #[test]
    fn test_has_more() {
        let page = PagedResult::new(vec![1, 2, 3], 10, 0, 3);
        assert!(page.has_more());
        let last = PagedResult::new(vec![9, 10], 10, 8, 3);
        assert!(!last.has_more());
    }

    #[test]
    fn test_included_does_not_affect_total() {
        let page = PagedResult::new(vec![1], 1, 0, 10)
            .with_included(vec![serde_json::json!({"resourceType": "Patient", "id": "p1"})]);
        assert_eq!(page.total, 1);
        assert_eq!(page.included.len(), 1);
        assert!(!page.has_more());
    }

    #[test]
    fn test_page_config_deserialize() {
        let config: PageConfig = serde_json::from_str(r#"{"default_count": 5}"#).unwrap();
        assert_eq!(config.default_count, 5);
        assert_eq!(config.max_count, 100);
    }
}
