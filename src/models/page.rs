use serde::{Deserialize, Serialize};

/// One page of a paginated listing.
/// The API emits both `items`/`totalItems` and the older
/// `content`/`totalElements` field names depending on the endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    #[serde(alias = "content", default = "Vec::new")]
    pub items: Vec<T>,
    #[serde(default, alias = "number")]
    pub page: u32,
    #[serde(rename = "pageSize", alias = "size", default)]
    pub page_size: u32,
    #[serde(rename = "totalItems", alias = "totalElements", default)]
    pub total_items: u64,
    #[serde(rename = "totalPages", default)]
    pub total_pages: u32,
}

impl<T> Page<T> {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether another page follows this one (pages are zero-based).
    pub fn has_next(&self) -> bool {
        self.page + 1 < self.total_pages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_items_shape() {
        let json = r#"{"items":[1,2,3],"page":0,"pageSize":20,"totalItems":3,"totalPages":1}"#;
        let page: Page<i64> = serde_json::from_str(json).expect("Failed to parse page JSON");
        assert_eq!(page.items, vec![1, 2, 3]);
        assert!(!page.has_next());
    }

    #[test]
    fn test_parse_content_shape() {
        let json = r#"{"content":[1,2],"number":1,"size":2,"totalElements":6,"totalPages":3}"#;
        let page: Page<i64> = serde_json::from_str(json).expect("Failed to parse page JSON");
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.page, 1);
        assert_eq!(page.total_items, 6);
        assert!(page.has_next());
    }
}
