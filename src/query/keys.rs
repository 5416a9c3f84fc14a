//! Key builders for every cached resource.
//!
//! Call sites go through these so segment order stays agreed upon.
//! Everything scoped to one inscription extends [`inscription`], which
//! lets a single prefix eviction cover the detail view and all of its
//! analytics pages.

use super::key::QueryKey;

/// Prefix covering every cached read for one inscription.
pub fn inscription(id: i64) -> QueryKey {
    QueryKey::new().text("inscriptions").id(id)
}

pub fn inscription_detail(id: i64) -> QueryKey {
    inscription(id).text("detail")
}

pub fn inscription_analytics(id: i64, page: u32, page_size: u32) -> QueryKey {
    inscription(id).text("analytics").page(page, page_size)
}

/// Prefix covering every event-scoped listing.
pub fn events() -> QueryKey {
    QueryKey::new().text("events")
}

pub fn event_list(page: u32, page_size: u32) -> QueryKey {
    events().text("list").page(page, page_size)
}

pub fn event_detail(id: i64) -> QueryKey {
    events().id(id).text("detail")
}

pub fn event_analysis(id: i64, page: u32, page_size: u32) -> QueryKey {
    events().id(id).text("analysis").page(page, page_size)
}

pub fn event_inscriptions(event_id: i64, page: u32, page_size: u32) -> QueryKey {
    events().id(event_id).text("inscriptions").page(page, page_size)
}

pub fn payments(event_id: i64) -> QueryKey {
    QueryKey::new().text("payments").id(event_id)
}

pub fn payments_page(event_id: i64, page: u32, page_size: u32) -> QueryKey {
    payments(event_id).page(page, page_size)
}

pub fn tickets(event_id: i64) -> QueryKey {
    QueryKey::new().text("tickets").id(event_id)
}

pub fn tickets_page(event_id: i64, page: u32, page_size: u32) -> QueryKey {
    tickets(event_id).page(page, page_size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inscription_scoped_keys_share_prefix() {
        let prefix = inscription(42);
        assert!(inscription_detail(42).starts_with(&prefix));
        assert!(inscription_analytics(42, 0, 20).starts_with(&prefix));
        assert!(!inscription_detail(43).starts_with(&prefix));
    }

    #[test]
    fn test_event_scoped_keys_share_prefix() {
        let prefix = events();
        assert!(event_list(0, 20).starts_with(&prefix));
        assert!(event_analysis(7, 1, 10).starts_with(&prefix));
        assert!(!payments_page(7, 0, 20).starts_with(&prefix));
    }
}
