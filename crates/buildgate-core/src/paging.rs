//! Paged results and locator construction.
//!
//! A locator is the server's query-filter syntax: an ordered list of
//! `key:value` clauses joined by commas. Each endpoint family expects its
//! clauses in its own order, so callers add clauses in the order the endpoint
//! wants and the locator keeps that order verbatim.

use std::fmt;

/// A page of items returned by a list endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct PagedResult<T> {
    /// Items in server order.
    pub items: Vec<T>,

    /// Total number of items reported by the server.
    pub total_count: usize,
}

impl<T> PagedResult<T> {
    pub fn new(items: Vec<T>, total_count: usize) -> Self {
        Self { items, total_count }
    }

    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            total_count: 0,
        }
    }

    /// Number of items actually returned.
    pub fn returned_count(&self) -> usize {
        self.items.len()
    }

    /// Returns true if the server holds more items than were returned.
    pub fn has_more(&self) -> bool {
        self.returned_count() < self.total_count
    }

    /// Append another result: items are concatenated in order and totals summed.
    pub fn merge(mut self, other: PagedResult<T>) -> Self {
        self.items.extend(other.items);
        self.total_count += other.total_count;
        self
    }

    /// Keep only items matching the predicate. The server total is untouched.
    pub fn retain(&mut self, f: impl FnMut(&T) -> bool) {
        self.items.retain(f);
    }

    pub fn into_items(self) -> Vec<T> {
        self.items
    }
}

impl<T> Default for PagedResult<T> {
    fn default() -> Self {
        Self::empty()
    }
}

/// Offset of the first item on a 1-based page. Page 0 is treated as page 1.
pub fn page_start(page: u32, page_size: u32) -> u32 {
    page.max(1).saturating_sub(1).saturating_mul(page_size)
}

/// Ordered list of locator clauses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Locator {
    clauses: Vec<(String, String)>,
}

impl Locator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a `key:value` clause.
    pub fn clause(mut self, key: impl Into<String>, value: impl fmt::Display) -> Self {
        self.clauses.push((key.into(), value.to_string()));
        self
    }

    /// Append a clause only when the value is present and not blank.
    pub fn clause_opt<V: AsRef<str>>(self, key: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(v) if !v.as_ref().trim().is_empty() => {
                let v = v.as_ref().to_string();
                self.clause(key, v)
            }
            _ => self,
        }
    }

    /// Append a `count:` clause.
    pub fn count(self, count: u32) -> Self {
        self.clause("count", count)
    }

    /// Append `count:{page_size},start:{(page-1)*page_size}`.
    pub fn paginate(self, page: u32, page_size: u32) -> Self {
        self.count(page_size)
            .clause("start", page_start(page, page_size))
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn len(&self) -> usize {
        self.clauses.len()
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.clauses.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{key}:{value}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_paged_result_counts() {
        let page = PagedResult::new(vec![1, 2, 3], 10);
        assert_eq!(page.returned_count(), 3);
        assert!(page.has_more());

        let full = PagedResult::new(vec![1, 2], 2);
        assert!(!full.has_more());

        let empty: PagedResult<u8> = PagedResult::empty();
        assert_eq!(empty.returned_count(), 0);
        assert!(!empty.has_more());
    }

    #[test]
    fn test_merge_keeps_order_and_sums_totals() {
        let running = PagedResult::new(vec!["r1", "r2"], 2);
        let queued = PagedResult::new(vec!["q1"], 4);
        let merged = running.merge(queued);
        assert_eq!(merged.items, vec!["r1", "r2", "q1"]);
        assert_eq!(merged.total_count, 6);
        assert_eq!(merged.returned_count(), merged.items.len());
        assert!(merged.has_more());
    }

    #[test]
    fn test_page_start() {
        assert_eq!(page_start(1, 20), 0);
        assert_eq!(page_start(3, 20), 40);
        assert_eq!(page_start(0, 20), 0);
    }

    #[test]
    fn test_paginated_locator() {
        let locator = Locator::new().paginate(2, 25);
        assert_eq!(locator.to_string(), "count:25,start:25");
    }

    #[test]
    fn test_locator_keeps_caller_order() {
        let search = Locator::new()
            .clause_opt("name", Some("svn"))
            .clause_opt("project", Some("Unity"))
            .paginate(1, 20);
        assert_eq!(search.to_string(), "name:svn,project:Unity,count:20,start:0");

        let running = Locator::new()
            .clause("buildType", "bt1")
            .clause("running", true)
            .count(20);
        assert_eq!(running.to_string(), "buildType:bt1,running:true,count:20");

        let suffixed = Locator::new().paginate(1, 5).clause("tags", "nightly");
        assert_eq!(suffixed.to_string(), "count:5,start:0,tags:nightly");
    }

    #[test]
    fn test_clause_opt_skips_blank() {
        let locator = Locator::new()
            .clause_opt::<&str>("name", None)
            .clause_opt("project", Some("  "))
            .count(1);
        assert_eq!(locator.to_string(), "count:1");
        assert_eq!(locator.len(), 1);
    }

    proptest! {
        #[test]
        fn prop_counts_follow_items(
            items in prop::collection::vec(any::<u16>(), 0..50),
            total in 0usize..100,
        ) {
            let page = PagedResult::new(items.clone(), total);
            prop_assert_eq!(page.returned_count(), items.len());
            prop_assert_eq!(page.has_more(), items.len() < total);
        }

        #[test]
        fn prop_merge_preserves_invariants(
            first in prop::collection::vec(any::<u16>(), 0..30),
            first_total in 0usize..60,
            second in prop::collection::vec(any::<u16>(), 0..30),
            second_total in 0usize..60,
        ) {
            let merged = PagedResult::new(first.clone(), first_total)
                .merge(PagedResult::new(second.clone(), second_total));

            let mut expected = first;
            expected.extend(second);
            prop_assert_eq!(merged.returned_count(), expected.len());
            prop_assert_eq!(merged.total_count, first_total + second_total);
            prop_assert_eq!(merged.has_more(), expected.len() < first_total + second_total);
            prop_assert_eq!(merged.items, expected);
        }
    }
}
