//! Deduplicated, TTL-bounded news cache

use super::NewsItem;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;

/// In-memory news store keyed by article URL
///
/// Entries expire after a fixed TTL and the cache is bounded by capacity,
/// evicting the oldest fetched-at first. Re-inserting a known URL replaces
/// the stored content and refreshes fetched-at, but keeps the consumed flag
/// so already-paired articles are not evaluated again.
pub struct NewsCache {
    entries: HashMap<String, NewsItem>,
    ttl: Duration,
    capacity: usize,
}

impl NewsCache {
    /// Create a cache with the given TTL and capacity
    pub fn new(ttl_secs: u64, capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            ttl: Duration::seconds(ttl_secs as i64),
            capacity,
        }
    }

    /// Insert or update an item by URL key, refreshing fetched-at
    ///
    /// Returns true if the URL was not cached before.
    pub fn put(&mut self, item: NewsItem) -> bool {
        let url = item.url.clone();
        let inserted = match self.entries.get(&url) {
            Some(existing) => {
                let consumed = existing.consumed;
                let mut updated = item;
                updated.consumed = consumed;
                self.entries.insert(url, updated);
                false
            }
            None => {
                self.entries.insert(url, item);
                true
            }
        };

        while self.entries.len() > self.capacity {
            if let Some(oldest) = self.oldest_url() {
                self.entries.remove(&oldest);
            } else {
                break;
            }
        }

        inserted
    }

    /// Remove entries whose fetched-at is older than the TTL
    pub fn evict_expired(&mut self, now: DateTime<Utc>) {
        let ttl = self.ttl;
        self.entries.retain(|_, item| now - item.fetched_at <= ttl);
    }

    /// Items not yet paired against the active markets, oldest first
    pub fn all_unconsumed(&self) -> Vec<NewsItem> {
        let mut items: Vec<NewsItem> = self
            .entries
            .values()
            .filter(|item| !item.consumed)
            .cloned()
            .collect();
        items.sort_by(|a, b| a.fetched_at.cmp(&b.fetched_at).then(a.url.cmp(&b.url)));
        items
    }

    /// Mark an item as paired against all current markets
    pub fn mark_consumed(&mut self, url: &str) {
        if let Some(item) = self.entries.get_mut(url) {
            item.consumed = true;
        }
    }

    /// Look up an item by URL
    pub fn get(&self, url: &str) -> Option<&NewsItem> {
        self.entries.get(url)
    }

    /// Number of cached items
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn oldest_url(&self) -> Option<String> {
        self.entries
            .values()
            .min_by(|a, b| a.fetched_at.cmp(&b.fetched_at).then(a.url.cmp(&b.url)))
            .map(|item| item.url.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item_at(url: &str, fetched_at: DateTime<Utc>) -> NewsItem {
        let mut item = NewsItem::new(url, format!("headline {url}"), "summary");
        item.fetched_at = fetched_at;
        item
    }

    #[test]
    fn test_put_deduplicates_by_url() {
        let mut cache = NewsCache::new(3600, 10);
        let now = Utc::now();

        assert!(cache.put(item_at("https://example.com/a", now)));
        let mut update = item_at("https://example.com/a", now + Duration::seconds(5));
        update.headline = "updated".to_string();
        assert!(!cache.put(update));

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("https://example.com/a").unwrap().headline, "updated");
    }

    #[test]
    fn test_put_preserves_consumed_on_update() {
        let mut cache = NewsCache::new(3600, 10);
        let now = Utc::now();

        cache.put(item_at("https://example.com/a", now));
        cache.mark_consumed("https://example.com/a");
        cache.put(item_at("https://example.com/a", now + Duration::seconds(30)));

        assert!(cache.get("https://example.com/a").unwrap().consumed);
        assert!(cache.all_unconsumed().is_empty());
    }

    #[test]
    fn test_evict_expired() {
        let mut cache = NewsCache::new(60, 10);
        let now = Utc::now();

        cache.put(item_at("https://example.com/old", now - Duration::seconds(120)));
        cache.put(item_at("https://example.com/fresh", now - Duration::seconds(30)));
        cache.evict_expired(now);

        assert_eq!(cache.len(), 1);
        assert!(cache.get("https://example.com/fresh").is_some());
    }

    #[test]
    fn test_capacity_evicts_single_oldest() {
        let mut cache = NewsCache::new(3600, 3);
        let now = Utc::now();

        for i in 0..3 {
            cache.put(item_at(
                &format!("https://example.com/{i}"),
                now + Duration::seconds(i),
            ));
        }
        cache.put(item_at("https://example.com/3", now + Duration::seconds(3)));

        assert_eq!(cache.len(), 3);
        assert!(cache.get("https://example.com/0").is_none());
        for i in 1..=3 {
            assert!(cache.get(&format!("https://example.com/{i}")).is_some());
        }
    }

    #[test]
    fn test_all_unconsumed_oldest_first() {
        let mut cache = NewsCache::new(3600, 10);
        let now = Utc::now();

        cache.put(item_at("https://example.com/b", now + Duration::seconds(10)));
        cache.put(item_at("https://example.com/a", now));
        cache.put(item_at("https://example.com/c", now + Duration::seconds(20)));
        cache.mark_consumed("https://example.com/c");

        let unconsumed = cache.all_unconsumed();
        let urls: Vec<&str> = unconsumed.iter().map(|i| i.url.as_str()).collect();
        assert_eq!(urls, vec!["https://example.com/a", "https://example.com/b"]);
    }
}
