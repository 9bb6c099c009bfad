//! # Reply Cache
//!
//! Short-lived cache of command replies keyed by the exact message text.
//! Only consulted for commands marked cacheable.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

pub struct ReplyCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, (Instant, Vec<String>)>>,
}

impl ReplyCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Cached reply for `key`, if it has not expired.
    pub fn get(&self, key: &str) -> Option<Vec<String>> {
        let mut entries = self.entries.lock().ok()?;
        match entries.get(key) {
            Some((stored, lines)) if stored.elapsed() < self.ttl => Some(lines.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn insert(&self, key: &str, lines: Vec<String>) {
        if self.ttl.is_zero() {
            return;
        }
        if let Ok(mut entries) = self.entries.lock() {
            let ttl = self.ttl;
            entries.retain(|_, (stored, _)| stored.elapsed() < ttl);
            entries.insert(key.to_string(), (Instant::now(), lines));
        }
    }

    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_entries_expire_after_ttl() {
        let cache = ReplyCache::new(Duration::from_secs(10));
        cache.insert(".help", vec!["line".into()]);
        assert_eq!(cache.get(".help"), Some(vec!["line".to_string()]));

        tokio::time::advance(Duration::from_secs(11)).await;
        assert_eq!(cache.get(".help"), None);
    }

    #[tokio::test]
    async fn test_zero_ttl_disables_cache() {
        let cache = ReplyCache::new(Duration::ZERO);
        cache.insert(".help", vec!["line".into()]);
        assert_eq!(cache.get(".help"), None);
    }

    #[tokio::test]
    async fn test_clear() {
        let cache = ReplyCache::new(Duration::from_secs(60));
        cache.insert("a", vec![]);
        cache.clear();
        assert!(cache.get("a").is_none());
    }
}
