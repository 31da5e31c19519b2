use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

struct Inner<K, V> {
    ttl: Duration,
    entries: HashMap<K, (Instant, V)>,
}

/// Shared map whose entries expire `ttl` after they were inserted.
///
/// Lookups evict the entry they find expired and inserts sweep every expired entry.
pub struct TtlCache<K, V> {
    inner: Mutex<Inner<K, V>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Mutex::new(Inner {
                ttl,
                entries: HashMap::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner<K, V>> {
        // A panic while holding the lock cannot leave the map half-updated.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn ttl(&self) -> Duration {
        self.lock().ttl
    }

    /// Applies to existing entries too: expiry is checked against the current TTL.
    pub fn set_ttl(&self, ttl: Duration) {
        self.lock().ttl = ttl;
    }

    pub fn get(&self, key: &K) -> Option<V> {
        self.get_at(key, Instant::now())
    }

    pub fn get_at(&self, key: &K, now: Instant) -> Option<V> {
        let mut inner = self.lock();
        let ttl = inner.ttl;
        let expired = match inner.entries.get(key) {
            Some((at, _)) => now.saturating_duration_since(*at) >= ttl,
            None => return None,
        };
        if expired {
            inner.entries.remove(key);
            return None;
        }
        inner.entries.get(key).map(|(_, v)| v.clone())
    }

    pub fn insert(&self, key: K, value: V) {
        self.insert_at(key, value, Instant::now());
    }

    pub fn insert_at(&self, key: K, value: V, now: Instant) {
        let mut inner = self.lock();
        let ttl = inner.ttl;
        inner
            .entries
            .retain(|_, (at, _)| now.saturating_duration_since(*at) < ttl);
        inner.entries.insert(key, (now, value));
    }

    pub fn clear(&self) {
        self.lock().entries.clear();
    }

    /// Live entries; expired ones still stored are not counted.
    pub fn len(&self) -> usize {
        self.len_at(Instant::now())
    }

    pub fn len_at(&self, now: Instant) -> usize {
        let inner = self.lock();
        inner
            .entries
            .values()
            .filter(|(at, _)| now.saturating_duration_since(*at) < inner.ttl)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_entry_is_returned() {
        let c: TtlCache<&str, String> = TtlCache::new(Duration::from_secs(60));
        let t0 = Instant::now();
        c.insert_at("k", "v".to_string(), t0);
        assert_eq!(c.get_at(&"k", t0 + Duration::from_secs(59)).as_deref(), Some("v"));
    }

    #[test]
    fn expired_entry_is_evicted_on_lookup() {
        let c: TtlCache<&str, u32> = TtlCache::new(Duration::from_secs(60));
        let t0 = Instant::now();
        c.insert_at("k", 1, t0);
        assert_eq!(c.len(), 1);
        assert_eq!(c.get_at(&"k", t0 + Duration::from_secs(60)), None);
        assert_eq!(c.len(), 0);
    }

    #[test]
    fn shortening_ttl_expires_older_entries() {
        let c: TtlCache<u8, u8> = TtlCache::new(Duration::from_secs(3600));
        let t0 = Instant::now();
        c.insert_at(1, 10, t0);
        c.set_ttl(Duration::from_secs(60));
        assert_eq!(c.ttl(), Duration::from_secs(60));
        assert_eq!(c.get_at(&1, t0 + Duration::from_secs(120)), None);
    }

    #[test]
    fn clear_drops_everything() {
        let c: TtlCache<u8, u8> = TtlCache::new(Duration::from_secs(60));
        c.insert(1, 1);
        c.insert(2, 2);
        assert_eq!(c.len(), 2);
        c.clear();
        assert!(c.is_empty());
        assert_eq!(c.get(&1), None);
    }

    #[test]
    fn insert_sweeps_expired_and_len_skips_them() {
        let c: TtlCache<u8, u8> = TtlCache::new(Duration::from_secs(60));
        let t0 = Instant::now();
        c.insert_at(1, 1, t0);
        c.insert_at(2, 2, t0 + Duration::from_secs(30));
        assert_eq!(c.len_at(t0 + Duration::from_secs(70)), 1);
        c.insert_at(3, 3, t0 + Duration::from_secs(100));
        assert_eq!(c.lock().entries.len(), 1);
        assert_eq!(c.get_at(&2, t0 + Duration::from_secs(100)), None);
        assert_eq!(c.get_at(&3, t0 + Duration::from_secs(100)), Some(3));
    }

    #[test]
    fn reinsert_refreshes_age() {
        let c: TtlCache<u8, u8> = TtlCache::new(Duration::from_secs(60));
        let t0 = Instant::now();
        c.insert_at(1, 1, t0);
        c.insert_at(1, 2, t0 + Duration::from_secs(50));
        assert_eq!(c.get_at(&1, t0 + Duration::from_secs(100)), Some(2));
    }
}
