use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;
use crate::error::CacheError;

/// LRU メモリキャッシュ
///
/// アクセスのたびに単調増加のスタンプを振り、`order` で古い順に並べる。
pub struct ThumbnailMemoryCache<K, V> {
    cache: HashMap<K, (V, u64)>,  // key -> (値, 最終アクセススタンプ)
    order: BTreeMap<u64, K>,      // LRU順序（先頭が最古）
    max_size: usize,
    clock: u64,
}

impl<K, V> ThumbnailMemoryCache<K, V>
where
    K: Hash + Eq + Clone,
{
    pub fn new(max_size: usize) -> Self {
        Self {
            cache: HashMap::new(),
            order: BTreeMap::new(),
            max_size,
            clock: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.max_size
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.cache.contains_key(key)
    }

    /// 取得してLRU位置を更新
    pub fn get(&mut self, key: &K) -> Option<&V> {
        let stamp = self.next_stamp();
        let (value, last) = self.cache.get_mut(key)?;
        // アクセスされたキーを末尾に移動（LRU更新）
        if let Some(k) = self.order.remove(&*last) {
            self.order.insert(stamp, k);
        }
        *last = stamp;
        Some(&*value)
    }

    /// LRU位置を変えずに参照
    pub fn peek(&self, key: &K) -> Option<&V> {
        self.cache.get(key).map(|(value, _)| value)
    }

    /// 挿入して、容量を超えた分を古い順に追い出す（追い出したエントリを返す）
    pub fn insert(&mut self, key: K, value: V) -> Vec<(K, V)> {
        let stamp = self.next_stamp();
        if let Some((_, last)) = self.cache.insert(key.clone(), (value, stamp)) {
            // 既存のキーなら古い順序を外す
            self.order.remove(&last);
        }
        self.order.insert(stamp, key);

        let mut evicted = Vec::new();
        while self.cache.len() > self.max_size {
            match self.pop_oldest() {
                Some(entry) => evicted.push(entry),
                None => break,
            }
        }
        evicted
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        let (value, last) = self.cache.remove(key)?;
        self.order.remove(&last);
        Some(value)
    }

    pub fn clear(&mut self) {
        self.cache.clear();
        self.order.clear();
    }

    /// 古い順のキー一覧
    pub fn keys_oldest_first(&self) -> impl Iterator<Item = &K> {
        self.order.values()
    }

    /// 容量の不変条件を確認
    pub fn check_capacity(&self) -> Result<(), CacheError> {
        if self.cache.len() > self.max_size || self.order.len() != self.cache.len() {
            return Err(CacheError::CapacityExceeded {
                len: self.cache.len(),
                max: self.max_size,
            });
        }
        Ok(())
    }

    fn pop_oldest(&mut self) -> Option<(K, V)> {
        let (_, oldest) = self.order.pop_first()?;
        let (value, _) = self.cache.remove(&oldest)?;
        Some((oldest, value))
    }

    fn next_stamp(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(cache: &ThumbnailMemoryCache<&'static str, u32>) -> Vec<&'static str> {
        cache.keys_oldest_first().copied().collect()
    }

    #[test]
    fn insert_beyond_capacity_evicts_oldest() {
        let mut cache = ThumbnailMemoryCache::new(2);
        assert!(cache.insert("a", 1).is_empty());
        assert!(cache.insert("b", 2).is_empty());

        let evicted = cache.insert("c", 3);
        assert_eq!(evicted, vec![("a", 1)]);
        assert_eq!(keys(&cache), vec!["b", "c"]);
        assert!(cache.check_capacity().is_ok());
    }

    #[test]
    fn get_promotes_to_most_recent() {
        let mut cache = ThumbnailMemoryCache::new(2);
        cache.insert("a", 1);
        cache.insert("b", 2);
        assert_eq!(cache.get(&"a"), Some(&1));

        let evicted = cache.insert("c", 3);
        assert_eq!(evicted, vec![("b", 2)]);
        assert!(cache.contains(&"a"));
    }

    #[test]
    fn peek_does_not_promote() {
        let mut cache = ThumbnailMemoryCache::new(2);
        cache.insert("a", 1);
        cache.insert("b", 2);
        assert_eq!(cache.peek(&"a"), Some(&1));

        cache.insert("c", 3);
        assert!(!cache.contains(&"a"));
    }

    #[test]
    fn reinsert_replaces_value_and_promotes() {
        let mut cache = ThumbnailMemoryCache::new(2);
        cache.insert("a", 1);
        cache.insert("b", 2);
        assert!(cache.insert("a", 10).is_empty());
        assert_eq!(cache.len(), 2);
        assert_eq!(keys(&cache), vec!["b", "a"]);
        assert_eq!(cache.peek(&"a"), Some(&10));
    }

    #[test]
    fn remove_and_clear() {
        let mut cache = ThumbnailMemoryCache::new(3);
        cache.insert("a", 1);
        cache.insert("b", 2);
        assert_eq!(cache.remove(&"a"), Some(1));
        assert_eq!(cache.remove(&"a"), None);
        assert_eq!(keys(&cache), vec!["b"]);

        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(keys(&cache).len(), 0);
    }

    #[test]
    fn missing_key_get_is_none() {
        let mut cache: ThumbnailMemoryCache<&str, u32> = ThumbnailMemoryCache::new(1);
        assert_eq!(cache.get(&"nope"), None);
    }
}
