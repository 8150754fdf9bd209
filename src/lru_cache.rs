use std::fmt::Debug;
use std::hash::Hash;

use rustc_hash::{FxBuildHasher, FxHashMap};

const NIL: usize = usize::MAX;

/// A bounded map which evicts its least recently used entry to make room
/// for new ones.
///
/// Entries live in a slab and are linked together from the most to the
/// least recently used one, so every operation is O(1).
///
/// # Examples
///
/// ```
/// # use braid::LruCache;
/// #
/// let mut cache = LruCache::new(2);
///
/// cache.insert("a", 1);
/// cache.insert("b", 2);
///
/// // Reading "a" makes "b" the least recently used entry.
/// assert_eq!(cache.get(&"a"), Some(&1));
///
/// cache.insert("c", 3);
///
/// assert_eq!(cache.peek(&"b"), None);
/// assert_eq!(cache.len(), 2);
/// ```
#[derive(Clone)]
pub struct LruCache<K, V> {
    map: FxHashMap<K, usize>,
    slots: Vec<Option<Entry<K, V>>>,
    free: Vec<usize>,

    /// The most recently used entry.
    head: usize,

    /// The least recently used entry.
    tail: usize,

    capacity: usize,
}

#[derive(Clone)]
struct Entry<K, V> {
    key: K,
    value: V,
    prev: usize,
    next: usize,
}

impl<K, V> Debug for LruCache<K, V>
where
    K: Hash + Eq + Clone + Debug,
    V: Debug,
{
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: Hash + Eq + Clone, V> LruCache<K, V> {
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn clear(&mut self) {
        self.map.clear();
        self.slots.clear();
        self.free.clear();
        self.head = NIL;
        self.tail = NIL;
    }

    /// Returns `true` if the cache holds `key`, without marking it as used.
    #[inline]
    pub fn contains_key(&self, key: &K) -> bool {
        self.map.contains_key(key)
    }

    #[inline]
    fn entry(&self, idx: usize) -> &Entry<K, V> {
        self.slots[idx].as_ref().expect("linked slots are occupied")
    }

    #[inline]
    fn entry_mut(&mut self, idx: usize) -> &mut Entry<K, V> {
        self.slots[idx].as_mut().expect("linked slots are occupied")
    }

    /// Returns the value of `key` and marks it as the most recently used
    /// entry.
    #[inline]
    pub fn get(&mut self, key: &K) -> Option<&V> {
        let idx = *self.map.get(key)?;
        self.touch(idx);
        Some(&self.entry(idx).value)
    }

    /// Like [`get()`](Self::get()), but returns a mutable reference.
    #[inline]
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let idx = *self.map.get(key)?;
        self.touch(idx);
        Some(&mut self.entry_mut(idx).value)
    }

    /// Inserts a value, marking it as the most recently used entry and
    /// returning the value previously stored under the same key.
    ///
    /// If the key is new and the cache is full the least recently used entry
    /// is evicted first.
    #[inline]
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        if let Some(&idx) = self.map.get(&key) {
            self.touch(idx);
            return Some(std::mem::replace(&mut self.entry_mut(idx).value, value));
        }

        if self.map.len() == self.capacity {
            let lru = self.tail;
            let evicted = self.take(lru);
            self.map.remove(&evicted.key);
            tracing::trace!(capacity = self.capacity, "evicted LRU entry");
        }

        let entry = Entry { key: key.clone(), value, prev: NIL, next: NIL };

        let idx = match self.free.pop() {
            Some(idx) => {
                self.slots[idx] = Some(entry);
                idx
            },
            None => {
                self.slots.push(Some(entry));
                self.slots.len() - 1
            },
        };

        self.push_front(idx);
        self.map.insert(key, idx);

        None
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Returns an iterator over the entries, from the most to the least
    /// recently used one.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> + '_ {
        let mut idx = self.head;

        std::iter::from_fn(move || {
            if idx == NIL {
                return None;
            }
            let entry = self.entry(idx);
            idx = entry.next;
            Some((&entry.key, &entry.value))
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Creates an empty cache holding at most `capacity` entries.
    ///
    /// # Panics
    ///
    /// Panics if the capacity is zero.
    #[track_caller]
    #[inline]
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "The capacity of an LruCache can't be zero");

        Self {
            map: FxHashMap::with_capacity_and_hasher(capacity, FxBuildHasher),
            slots: Vec::new(),
            free: Vec::new(),
            head: NIL,
            tail: NIL,
            capacity,
        }
    }

    /// Returns the value of `key` without marking it as used.
    #[inline]
    pub fn peek(&self, key: &K) -> Option<&V> {
        self.map.get(key).map(|&idx| &self.entry(idx).value)
    }

    #[inline]
    fn push_front(&mut self, idx: usize) {
        let head = self.head;

        let entry = self.entry_mut(idx);
        entry.prev = NIL;
        entry.next = head;

        if head == NIL {
            self.tail = idx;
        } else {
            self.entry_mut(head).prev = idx;
        }

        self.head = idx;
    }

    #[inline]
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let idx = self.map.remove(key)?;
        Some(self.take(idx).value)
    }

    /// Unlinks the entry at `idx` and frees its slot.
    #[inline]
    fn take(&mut self, idx: usize) -> Entry<K, V> {
        self.unlink(idx);
        self.free.push(idx);
        self.slots[idx].take().expect("linked slots are occupied")
    }

    #[inline]
    fn touch(&mut self, idx: usize) {
        if self.head != idx {
            self.unlink(idx);
            self.push_front(idx);
        }
    }

    #[inline]
    fn unlink(&mut self, idx: usize) {
        let Entry { prev, next, .. } = *self.entry(idx);

        if prev == NIL {
            self.head = next;
        } else {
            self.entry_mut(prev).next = next;
        }

        if next == NIL {
            self.tail = prev;
        } else {
            self.entry_mut(next).prev = prev;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(cache: &LruCache<u32, &str>) -> Vec<u32> {
        cache.iter().map(|(k, _)| *k).collect()
    }

    #[test]
    fn evicts_least_recently_used() {
        let mut cache = LruCache::new(3);

        cache.insert(1, "a");
        cache.insert(2, "b");
        cache.insert(3, "c");
        assert_eq!(keys(&cache), [3, 2, 1]);

        cache.get(&1);
        cache.insert(4, "d");

        assert_eq!(keys(&cache), [4, 1, 3]);
        assert!(!cache.contains_key(&2));
    }

    #[test]
    fn insert_existing_key() {
        let mut cache = LruCache::new(2);

        assert_eq!(cache.insert(1, "a"), None);
        cache.insert(2, "b");
        assert_eq!(cache.insert(1, "z"), Some("a"));

        assert_eq!(cache.len(), 2);
        assert_eq!(keys(&cache), [1, 2]);
    }

    #[test]
    fn peek_does_not_touch() {
        let mut cache = LruCache::new(2);

        cache.insert(1, "a");
        cache.insert(2, "b");

        assert_eq!(cache.peek(&1), Some(&"a"));
        cache.insert(3, "c");

        assert_eq!(cache.peek(&1), None);
        assert_eq!(keys(&cache), [3, 2]);
    }

    #[test]
    fn remove_reuses_slots() {
        let mut cache = LruCache::new(3);

        cache.insert(1, "a");
        cache.insert(2, "b");
        cache.insert(3, "c");

        assert_eq!(cache.remove(&2), Some("b"));
        assert_eq!(cache.remove(&2), None);
        assert_eq!(keys(&cache), [3, 1]);

        cache.insert(4, "d");
        assert_eq!(cache.slots.len(), 3);
        assert_eq!(keys(&cache), [4, 3, 1]);

        cache.remove(&1);
        cache.remove(&4);
        cache.remove(&3);
        assert!(cache.is_empty());
        assert_eq!(cache.iter().count(), 0);
    }

    #[test]
    fn capacity_one() {
        let mut cache = LruCache::new(1);

        cache.insert(1, "a");
        cache.insert(2, "b");

        assert_eq!(keys(&cache), [2]);

        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.capacity(), 1);

        cache.insert(3, "c");
        assert_eq!(cache.get_mut(&3).map(|v| *v), Some("c"));
    }

    #[test]
    #[should_panic(expected = "can't be zero")]
    fn zero_capacity() {
        LruCache::<u32, u32>::new(0);
    }
}
