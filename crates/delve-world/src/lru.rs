//! Recency-ordered cache.
//!
//! Entries live in a dense `Vec` linked into a doubly-linked list by index,
//! with a hash map from key to slot. Touch, insert, remove and evict are all
//! O(1); removal swaps the last slot into the hole and patches its links.

use std::hash::Hash;

use ahash::AHashMap;

/// Sentinel for "no neighbor".
const NIL: usize = usize::MAX;

#[derive(Debug, Clone)]
struct Node<K, V> {
    key: K,
    value: V,
    /// Next more recently used entry.
    newer: usize,
    /// Next less recently used entry.
    older: usize,
}

/// A map that remembers the order in which its entries were last used.
#[derive(Debug, Clone)]
pub struct LruCache<K, V> {
    nodes: Vec<Node<K, V>>,
    slots: AHashMap<K, usize>,
    /// Most recently used slot.
    newest: usize,
    /// Least recently used slot.
    oldest: usize,
}

impl<K, V> Default for LruCache<K, V>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> LruCache<K, V>
where
    K: Eq + Hash + Clone,
{
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            slots: AHashMap::new(),
            newest: NIL,
            oldest: NIL,
        }
    }

    /// Creates an empty cache with room for `capacity` entries.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
            slots: AHashMap::with_capacity(capacity),
            newest: NIL,
            oldest: NIL,
        }
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Checks for a key without changing recency.
    #[must_use]
    pub fn contains(&self, key: &K) -> bool {
        self.slots.contains_key(key)
    }

    /// Inserts or replaces an entry and marks it most recently used.
    ///
    /// Returns the previous value for the key, if any.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        if let Some(&slot) = self.slots.get(&key) {
            self.move_to_newest(slot);
            return Some(std::mem::replace(&mut self.nodes[slot].value, value));
        }

        let slot = self.nodes.len();
        self.nodes.push(Node {
            key: key.clone(),
            value,
            newer: NIL,
            older: NIL,
        });
        self.slots.insert(key, slot);
        self.link_newest(slot);
        None
    }

    /// Returns an entry and marks it most recently used.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        let slot = *self.slots.get(key)?;
        self.move_to_newest(slot);
        Some(&self.nodes[slot].value)
    }

    /// Returns an entry mutably and marks it most recently used.
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let slot = *self.slots.get(key)?;
        self.move_to_newest(slot);
        Some(&mut self.nodes[slot].value)
    }

    /// Returns an entry without changing recency.
    #[must_use]
    pub fn peek(&self, key: &K) -> Option<&V> {
        self.slots.get(key).map(|&slot| &self.nodes[slot].value)
    }

    /// Returns an entry mutably without changing recency.
    pub fn peek_mut(&mut self, key: &K) -> Option<&mut V> {
        let slot = *self.slots.get(key)?;
        Some(&mut self.nodes[slot].value)
    }

    /// Marks an entry most recently used. Returns false if absent.
    pub fn touch(&mut self, key: &K) -> bool {
        match self.slots.get(key) {
            Some(&slot) => {
                self.move_to_newest(slot);
                true
            },
            None => false,
        }
    }

    /// Removes an entry.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let slot = *self.slots.get(key)?;
        Some(self.remove_slot(slot).1)
    }

    /// Removes the least recently used entry.
    pub fn pop_oldest(&mut self) -> Option<(K, V)> {
        if self.oldest == NIL {
            return None;
        }
        Some(self.remove_slot(self.oldest))
    }

    /// Removes the least recently used entry that satisfies `evictable`.
    ///
    /// Entries that fail the predicate are skipped and keep their position.
    pub fn pop_oldest_where<F>(&mut self, mut evictable: F) -> Option<(K, V)>
    where
        F: FnMut(&K, &V) -> bool,
    {
        let mut cursor = self.oldest;
        while cursor != NIL {
            let node = &self.nodes[cursor];
            if evictable(&node.key, &node.value) {
                return Some(self.remove_slot(cursor));
            }
            cursor = node.newer;
        }
        None
    }

    /// Iterates from least to most recently used.
    pub fn iter_oldest_first(&self) -> Iter<'_, K, V> {
        Iter {
            nodes: &self.nodes,
            cursor: self.oldest,
            remaining: self.nodes.len(),
        }
    }

    /// Keys from least to most recently used.
    #[must_use]
    pub fn keys_oldest_first(&self) -> Vec<K> {
        self.iter_oldest_first().map(|(k, _)| k.clone()).collect()
    }

    /// Removes every entry.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.slots.clear();
        self.newest = NIL;
        self.oldest = NIL;
    }

    /// Detaches a slot from the recency list.
    fn unlink(&mut self, slot: usize) {
        let Node { newer, older, .. } = self.nodes[slot];
        if newer == NIL {
            self.newest = older;
        } else {
            self.nodes[newer].older = older;
        }
        if older == NIL {
            self.oldest = newer;
        } else {
            self.nodes[older].newer = newer;
        }
        self.nodes[slot].newer = NIL;
        self.nodes[slot].older = NIL;
    }

    /// Attaches a detached slot as the most recently used entry.
    fn link_newest(&mut self, slot: usize) {
        self.nodes[slot].older = self.newest;
        self.nodes[slot].newer = NIL;
        if self.newest == NIL {
            self.oldest = slot;
        } else {
            let previous = self.newest;
            self.nodes[previous].newer = slot;
        }
        self.newest = slot;
    }

    fn move_to_newest(&mut self, slot: usize) {
        if self.newest != slot {
            self.unlink(slot);
            self.link_newest(slot);
        }
    }

    /// Removes a slot, moving the last slot into its place.
    fn remove_slot(&mut self, slot: usize) -> (K, V) {
        self.unlink(slot);
        let removed = self.nodes.swap_remove(slot);
        self.slots.remove(&removed.key);

        if slot < self.nodes.len() {
            // The former last slot now lives at `slot`; repoint its neighbors.
            let Node { newer, older, .. } = self.nodes[slot];
            if newer == NIL {
                self.newest = slot;
            } else {
                self.nodes[newer].older = slot;
            }
            if older == NIL {
                self.oldest = slot;
            } else {
                self.nodes[older].newer = slot;
            }
            if let Some(entry) = self.slots.get_mut(&self.nodes[slot].key) {
                *entry = slot;
            }
        }

        (removed.key, removed.value)
    }
}

/// Iterator over cache entries from least to most recently used.
pub struct Iter<'a, K, V> {
    nodes: &'a [Node<K, V>],
    cursor: usize,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor == NIL {
            return None;
        }
        let node = &self.nodes[self.cursor];
        self.cursor = node.newer;
        self.remaining -= 1;
        Some((&node.key, &node.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache_of(keys: &[char]) -> LruCache<char, u32> {
        let mut cache = LruCache::new();
        for (i, &k) in keys.iter().enumerate() {
            cache.insert(k, i as u32);
        }
        cache
    }

    #[test]
    fn test_insertion_order() {
        let cache = cache_of(&['a', 'b', 'c']);
        assert_eq!(cache.keys_oldest_first(), vec!['a', 'b', 'c']);
        assert_eq!(cache.len(), 3);
        assert_eq!(cache.iter_oldest_first().len(), 3);
    }

    #[test]
    fn test_get_and_touch_refresh_recency() {
        let mut cache = cache_of(&['a', 'b', 'c']);
        assert_eq!(cache.get(&'a'), Some(&0));
        assert_eq!(cache.keys_oldest_first(), vec!['b', 'c', 'a']);

        assert!(cache.touch(&'b'));
        assert!(!cache.touch(&'z'));
        assert_eq!(cache.keys_oldest_first(), vec!['c', 'a', 'b']);

        // Peeking leaves the order alone.
        assert_eq!(cache.peek(&'c'), Some(&2));
        assert_eq!(cache.keys_oldest_first(), vec!['c', 'a', 'b']);
    }

    #[test]
    fn test_reinsert_replaces_and_refreshes() {
        let mut cache = cache_of(&['a', 'b']);
        assert_eq!(cache.insert('a', 10), Some(0));
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.keys_oldest_first(), vec!['b', 'a']);
        assert_eq!(cache.peek(&'a'), Some(&10));
    }

    #[test]
    fn test_remove_fixes_moved_slot() {
        let mut cache = cache_of(&['a', 'b', 'c', 'd']);
        // 'a' sits in slot 0; removing it moves 'd' into slot 0.
        assert_eq!(cache.remove(&'a'), Some(0));
        assert_eq!(cache.keys_oldest_first(), vec!['b', 'c', 'd']);
        assert_eq!(cache.get(&'d'), Some(&3));
        assert_eq!(cache.remove(&'b'), Some(1));
        assert_eq!(cache.keys_oldest_first(), vec!['c', 'd']);
        assert_eq!(cache.remove(&'b'), None);

        cache.insert('e', 4);
        assert_eq!(cache.keys_oldest_first(), vec!['c', 'd', 'e']);
    }

    #[test]
    fn test_pop_oldest() {
        let mut cache = cache_of(&['a', 'b', 'c']);
        assert_eq!(cache.pop_oldest(), Some(('a', 0)));
        assert_eq!(cache.pop_oldest(), Some(('b', 1)));
        assert_eq!(cache.pop_oldest(), Some(('c', 2)));
        assert_eq!(cache.pop_oldest(), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_pop_oldest_where_skips_pinned() {
        let mut cache = cache_of(&['a', 'b', 'c', 'd']);
        let pinned = ['a', 'c'];
        let evicted = cache.pop_oldest_where(|k, _| !pinned.contains(k));
        assert_eq!(evicted, Some(('b', 1)));
        assert_eq!(cache.keys_oldest_first(), vec!['a', 'c', 'd']);

        assert_eq!(cache.pop_oldest_where(|_, _| false), None);
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn test_clear() {
        let mut cache = cache_of(&['a', 'b']);
        cache.clear();
        assert!(cache.is_empty());
        assert!(!cache.contains(&'a'));
        assert_eq!(cache.pop_oldest(), None);
        cache.insert('x', 1);
        assert_eq!(cache.keys_oldest_first(), vec!['x']);
    }
}
