//! Chained hash index from canonical question text to animal identifiers.
//!
//! Buckets are fixed at construction; collisions chain through singly linked
//! entries with the newest entry at the head. Each entry owns a duplicate-free
//! list of identifiers in insertion order.

use tracing::trace;

use crate::domain::error::{DomainError, DomainResult};

/// Identifier recorded for the animal a question was learned for.
pub type AnimalId = u32;

const INITIAL_ID_CAPACITY: usize = 4;

/// Normalize question text into an index key.
///
/// ASCII letters and digits are kept (lowercased), every whitespace
/// character becomes one underscore, everything else is dropped.
///
/// ```
/// use twentyq::domain::index::canonicalize;
///
/// assert_eq!(canonicalize("Does it meow?"), "does_it_meow");
/// assert_eq!(canonicalize("  A B  "), "__a_b__");
/// ```
pub fn canonicalize(s: &str) -> String {
    s.chars()
        .filter_map(|c| {
            if c.is_ascii_alphanumeric() {
                Some(c.to_ascii_lowercase())
            } else if is_c_space(c) {
                Some('_')
            } else {
                None
            }
        })
        .collect()
}

// space, \t, \n, \v, \f, \r
fn is_c_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\x0B' | '\x0C' | '\r')
}

/// djb2: `hash = hash * 33 + byte`, starting at 5381, wrapping at 32 bits.
pub fn djb2(s: &str) -> u32 {
    s.bytes().fold(5381u32, |hash, byte| {
        (hash << 5).wrapping_add(hash).wrapping_add(u32::from(byte))
    })
}

/// Growable identifier list: starts at capacity 4 and doubles when full.
#[derive(Debug)]
struct IdList {
    ids: Vec<AnimalId>,
    capacity: usize,
}

impl IdList {
    fn with_first(id: AnimalId) -> DomainResult<Self> {
        let mut ids = Vec::new();
        ids.try_reserve_exact(INITIAL_ID_CAPACITY)
            .map_err(|_| DomainError::Allocation { what: "index ids" })?;
        ids.push(id);
        Ok(Self {
            ids,
            capacity: INITIAL_ID_CAPACITY,
        })
    }

    fn contains(&self, id: AnimalId) -> bool {
        self.ids.contains(&id)
    }

    fn push(&mut self, id: AnimalId) -> DomainResult<()> {
        if self.ids.len() == self.capacity {
            let new_capacity = if self.capacity > 0 {
                self.capacity * 2
            } else {
                INITIAL_ID_CAPACITY
            };
            self.ids
                .try_reserve_exact(new_capacity - self.ids.len())
                .map_err(|_| DomainError::Allocation { what: "index ids" })?;
            self.capacity = new_capacity;
        }
        self.ids.push(id);
        Ok(())
    }
}

#[derive(Debug)]
struct Entry {
    key: String,
    ids: IdList,
    next: Option<Box<Entry>>,
}

#[derive(Debug)]
pub struct QuestionIndex {
    buckets: Vec<Option<Box<Entry>>>,
    /// Number of distinct keys
    size: usize,
}

impl QuestionIndex {
    /// A bucket count of zero is raised to one.
    pub fn new(nbuckets: usize) -> DomainResult<Self> {
        let nbuckets = nbuckets.max(1);
        let mut buckets = Vec::new();
        buckets
            .try_reserve_exact(nbuckets)
            .map_err(|_| DomainError::Allocation { what: "index buckets" })?;
        buckets.resize_with(nbuckets, || None);
        Ok(Self { buckets, size: 0 })
    }

    fn bucket(&self, key: &str) -> usize {
        djb2(key) as usize % self.buckets.len()
    }

    fn find(&self, key: &str) -> Option<&Entry> {
        let mut current = self.buckets[self.bucket(key)].as_deref();
        while let Some(entry) = current {
            if entry.key == key {
                return Some(entry);
            }
            current = entry.next.as_deref();
        }
        None
    }

    fn find_mut(&mut self, key: &str) -> Option<&mut Entry> {
        let idx = self.bucket(key);
        let mut current = self.buckets[idx].as_deref_mut();
        while let Some(entry) = current {
            if entry.key == key {
                return Some(entry);
            }
            current = entry.next.as_deref_mut();
        }
        None
    }

    /// Associate `id` with `key`.
    ///
    /// Returns `Ok(false)` when the pair is already present.
    pub fn put(&mut self, key: &str, id: AnimalId) -> DomainResult<bool> {
        if let Some(entry) = self.find_mut(key) {
            if entry.ids.contains(id) {
                return Ok(false);
            }
            entry.ids.push(id)?;
            trace!("put: appended {} to {:?}", id, key);
            return Ok(true);
        }

        let mut owned_key = String::new();
        owned_key
            .try_reserve_exact(key.len())
            .map_err(|_| DomainError::Allocation { what: "index key" })?;
        owned_key.push_str(key);
        let ids = IdList::with_first(id)?;

        let idx = self.bucket(key);
        let entry = Box::new(Entry {
            key: owned_key,
            ids,
            next: self.buckets[idx].take(),
        });
        self.buckets[idx] = Some(entry);
        self.size += 1;
        trace!("put: new key {:?} in bucket {}", key, idx);
        Ok(true)
    }

    pub fn contains(&self, key: &str, id: AnimalId) -> bool {
        self.find(key).is_some_and(|entry| entry.ids.contains(id))
    }

    pub fn get_ids(&self, key: &str) -> Option<&[AnimalId]> {
        self.find(key).map(|entry| entry.ids.ids.as_slice())
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// All keys with their identifiers, bucket by bucket, chain order within a bucket.
    pub fn entries(&self) -> Vec<(&str, &[AnimalId])> {
        let mut out = Vec::with_capacity(self.size);
        for bucket in &self.buckets {
            let mut current = bucket.as_deref();
            while let Some(entry) = current {
                out.push((entry.key.as_str(), entry.ids.ids.as_slice()));
                current = entry.next.as_deref();
            }
        }
        out
    }
}

impl Drop for QuestionIndex {
    // unlink chains one entry at a time so long chains cannot exhaust the stack
    fn drop(&mut self) {
        for bucket in &mut self.buckets {
            let mut current = bucket.take();
            while let Some(mut entry) = current {
                current = entry.next.take();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_known_inputs_when_hashing_then_djb2_values() {
        assert_eq!(djb2(""), 5381);
        assert_eq!(djb2("a"), 5381 * 33 + 97);
    }

    #[test]
    fn given_long_input_when_hashing_then_wraps_without_panic() {
        let key = "z".repeat(1000);
        let _ = djb2(&key);
    }

    #[test]
    fn given_same_pair_twice_when_putting_then_second_is_noop() {
        let mut index = QuestionIndex::new(16).unwrap();
        assert_eq!(index.put("does_it_meow", 3), Ok(true));
        assert_eq!(index.put("does_it_meow", 3), Ok(false));
        assert_eq!(index.len(), 1);
        assert_eq!(index.get_ids("does_it_meow"), Some(&[3][..]));
    }

    #[test]
    fn given_many_ids_when_putting_then_list_grows_in_order() {
        let mut index = QuestionIndex::new(8).unwrap();
        for id in 0..9 {
            assert_eq!(index.put("k", id), Ok(true));
        }
        assert_eq!(index.get_ids("k").unwrap(), &(0..9).collect::<Vec<_>>()[..]);
    }

    #[test]
    fn given_single_bucket_when_putting_colliding_keys_then_lookups_stay_separate() {
        let mut index = QuestionIndex::new(1).unwrap();
        index.put("does_it_bark", 5).unwrap();
        index.put("does_it_fly", 7).unwrap();

        assert_eq!(index.get_ids("does_it_bark"), Some(&[5][..]));
        assert_eq!(index.get_ids("does_it_fly"), Some(&[7][..]));
        assert!(index.contains("does_it_fly", 7));
        assert!(!index.contains("does_it_fly", 5));
        assert_eq!(index.get_ids("does_it_swim"), None);
        // newest key sits at the chain head
        assert_eq!(index.entries()[0].0, "does_it_fly");
    }

    #[test]
    fn given_zero_buckets_when_creating_then_one_bucket() {
        let index = QuestionIndex::new(0).unwrap();
        assert_eq!(index.bucket_count(), 1);
        assert!(index.is_empty());
    }
}
