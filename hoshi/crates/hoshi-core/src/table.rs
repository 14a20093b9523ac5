//! Open-addressed hash table keyed by interned strings.
//!
//! This is the table behind both string interning and the global-name index.
//! It uses linear probing with tombstones, grows at 75% load, and compares
//! keys by [`StrId`] identity - content comparison only happens in
//! [`Table::find_string`], the one lookup interning itself needs before an
//! id exists.
//!
//! Keys do not carry their own hash the way a heap object would, so each
//! occupied bucket caches the key's hash for probing and rehashing.

use crate::heap::StrId;
use crate::value::Value;

/// An occupied table slot.
#[derive(Clone, Copy, Debug)]
pub struct Entry {
    /// The interned key.
    pub key: StrId,
    /// Cached hash of the key's contents.
    pub hash: u64,
    /// The stored value.
    pub value: Value,
}

#[derive(Clone, Debug)]
enum Bucket {
    Empty,
    /// A deleted slot. Probe sequences continue through it; insertions may
    /// reuse it.
    Tombstone,
    Occupied(Entry),
}

/// Open-addressed hash table with linear probing and tombstones.
///
/// # Examples
///
/// ```
/// use hoshi_core::{Heap, Table, Value};
///
/// let mut heap = Heap::new();
/// let key = heap.intern(b"answer");
/// let hash = heap.hash_of(key);
///
/// let mut table = Table::new();
/// assert!(table.set(key, hash, Value::Number(42.0)));
/// assert_eq!(table.get(key, hash), Some(Value::Number(42.0)));
/// ```
#[derive(Clone, Debug, Default)]
pub struct Table {
    buckets: Vec<Bucket>,
    /// Occupied slots plus tombstones; this is what the load factor is
    /// measured against.
    count: usize,
}

/// First allocation size; doubles from there.
const INITIAL_CAPACITY: usize = 8;

/// Finds the slot for `key`: the matching occupied bucket, or the bucket an
/// insertion should use (the earliest tombstone on the probe path if one was
/// seen, else the first empty bucket).
fn find_slot(buckets: &[Bucket], key: StrId, hash: u64) -> usize {
    let mut index = (hash % buckets.len() as u64) as usize;
    let mut tombstone = None;
    loop {
        match &buckets[index] {
            Bucket::Empty => return tombstone.unwrap_or(index),
            Bucket::Tombstone => {
                tombstone.get_or_insert(index);
            }
            Bucket::Occupied(entry) if entry.key == key => return index,
            Bucket::Occupied(_) => {}
        }
        index = (index + 1) % buckets.len();
    }
}

impl Table {
    /// Creates an empty table. No memory is allocated until the first
    /// insertion.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.buckets
            .iter()
            .filter(|bucket| matches!(bucket, Bucket::Occupied(_)))
            .count()
    }

    /// Whether the table has no live entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current bucket count.
    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }

    /// Inserts or overwrites. Returns whether `key` was not present before.
    pub fn set(&mut self, key: StrId, hash: u64, value: Value) -> bool {
        if (self.count + 1) * 4 > self.buckets.len() * 3 {
            self.grow();
        }

        let index = find_slot(&self.buckets, key, hash);
        match &mut self.buckets[index] {
            Bucket::Occupied(entry) => {
                entry.value = value;
                false
            }
            bucket @ Bucket::Empty => {
                *bucket = Bucket::Occupied(Entry { key, hash, value });
                self.count += 1;
                true
            }
            bucket @ Bucket::Tombstone => {
                // The tombstone already counts toward the load factor.
                *bucket = Bucket::Occupied(Entry { key, hash, value });
                true
            }
        }
    }

    /// Looks up the value stored under `key`.
    pub fn get(&self, key: StrId, hash: u64) -> Option<Value> {
        if self.count == 0 {
            return None;
        }
        match &self.buckets[find_slot(&self.buckets, key, hash)] {
            Bucket::Occupied(entry) => Some(entry.value),
            _ => None,
        }
    }

    /// Deletes `key`, leaving a tombstone. Returns whether it was present.
    pub fn delete(&mut self, key: StrId, hash: u64) -> bool {
        if self.count == 0 {
            return false;
        }
        let index = find_slot(&self.buckets, key, hash);
        match &mut self.buckets[index] {
            bucket @ Bucket::Occupied(_) => {
                *bucket = Bucket::Tombstone;
                true
            }
            _ => false,
        }
    }

    /// Content-based lookup used only while interning, before the caller has
    /// an id for the bytes. `contents` resolves an existing key to its byte
    /// contents.
    ///
    /// Contract: if some key in the table has byte contents equal to
    /// `bytes`, that key is returned rather than letting the caller allocate
    /// a duplicate.
    pub fn find_string<'a>(
        &self,
        bytes: &[u8],
        hash: u64,
        contents: impl Fn(StrId) -> &'a [u8],
    ) -> Option<StrId> {
        if self.count == 0 {
            return None;
        }
        let mut index = (hash % self.buckets.len() as u64) as usize;
        loop {
            match &self.buckets[index] {
                Bucket::Empty => return None,
                Bucket::Tombstone => {}
                Bucket::Occupied(entry) => {
                    if entry.hash == hash && contents(entry.key) == bytes {
                        return Some(entry.key);
                    }
                }
            }
            index = (index + 1) % self.buckets.len();
        }
    }

    /// Iterates the live entries in bucket order.
    pub fn iter(&self) -> impl Iterator<Item = &Entry> {
        self.buckets.iter().filter_map(|bucket| match bucket {
            Bucket::Occupied(entry) => Some(entry),
            _ => None,
        })
    }

    /// Doubles capacity and reinserts every live entry. Tombstones are
    /// dropped here, which is the only place the load count shrinks.
    fn grow(&mut self) {
        let new_capacity = if self.buckets.len() < INITIAL_CAPACITY {
            INITIAL_CAPACITY
        } else {
            self.buckets.len() * 2
        };

        let old = std::mem::replace(&mut self.buckets, vec![Bucket::Empty; new_capacity]);
        self.count = 0;
        for bucket in old {
            if let Bucket::Occupied(entry) = bucket {
                let index = find_slot(&self.buckets, entry.key, entry.hash);
                self.buckets[index] = Bucket::Occupied(entry);
                self.count += 1;
            }
        }
    }
}
