use std::{
    collections::HashMap,
    fmt::Display,
    hash::{BuildHasher, Hash, RandomState},
    sync::{
        Mutex, MutexGuard,
        atomic::{AtomicBool, Ordering},
    },
};

use crate::error::StoreError;

/// Result of an insert-if-absent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOutcome {
    Inserted,
    /// The key was already present; the offered value has been dropped
    AlreadyExists,
}

/// Concurrent key/value store contract required by the address cache.
///
/// Every operation must be atomic with respect to the others on the same key.
/// `get` hands out a clone of the stored value, so a value type such as
/// `Arc<T>` keeps a reader's snapshot alive across a concurrent `delete`.
pub trait KeyValueStore<K, V>: Send + Sync {
    /// Insert `value` under `key` unless the key is already present
    fn set(&self, key: K, value: V) -> Result<SetOutcome, StoreError>;

    fn get(&self, key: &K) -> Result<Option<V>, StoreError>;

    /// Remove the key, returning the value it held
    fn delete(&self, key: &K) -> Result<Option<V>, StoreError>;

    /// Drop every entry for which `keep` returns false, returning how many went
    fn retain<F>(&self, keep: F) -> Result<usize, StoreError>
    where
        F: FnMut(&K, &V) -> bool;

    fn len(&self) -> Result<usize, StoreError>;

    fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }

    /// Remove everything and refuse further inserts, returning how many went
    fn drain(&self) -> Result<usize, StoreError>;
}

/// Hash table split into `index_size` independently locked partitions.
///
/// Keys are routed to a partition through a hash state seeded once per
/// table, so routing is stable for the lifetime of the table but not
/// across processes.
#[derive(Debug)]
pub struct PartitionedTable<K, V> {
    partitions: Vec<Mutex<HashMap<K, V>>>,
    hasher: RandomState,
    closed: AtomicBool,
}

impl<K, V> PartitionedTable<K, V>
where
    K: Hash + Eq + Display,
{
    /// Create a table with `index_size` partitions (at least one)
    pub fn new(index_size: usize) -> Self {
        let partitions = (0..index_size.max(1))
            .map(|_| Mutex::new(HashMap::new()))
            .collect();
        Self {
            partitions,
            hasher: RandomState::new(),
            closed: AtomicBool::new(false),
        }
    }

    pub fn partition_count(&self) -> usize {
        self.partitions.len()
    }

    fn partition_of(&self, key: &K) -> usize {
        (self.hasher.hash_one(key) % self.partitions.len() as u64) as usize
    }

    fn lock(&self, partition: usize) -> Result<MutexGuard<'_, HashMap<K, V>>, StoreError> {
        self.partitions[partition]
            .lock()
            .map_err(|_| StoreError::Poisoned { partition })
    }
}

impl<K, V> KeyValueStore<K, V> for PartitionedTable<K, V>
where
    K: Hash + Eq + Display + Send,
    V: Clone + Send,
{
    fn set(&self, key: K, value: V) -> Result<SetOutcome, StoreError> {
        let partition = self.partition_of(&key);
        let mut map = self.lock(partition)?;
        if self.closed.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable);
        }

        if map.contains_key(&key) {
            log::trace!("Key {} already present in partition {}", key, partition);
            return Ok(SetOutcome::AlreadyExists);
        }
        map.insert(key, value);
        Ok(SetOutcome::Inserted)
    }

    fn get(&self, key: &K) -> Result<Option<V>, StoreError> {
        let map = self.lock(self.partition_of(key))?;
        Ok(map.get(key).cloned())
    }

    fn delete(&self, key: &K) -> Result<Option<V>, StoreError> {
        let mut map = self.lock(self.partition_of(key))?;
        Ok(map.remove(key))
    }

    fn retain<F>(&self, mut keep: F) -> Result<usize, StoreError>
    where
        F: FnMut(&K, &V) -> bool,
    {
        let mut removed = 0;
        for partition in 0..self.partitions.len() {
            let mut map = self.lock(partition)?;
            let before = map.len();
            map.retain(|k, v| keep(k, v));
            removed += before - map.len();
        }
        Ok(removed)
    }

    fn len(&self) -> Result<usize, StoreError> {
        let mut total = 0;
        for partition in 0..self.partitions.len() {
            total += self.lock(partition)?.len();
        }
        Ok(total)
    }

    fn drain(&self) -> Result<usize, StoreError> {
        self.closed.store(true, Ordering::SeqCst);
        let mut removed = 0;
        for partition in 0..self.partitions.len() {
            let mut map = self.lock(partition)?;
            removed += map.len();
            map.clear();
        }
        Ok(removed)
    }
}
