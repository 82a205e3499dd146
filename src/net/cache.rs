use std::{
    net::{IpAddr, SocketAddr},
    sync::{Arc, Mutex, PoisonError},
    time::{Duration, Instant},
};

use crate::error::{CacheError, StoreError};

use super::{
    key::SockKey,
    reaper::Reaper,
    resolver::ReverseResolver,
    settings::CacheSettings,
    store::{KeyValueStore, PartitionedTable, SetOutcome},
};

/// Reverse lookups slower than this are reported
const SLOW_RESOLUTION: Duration = Duration::from_secs(1);

/// A cached hostname and the moment it was resolved. Never mutated; a stale
/// mapping is replaced by a new entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    hostname: String,
    inserted_at: Instant,
}

impl CacheEntry {
    pub fn new(hostname: String, inserted_at: Instant) -> Self {
        Self {
            hostname,
            inserted_at,
        }
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn inserted_at(&self) -> Instant {
        self.inserted_at
    }

    /// True once the entry is strictly older than `ttl` at `now`
    pub fn is_expired(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.inserted_at) > ttl
    }
}

/// Store type used by [`IpNameCache::new`]
pub type EntryTable = PartitionedTable<SockKey, Arc<CacheEntry>>;

/// What happened to the store during [`IpNameCache::resolve_and_insert`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// A concurrent caller cached the same address first; our copy was dropped
    AlreadyPresent,
    /// The store refused the entry; the name is still usable, just not cached
    Failed(StoreError),
}

/// Name produced by a resolve-and-insert, plus the store outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub hostname: String,
    pub outcome: InsertOutcome,
}

/// TTL-bounded cache from request source address to hostname.
///
/// Expired entries are only evicted when a lookup finds them (or by
/// [`purge_expired`](Self::purge_expired)); nothing sweeps in the
/// background unless a reaper is attached with
/// [`spawn_reaper`](Self::spawn_reaper).
pub struct IpNameCache<R, S = EntryTable> {
    resolver: R,
    store: S,
    expiration_time: Duration,
    slow_resolution: Duration,
    reaper: Mutex<Option<Reaper>>,
}

impl<R: ReverseResolver> IpNameCache<R, EntryTable> {
    /// Create a cache backed by a [`PartitionedTable`] sized from `settings`
    pub fn new(settings: &CacheSettings, resolver: R) -> Self {
        Self::with_store(
            PartitionedTable::new(settings.index_size),
            settings.expiration_time,
            resolver,
        )
    }
}

impl<R, S> IpNameCache<R, S>
where
    R: ReverseResolver,
    S: KeyValueStore<SockKey, Arc<CacheEntry>>,
{
    pub fn with_store(store: S, expiration_time: Duration, resolver: R) -> Self {
        Self {
            resolver,
            store,
            expiration_time,
            slow_resolution: SLOW_RESOLUTION,
            reaper: Mutex::new(None),
        }
    }

    /// Warn about reverse lookups taking at least `threshold` (default 1 s)
    pub fn with_slow_resolution(mut self, threshold: Duration) -> Self {
        self.slow_resolution = threshold;
        self
    }

    pub fn expiration_time(&self) -> Duration {
        self.expiration_time
    }

    /// Underlying store, for inspection
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Look up the cached hostname for `addr`
    ///
    /// # Returns
    /// * `Ok(Some(hostname))` - A live entry exists
    /// * `Ok(None)` - No entry, or the entry had expired and was evicted
    /// * `Err(CacheError)` - The store failed
    pub fn lookup(&self, addr: SocketAddr) -> Result<Option<String>, CacheError> {
        self.lookup_at(addr, Instant::now())
    }

    /// [`lookup`](Self::lookup) evaluated at an explicit point in time
    pub fn lookup_at(
        &self,
        addr: SocketAddr,
        now: Instant,
    ) -> Result<Option<String>, CacheError> {
        let key = SockKey::new(addr);

        let Some(entry) = self.store.get(&key)? else {
            log::trace!("Cache get miss for {}", key);
            return Ok(None);
        };

        if entry.is_expired(now, self.expiration_time) {
            log::trace!("Found an expired host {} entry, removing", entry.hostname());
            if let Some(removed) = self.store.delete(&key)? {
                log::trace!("Removing cache entry {}->{}", key, removed.hostname());
            }
            return Ok(None);
        }

        log::trace!("Cache get hit for {}->{}", key, entry.hostname());
        Ok(Some(entry.hostname().to_string()))
    }

    /// Copy the cached hostname for `addr` into `buf`.
    ///
    /// Returns the number of bytes written. A hostname longer than `buf` is
    /// [`CacheError::BufferTooSmall`] and nothing is written.
    pub fn lookup_into(
        &self,
        addr: SocketAddr,
        buf: &mut [u8],
    ) -> Result<Option<usize>, CacheError> {
        let Some(hostname) = self.lookup(addr)? else {
            return Ok(None);
        };

        if hostname.len() > buf.len() {
            log::warn!("Could not return host {} to caller, too big", hostname);
            return Err(CacheError::BufferTooSmall {
                needed: hostname.len(),
                available: buf.len(),
            });
        }

        buf[..hostname.len()].copy_from_slice(hostname.as_bytes());
        Ok(Some(hostname.len()))
    }

    /// Reverse-resolve `addr` and cache the result.
    ///
    /// Always produces a name: when resolution fails the textual address is
    /// used instead. Two callers racing on the same unseen address both
    /// resolve it, one of them gets [`InsertOutcome::AlreadyPresent`].
    pub async fn resolve_and_insert(&self, addr: SocketAddr) -> Resolved {
        let key = SockKey::new(addr);
        let hostname = match self.resolve_name(key.ip()).await {
            Some(name) => name,
            None => key.ip().to_string(),
        };
        let outcome = self.insert(key, &hostname);
        Resolved { hostname, outcome }
    }

    /// Bounded-buffer form of [`resolve_and_insert`](Self::resolve_and_insert).
    ///
    /// A resolved name that does not fit in `buf` falls back to the textual
    /// address. If that does not fit either, the call fails with
    /// [`CacheError::BufferTooSmall`] before touching the store.
    pub async fn resolve_and_insert_into(
        &self,
        addr: SocketAddr,
        buf: &mut [u8],
    ) -> Result<(usize, InsertOutcome), CacheError> {
        let key = SockKey::new(addr);
        let hostname = match self.resolve_name(key.ip()).await {
            Some(name) if name.len() <= buf.len() => name,
            resolved => {
                if let Some(name) = resolved {
                    log::warn!(
                        "Name {} for {} does not fit in {} bytes, using address as hostname",
                        name,
                        key,
                        buf.len()
                    );
                }
                let fallback = key.ip().to_string();
                if fallback.len() > buf.len() {
                    log::error!(
                        "Could not return ip address {} because caller's buffer was too small",
                        fallback
                    );
                    return Err(CacheError::BufferTooSmall {
                        needed: fallback.len(),
                        available: buf.len(),
                    });
                }
                fallback
            }
        };

        buf[..hostname.len()].copy_from_slice(hostname.as_bytes());
        let outcome = self.insert(key, &hostname);
        Ok((hostname.len(), outcome))
    }

    /// Hostname for `addr`, from cache when possible.
    ///
    /// Store failures are logged and degrade to an uncached resolution.
    pub async fn hostname(&self, addr: SocketAddr) -> String {
        match self.lookup(addr) {
            Ok(Some(hostname)) => return hostname,
            Ok(None) => {}
            Err(err) => log::error!("Cache lookup for {} failed: {}", addr.ip(), err),
        }
        self.resolve_and_insert(addr).await.hostname
    }

    /// Drop the entry for `addr`, returning whether one existed
    pub fn remove(&self, addr: SocketAddr) -> Result<bool, CacheError> {
        let key = SockKey::new(addr);
        match self.store.delete(&key)? {
            Some(removed) => {
                log::trace!("Cache remove hit for {}->{}", key, removed.hostname());
                Ok(true)
            }
            None => {
                log::trace!("Cache remove miss for {}", key);
                Ok(false)
            }
        }
    }

    /// Evict every entry that has expired at `now`
    pub fn purge_expired(&self, now: Instant) -> Result<usize, CacheError> {
        let ttl = self.expiration_time;
        let removed = self.store.retain(|_, entry| !entry.is_expired(now, ttl))?;
        Ok(removed)
    }

    pub fn len(&self) -> Result<usize, CacheError> {
        Ok(self.store.len()?)
    }

    pub fn is_empty(&self) -> Result<bool, CacheError> {
        Ok(self.store.is_empty()?)
    }

    /// Stop the reaper, if one is running, then drop every entry and refuse
    /// further inserts
    pub async fn shutdown(&self) -> Result<usize, CacheError> {
        let reaper = self
            .reaper
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(reaper) = reaper {
            reaper.stop().await;
            log::debug!("Address cache reaper stopped");
        }

        let removed = self.store.drain()?;
        log::info!("Address cache drained, {} entries released", removed);
        Ok(removed)
    }

    /// Sweep expired entries every `interval` until [`shutdown`](Self::shutdown).
    ///
    /// Returns `false` and leaves the running reaper alone if one is already
    /// attached. The reaper holds a reference to the cache, so a cache with a
    /// reaper lives until it is shut down.
    pub fn spawn_reaper(self: &Arc<Self>, interval: Duration) -> bool
    where
        S: 'static,
    {
        let mut slot = self.reaper.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_some() {
            log::debug!("Address cache reaper already running");
            return false;
        }
        *slot = Some(Reaper::spawn(Arc::clone(self), interval));
        log::debug!("Address cache reaper started, sweeping every {:?}", interval);
        true
    }

    /// Reverse-resolve `ip`, returning `None` when no usable name came back
    async fn resolve_name(&self, ip: IpAddr) -> Option<String> {
        let started = Instant::now();
        let result = self.resolver.reverse_lookup(ip).await;
        let elapsed = started.elapsed();

        if elapsed >= self.slow_resolution {
            log::warn!(
                "Long DNS query for {}: {}.{:06} sec",
                ip,
                elapsed.as_secs(),
                elapsed.subsec_micros()
            );
        }

        match result {
            Ok(name) if !name.is_empty() => Some(name),
            Ok(_) => {
                log::info!("Empty name for address {}, using address as hostname", ip);
                None
            }
            Err(err) => {
                log::info!(
                    "Cannot resolve address {}, error {}, using address as hostname",
                    ip,
                    err
                );
                None
            }
        }
    }

    fn insert(&self, key: SockKey, hostname: &str) -> InsertOutcome {
        let entry = Arc::new(CacheEntry::new(hostname.to_string(), Instant::now()));
        log::debug!("Inserting {}->{} to addr cache", key, hostname);

        match self.store.set(key, entry) {
            Ok(SetOutcome::Inserted) => InsertOutcome::Inserted,
            Ok(SetOutcome::AlreadyExists) => {
                log::debug!("Host {} was cached concurrently, dropping our copy", key);
                InsertOutcome::AlreadyPresent
            }
            Err(err) => {
                log::error!("Error {} while adding host {} to cache", err, hostname);
                InsertOutcome::Failed(err)
            }
        }
    }
}
