use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use tokio::task::JoinHandle;

use crate::sync::ShutdownSignal;

use super::{
    cache::{CacheEntry, IpNameCache},
    key::SockKey,
    resolver::ReverseResolver,
    store::KeyValueStore,
};

/// Optional background task that evicts expired cache entries on a timer.
///
/// Without it, entries are only evicted when a lookup trips over them.
/// Started through [`IpNameCache::spawn_reaper`] and stopped by
/// [`IpNameCache::shutdown`].
pub(crate) struct Reaper {
    signal: Arc<ShutdownSignal>,
    handle: JoinHandle<()>,
}

impl Reaper {
    /// Start sweeping `cache` every `interval`
    pub(crate) fn spawn<R, S>(cache: Arc<IpNameCache<R, S>>, interval: Duration) -> Self
    where
        R: ReverseResolver,
        S: KeyValueStore<SockKey, Arc<CacheEntry>> + 'static,
    {
        let signal = ShutdownSignal::new();
        let task_signal = Arc::clone(&signal);

        let handle = tokio::spawn(async move {
            loop {
                if task_signal.wait_timeout_or_shutdown(interval).await {
                    return;
                }

                match cache.purge_expired(Instant::now()) {
                    Ok(0) => {}
                    Ok(removed) => log::info!("Reaped {} expired address cache entries", removed),
                    Err(err) => log::error!("Failed to reap expired address cache entries: {err}"),
                }
            }
        });

        Self { signal, handle }
    }

    /// Signal the task to stop and wait for it
    pub(crate) async fn stop(self) {
        self.signal.shutdown();
        if let Err(err) = self.handle.await {
            log::error!("Address cache reaper ended abnormally: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::{resolver::MockReverseResolver, settings::CacheSettings};

    fn stale_entry(name: &str) -> Arc<CacheEntry> {
        let long_ago = Instant::now()
            .checked_sub(Duration::from_secs(30))
            .unwrap();
        Arc::new(CacheEntry::new(name.to_string(), long_ago))
    }

    #[tokio::test]
    async fn sweeps_expired_entries() {
        let settings = CacheSettings {
            expiration_time: Duration::from_secs(5),
            ..Default::default()
        };
        let cache = Arc::new(IpNameCache::new(&settings, MockReverseResolver::new()));
        let stale: SockKey = "192.0.2.1".parse::<std::net::IpAddr>().unwrap().into();
        let fresh: SockKey = "192.0.2.2".parse::<std::net::IpAddr>().unwrap().into();
        cache.store().set(stale, stale_entry("old.example")).unwrap();
        cache
            .store()
            .set(
                fresh,
                Arc::new(CacheEntry::new("new.example".to_string(), Instant::now())),
            )
            .unwrap();

        let reaper = Reaper::spawn(Arc::clone(&cache), Duration::from_millis(5));
        tokio::time::sleep(Duration::from_millis(50)).await;
        reaper.stop().await;

        assert_eq!(cache.store().get(&stale).unwrap(), None);
        assert!(cache.store().get(&fresh).unwrap().is_some());
    }

    #[tokio::test]
    async fn stop_returns_promptly() {
        let cache = Arc::new(IpNameCache::new(
            &CacheSettings::default(),
            MockReverseResolver::new(),
        ));
        let reaper = Reaper::spawn(cache, Duration::from_secs(3600));

        tokio::time::timeout(Duration::from_secs(1), reaper.stop())
            .await
            .expect("reaper should stop before its next sweep");
    }
}
