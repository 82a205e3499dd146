pub mod cache;
pub mod key;
pub mod reaper;
pub mod resolver;
pub mod settings;
pub mod store;

// Re-export main types
pub use cache::{CacheEntry, EntryTable, InsertOutcome, IpNameCache, Resolved};
pub use key::SockKey;
pub use resolver::{ReverseResolver, SystemReverseResolver};
pub use settings::CacheSettings;
pub use store::{KeyValueStore, PartitionedTable, SetOutcome};
