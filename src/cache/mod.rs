//! Shard cache with a pluggable storage backend
//!
//! Shards are stored as JSON `{ ts, data }` records under keys of the form
//! `raas-{lang}-{shard}`. Entries older than the configured TTL are evicted on
//! read. The backend is chosen once when the cache is built: a file store in
//! the user's cache directory when one is usable, otherwise a process-local
//! in-memory map.

mod clock;
mod manager;
mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use manager::{cache_key, ShardCache};
pub use store::{CacheStore, FileStore, MemoryStore};
