//! Storage backends for the shard cache
//!
//! Both backends are plain keyed string stores. Expiry and JSON framing live
//! in [`ShardCache`](super::ShardCache) so the two behave identically.

use directories::ProjectDirs;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt::Debug;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Keyed string storage used by the shard cache
pub trait CacheStore: Send + Sync + Debug {
    /// Returns the stored value, or `None` if the key is absent
    fn get(&self, key: &str) -> io::Result<Option<String>>;

    /// Stores a value, replacing any previous one
    fn set(&self, key: &str, value: &str) -> io::Result<()>;

    /// Deletes a key; deleting a missing key is not an error
    fn remove(&self, key: &str) -> io::Result<()>;

    /// Deletes every key
    fn clear(&self) -> io::Result<()>;

    /// Whether values survive a process restart
    fn is_persistent(&self) -> bool;
}

/// Persistent store writing one JSON file per key
///
/// Files live in an XDG-compliant cache directory (`~/.cache/raas/` on Linux),
/// in a subdirectory per API base URL so deployments never share entries.
///
/// I/O uses blocking `std::fs`. Entries are small and one shard is touched per
/// request, so the calls are made inline from async code.
#[derive(Debug, Clone)]
pub struct FileStore {
    /// Directory where cache files are stored
    cache_dir: PathBuf,
}

impl FileStore {
    /// Creates a store in the platform cache directory, scoped to `base_url`
    ///
    /// Returns `None` if the cache directory cannot be determined (e.g., no home directory).
    pub fn new(base_url: &str) -> Option<Self> {
        Self::default_dir(base_url).map(Self::with_dir)
    }

    /// Platform cache directory for entries fetched from `base_url`
    pub fn default_dir(base_url: &str) -> Option<PathBuf> {
        let project_dirs = ProjectDirs::from("", "", "raas")?;
        Some(project_dirs.cache_dir().join(scope_dir_name(base_url)))
    }

    /// Creates a store rooted at a custom directory
    pub fn with_dir(cache_dir: PathBuf) -> Self {
        Self { cache_dir }
    }

    pub fn dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Creates the cache directory if needed and checks it is a directory
    pub fn ensure_dir(&self) -> io::Result<()> {
        fs::create_dir_all(&self.cache_dir)
    }

    /// Returns the path to a cache file for the given key
    fn cache_path(&self, key: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.json", escape_key(key)))
    }
}

/// Directory name for a base URL: first 16 hex chars of its SHA-256
pub fn scope_dir_name(base_url: &str) -> String {
    let digest = Sha256::digest(base_url.trim_end_matches('/').as_bytes());
    hex::encode(digest)[..16].to_string()
}

/// Percent-escapes every byte outside `[A-Za-z0-9_-]`
///
/// Injective, so distinct keys never share a file, and the result never
/// contains a path separator or a dot.
fn escape_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for b in key.bytes() {
        if b.is_ascii_alphanumeric() || b == b'-' || b == b'_' {
            out.push(b as char);
        } else {
            out.push_str(&format!("%{:02X}", b));
        }
    }
    out
}

impl CacheStore for FileStore {
    fn get(&self, key: &str) -> io::Result<Option<String>> {
        match fs::read_to_string(self.cache_path(key)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn set(&self, key: &str, value: &str) -> io::Result<()> {
        self.ensure_dir()?;
        fs::write(self.cache_path(key), value)
    }

    fn remove(&self, key: &str) -> io::Result<()> {
        match fs::remove_file(self.cache_path(key)) {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }

    fn clear(&self) -> io::Result<()> {
        let entries = match fs::read_dir(&self.cache_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e),
        };

        for entry in entries {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                fs::remove_file(path)?;
            }
        }
        Ok(())
    }

    fn is_persistent(&self) -> bool {
        true
    }
}

/// Transient store scoped to the current process
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CacheStore for MemoryStore {
    fn get(&self, key: &str) -> io::Result<Option<String>> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> io::Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> io::Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.remove(key);
        Ok(())
    }

    fn clear(&self) -> io::Result<()> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).clear();
        Ok(())
    }

    fn is_persistent(&self) -> bool {
        false
    }
}
