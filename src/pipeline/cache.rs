// src/pipeline/cache.rs

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::debug;

/// blake3 hex digest of `bytes`.
pub fn content_hash(bytes: &[u8]) -> String {
    blake3::hash(bytes).to_hex().to_string()
}

/// Source hash recorded after each successful compile, keyed by source path.
#[derive(Debug, Default)]
pub struct CompileCache {
    hashes: HashMap<PathBuf, String>,
}

impl CompileCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when `source` was last compiled from content hashing to `hash`.
    pub fn is_fresh(&self, source: &Path, hash: &str) -> bool {
        self.hashes.get(source).is_some_and(|h| h == hash)
    }

    pub fn record(&mut self, source: &Path, hash: String) {
        self.hashes.insert(source.to_path_buf(), hash);
    }

    pub fn invalidate(&mut self, source: &Path) {
        if self.hashes.remove(source).is_some() {
            debug!(path = %source.display(), "invalidated compile cache entry");
        }
    }

    /// Drop every entry at or below `dir`.
    pub fn invalidate_under(&mut self, dir: &Path) {
        let before = self.hashes.len();
        self.hashes.retain(|path, _| !path.starts_with(dir));
        let dropped = before - self.hashes.len();
        if dropped > 0 {
            debug!(dir = %dir.display(), dropped, "invalidated compile cache entries");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_stable_and_content_sensitive() {
        assert_eq!(content_hash(b"a"), content_hash(b"a"));
        assert_ne!(content_hash(b"a"), content_hash(b"b"));
        assert_eq!(content_hash(b"").len(), 64);
    }

    #[test]
    fn fresh_until_invalidated() {
        let mut cache = CompileCache::new();
        let p = Path::new("/p/src/a.js");
        let h = content_hash(b"x");

        assert!(!cache.is_fresh(p, &h));
        cache.record(p, h.clone());
        assert!(cache.is_fresh(p, &h));
        assert!(!cache.is_fresh(p, &content_hash(b"y")));

        cache.invalidate(p);
        assert!(!cache.is_fresh(p, &h));
    }

    #[test]
    fn invalidate_under_drops_subtree_only() {
        let mut cache = CompileCache::new();
        cache.record(Path::new("/p/src/lib/a.js"), "1".into());
        cache.record(Path::new("/p/src/lib/deep/b.js"), "2".into());
        cache.record(Path::new("/p/src/index.js"), "3".into());

        cache.invalidate_under(Path::new("/p/src/lib"));

        assert!(!cache.is_fresh(Path::new("/p/src/lib/a.js"), "1"));
        assert!(!cache.is_fresh(Path::new("/p/src/lib/deep/b.js"), "2"));
        assert!(cache.is_fresh(Path::new("/p/src/index.js"), "3"));
    }
}
