// Load cache — explicit memoization for expensive file loads.
//
// The corpus and the embedding file are pure functions of what is on disk,
// and every downstream step consumes them. Instead of process-wide hidden
// state, callers own a `LoadCache` and pass it in. An entry is reused only
// while the fingerprint of its input (every file's path, mtime and size)
// is unchanged.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use tracing::debug;

use crate::error::{DatasetError, Result};

/// Snapshot of the files behind one cache entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFingerprint {
    files: Vec<(PathBuf, Option<SystemTime>, u64)>,
}

impl SourceFingerprint {
    /// Fingerprint a single file, or every `*.json` file directly inside a
    /// directory.
    pub fn of(path: &Path) -> Result<Self> {
        let meta = fs::metadata(path).map_err(|e| DatasetError::io(path, e))?;
        let mut files = Vec::new();
        if meta.is_dir() {
            for path in json_files_in(path)? {
                let meta = fs::metadata(&path).map_err(|e| DatasetError::io(&path, e))?;
                files.push((path, meta.modified().ok(), meta.len()));
            }
        } else {
            files.push((path.to_path_buf(), meta.modified().ok(), meta.len()));
        }
        Ok(Self { files })
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }
}

/// List `*.json` files directly inside `dir`, sorted by path. Readers
/// process files in this order, so last-write-wins follows file names.
pub fn json_files_in(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|e| DatasetError::io(dir, e))?;
    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| DatasetError::io(dir, e))?;
        let path = entry.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

struct CacheEntry<T> {
    fingerprint: SourceFingerprint,
    value: Arc<T>,
}

/// Memoizes loads keyed by input path plus a loader-argument key,
/// invalidated when the files change.
pub struct LoadCache<T> {
    entries: HashMap<(PathBuf, String), CacheEntry<T>>,
    hits: u64,
    misses: u64,
}

impl<T> Default for LoadCache<T> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            hits: 0,
            misses: 0,
        }
    }
}

impl<T> LoadCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached value for `path`, or run `loader` and cache it.
    ///
    /// For loaders that take nothing but the path. Loaders with extra
    /// arguments go through [`LoadCache::get_or_load_keyed`].
    pub fn get_or_load<F>(&mut self, path: &Path, loader: F) -> Result<Arc<T>>
    where
        F: FnOnce(&Path) -> Result<T>,
    {
        self.get_or_load_keyed(path, "", loader)
    }

    /// Like [`LoadCache::get_or_load`], with `key` encoding every other
    /// argument the loader depends on. Each (path, key) pair is cached
    /// separately.
    ///
    /// The fingerprint is recomputed on every call; a changed file, an added
    /// file, or a removed file all force a reload.
    pub fn get_or_load_keyed<F>(&mut self, path: &Path, key: &str, loader: F) -> Result<Arc<T>>
    where
        F: FnOnce(&Path) -> Result<T>,
    {
        let fingerprint = SourceFingerprint::of(path)?;
        let cache_key = (path.to_path_buf(), key.to_string());

        if let Some(entry) = self.entries.get(&cache_key) {
            if entry.fingerprint == fingerprint {
                self.hits += 1;
                debug!(path = %path.display(), key, "load cache hit");
                return Ok(Arc::clone(&entry.value));
            }
            debug!(path = %path.display(), key, "load cache stale, reloading");
        }

        self.misses += 1;
        let value = Arc::new(loader(path)?);
        self.entries.insert(
            cache_key,
            CacheEntry {
                fingerprint,
                value: Arc::clone(&value),
            },
        );
        Ok(value)
    }

    /// Drop every entry for one path, whatever its key.
    pub fn invalidate(&mut self, path: &Path) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(p, _), _| p != path);
        self.entries.len() < before
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// (hits, misses) since the cache was created.
    pub fn stats(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_second_load_is_a_hit() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.json");
        fs::write(&file, "[]").unwrap();

        let calls = Cell::new(0);
        let mut cache: LoadCache<usize> = LoadCache::new();
        let load = |_: &Path| -> Result<usize> {
            calls.set(calls.get() + 1);
            Ok(42)
        };

        assert_eq!(*cache.get_or_load(&file, load).unwrap(), 42);
        assert_eq!(*cache.get_or_load(&file, load).unwrap(), 42);
        assert_eq!(calls.get(), 1);
        assert_eq!(cache.stats(), (1, 1));
    }

    #[test]
    fn test_new_file_in_directory_invalidates() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.json"), "[]").unwrap();

        let mut cache: LoadCache<usize> = LoadCache::new();
        let count = |p: &Path| -> Result<usize> { Ok(json_files_in(p)?.len()) };

        assert_eq!(*cache.get_or_load(dir.path(), count).unwrap(), 1);
        fs::write(dir.path().join("b.json"), "[]").unwrap();
        assert_eq!(*cache.get_or_load(dir.path(), count).unwrap(), 2);
        assert_eq!(cache.stats(), (0, 2));
    }

    #[test]
    fn test_invalidate_forces_reload() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.json");
        fs::write(&file, "[]").unwrap();

        let mut cache: LoadCache<u8> = LoadCache::new();
        cache.get_or_load(&file, |_| Ok(1)).unwrap();
        assert!(cache.invalidate(&file));
        assert!(cache.is_empty());
        assert_eq!(*cache.get_or_load(&file, |_| Ok(2)).unwrap(), 2);
    }

    #[test]
    fn test_keys_are_cached_separately() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.json");
        fs::write(&file, "[]").unwrap();

        let mut cache: LoadCache<u8> = LoadCache::new();
        assert_eq!(*cache.get_or_load_keyed(&file, "one", |_| Ok(1)).unwrap(), 1);
        assert_eq!(*cache.get_or_load_keyed(&file, "two", |_| Ok(2)).unwrap(), 2);
        assert_eq!(*cache.get_or_load_keyed(&file, "one", |_| Ok(9)).unwrap(), 1);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.stats(), (1, 2));

        assert!(cache.invalidate(&file));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_json_files_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.json"), "[]").unwrap();
        fs::write(dir.path().join("a.json"), "[]").unwrap();
        fs::write(dir.path().join("notes.txt"), "").unwrap();

        let names: Vec<String> = json_files_in(dir.path())
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.json", "b.json"]);
    }

    #[test]
    fn test_missing_path_is_io_error() {
        let mut cache: LoadCache<u8> = LoadCache::new();
        let err = cache
            .get_or_load(Path::new("/nonexistent/fedlens"), |_| Ok(0))
            .unwrap_err();
        assert!(matches!(err, DatasetError::Io { .. }));
    }
}
