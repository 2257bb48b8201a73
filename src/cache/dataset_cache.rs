use crate::error::{LoadError, ReportError, Result};
use crate::models::Dataset;
use crate::readers::DatasetReader;
use crate::utils::progress::ProgressReporter;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use tracing::{debug, info};

/// Identity of a dataset source: path plus modification time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFingerprint {
    pub path: PathBuf,
    pub modified: Option<SystemTime>,
}

impl SourceFingerprint {
    pub fn of(path: &Path) -> Result<Self> {
        let metadata = std::fs::metadata(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => LoadError::NotFound {
                path: path.to_path_buf(),
            }
            .into(),
            _ => ReportError::Io(e),
        })?;

        Ok(Self {
            path: path.to_path_buf(),
            // Some filesystems do not report mtime; such entries only
            // invalidate on a path change.
            modified: metadata.modified().ok(),
        })
    }
}

#[derive(Debug)]
struct CacheEntry {
    fingerprint: SourceFingerprint,
    dataset: Arc<Dataset>,
}

/// Outcome of checking a path against the cache.
enum Lookup {
    Hit(Arc<Dataset>),
    Miss(SourceFingerprint),
}

/// Holds at most one loaded dataset for the session.
///
/// The cached dataset is reused until the requested path differs from the
/// cached one or the file's modification time changes; then it is reloaded.
/// Handles already given out stay valid after a reload.
#[derive(Debug, Default)]
pub struct DatasetCache {
    reader: DatasetReader,
    entry: Option<CacheEntry>,
    quiet: bool,
}

impl DatasetCache {
    pub fn new(reader: DatasetReader) -> Self {
        Self {
            reader,
            entry: None,
            quiet: false,
        }
    }

    /// Suppress the spinner shown by [`DatasetCache::get_or_load_async`].
    pub fn with_quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    pub fn reader(&self) -> &DatasetReader {
        &self.reader
    }

    /// Cached dataset if `fingerprint` still matches it.
    pub fn lookup(&self, fingerprint: &SourceFingerprint) -> Option<Arc<Dataset>> {
        self.entry
            .as_ref()
            .filter(|e| e.fingerprint == *fingerprint)
            .map(|e| Arc::clone(&e.dataset))
    }

    pub fn store(&mut self, fingerprint: SourceFingerprint, dataset: Dataset) -> Arc<Dataset> {
        let dataset = Arc::new(dataset);
        info!(path = %fingerprint.path.display(), records = dataset.len(), "cached dataset");
        self.entry = Some(CacheEntry {
            fingerprint,
            dataset: Arc::clone(&dataset),
        });
        dataset
    }

    /// Fingerprint `path` and compare it with the cached entry. Anything
    /// other than a hit empties the cache.
    fn check(&mut self, path: &Path) -> Result<Lookup> {
        let fingerprint = match SourceFingerprint::of(path) {
            Ok(fp) => fp,
            Err(e) => {
                self.invalidate();
                return Err(e);
            }
        };

        if let Some(dataset) = self.lookup(&fingerprint) {
            debug!(path = %path.display(), "dataset cache hit");
            return Ok(Lookup::Hit(dataset));
        }

        self.invalidate();
        Ok(Lookup::Miss(fingerprint))
    }

    /// Return the dataset at `path`, loading it on first use or when the
    /// source changed. A failed load leaves the cache empty.
    pub fn get_or_load(&mut self, path: &Path) -> Result<Arc<Dataset>> {
        match self.check(path)? {
            Lookup::Hit(dataset) => Ok(dataset),
            Lookup::Miss(fingerprint) => {
                let dataset = self.reader.read_dataset(path)?;
                Ok(self.store(fingerprint, dataset))
            }
        }
    }

    /// Same rule as [`DatasetCache::get_or_load`], with the read on a
    /// blocking worker and a spinner while it runs.
    pub async fn get_or_load_async(&mut self, path: &Path) -> Result<Arc<Dataset>> {
        let fingerprint = match self.check(path)? {
            Lookup::Hit(dataset) => return Ok(dataset),
            Lookup::Miss(fingerprint) => fingerprint,
        };

        let progress =
            ProgressReporter::new_spinner(&format!("Loading {}...", path.display()), self.quiet);
        let reader = self.reader.clone();
        let owned = path.to_path_buf();
        let loaded = tokio::task::spawn_blocking(move || reader.read_dataset(&owned)).await;

        match loaded.map_err(ReportError::from).and_then(|r| r) {
            Ok(dataset) => {
                progress.finish_with_message(&format!("Loaded {} records", dataset.len()));
                Ok(self.store(fingerprint, dataset))
            }
            Err(e) => {
                progress.finish_and_clear();
                Err(e)
            }
        }
    }

    pub fn invalidate(&mut self) {
        if self.entry.take().is_some() {
            debug!("dataset cache invalidated");
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.entry.is_some()
    }

    pub fn current(&self) -> Option<Arc<Dataset>> {
        self.entry.as_ref().map(|e| Arc::clone(&e.dataset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{File, OpenOptions};
    use std::io::Write;
    use std::time::Duration;
    use tempfile::TempDir;

    const CSV: &str = "date_time,PM2.5,NO2,CO\n2014-01-01 00:00:00,10,20,300\n";

    fn write_csv(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_reuses_until_modified() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_csv(temp_dir.path(), "data.csv", CSV);
        let mut cache = DatasetCache::default();

        let first = cache.get_or_load(&path).unwrap();
        let second = cache.get_or_load(&path).unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(b"2014-01-02 00:00:00,11,21,301\n").unwrap();
        // Force a distinct mtime even on coarse-grained filesystems
        let later = SystemTime::now() + Duration::from_secs(5);
        file.set_modified(later).unwrap();
        drop(file);

        let third = cache.get_or_load(&path).unwrap();
        assert!(!Arc::ptr_eq(&first, &third));
        assert_eq!(third.len(), 2);
        // Handles given out earlier still see the old snapshot
        assert_eq!(first.len(), 1);
    }

    #[test]
    fn test_path_change_reloads() {
        let temp_dir = TempDir::new().unwrap();
        let a = write_csv(temp_dir.path(), "a.csv", CSV);
        let b = write_csv(temp_dir.path(), "b.csv", CSV);
        let mut cache = DatasetCache::default();

        let first = cache.get_or_load(&a).unwrap();
        let second = cache.get_or_load(&b).unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_missing_file_empties_cache() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_csv(temp_dir.path(), "data.csv", CSV);
        let mut cache = DatasetCache::default();
        cache.get_or_load(&path).unwrap();
        assert!(cache.is_loaded());

        let err = cache
            .get_or_load(&temp_dir.path().join("gone.csv"))
            .unwrap_err();
        assert!(err.is_load_error());
        assert!(!cache.is_loaded());
        assert!(cache.current().is_none());
    }

    #[test]
    fn test_invalidate_forces_reload() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_csv(temp_dir.path(), "data.csv", CSV);
        let mut cache = DatasetCache::default();

        let first = cache.get_or_load(&path).unwrap();
        cache.invalidate();
        let second = cache.get_or_load(&path).unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(*first, *second);
    }

    #[tokio::test]
    async fn test_async_load_shares_entry_with_sync() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_csv(temp_dir.path(), "data.csv", CSV);
        let mut cache = DatasetCache::default().with_quiet(true);

        let first = cache.get_or_load_async(&path).await.unwrap();
        let second = cache.get_or_load(&path).unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(b"2014-01-02 00:00:00,11,21,301\n").unwrap();
        file.set_modified(SystemTime::now() + Duration::from_secs(5))
            .unwrap();
        drop(file);

        let third = cache.get_or_load_async(&path).await.unwrap();
        assert_eq!(third.len(), 2);

        let err = cache
            .get_or_load_async(&temp_dir.path().join("gone.csv"))
            .await
            .unwrap_err();
        assert!(err.is_load_error());
        assert!(!cache.is_loaded());
    }
}
