pub mod entropy;
pub mod error;
pub mod queries;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chirpy_types::models::Document;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub use entropy::{EntropySource, OsEntropy};
pub use error::{Result, StoreError};

/// File-backed store for the whole JSON document.
///
/// Every logical operation re-reads the file; nothing is cached between
/// calls. Mutations hold the write guard across the full load-mutate-write
/// cycle, so two concurrent creators can never both build on the same
/// snapshot. Writes land in a sibling temp file which is then renamed over
/// the target, so an unlocked `load` observes either the old or the new
/// document, never a partial one.
pub struct DataStore {
    path: PathBuf,
    guard: Mutex<()>,
    entropy: Box<dyn EntropySource>,
    token_ttl: Option<chrono::Duration>,
}

impl DataStore {
    /// Bind to `path`, copying the seed template there first if nothing exists yet.
    pub fn initialize(path: impl Into<PathBuf>, seed_path: &Path) -> Result<Self> {
        let path = path.into();

        if !path.exists() {
            let seed = fs::read(seed_path).map_err(|e| StoreError::io(seed_path, e))?;

            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
            }
            fs::write(&path, seed).map_err(|e| StoreError::io(&path, e))?;

            info!(
                "Seeded document at {} from {}",
                path.display(),
                seed_path.display()
            );
        }

        info!("Data store opened at {}", path.display());
        Ok(Self {
            path,
            guard: Mutex::new(()),
            entropy: Box::new(OsEntropy),
            token_ttl: None,
        })
    }

    /// Replace the random source used for refresh-token values.
    pub fn with_entropy(mut self, entropy: impl EntropySource + 'static) -> Self {
        self.entropy = Box::new(entropy);
        self
    }

    /// Stamp newly issued refresh tokens with `now + ttl`.
    pub fn with_token_ttl(mut self, ttl: chrono::Duration) -> Self {
        self.token_ttl = Some(ttl);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and parse the whole document. Takes no lock.
    pub fn load(&self) -> Result<Document> {
        let bytes = fs::read(&self.path).map_err(|e| StoreError::io(&self.path, e))?;
        serde_json::from_slice(&bytes).map_err(|source| StoreError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    /// Overwrite the file with `document` under the write guard.
    pub fn write(&self, document: &Document) -> Result<()> {
        let _guard = self.lock();
        self.persist(document)
    }

    /// Run `f` against a freshly loaded document and write the result back,
    /// all under the write guard.
    pub(crate) fn mutate<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Document) -> Result<T>,
    {
        self.mutate_if_changed(|doc| f(doc).map(|out| (out, true)))
    }

    /// Like `mutate`, but `f` reports whether it changed anything; an
    /// unchanged document is not rewritten.
    pub(crate) fn mutate_if_changed<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Document) -> Result<(T, bool)>,
    {
        let _guard = self.lock();
        let mut document = self.load()?;
        let (out, changed) = f(&mut document)?;
        if changed {
            self.persist(&document)?;
        }
        Ok(out)
    }

    // The guard protects no in-memory state; the file on disk is only ever
    // replaced by a complete rename, so a panic mid-cycle leaves nothing torn.
    fn lock(&self) -> MutexGuard<'_, ()> {
        self.guard.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // Caller must hold the guard.
    fn persist(&self, document: &Document) -> Result<()> {
        let payload = serde_json::to_vec(document).map_err(StoreError::Serialization)?;

        let temp_path = self
            .path
            .with_extension(format!("{}.tmp", Uuid::new_v4().simple()));
        fs::write(&temp_path, &payload).map_err(|e| StoreError::io(&temp_path, e))?;

        if let Err(e) = fs::rename(&temp_path, &self.path) {
            if let Err(cleanup) = fs::remove_file(&temp_path) {
                warn!(
                    "Failed to remove temp file {}: {}",
                    temp_path.display(),
                    cleanup
                );
            }
            return Err(StoreError::io(&self.path, e));
        }

        debug!("Wrote {} bytes to {}", payload.len(), self.path.display());
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use tempfile::TempDir;

    pub fn seed_path() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("../../database/template.json")
    }

    /// A store seeded from the repository template inside a scratch directory.
    /// Keep the `TempDir` alive for as long as the store is used.
    pub fn scratch_store() -> (TempDir, DataStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = DataStore::initialize(dir.path().join("database.json"), &seed_path()).unwrap();
        (dir, store)
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use chirpy_types::models::{Account, Post, RefreshToken};

    #[test]
    fn initialize_seeds_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("database.json");

        let store = DataStore::initialize(&path, &seed_path()).unwrap();
        assert!(path.exists());

        let seed: Document =
            serde_json::from_slice(&fs::read(seed_path()).unwrap()).unwrap();
        assert_eq!(store.load().unwrap(), seed);
        assert_eq!(seed.posts[&1].body, "This is the first chirp ever!");
    }

    #[test]
    fn initialize_keeps_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("database.json");
        fs::write(&path, r#"{"chirps":{},"users":{},"refresh_tokens":{}}"#).unwrap();

        let store = DataStore::initialize(&path, &seed_path()).unwrap();
        assert!(store.load().unwrap().posts.is_empty());
    }

    #[test]
    fn initialize_fails_without_seed() {
        let dir = tempfile::tempdir().unwrap();
        let result = DataStore::initialize(
            dir.path().join("database.json"),
            &dir.path().join("missing-template.json"),
        );
        assert!(matches!(result, Err(StoreError::Io { .. })));
    }

    #[test]
    fn load_rejects_malformed_document() {
        let (_dir, store) = scratch_store();
        fs::write(store.path(), b"{\"chirps\": {\"1\": ").unwrap();
        assert!(matches!(store.load(), Err(StoreError::Parse { .. })));
    }

    #[test]
    fn load_rejects_wrong_shape() {
        let (_dir, store) = scratch_store();
        fs::write(store.path(), br#"{"chirps": [1, 2, 3]}"#).unwrap();
        assert!(matches!(store.load(), Err(StoreError::Parse { .. })));
    }

    #[test]
    fn load_fails_when_file_is_gone() {
        let (_dir, store) = scratch_store();
        fs::remove_file(store.path()).unwrap();
        assert!(matches!(store.load(), Err(StoreError::Io { .. })));
    }

    #[test]
    fn write_then_load_preserves_document() {
        let (_dir, store) = scratch_store();

        let mut doc = Document::default();
        doc.posts.insert(1, Post { id: 1, body: "one".into() });
        doc.accounts.insert(
            1,
            Account {
                id: 1,
                email: "a@x.com".into(),
                password_hash: b"$argon2id$hash".to_vec(),
                token: Some("eyJhbGciOiJIUzI1NiJ9.e30.sig".into()),
                refresh_token_id: Some(1),
            },
        );
        doc.refresh_tokens.insert(
            1,
            RefreshToken {
                id: 1,
                account_id: 1,
                token: "00ff".into(),
                expires_at: Some(chrono::Utc::now()),
                is_valid: true,
            },
        );

        store.write(&doc).unwrap();
        assert_eq!(store.load().unwrap(), doc);
    }

    #[test]
    fn write_leaves_no_temp_files() {
        let (dir, store) = scratch_store();
        store.write(&Document::default()).unwrap();

        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn failed_write_releases_guard() {
        let (_dir, store) = scratch_store();

        // A directory in place of the document makes the final rename fail.
        fs::remove_file(store.path()).unwrap();
        fs::create_dir(store.path()).unwrap();
        assert!(matches!(
            store.write(&Document::default()),
            Err(StoreError::Io { .. })
        ));

        fs::remove_dir(store.path()).unwrap();
        store.write(&Document::default()).unwrap();
        assert_eq!(store.load().unwrap(), Document::default());
    }

    #[test]
    fn panic_under_guard_does_not_wedge_the_store() {
        let (_dir, store) = scratch_store();

        let result = std::thread::scope(|s| {
            s.spawn(|| store.mutate(|_doc| -> Result<()> { panic!("mutation died mid-cycle") }))
                .join()
        });
        assert!(result.is_err());
        assert!(store.guard.is_poisoned());

        store.write(&Document::default()).unwrap();
        assert_eq!(store.load().unwrap(), Document::default());
    }
}
