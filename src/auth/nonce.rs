//! Nonce generation for FreeKassa API authentication.
//!
//! The API requires a strictly increasing nonce on every signed request to
//! prevent replay attacks. The counter is persisted in a small file so it
//! survives restarts.

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, OnceLock};

use fs2::FileExt;
use futures_util::future::BoxFuture;

use crate::config::Configuration;
use crate::error::FreekassaError;

/// File name used when no nonce path is configured.
pub const DEFAULT_NONCE_FILE_STEM: &str = "./nonce";

/// On-disk encoding of the nonce counter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum NonceMethod {
    /// Decimal text, e.g. `"42"`.
    #[default]
    Text,
    /// Fixed 8-byte big-endian unsigned integer.
    Binary,
}

impl NonceMethod {
    /// Canonical file extension for this encoding.
    pub fn extension(&self) -> &'static str {
        match self {
            NonceMethod::Text => "txt",
            NonceMethod::Binary => "bin",
        }
    }

    /// Resolve the storage path for this encoding.
    ///
    /// No path means `./nonce.<ext>`; a path without the `.<ext>` suffix gets
    /// it appended; anything else is used verbatim.
    pub fn resolve_path(&self, path: Option<&Path>) -> PathBuf {
        let suffix = format!(".{}", self.extension());
        match path {
            None => PathBuf::from(format!("{DEFAULT_NONCE_FILE_STEM}{suffix}")),
            Some(p) if p.as_os_str().to_string_lossy().ends_with(&suffix) => p.to_path_buf(),
            Some(p) => {
                let mut with_ext = p.as_os_str().to_os_string();
                with_ext.push(&suffix);
                PathBuf::from(with_ext)
            }
        }
    }

    /// Serialize a counter value.
    pub fn encode(&self, value: u64) -> Vec<u8> {
        match self {
            NonceMethod::Text => value.to_string().into_bytes(),
            NonceMethod::Binary => value.to_be_bytes().to_vec(),
        }
    }

    /// Deserialize a counter value. Empty or malformed content is `None`.
    pub fn decode(&self, bytes: &[u8]) -> Option<u64> {
        match self {
            NonceMethod::Text => std::str::from_utf8(bytes).ok()?.trim().parse().ok(),
            NonceMethod::Binary => <[u8; 8]>::try_from(bytes).ok().map(u64::from_be_bytes),
        }
    }
}

impl FromStr for NonceMethod {
    type Err = FreekassaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "txt" | "text" => Ok(NonceMethod::Text),
            "bin" | "binary" => Ok(NonceMethod::Binary),
            other => Err(FreekassaError::Configuration(format!(
                "unknown nonce method: {other:?}"
            ))),
        }
    }
}

impl std::fmt::Display for NonceMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// Trait for providing nonces for signed requests.
///
/// Every returned value must be greater than any previously returned value
/// for the same underlying counter.
pub trait NonceProvider: Send + Sync {
    /// Generate the next nonce value.
    fn next_nonce(&self) -> BoxFuture<'_, Result<u64, FreekassaError>>;
}

/// A nonce counter persisted in a file.
///
/// Read-modify-write cycles are serialized per resolved path inside the
/// process and guarded by an exclusive advisory file lock across processes,
/// so concurrent callers never observe duplicate values.
#[derive(Debug, Clone)]
pub struct FileNonceStore {
    method: NonceMethod,
    path: PathBuf,
}

impl FileNonceStore {
    /// Create a store; `path` is resolved with [`NonceMethod::resolve_path`].
    pub fn new(method: NonceMethod, path: Option<&Path>) -> Self {
        Self {
            method,
            path: method.resolve_path(path),
        }
    }

    /// Create a store from the nonce settings of a configuration.
    pub fn from_config(config: &Configuration) -> Self {
        Self::new(config.nonce_method, config.nonce_path.as_deref())
    }

    /// Resolved storage path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Storage encoding.
    pub fn method(&self) -> NonceMethod {
        self.method
    }

    /// Advance the counter and return the new value.
    ///
    /// An empty, missing or unreadable counter starts at `1`.
    pub async fn generate(&self) -> Result<u64, FreekassaError> {
        let next = self
            .locked(true, |method, file| {
                let previous = read_value(method, file)?;
                let next = match previous {
                    Some(p) if p != 0 => p.checked_add(1).ok_or_else(|| {
                        io::Error::new(io::ErrorKind::InvalidData, "nonce counter overflow")
                    })?,
                    _ => 1,
                };
                write_value(method, file, next)?;
                Ok(Some(next))
            })
            .await?
            .unwrap_or(1);

        tracing::debug!(path = %self.path.display(), nonce = next, "advanced nonce");
        Ok(next)
    }

    /// Read the stored value without advancing it.
    pub async fn current(&self) -> Result<Option<u64>, FreekassaError> {
        self.locked(false, read_value).await
    }

    /// Overwrite the stored value.
    pub async fn store(&self, value: u64) -> Result<(), FreekassaError> {
        self.locked(true, move |method, file| {
            write_value(method, file, value)?;
            Ok(None)
        })
        .await?;
        Ok(())
    }

    /// Run `op` on the counter file while holding both the in-process path
    /// lock and the exclusive file lock. Without `create`, a missing file
    /// yields `Ok(None)` and `op` is not called.
    async fn locked<F>(&self, create: bool, op: F) -> Result<Option<u64>, FreekassaError>
    where
        F: FnOnce(NonceMethod, &mut File) -> io::Result<Option<u64>> + Send + 'static,
    {
        let lock = path_lock(&self.path);
        let _guard = lock.lock().await;

        let method = self.method;
        let path = self.path.clone();
        let result = tokio::task::spawn_blocking(move || {
            let file = OpenOptions::new()
                .read(true)
                .write(true)
                .create(create)
                .truncate(false)
                .open(&path);
            let mut file = match file {
                Ok(file) => file,
                Err(e) if !create && e.kind() == io::ErrorKind::NotFound => return Ok(None),
                Err(e) => return Err(e),
            };

            file.lock_exclusive()?;
            let result = op(method, &mut file);
            FileExt::unlock(&file)?;
            result
        })
        .await
        .map_err(io::Error::other)?;

        Ok(result?)
    }
}

impl NonceProvider for FileNonceStore {
    fn next_nonce(&self) -> BoxFuture<'_, Result<u64, FreekassaError>> {
        Box::pin(self.generate())
    }
}

fn read_value(method: NonceMethod, file: &mut File) -> io::Result<Option<u64>> {
    file.seek(SeekFrom::Start(0))?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;
    Ok(method.decode(&bytes))
}

fn write_value(method: NonceMethod, file: &mut File, value: u64) -> io::Result<()> {
    let bytes = method.encode(value);
    file.seek(SeekFrom::Start(0))?;
    file.write_all(&bytes)?;
    // Drop leftovers from a longer previous value.
    file.set_len(bytes.len() as u64)?;
    file.sync_data()
}

type PathLocks = Mutex<HashMap<PathBuf, Arc<tokio::sync::Mutex<()>>>>;

/// Process-wide lock for a nonce file, keyed by absolute path.
fn path_lock(path: &Path) -> Arc<tokio::sync::Mutex<()>> {
    static LOCKS: OnceLock<PathLocks> = OnceLock::new();

    let key = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let mut locks = LOCKS
        .get_or_init(Default::default)
        .lock()
        .unwrap_or_else(|e| e.into_inner());
    locks.entry(key).or_default().clone()
}

/// An in-memory nonce counter.
///
/// Useful for tests and for deployments where the gateway-side nonce is reset
/// together with the process. Values start at `start + 1`.
pub struct MemoryNonce {
    last_nonce: AtomicU64,
}

impl MemoryNonce {
    /// Create a counter whose first value is `1`.
    pub fn new() -> Self {
        Self::starting_after(0)
    }

    /// Create a counter whose first value is `last + 1`.
    pub fn starting_after(last: u64) -> Self {
        Self {
            last_nonce: AtomicU64::new(last),
        }
    }
}

impl Default for MemoryNonce {
    fn default() -> Self {
        Self::new()
    }
}

impl NonceProvider for MemoryNonce {
    fn next_nonce(&self) -> BoxFuture<'_, Result<u64, FreekassaError>> {
        let next = self.last_nonce.fetch_add(1, Ordering::SeqCst) + 1;
        Box::pin(async move { Ok(next) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_resolve_path() {
        let text = NonceMethod::Text;
        assert_eq!(text.resolve_path(None), PathBuf::from("./nonce.txt"));
        assert_eq!(
            text.resolve_path(Some(Path::new("data/counter"))),
            PathBuf::from("data/counter.txt")
        );
        assert_eq!(
            text.resolve_path(Some(Path::new("data/counter.txt"))),
            PathBuf::from("data/counter.txt")
        );
        assert_eq!(
            NonceMethod::Binary.resolve_path(Some(Path::new("data/counter.txt"))),
            PathBuf::from("data/counter.txt.bin")
        );
    }

    #[test]
    fn test_unknown_method_is_configuration_error() {
        let err = "pickle".parse::<NonceMethod>().unwrap_err();
        assert!(matches!(err, FreekassaError::Configuration(_)));
        assert_eq!("TXT".parse::<NonceMethod>().unwrap(), NonceMethod::Text);
        assert_eq!("binary".parse::<NonceMethod>().unwrap(), NonceMethod::Binary);
    }

    #[test]
    fn test_decode_malformed_is_none() {
        assert_eq!(NonceMethod::Text.decode(b""), None);
        assert_eq!(NonceMethod::Text.decode(b"abc"), None);
        assert_eq!(NonceMethod::Text.decode(b"17\n"), Some(17));
        assert_eq!(NonceMethod::Binary.decode(&[1, 2, 3]), None);
        assert_eq!(NonceMethod::Binary.decode(&7u64.to_be_bytes()), Some(7));
    }

    #[tokio::test]
    async fn test_generate_strictly_increasing() {
        for method in [NonceMethod::Text, NonceMethod::Binary] {
            let dir = tempfile::tempdir().unwrap();
            let store = FileNonceStore::new(method, Some(dir.path().join("nonce").as_path()));

            assert_eq!(store.generate().await.unwrap(), 1);
            assert_eq!(store.generate().await.unwrap(), 2);
            assert_eq!(store.generate().await.unwrap(), 3);
            assert_eq!(store.current().await.unwrap(), Some(3));
        }
    }

    #[tokio::test]
    async fn test_store_then_current() {
        for method in [NonceMethod::Text, NonceMethod::Binary] {
            let dir = tempfile::tempdir().unwrap();
            let store = FileNonceStore::new(method, Some(dir.path().join("nonce").as_path()));

            store.store(123_456).await.unwrap();
            assert_eq!(store.current().await.unwrap(), Some(123_456));
            assert_eq!(store.generate().await.unwrap(), 123_457);
        }
    }

    #[tokio::test]
    async fn test_current_on_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileNonceStore::new(NonceMethod::Text, Some(dir.path().join("absent").as_path()));
        assert_eq!(store.current().await.unwrap(), None);
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn test_shorter_value_leaves_no_trailing_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nonce.txt");
        std::fs::write(&path, "garbage-content").unwrap();

        let store = FileNonceStore::new(NonceMethod::Text, Some(path.as_path()));
        assert_eq!(store.generate().await.unwrap(), 1);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "1");
        assert_eq!(store.generate().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_zero_restarts_at_one() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileNonceStore::new(NonceMethod::Binary, Some(dir.path().join("n").as_path()));
        store.store(0).await.unwrap();
        assert_eq!(store.generate().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_io_error_propagates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing_dir").join("nonce");
        let store = FileNonceStore::new(NonceMethod::Text, Some(path.as_path()));
        assert!(matches!(
            store.generate().await,
            Err(FreekassaError::Io(_))
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_generate_unique() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shared");
        let mut handles = Vec::new();

        for _ in 0..8 {
            // Separate store instances on the same path share the path lock.
            let store = FileNonceStore::new(NonceMethod::Text, Some(path.as_path()));
            handles.push(tokio::spawn(async move {
                let mut nonces = Vec::new();
                for _ in 0..10 {
                    nonces.push(store.generate().await.unwrap());
                }
                nonces
            }));
        }

        let mut all_nonces = HashSet::new();
        for handle in handles {
            for nonce in handle.await.unwrap() {
                assert!(all_nonces.insert(nonce), "Nonce must be unique");
            }
        }
        assert_eq!(all_nonces, (1..=80).collect::<HashSet<u64>>());
    }

    #[tokio::test]
    async fn test_memory_nonce_strictly_increasing() {
        let provider = MemoryNonce::starting_after(41);
        assert_eq!(provider.next_nonce().await.unwrap(), 42);
        assert_eq!(provider.next_nonce().await.unwrap(), 43);
    }
}
