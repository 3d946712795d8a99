use std::{
    ffi::OsStr,
    fmt::Display,
    path::{Path, PathBuf, StripPrefixError},
    sync::Arc,
};

use futures::TryFutureExt as _;
use sha2::{Digest, Sha256};
use tokio::{fs, io::AsyncWriteExt as _, task::spawn_blocking};
use tracing::{debug, error};

use super::{
    Store, StoreInfo, ValidPath,
    error::{StoreError, StoreResult},
};

fn rsplit_file_at_dot(file: &str) -> (Option<&str>, Option<&str>) {
    if file == ".." {
        return (Some(file), None);
    }
    let mut iter = file.rsplitn(2, '.');
    let after = iter.next();
    let before = iter.next();
    if before == Some("") {
        (Some(file), None)
    } else {
        (before, after)
    }
}

#[inline]
fn hex(bytes: &[u8]) -> String {
    base16ct::lower::encode_string(bytes)
}

const MAX_SAME_FILES: usize = 10;

/// Finds free name by adding (n) suffix before extension
/// Race between check and create is compensated by store lock
fn find_unique_path(path: &Path) -> StoreResult<PathBuf> {
    let file_name = path
        .file_name()
        .and_then(OsStr::to_str)
        .ok_or(StoreError::InvalidPath)?;
    let (base_name, ext) = match rsplit_file_at_dot(file_name) {
        (Some(base), Some(ext)) => (base, Some(ext)),
        _ => (file_name, None),
    };

    for i in 1..=MAX_SAME_FILES {
        let new_path = match ext {
            Some(ext) => path.with_file_name(format!("{base_name}({i}).{ext}")),
            None => path.with_file_name(format!("{base_name}({i})")),
        };
        if !new_path.exists() {
            return Ok(new_path);
        }
    }

    Err(StoreError::PathConflict)
}

fn tmp_path(root: &Path) -> PathBuf {
    let id = uuid::Uuid::new_v4().to_string();
    root.join(format!(".{id}.tmp"))
}

fn unique_path_sync(final_path: PathBuf) -> StoreResult<PathBuf> {
    if final_path.is_dir() {
        Err(StoreError::InvalidPath)
    } else {
        if final_path.exists() {
            find_unique_path(&final_path)
        } else {
            Ok(final_path)
        }
    }
}

async fn unique_path(root: &Path, path: &str) -> StoreResult<PathBuf> {
    let path = root.join(path);
    spawn_blocking(|| unique_path_sync(path)).await?
}

async fn cleanup<E: Display>(path: &Path, error: E) -> Result<(), E> {
    error!("Failed to store file to path {path:?}: {error}");
    if path.exists() {
        fs::remove_file(path)
            .await
            .map_err(|e| error!("Failed to remove file {path:?}: {e}"))
            .ok();
    }
    Err(error)
}

struct FileStoreInner {
    root: PathBuf,
    lock: tokio::sync::Mutex<()>,
}

/// Store of files in local directory
#[derive(Clone)]
pub struct FileStore {
    inner: Arc<FileStoreInner>,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            inner: Arc::new(FileStoreInner {
                root: root.into(),
                lock: tokio::sync::Mutex::new(()),
            }),
        }
    }

    pub fn root(&self) -> &Path {
        &self.inner.root
    }

    fn relative_path(&self, path: &impl AsRef<Path>) -> Result<ValidPath, StripPrefixError> {
        let relative_path = path.as_ref().strip_prefix(&self.inner.root)?;
        // path was created from root and ValidPath so it is utf-8
        let final_path = relative_path.to_string_lossy().to_string();
        Ok(ValidPath(final_path))
    }
}

impl Store for FileStore {
    async fn store_data(&self, path: &ValidPath, data: &[u8]) -> StoreResult<StoreInfo> {
        if !fs::try_exists(&self.inner.root).await? {
            fs::create_dir_all(&self.inner.root).await?;
        }
        let tmp_path = tmp_path(&self.inner.root);
        let mut file = fs::File::create(&tmp_path)
            .await
            .inspect_err(|e| error!("Failed to create tmp file {tmp_path:?}: {e}"))?;
        file.write_all(data)
            .or_else(|e| cleanup(&tmp_path, e))
            .await?;
        file.flush().or_else(|e| cleanup(&tmp_path, e)).await?;
        drop(file);

        let final_path = {
            let _lock = self.inner.lock.lock().await;
            let final_path = match unique_path(&self.inner.root, path.as_ref()).await {
                Ok(final_path) => final_path,
                Err(e) => {
                    cleanup(&tmp_path, e).await?;
                    unreachable!()
                }
            };
            fs::rename(&tmp_path, &final_path)
                .or_else(|e| cleanup(&tmp_path, e))
                .await?;
            final_path
        };
        let size = data.len() as u64;
        debug!("Stored {size} bytes to {final_path:?}");
        let digest = Sha256::digest(data);
        let final_path = self
            .relative_path(&final_path)
            .map_err(|_| StoreError::InvalidPath)?;
        Ok(StoreInfo {
            final_path,
            size,
            hash: hex(&digest),
        })
    }

    async fn delete(&self, path: &ValidPath) -> StoreResult<bool> {
        let full_path = self.inner.root.join(path.as_ref());
        match fs::remove_file(&full_path).await {
            Ok(()) => {
                debug!("Deleted {full_path:?}");
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => {
                error!("Failed to delete {full_path:?}: {e}");
                Err(e.into())
            }
        }
    }

    async fn list(&self) -> StoreResult<Vec<String>> {
        let mut names = Vec::new();
        let mut entries = match fs::read_dir(&self.inner.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(names),
            Err(e) => return Err(e.into()),
        };
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_file() {
                if let Some(name) = entry.file_name().to_str() {
                    if !name.starts_with('.') {
                        names.push(name.to_string());
                    }
                }
            }
        }
        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_at_dot() {
        assert_eq!(rsplit_file_at_dot("a.png"), (Some("a"), Some("png")));
        assert_eq!(rsplit_file_at_dot("a.b.png"), (Some("a.b"), Some("png")));
        assert_eq!(rsplit_file_at_dot(".hidden"), (Some(".hidden"), None));
        assert_eq!(rsplit_file_at_dot("plain"), (None, Some("plain")));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 3)]
    async fn test_store() {
        let tmp_dir = tempfile::tempdir().unwrap();
        let content = b"neco tady je";
        let store = FileStore::new(tmp_dir.path().join("images"));
        let store2 = store.clone();
        // test to move store to other thread
        let validated_path = ValidPath::new("kulisatna.png").unwrap();
        let validated_path2 = validated_path.clone();
        let handle =
            tokio::spawn(async move { store2.store_data(&validated_path2, content).await });
        let res = handle.await.unwrap().unwrap();
        assert_eq!(res.size, 12);
        assert_eq!(res.final_path.as_ref(), "kulisatna.png");
        let res_path = store.root().join("kulisatna.png");
        assert!(res_path.exists());
        assert_eq!(fs::read(res_path).await.unwrap(), content);

        let res2 = store.store_data(&validated_path, content).await.unwrap();
        assert_eq!(res2.final_path.as_ref(), "kulisatna(1).png");
        assert_eq!(res.hash, res2.hash);

        let names = store.list().await.unwrap();
        assert_eq!(names, vec!["kulisatna(1).png", "kulisatna.png"]);
    }

    #[tracing_test::traced_test]
    #[tokio::test]
    async fn test_delete() {
        let tmp_dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(tmp_dir.path());
        let path = ValidPath::new("random.bin").unwrap();
        let data = rand::random::<[u8; 1024]>();
        store.store_data(&path, &data).await.unwrap();
        assert!(tmp_dir.path().join("random.bin").exists());

        assert!(store.delete(&path).await.unwrap());
        assert!(!tmp_dir.path().join("random.bin").exists());
        assert!(!store.delete(&path).await.unwrap());
    }

    #[tokio::test]
    async fn test_list_missing_root() {
        let tmp_dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(tmp_dir.path().join("nothing"));
        assert!(store.list().await.unwrap().is_empty());
    }
}
