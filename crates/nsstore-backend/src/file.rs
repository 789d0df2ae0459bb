//! File-backed key-value store.
//!
//! Each key is one file under the root directory, named by the lowercase hex
//! encoding of the key's UTF-8 bytes, so any key (dots, slashes, unicode)
//! maps to a path-safe name and can be decoded back for listing. Hex names
//! longer than 128 characters are split into nested directories named
//! `<segment>.d`, with the last segment as the file name, which keeps every
//! path component under the usual 255-byte file name limit. The empty key is
//! stored as `_`.
//!
//! Every write goes to its own temp file in the target directory and is
//! renamed into place, so a reader never observes a half-written value and
//! concurrent writers to one key never trip over each other. Directories
//! created for long keys are left in place when the key is deleted.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::{debug, warn};

use crate::error::{BackendError, BackendResult};
use crate::traits::KvBackend;

/// Suffix used for in-flight writes.
const TMP_SUFFIX: &str = ".tmp";

/// Suffix of directories holding the continuation of a long key.
const DIR_SUFFIX: &str = ".d";

/// Maximum number of hex characters in one path component.
const SEGMENT_LEN: usize = 128;

/// File name of the empty key.
const EMPTY_KEY_FILE: &str = "_";

/// Persistent backend storing one file per key.
#[derive(Clone, Debug)]
pub struct FileBackend {
    root: PathBuf,
}

impl FileBackend {
    /// Open (or create) a file backend rooted at `root`.
    pub async fn open(root: impl Into<PathBuf>) -> BackendResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root).await?;
        debug!(root = %root.display(), "opened file backend");
        Ok(Self { root })
    }

    /// Root directory holding the entry files.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the file holding `key`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        let encoded = hex::encode(key.as_bytes());
        if encoded.is_empty() {
            return self.root.join(EMPTY_KEY_FILE);
        }
        let mut path = self.root.clone();
        let mut rest = encoded.as_str();
        while rest.len() > SEGMENT_LEN {
            let (segment, tail) = rest.split_at(SEGMENT_LEN);
            path.push(format!("{segment}{DIR_SUFFIX}"));
            rest = tail;
        }
        path.push(rest);
        path
    }

    /// Sorted list of every stored key.
    ///
    /// Files and directories that this backend would not have written are
    /// skipped with a warning. In-flight temp files are skipped silently.
    pub async fn keys(&self) -> BackendResult<Vec<String>> {
        let mut keys = Vec::new();
        let mut pending = vec![(self.root.clone(), String::new())];

        while let Some((dir_path, prefix)) = pending.pop() {
            let mut dir = fs::read_dir(&dir_path).await?;
            while let Some(entry) = dir.next_entry().await? {
                let file_name = entry.file_name();
                let Some(name) = file_name.to_str() else {
                    warn!(file = ?entry.path(), "skipping non-UTF-8 file name");
                    continue;
                };
                if name.ends_with(TMP_SUFFIX) {
                    continue;
                }

                if entry.file_type().await?.is_dir() {
                    match name.strip_suffix(DIR_SUFFIX) {
                        Some(segment) if segment.len() == SEGMENT_LEN => {
                            pending.push((entry.path(), format!("{prefix}{segment}")));
                        }
                        _ => warn!(dir = ?entry.path(), "skipping foreign directory in backend root"),
                    }
                    continue;
                }

                if prefix.is_empty() && name == EMPTY_KEY_FILE {
                    keys.push(String::new());
                    continue;
                }
                match decode_key(&prefix, name) {
                    Some(key) => keys.push(key),
                    None => warn!(file = ?entry.path(), "skipping foreign file in backend root"),
                }
            }
        }

        keys.sort();
        Ok(keys)
    }
}

fn decode_key(prefix: &str, file_name: &str) -> Option<String> {
    if file_name.is_empty() || file_name.len() > SEGMENT_LEN {
        return None;
    }
    let bytes = hex::decode(format!("{prefix}{file_name}")).ok()?;
    String::from_utf8(bytes).ok()
}

fn write_replacing(dir: &Path, path: &Path, value: &[u8]) -> io::Result<()> {
    let mut tmp = tempfile::Builder::new()
        .prefix(".")
        .suffix(TMP_SUFFIX)
        .tempfile_in(dir)?;
    tmp.write_all(value)?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[async_trait]
impl KvBackend for FileBackend {
    async fn get(&self, key: &str) -> BackendResult<Option<String>> {
        let path = self.path_for(key);
        match fs::read(&path).await {
            Ok(bytes) => String::from_utf8(bytes)
                .map(Some)
                .map_err(|e| BackendError::Corrupt {
                    key: key.to_string(),
                    reason: e.to_string(),
                }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: &str) -> BackendResult<()> {
        let path = self.path_for(key);
        let dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.root.clone());
        if dir != self.root {
            fs::create_dir_all(&dir).await?;
        }

        let value = value.as_bytes().to_vec();
        tokio::task::spawn_blocking(move || write_replacing(&dir, &path, &value))
            .await
            .map_err(|e| BackendError::Unavailable(format!("write task failed: {e}")))??;
        Ok(())
    }

    async fn delete(&self, key: &str) -> BackendResult<()> {
        match fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn open_temp() -> (tempfile::TempDir, FileBackend) {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::open(dir.path().join("kv")).await.unwrap();
        (dir, backend)
    }

    #[tokio::test]
    async fn set_get_delete() {
        let (_dir, backend) = open_temp().await;
        backend.set("user.pts.PROF", "3").await.unwrap();
        assert_eq!(
            backend.get("user.pts.PROF").await.unwrap().as_deref(),
            Some("3")
        );

        backend.delete("user.pts.PROF").await.unwrap();
        assert!(backend.get("user.pts.PROF").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_missing_is_ok() {
        let (_dir, backend) = open_temp().await;
        backend.delete("never-written").await.unwrap();
    }

    #[tokio::test]
    async fn keys_survive_reopen() {
        let (dir, backend) = open_temp().await;
        backend.set("b/with/slashes", "2").await.unwrap();
        backend.set("a.dotted", "1").await.unwrap();
        drop(backend);

        let reopened = FileBackend::open(dir.path().join("kv")).await.unwrap();
        assert_eq!(
            reopened.keys().await.unwrap(),
            vec!["a.dotted", "b/with/slashes"]
        );
        assert_eq!(
            reopened.get("b/with/slashes").await.unwrap().as_deref(),
            Some("2")
        );
    }

    #[tokio::test]
    async fn keys_skip_foreign_files() {
        let (_dir, backend) = open_temp().await;
        backend.set("k", "v").await.unwrap();
        std::fs::write(backend.root().join("not-hex"), b"x").unwrap();
        std::fs::write(backend.root().join("6b.tmp"), b"x").unwrap();
        assert_eq!(backend.keys().await.unwrap(), vec!["k"]);
    }

    #[tokio::test]
    async fn non_utf8_value_is_corrupt() {
        let (_dir, backend) = open_temp().await;
        std::fs::write(backend.path_for("bin"), [0xff, 0xfe]).unwrap();
        let err = backend.get("bin").await.unwrap_err();
        assert!(matches!(err, BackendError::Corrupt { ref key, .. } if key == "bin"));
    }

    #[test]
    fn path_is_hex_of_key() {
        let backend = FileBackend {
            root: PathBuf::from("/data"),
        };
        assert_eq!(backend.path_for("a.b"), PathBuf::from("/data/612e62"));
        assert_eq!(decode_key("", "612e62").as_deref(), Some("a.b"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_writes_to_one_key_all_succeed() {
        let (_dir, backend) = open_temp().await;
        let writers: Vec<_> = (0..64)
            .map(|i| {
                let backend = backend.clone();
                tokio::spawn(async move { backend.set("user.pts.PROF", &i.to_string()).await })
            })
            .collect();
        for writer in writers {
            writer.await.unwrap().unwrap();
        }

        let stored: u32 = backend
            .get("user.pts.PROF")
            .await
            .unwrap()
            .unwrap()
            .parse()
            .unwrap();
        assert!(stored < 64);
        assert_eq!(backend.keys().await.unwrap(), vec!["user.pts.PROF"]);
    }

    #[tokio::test]
    async fn long_keys_are_split_into_directories() {
        let (_dir, backend) = open_temp().await;
        let long = format!("user.{}", "x".repeat(195));
        assert_eq!(long.len(), 200);
        let path = backend.path_for(&long);
        assert!(path
            .components()
            .all(|c| c.as_os_str().len() <= SEGMENT_LEN + DIR_SUFFIX.len()));

        backend.set(&long, "v").await.unwrap();
        backend.set("user.short", "s").await.unwrap();
        assert_eq!(backend.get(&long).await.unwrap().as_deref(), Some("v"));
        assert_eq!(backend.keys().await.unwrap(), vec!["user.short".to_string(), long.clone()]);

        backend.delete(&long).await.unwrap();
        assert!(backend.get(&long).await.unwrap().is_none());
        assert_eq!(backend.keys().await.unwrap(), vec!["user.short"]);
    }

    #[tokio::test]
    async fn key_of_exactly_one_segment_does_not_collide_with_longer_key() {
        let (_dir, backend) = open_temp().await;
        let base = "k".repeat(SEGMENT_LEN / 2);
        let longer = format!("{base}.more");
        backend.set(&base, "1").await.unwrap();
        backend.set(&longer, "2").await.unwrap();
        assert_eq!(backend.get(&base).await.unwrap().as_deref(), Some("1"));
        assert_eq!(backend.get(&longer).await.unwrap().as_deref(), Some("2"));
        assert_eq!(backend.keys().await.unwrap(), vec![base, longer]);
    }

    #[tokio::test]
    async fn empty_key() {
        let (_dir, backend) = open_temp().await;
        backend.set("", "root").await.unwrap();
        assert_eq!(backend.get("").await.unwrap().as_deref(), Some("root"));
        assert_eq!(backend.keys().await.unwrap(), vec![""]);
    }
}
