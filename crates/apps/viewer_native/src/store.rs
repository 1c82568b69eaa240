use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use streaming::{BackingStore, BoxFuture, StoreError, TileKey};

const EXTENSION: &str = "bin";

fn io(err: std::io::Error) -> StoreError {
    StoreError::Io(err.to_string())
}

/// Directory-backed tile store: one `{key}.bin` file per tile key.
///
/// Only well-formed tile keys are accepted, so a key can never name a path
/// outside the directory. Writes go through a temporary file and a rename.
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await.map_err(io)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        key.parse::<TileKey>()
            .map_err(|err| StoreError::InvalidKey(err.to_string()))?;
        Ok(self.root.join(format!("{key}.{EXTENSION}")))
    }
}

impl BackingStore for FsStore {
    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<Vec<u8>>, StoreError>> {
        Box::pin(async move {
            let path = self.path_for(key)?;
            match tokio::fs::read(&path).await {
                Ok(bytes) => Ok(Some(bytes)),
                Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
                Err(err) => Err(io(err)),
            }
        })
    }

    fn set<'a>(&'a self, key: &'a str, value: Vec<u8>) -> BoxFuture<'a, Result<(), StoreError>> {
        Box::pin(async move {
            let path = self.path_for(key)?;
            let tmp = path.with_extension(format!("{EXTENSION}.tmp"));
            tokio::fs::write(&tmp, value).await.map_err(io)?;
            tokio::fs::rename(&tmp, &path).await.map_err(io)
        })
    }

    fn list_keys(&self) -> BoxFuture<'_, Result<Vec<String>, StoreError>> {
        Box::pin(async move {
            let mut dir = tokio::fs::read_dir(&self.root).await.map_err(io)?;
            let mut keys = Vec::new();
            while let Some(entry) = dir.next_entry().await.map_err(io)? {
                let path = entry.path();
                if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                    continue;
                }
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    keys.push(stem.to_string());
                }
            }
            keys.sort();
            Ok(keys)
        })
    }
}
