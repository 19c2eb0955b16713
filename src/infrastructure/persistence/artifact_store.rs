use crate::domain::ml::model_key::ModelKey;
use crate::domain::ports::ArtifactStore;
use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use uuid::Uuid;

const ARTIFACT_EXTENSION: &str = "json";

/// One artifact file per key under a single models directory
pub struct FileArtifactStore {
    dir: PathBuf,
}

impl FileArtifactStore {
    /// Opens the store, creating the directory if needed.
    pub fn open(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let dir = dir.into();
        if !dir.exists() {
            std::fs::create_dir_all(&dir)?;
            info!("Created models directory {:?}", dir);
        }
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &ModelKey) -> PathBuf {
        self.dir
            .join(format!("{}.{}", key.file_stem(), ARTIFACT_EXTENSION))
    }
}

#[async_trait]
impl ArtifactStore for FileArtifactStore {
    fn location(&self, key: &ModelKey) -> String {
        self.path_for(key).display().to_string()
    }

    async fn exists(&self, key: &ModelKey) -> io::Result<bool> {
        tokio::fs::try_exists(self.path_for(key)).await
    }

    async fn load(&self, key: &ModelKey) -> io::Result<Vec<u8>> {
        let path = self.path_for(key);
        debug!("Loading artifact from {:?}", path);
        tokio::fs::read(path).await
    }

    async fn save(&self, key: &ModelKey, bytes: &[u8]) -> io::Result<()> {
        let path = self.path_for(key);

        // Atomic write: unique temp file in the same directory, then rename over the target
        let temp_path = self
            .dir
            .join(format!("{}.{}.tmp", key.file_stem(), Uuid::new_v4()));
        if let Err(e) = tokio::fs::write(&temp_path, bytes).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(e);
        }
        if let Err(e) = tokio::fs::rename(&temp_path, &path).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(e);
        }

        info!("Saved model artifact to {:?} ({} bytes)", path, bytes.len());
        Ok(())
    }

    async fn list_keys(&self) -> io::Result<Vec<ModelKey>> {
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        let mut keys = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(ARTIFACT_EXTENSION) {
                continue;
            }
            if let Some(key) = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(ModelKey::from_file_stem)
            {
                keys.push(key);
            }
        }

        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_creates_directory() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("nested").join("models");
        let store = FileArtifactStore::open(&dir).unwrap();
        assert!(store.dir().is_dir());
    }

    #[tokio::test]
    async fn test_location_is_deterministic() {
        let root = tempfile::tempdir().unwrap();
        let store = FileArtifactStore::open(root.path()).unwrap();

        let a = store.location(&ModelKey::new("aapl", 40));
        let b = store.location(&ModelKey::new("AAPL", 40));
        assert_eq!(a, b);
        assert!(a.ends_with("aapl_ws40.json"));
    }

    #[tokio::test]
    async fn test_save_load_and_overwrite() {
        let root = tempfile::tempdir().unwrap();
        let store = FileArtifactStore::open(root.path()).unwrap();
        let key = ModelKey::new("msft", 20);

        assert!(!store.exists(&key).await.unwrap());
        store.save(&key, b"first").await.unwrap();
        store.save(&key, b"second").await.unwrap();

        assert!(store.exists(&key).await.unwrap());
        assert_eq!(store.load(&key).await.unwrap(), b"second".to_vec());

        // No temp files left behind
        let leftovers = std::fs::read_dir(root.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().and_then(|x| x.to_str()) == Some("tmp"))
            .count();
        assert_eq!(leftovers, 0);
    }

    #[tokio::test]
    async fn test_list_keys_ignores_foreign_files() {
        let root = tempfile::tempdir().unwrap();
        let store = FileArtifactStore::open(root.path()).unwrap();
        store.save(&ModelKey::new("tsla", 40), b"{}").await.unwrap();
        store.save(&ModelKey::new("aapl", 60), b"{}").await.unwrap();
        std::fs::write(root.path().join("README.txt"), "notes").unwrap();
        std::fs::write(root.path().join("weird.json"), "{}").unwrap();

        let keys = store.list_keys().await.unwrap();
        assert_eq!(
            keys,
            vec![ModelKey::new("AAPL", 60), ModelKey::new("TSLA", 40)]
        );
    }
}
