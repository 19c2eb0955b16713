use crate::domain::errors::{ForecastError, ModelError};
use crate::domain::forecast::result::ModelOrigin;
use crate::domain::ml::dataset::WindowBlock;
use crate::domain::ml::model_key::ModelKey;
use crate::domain::ml::regressor::{Regressor, RegressorFactory};
use crate::domain::ports::ArtifactStore;
use ndarray::{Array1, Array2};
use std::collections::{BTreeSet, HashMap};
use std::io;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{error, info};

type KeyLock = Arc<tokio::sync::Mutex<()>>;

/// Where the artifact for a key lives and whether it is there yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactRef {
    pub key: ModelKey,
    pub location: String,
    pub exists: bool,
}

/// A ready-to-use model plus where it came from
pub struct ModelHandle {
    pub key: ModelKey,
    pub location: String,
    pub origin: ModelOrigin,
    pub regressor: Box<dyn Regressor>,
}

impl std::fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelHandle")
            .field("key", &self.key)
            .field("location", &self.location)
            .field("origin", &self.origin)
            .field("regressor", &self.regressor.name())
            .finish()
    }
}

/// Maps `(symbol, window_size)` to a persisted model and decides between training and reuse.
///
/// An existing artifact is always reused, never retrained. Concurrent requests for one key
/// are serialized so that only one of them trains and writes.
pub struct ModelCache {
    store: Arc<dyn ArtifactStore>,
    factory: Arc<dyn RegressorFactory>,
    key_locks: Mutex<HashMap<ModelKey, KeyLock>>,
}

impl ModelCache {
    pub fn new(store: Arc<dyn ArtifactStore>, factory: Arc<dyn RegressorFactory>) -> Self {
        Self {
            store,
            factory,
            key_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn factory(&self) -> &Arc<dyn RegressorFactory> {
        &self.factory
    }

    pub async fn resolve(&self, key: &ModelKey) -> Result<ArtifactRef, ForecastError> {
        let exists = self
            .store
            .exists(key)
            .await
            .map_err(|e| Self::storage_error(key, &e))?;
        Ok(ArtifactRef {
            key: key.clone(),
            location: self.store.location(key),
            exists,
        })
    }

    /// Loads the artifact for `key`, or trains one with `train_fn` over `train` and persists it.
    ///
    /// A present but unreadable artifact, or one built for another window size, fails with
    /// `ArtifactCorrupt`; it is not replaced.
    pub async fn train_or_load<F>(
        &self,
        key: &ModelKey,
        train: WindowBlock,
        train_fn: F,
    ) -> Result<ModelHandle, ForecastError>
    where
        F: FnOnce(&Array2<f64>, &Array1<f64>) -> Result<Box<dyn Regressor>, ModelError>
            + Send
            + 'static,
    {
        let lock = self.key_lock(key);
        let result = {
            let _guard = lock.lock().await;
            self.load_or_train_locked(key, train, train_fn).await
        };
        self.release_key_lock(key, &lock);
        result
    }

    async fn load_or_train_locked<F>(
        &self,
        key: &ModelKey,
        train: WindowBlock,
        train_fn: F,
    ) -> Result<ModelHandle, ForecastError>
    where
        F: FnOnce(&Array2<f64>, &Array1<f64>) -> Result<Box<dyn Regressor>, ModelError>
            + Send
            + 'static,
    {
        let artifact = self.resolve(key).await?;
        if artifact.exists {
            info!("Loading existing model for {} from {}", key, artifact.location);
            return self.load(artifact).await;
        }

        info!(
            "No model stored for {}; training on {} windows",
            key,
            train.len()
        );
        let regressor = tokio::task::spawn_blocking(move || train_fn(&train.inputs, &train.targets))
            .await
            .map_err(|e| ForecastError::Training(format!("training task failed: {}", e)))??;

        let bytes = regressor.serialize()?;
        self.store
            .save(key, &bytes)
            .await
            .map_err(|e| Self::storage_error(key, &e))?;
        info!("Saved model for {} to {}", key, artifact.location);

        Ok(ModelHandle {
            key: key.clone(),
            location: artifact.location,
            origin: ModelOrigin::Trained,
            regressor,
        })
    }

    /// Upper-cased symbols with at least one stored model, ascending.
    pub async fn list_symbols(&self) -> io::Result<Vec<String>> {
        let symbols: BTreeSet<String> = self
            .store
            .list_keys()
            .await?
            .into_iter()
            .map(|k| k.symbol().to_string())
            .collect();
        Ok(symbols.into_iter().collect())
    }

    async fn load(&self, artifact: ArtifactRef) -> Result<ModelHandle, ForecastError> {
        let corrupt = |reason: String| {
            error!(
                "Stored model for {} at {} is unreadable: {}",
                artifact.key, artifact.location, reason
            );
            ForecastError::ArtifactCorrupt {
                key: artifact.key.clone(),
                location: artifact.location.clone(),
                reason,
            }
        };

        let bytes = self
            .store
            .load(&artifact.key)
            .await
            .map_err(|e| corrupt(e.kind().to_string()))?;
        let regressor = self
            .factory
            .deserialize(&bytes)
            .map_err(|e| corrupt(e.to_string()))?;
        if regressor.window_size() != artifact.key.window_size() {
            return Err(corrupt(format!(
                "built for windows of {} values, expected {}",
                regressor.window_size(),
                artifact.key.window_size()
            )));
        }

        Ok(ModelHandle {
            key: artifact.key,
            location: artifact.location,
            origin: ModelOrigin::Reused,
            regressor,
        })
    }

    fn lock_table(&self) -> MutexGuard<'_, HashMap<ModelKey, KeyLock>> {
        match self.key_locks.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                error!("ModelCache: key lock table poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    fn key_lock(&self, key: &ModelKey) -> KeyLock {
        self.lock_table().entry(key.clone()).or_default().clone()
    }

    /// Drops the table entry once no other request holds or awaits it.
    fn release_key_lock(&self, key: &ModelKey, lock: &KeyLock) {
        let mut locks = self.lock_table();
        let idle = locks
            .get(key)
            .is_some_and(|entry| Arc::ptr_eq(entry, lock) && Arc::strong_count(lock) == 2);
        if idle {
            locks.remove(key);
        }
    }

    fn storage_error(key: &ModelKey, e: &io::Error) -> ForecastError {
        error!("Model storage failed for {}: {}", key, e);
        ForecastError::Storage {
            key: key.clone(),
            reason: e.kind().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ml::regressor_factory::DefaultRegressorFactory;
    use crate::domain::ml::regressor::{ModelKind, TrainParams};
    use crate::infrastructure::persistence::artifact_store::FileArtifactStore;
    use chrono::NaiveDate;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn block(n: usize, window: usize) -> WindowBlock {
        let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        WindowBlock {
            inputs: Array2::from_shape_fn((n, window), |(i, j)| (i + j) as f64 / 50.0),
            targets: Array1::from_iter((0..n).map(|i| (i + window) as f64 / 50.0)),
            target_dates: vec![day; n],
        }
    }

    fn cache(dir: &std::path::Path) -> ModelCache {
        let store = Arc::new(FileArtifactStore::open(dir).unwrap());
        let factory = Arc::new(DefaultRegressorFactory::new(ModelKind::Linear));
        ModelCache::new(store, factory)
    }

    fn counting_trainer(
        counter: Arc<AtomicUsize>,
        window: usize,
    ) -> impl FnOnce(&Array2<f64>, &Array1<f64>) -> Result<Box<dyn Regressor>, ModelError>
    + Send
    + 'static {
        move |x: &Array2<f64>, y: &Array1<f64>| {
            counter.fetch_add(1, Ordering::SeqCst);
            let factory = DefaultRegressorFactory::new(ModelKind::Linear);
            let mut model = factory.create(window);
            model.fit(
                x,
                y,
                &TrainParams {
                    epochs: 5,
                    ..TrainParams::default()
                },
            )?;
            Ok(model)
        }
    }

    #[tokio::test]
    async fn test_second_call_reuses_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache(dir.path());
        let key = ModelKey::new("aapl", 4);
        let trained = Arc::new(AtomicUsize::new(0));

        let first = cache
            .train_or_load(&key, block(20, 4), counting_trainer(trained.clone(), 4))
            .await
            .unwrap();
        let second = cache
            .train_or_load(
                &ModelKey::new("AAPL", 4),
                block(20, 4),
                counting_trainer(trained.clone(), 4),
            )
            .await
            .unwrap();

        assert_eq!(first.origin, ModelOrigin::Trained);
        assert_eq!(second.origin, ModelOrigin::Reused);
        assert_eq!(first.location, second.location);
        assert_eq!(trained.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_resolve_reports_presence() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache(dir.path());
        let key = ModelKey::new("nvda", 4);

        let before = cache.resolve(&key).await.unwrap();
        assert!(!before.exists);

        cache
            .train_or_load(
                &key,
                block(10, 4),
                counting_trainer(Arc::new(AtomicUsize::new(0)), 4),
            )
            .await
            .unwrap();

        let after = cache.resolve(&key).await.unwrap();
        assert!(after.exists);
        assert_eq!(before.location, after.location);
    }

    #[tokio::test]
    async fn test_corrupt_artifact_is_surfaced_not_retrained() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache(dir.path());
        let key = ModelKey::new("msft", 4);
        let path = dir.path().join("msft_ws4.json");
        std::fs::write(&path, b"{\"format_version\":1,\"kind\":\"lin").unwrap();
        let trained = Arc::new(AtomicUsize::new(0));

        let err = cache
            .train_or_load(&key, block(10, 4), counting_trainer(trained.clone(), 4))
            .await
            .unwrap_err();

        assert!(matches!(err, ForecastError::ArtifactCorrupt { .. }));
        assert_eq!(trained.load(Ordering::SeqCst), 0);
        assert_eq!(
            std::fs::read(&path).unwrap(),
            b"{\"format_version\":1,\"kind\":\"lin".to_vec()
        );
    }

    #[tokio::test]
    async fn test_artifact_for_other_window_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache(dir.path());
        let trained = Arc::new(AtomicUsize::new(0));
        cache
            .train_or_load(
                &ModelKey::new("aapl", 10),
                block(20, 10),
                counting_trainer(trained.clone(), 10),
            )
            .await
            .unwrap();
        let misplaced = dir.path().join("aapl_ws4.json");
        std::fs::copy(dir.path().join("aapl_ws10.json"), &misplaced).unwrap();
        let before = std::fs::read(&misplaced).unwrap();

        let err = cache
            .train_or_load(
                &ModelKey::new("AAPL", 4),
                block(20, 4),
                counting_trainer(trained.clone(), 4),
            )
            .await
            .unwrap_err();

        match err {
            ForecastError::ArtifactCorrupt { key, reason, .. } => {
                assert_eq!(key.window_size(), 4);
                assert!(reason.contains("10"), "{}", reason);
            }
            other => panic!("expected ArtifactCorrupt, got {:?}", other),
        }
        assert_eq!(trained.load(Ordering::SeqCst), 1);
        assert_eq!(std::fs::read(&misplaced).unwrap(), before);
    }

    #[tokio::test]
    async fn test_key_locks_are_released() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache(dir.path());
        for window in [4, 5, 6] {
            cache
                .train_or_load(
                    &ModelKey::new("spy", window),
                    block(10, window),
                    counting_trainer(Arc::new(AtomicUsize::new(0)), window),
                )
                .await
                .unwrap();
        }
        let _ = cache
            .train_or_load(&ModelKey::new("spy", 7), block(0, 7), |_, _| {
                Err(ModelError::Training("no training windows".to_string()))
            })
            .await;

        assert!(cache.lock_table().is_empty());
    }

    #[tokio::test]
    async fn test_training_failure_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache(dir.path());
        let key = ModelKey::new("ibm", 4);

        let err = cache
            .train_or_load(&key, block(0, 4), |_, _| {
                Err(ModelError::Training("no training windows".to_string()))
            })
            .await
            .unwrap_err();

        assert!(matches!(err, ForecastError::Model(ModelError::Training(_))));
        assert!(!cache.resolve(&key).await.unwrap().exists);
    }

    #[tokio::test]
    async fn test_list_symbols_sorted_and_unique() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache(dir.path());
        for (symbol, window) in [("tsla", 4), ("aapl", 4), ("aapl", 6)] {
            cache
                .train_or_load(
                    &ModelKey::new(symbol, window),
                    block(12, window),
                    counting_trainer(Arc::new(AtomicUsize::new(0)), window),
                )
                .await
                .unwrap();
        }

        assert_eq!(cache.list_symbols().await.unwrap(), vec!["AAPL", "TSLA"]);
    }
}
