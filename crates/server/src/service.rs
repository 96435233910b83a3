//! # Box Office Service
//!
//! Serving façade around a trained pipeline:
//! 1. `retrain` loads a corpus and trains on a blocking thread
//! 2. A fully trained pipeline is swapped in atomically
//! 3. `predict` clones the current `Arc` and predicts without holding the lock
//!
//! A failed or cancelled retrain leaves the previously published pipeline
//! in place. Retrains run one at a time, in call order, so a slow earlier
//! run can never overwrite a newer pipeline.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

use data_loader::RawMovieRecord;
use pipeline::{train_from_corpus, CancelToken, PipelineError, PredictError, Prediction, TrainedPipeline, TrainingConfig};

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("No trained pipeline has been published yet")]
    NotTrained,

    #[error("Prediction failed: {0}")]
    Predict(#[from] PredictError),

    #[error("Training failed: {0}")]
    Training(#[from] PipelineError),

    #[error("Training task panicked or was aborted: {0}")]
    Join(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, ServiceError>;

pub struct BoxOfficeService {
    config: TrainingConfig,
    current: RwLock<Option<Arc<TrainedPipeline>>>,
    cancel: Mutex<CancelToken>,
    // Held for the whole of a retrain
    retrain_lock: Mutex<()>,
}

impl BoxOfficeService {
    /// Create a service with nothing published
    pub fn new(config: TrainingConfig) -> Self {
        Self {
            config,
            current: RwLock::new(None),
            cancel: Mutex::new(CancelToken::new()),
            retrain_lock: Mutex::new(()),
        }
    }

    /// Create a service that starts with an already trained pipeline
    pub fn with_pipeline(config: TrainingConfig, pipeline: Arc<TrainedPipeline>) -> Self {
        Self {
            config,
            current: RwLock::new(Some(pipeline)),
            cancel: Mutex::new(CancelToken::new()),
            retrain_lock: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// The published pipeline, if any
    pub async fn current(&self) -> Option<Arc<TrainedPipeline>> {
        self.current.read().await.clone()
    }

    /// Replace the published pipeline
    pub async fn publish(&self, pipeline: Arc<TrainedPipeline>) {
        *self.current.write().await = Some(pipeline);
    }

    /// Train on a corpus file and publish the result.
    ///
    /// Training runs under `spawn_blocking` with a fresh cancel token. The
    /// new pipeline is published only on success. Concurrent calls queue
    /// behind the running one.
    pub async fn retrain(&self, corpus_path: impl Into<PathBuf>) -> Result<Arc<TrainedPipeline>> {
        let path = corpus_path.into();
        let _running = self.retrain_lock.lock().await;
        let token = {
            let mut guard = self.cancel.lock().await;
            *guard = CancelToken::new();
            guard.clone()
        };

        let start = Instant::now();
        info!(path = %path.display(), "Retraining");
        let config = self.config.clone();
        let outcome = tokio::task::spawn_blocking(move || train_from_corpus(&path, &config, &token)).await?;

        let pipeline = match outcome {
            Ok(pipeline) => Arc::new(pipeline),
            Err(e) => {
                warn!(error = %e, "Retrain failed; keeping the current pipeline");
                return Err(e.into());
            }
        };

        self.publish(pipeline.clone()).await;
        info!(
            n_estimators = pipeline.report().n_estimators,
            test_r2 = pipeline.report().test_r2,
            "Published new pipeline in {:.2?}",
            start.elapsed()
        );
        Ok(pipeline)
    }

    /// Ask the running retrain to stop after its current candidates
    pub async fn cancel_training(&self) {
        self.cancel.lock().await.cancel();
        info!("Cancellation requested");
    }

    /// Predict with whatever pipeline is published right now
    pub async fn predict(&self, raw: &RawMovieRecord) -> Result<Prediction> {
        let pipeline = self.current().await.ok_or(ServiceError::NotTrained)?;
        Ok(pipeline.predict(raw)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use data_loader::Field;
    use pipeline::CandidateSizes;
    use std::path::Path;

    fn fixture_path() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("../pipeline/tests/fixtures/sample_corpus.csv")
    }

    fn test_config() -> TrainingConfig {
        TrainingConfig::default()
            .with_test_fraction(0.25)
            .with_candidates(CandidateSizes::List(vec![1, 5, 10]))
    }

    fn request() -> RawMovieRecord {
        RawMovieRecord::new()
            .with(Field::Title, "Clannad")
            .with(Field::Category, "爱情,校园")
            .with(Field::Country, "日本")
            .with(Field::Year, "2007")
            .with(Field::Month, "9")
            .with(Field::Day, "15")
            .with(Field::Length, "120")
            .with(Field::Rating, "9.9")
            .with(Field::RatingCount, "1234567")
            .with(Field::WishCount, "1234567")
            .with(Field::FirstDayBox, "11111111")
            .with(Field::FirstWeekBox, "22222222")
    }

    #[tokio::test]
    async fn test_predict_before_training() {
        let service = BoxOfficeService::new(test_config());
        let err = service.predict(&request()).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotTrained));
    }

    #[tokio::test]
    async fn test_retrain_publishes() {
        let service = BoxOfficeService::new(test_config());
        let trained = service.retrain(fixture_path()).await.unwrap();

        let current = service.current().await.unwrap();
        assert!(Arc::ptr_eq(&trained, &current));

        let prediction = service.predict(&request()).await.unwrap();
        assert_eq!(prediction.value, trained.predict(&request()).unwrap().value);
    }

    #[tokio::test]
    async fn test_failed_retrain_keeps_previous_pipeline() {
        let service = BoxOfficeService::new(test_config());
        let first = service.retrain(fixture_path()).await.unwrap();

        let err = service.retrain("does/not/exist.csv").await.unwrap_err();
        assert!(matches!(err, ServiceError::Training(PipelineError::Load(_))));

        let current = service.current().await.unwrap();
        assert!(Arc::ptr_eq(&first, &current));
    }

    #[tokio::test]
    async fn test_cancel_does_not_poison_next_retrain() {
        let service = BoxOfficeService::new(test_config());
        service.cancel_training().await;

        // The next retrain starts with a fresh token
        assert!(service.retrain(fixture_path()).await.is_ok());
    }

    #[tokio::test]
    async fn test_concurrent_retrains_publish_in_call_order() {
        let service = BoxOfficeService::new(test_config());

        let (first, second) = tokio::join!(
            service.retrain(fixture_path()),
            service.retrain(fixture_path())
        );
        let (first, second) = (first.unwrap(), second.unwrap());
        assert!(!Arc::ptr_eq(&first, &second));

        let current = service.current().await.unwrap();
        assert!(Arc::ptr_eq(&second, &current));
    }
}
