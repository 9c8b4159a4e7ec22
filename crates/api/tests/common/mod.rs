#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

use draftline_api::config::{ConsumerConfig, ServerConfig, DEFAULT_UPLOAD_MAX_BYTES};
use draftline_api::engine::JobSubmitter;
use draftline_api::router::build_app_router;
use draftline_api::state::AppState;
use draftline_api::storage::UploadStore;
use draftline_api::ws::ConnectionRegistry;
use draftline_core::drawing::{Drawing, DrawingStatus};
use draftline_core::job_key::JobKeyStrategy;
use draftline_core::queue::{
    EnqueueOutcome, JobQueue, QueueError, QueuedJob, ResultDelivery, ResultQueue,
};
use draftline_core::store::{RecordStore, StatusUpdate, StoreError};
use draftline_core::types::{DbId, Timestamp};
use draftline_db::{PgJobQueue, PgRecordStore};

// ---------------------------------------------------------------------------
// In-memory record store
// ---------------------------------------------------------------------------

/// Record store over a `HashMap`, with the same stale-result guard as the
/// database implementation.
#[derive(Default)]
pub struct MemoryStore {
    drawings: Mutex<HashMap<DbId, (Drawing, Option<Timestamp>)>>,
    pub updates: Mutex<Vec<(DbId, DrawingStatus)>>,
    pub fail: AtomicBool,
}

impl MemoryStore {
    pub fn with_drawings(drawings: impl IntoIterator<Item = Drawing>) -> Self {
        let store = Self::default();
        {
            let mut map = store.drawings.lock().unwrap();
            for d in drawings {
                map.insert(d.id, (d, None));
            }
        }
        store
    }

    pub fn status_of(&self, id: DbId) -> Option<DrawingStatus> {
        self.drawings.lock().unwrap().get(&id).map(|(d, _)| d.status)
    }

    pub fn update_count(&self) -> usize {
        self.updates.lock().unwrap().len()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn find_by_id(&self, id: DbId) -> Result<Option<Drawing>, StoreError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(StoreError("store offline".into()));
        }
        Ok(self.drawings.lock().unwrap().get(&id).map(|(d, _)| d.clone()))
    }

    async fn update_status(
        &self,
        id: DbId,
        status: DrawingStatus,
        submitted_at: Option<Timestamp>,
    ) -> Result<StatusUpdate, StoreError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(StoreError("store offline".into()));
        }
        let mut map = self.drawings.lock().unwrap();
        let Some((drawing, started_at)) = map.get_mut(&id) else {
            return Ok(StatusUpdate::NotFound);
        };
        if let (Some(new), Some(current)) = (submitted_at, *started_at) {
            let regresses = drawing.status.is_terminal() && !status.is_terminal();
            if new < current || (new == current && regresses) {
                return Ok(StatusUpdate::Stale);
            }
        }
        drawing.status = status;
        if submitted_at.is_some() {
            *started_at = submitted_at;
        }
        self.updates.lock().unwrap().push((id, status));
        Ok(StatusUpdate::Applied)
    }
}

pub fn drawing(id: DbId, original_url: &str) -> Drawing {
    Drawing {
        id,
        file_name: original_url.to_string(),
        original_url: original_url.to_string(),
        status: DrawingStatus::Pending,
        created_at: chrono::Utc::now(),
    }
}

// ---------------------------------------------------------------------------
// Recording job queue
// ---------------------------------------------------------------------------

/// Job queue that records every enqueue call and keeps one waiting job
/// per key.
#[derive(Default)]
pub struct RecordingQueue {
    pub calls: AtomicUsize,
    pub waiting: Mutex<Vec<QueuedJob>>,
    pub fail: AtomicBool,
}

impl RecordingQueue {
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn waiting(&self) -> Vec<QueuedJob> {
        self.waiting.lock().unwrap().clone()
    }
}

#[async_trait]
impl JobQueue for RecordingQueue {
    async fn enqueue(&self, job: &QueuedJob) -> Result<EnqueueOutcome, QueueError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(QueueError("broker offline".into()));
        }
        let mut waiting = self.waiting.lock().unwrap();
        match waiting.iter_mut().find(|j| j.key == job.key) {
            Some(existing) => {
                *existing = job.clone();
                Ok(EnqueueOutcome::Replaced)
            }
            None => {
                waiting.push(job.clone());
                Ok(EnqueueOutcome::Created)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// In-memory result queue
// ---------------------------------------------------------------------------

/// Result queue backed by a `VecDeque`. Released messages are recorded
/// but not redelivered, so `drain` always terminates.
#[derive(Default)]
pub struct MemoryResultQueue {
    pending: Mutex<VecDeque<ResultDelivery>>,
    next_id: AtomicUsize,
    pub acked: Mutex<Vec<DbId>>,
    pub released: Mutex<Vec<DbId>>,
}

impl MemoryResultQueue {
    pub fn push(&self, payload: serde_json::Value) -> DbId {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) as DbId + 1;
        self.pending.lock().unwrap().push_back(ResultDelivery {
            id,
            payload,
            attempts: 1,
        });
        id
    }

    pub fn acked(&self) -> Vec<DbId> {
        self.acked.lock().unwrap().clone()
    }

    pub fn released(&self) -> Vec<DbId> {
        self.released.lock().unwrap().clone()
    }
}

#[async_trait]
impl ResultQueue for MemoryResultQueue {
    async fn receive(&self) -> Result<Option<ResultDelivery>, QueueError> {
        Ok(self.pending.lock().unwrap().pop_front())
    }

    async fn ack(&self, delivery_id: DbId) -> Result<(), QueueError> {
        self.acked.lock().unwrap().push(delivery_id);
        Ok(())
    }

    async fn release(&self, delivery_id: DbId) -> Result<(), QueueError> {
        self.released.lock().unwrap().push(delivery_id);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// App builders
// ---------------------------------------------------------------------------

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config(upload_dir: PathBuf) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 5,
        upload_dir,
        upload_max_bytes: DEFAULT_UPLOAD_MAX_BYTES,
        job_key_strategy: JobKeyStrategy::PerEntity,
        consumer: ConsumerConfig::default(),
    }
}

/// Build application state backed by the test database.
pub fn test_state(pool: PgPool, upload_dir: PathBuf) -> AppState {
    let config = test_config(upload_dir);
    let submitter = JobSubmitter::new(
        Arc::new(PgRecordStore::new(pool.clone())),
        Arc::new(PgJobQueue::new(pool.clone())),
        config.job_key_strategy,
    );

    AppState {
        pool,
        uploads: Arc::new(UploadStore::new(config.upload_dir.clone())),
        config: Arc::new(config),
        registry: Arc::new(ConnectionRegistry::new()),
        submitter: Arc::new(submitter),
    }
}

/// Build the full application router, exactly as `main.rs` does.
pub fn build_test_app(state: AppState) -> Router {
    let config = state.config.clone();
    build_app_router(state, &config)
}

// ---------------------------------------------------------------------------
// HTTP helpers
// ---------------------------------------------------------------------------

pub async fn send(app: Router, request: Request<Body>) -> Response<Body> {
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Request::get(uri).body(Body::empty()).unwrap()).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    let request = Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
