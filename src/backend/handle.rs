//! Process-wide, lazily loaded handle to the generative backend
//!
//! The first `ensure_loaded` call runs the loader; concurrent callers wait on
//! that single attempt. The outcome, success or failure, is kept for the
//! lifetime of the handle. A failed load is never retried.

use async_trait::async_trait;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::OnceCell;
use tracing::{error, info};

use crate::backend::device::DeviceSelection;
use crate::backend::traits::{LoadedBackend, ModelLoader, ModelProvider, Readiness};
use crate::error::AppError;

enum LoadState {
    Ready(LoadedBackend),
    Unavailable(String),
}

impl LoadState {
    fn readiness(&self) -> Readiness {
        match self {
            LoadState::Ready(loaded) => Readiness::Ready(loaded.model.clone()),
            LoadState::Unavailable(reason) => Readiness::Unavailable(reason.clone()),
        }
    }
}

/// Single-flight handle around a [`ModelLoader`]
pub struct BackendHandle {
    loader: Arc<dyn ModelLoader>,
    state: Arc<OnceCell<LoadState>>,
    load_attempts: Arc<AtomicU64>,
}

impl BackendHandle {
    pub fn new(loader: Arc<dyn ModelLoader>) -> Self {
        Self {
            loader,
            state: Arc::new(OnceCell::new()),
            load_attempts: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Number of times the loader has been invoked
    pub fn load_attempts(&self) -> u64 {
        self.load_attempts.load(Ordering::SeqCst)
    }

    /// Device of the loaded model, if any
    pub fn device(&self) -> Option<DeviceSelection> {
        match self.state.get() {
            Some(LoadState::Ready(loaded)) => Some(loaded.device),
            _ => None,
        }
    }

    /// Reason the backend is unavailable, once a load has failed
    pub fn failure(&self) -> Option<String> {
        match self.state.get() {
            Some(LoadState::Unavailable(reason)) => Some(reason.clone()),
            _ => None,
        }
    }
}

async fn load_backend(loader: Arc<dyn ModelLoader>, attempts: Arc<AtomicU64>) -> LoadState {
    attempts.fetch_add(1, Ordering::SeqCst);
    let start = Instant::now();
    info!("Loading try-on backend");

    // A panicking loader counts as a failed load and is cached like one
    let outcome = match AssertUnwindSafe(loader.load()).catch_unwind().await {
        Ok(outcome) => outcome,
        Err(payload) => Err(AppError::BackendUnavailable(format!(
            "backend loader panicked: {}",
            panic_message(payload.as_ref())
        ))),
    };

    match outcome {
        Ok(loaded) => {
            info!(
                model = %loaded.model.name(),
                device = %loaded.device.device,
                precision = %loaded.device.precision,
                elapsed_secs = start.elapsed().as_secs_f64(),
                "Try-on backend loaded"
            );
            LoadState::Ready(loaded)
        }
        Err(e) => {
            error!(
                error = %e,
                elapsed_secs = start.elapsed().as_secs_f64(),
                "Try-on backend failed to load; serving fallback composites until restart"
            );
            LoadState::Unavailable(e.to_string())
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}

#[async_trait]
impl ModelProvider for BackendHandle {
    async fn ensure_loaded(&self) -> Readiness {
        if let Some(state) = self.state.get() {
            return state.readiness();
        }

        // The load runs in its own task so a caller that goes away mid-load
        // cannot abandon the attempt and let a second one start.
        let state = self.state.clone();
        let loader = self.loader.clone();
        let attempts = self.load_attempts.clone();
        let task = tokio::spawn(async move {
            state
                .get_or_init(|| load_backend(loader, attempts))
                .await
                .readiness()
        });

        match task.await {
            Ok(readiness) => readiness,
            Err(e) => Readiness::Unavailable(format!("backend load task failed: {}", e)),
        }
    }

    fn is_ready(&self) -> bool {
        matches!(self.state.get(), Some(LoadState::Ready(_)))
    }

    fn load_attempted(&self) -> bool {
        self.state.initialized()
    }
}
