//! Virtual Try-On Serving Gateway
//!
//! Serves garment try-on over HTTP: images are decoded and letterboxed to the
//! backend's canonical resolution, the generative backend is loaded once on
//! first demand, and a deterministic composite stands in whenever the backend
//! cannot produce a result.

pub mod api;
pub mod backend;
pub mod config;
pub mod error;
pub mod gateway;
pub mod imaging;
pub mod pipeline;

pub use error::{AppError, Result};

use std::sync::Arc;

use gateway::TryOnGateway;

/// Application state shared across all handlers
pub struct AppState {
    pub settings: Arc<config::Settings>,
    pub gateway: Arc<TryOnGateway>,
}
