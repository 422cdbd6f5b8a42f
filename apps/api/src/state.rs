use std::sync::Arc;

use crate::catalog::Catalog;
use crate::config::Config;
use crate::recommend::RecommendationEngine;

/// Shared application state injected into all route handlers via Axum
/// extractors. Catalog and engine are read-only; concurrent requests share
/// them without locking.
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<Catalog>,
    pub engine: Arc<RecommendationEngine>,
    /// Client for fetching job-posting URLs. The extraction timeout rides on
    /// each request, not on the client.
    pub http: reqwest::Client,
    pub config: Config,
}
