use std::sync::Arc;

use crate::session::controller::OptimizationController;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Owns the single active optimization session and its stream reader.
    pub controller: Arc<OptimizationController>,
}
