use std::sync::Arc;

use crate::screening::controller::ScreeningController;
use crate::screening::registry::SessionRegistry;
use crate::store::CandidateStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub controller: ScreeningController,
    /// Same store the controller commits to; read directly by the candidate routes.
    pub store: Arc<dyn CandidateStore>,
    pub sessions: Arc<SessionRegistry>,
}

impl AppState {
    pub fn new(controller: ScreeningController, store: Arc<dyn CandidateStore>) -> Self {
        Self {
            controller,
            store,
            sessions: Arc::new(SessionRegistry::new()),
        }
    }
}
