use job_board::store::SqliteStore;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared by the operational endpoints; the API routers carry their own state.
#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) store: Arc<SqliteStore>,
}

impl AppState {
    /// Ready once the listener is bound and the store answers.
    pub(crate) fn is_ready(&self) -> bool {
        self.readiness.load(Ordering::Relaxed) && self.store.ping().is_ok()
    }
}
