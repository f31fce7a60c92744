use std::sync::Arc;

use crate::config::ServerConfig;

/// Shared application state available to all handlers via `State<AppState>`.
///
/// Cheap to clone: the pool and everything else are reference counted.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: fleetcare_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// Workflow events are published here after their transaction commits.
    pub event_bus: Arc<fleetcare_events::EventBus>,
}
