use chrono::{DateTime, Utc};

use crate::config::Config;
use crate::rooms::RoomTable;

/// Shared application state available to all request handlers via Axum's `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: Config,
    pub rooms: RoomTable,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Build fresh state around an empty room table.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            rooms: RoomTable::new(),
            started_at: Utc::now(),
        }
    }
}
