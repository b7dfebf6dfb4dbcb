pub mod api;
pub mod config;
pub mod db;
pub mod storage;

pub use db::DbPool;

use config::Config;
use std::sync::Arc;

use crate::storage::BlobStore;

pub struct AppState {
    pub config: Config,
    pub db: DbPool,
    pub logos: Arc<dyn BlobStore>,
}

impl AppState {
    pub fn new(config: Config, db: DbPool, logos: Arc<dyn BlobStore>) -> Self {
        Self { config, db, logos }
    }
}
