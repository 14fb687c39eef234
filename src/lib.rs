pub mod backend;
pub mod config;
pub mod database;
pub mod error;
pub mod metrics;
pub mod studio;

pub use backend::{Backend, StudioClient};
pub use config::StudioConfig;
pub use database::{Database, VideoPatch, VideoRecord};
pub use error::AppError;
pub use studio::{Action, Library, LibraryAction, Notice, Severity, Studio};

use std::sync::Arc;

/// Open the local store and backend client described by `config`.
pub fn open(config: &StudioConfig) -> Result<(Arc<Database>, StudioClient), AppError> {
    let db_path = config.database_path();
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db = Database::new(&db_path)?.with_quota(config.storage_quota_bytes);
    log::info!("Video store at {}", db_path.display());

    let client = StudioClient::new(&config.base_url, config.request_timeout())?;
    log::info!("Backend at {}", client.base_url());

    Ok((Arc::new(db), client))
}
