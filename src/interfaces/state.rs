use std::sync::{Arc, Mutex, MutexGuard};

use tracing::error;

use crate::application::{AuthUseCase, UploadMergeUseCase};
use crate::domain::error::{AppError, Result};
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::storage::ensure_data_dir;
use crate::infrastructure::users::{JsonUserRepository, UserRepository};

pub struct AppState {
    pub config: AppConfig,
    pub workspace: Mutex<UploadMergeUseCase>,
    pub auth: AuthUseCase,
}

impl AppState {
    pub fn new(config: AppConfig, repo: Arc<dyn UserRepository>) -> Result<Self> {
        let workspace = UploadMergeUseCase::from_config(&config)?;
        let auth = AuthUseCase::new(repo, config.auth.clone());

        Ok(Self {
            config,
            workspace: Mutex::new(workspace),
            auth,
        })
    }

    /// Create the data directory and wire the JSON account store into it
    pub async fn bootstrap(config: AppConfig) -> Result<Self> {
        let data_dir = ensure_data_dir(&config.storage.data_dir).await.map_err(|err| {
            error!(
                error = %err,
                data_dir = %config.storage.data_dir.display(),
                "Failed to create data dir"
            );
            err
        })?;

        let repo = Arc::new(JsonUserRepository::new(&data_dir));
        Self::new(config, repo)
    }

    pub fn workspace(&self) -> Result<MutexGuard<'_, UploadMergeUseCase>> {
        self.workspace
            .lock()
            .map_err(|_| AppError::Internal("workspace lock poisoned".to_string()))
    }
}
