use std::sync::Arc;

use crate::config::AppConfig;
use crate::scoring::Aggregator;
use crate::storage::{LocalStaging, StagingStore};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub staging: Arc<dyn StagingStore>,
    pub aggregator: Aggregator,
}

impl AppState {
    pub fn init() -> anyhow::Result<Self> {
        Ok(Self::from_config(AppConfig::from_env()?))
    }

    /// Local staging directory and process-backed scorers, as configured.
    pub fn from_config(config: AppConfig) -> Self {
        let staging = Arc::new(LocalStaging::new(config.upload_dir.clone())) as Arc<dyn StagingStore>;
        let aggregator = Aggregator::from_config(&config.scoring);
        Self::from_parts(Arc::new(config), staging, aggregator)
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        staging: Arc<dyn StagingStore>,
        aggregator: Aggregator,
    ) -> Self {
        Self {
            config,
            staging,
            aggregator,
        }
    }
}
