use std::sync::Arc;
use std::time::Instant;

use crate::config::Config;
use crate::kt::engine::KtEngine;

#[derive(Clone)]
pub struct AppState {
    engine: Arc<KtEngine>,
    config: Arc<Config>,
    started_at: Instant,
}

impl AppState {
    pub fn new(engine: Arc<KtEngine>, config: &Config) -> Self {
        Self {
            engine,
            config: Arc::new(config.clone()),
            started_at: Instant::now(),
        }
    }

    pub fn engine(&self) -> &KtEngine {
        &self.engine
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::config::Config;
    use crate::kt::config::KtConfig;
    use crate::kt::engine::KtEngine;
    use crate::services::question_provider::MockQuestionProvider;

    use super::*;

    #[tokio::test]
    async fn clones_share_engine() {
        let cfg = Config::from_env();
        let engine = Arc::new(KtEngine::new(
            KtConfig::default(),
            Arc::new(MockQuestionProvider::default()),
            4,
        )
        .unwrap());
        let state = AppState::new(engine, &cfg);
        let other = state.clone();

        state.engine().create_session(None, None).await.unwrap();
        assert_eq!(other.engine().session_count().await, 1);
        assert_eq!(other.engine().provider_name(), "mock");
        assert_eq!(other.config().port, state.config().port);
    }
}
