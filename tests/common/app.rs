use std::sync::Arc;

use axum::Router;

use cognitrace_backend::config::{Config, KtEnvConfig, LLMConfig};
use cognitrace_backend::kt::config::KtConfig;
use cognitrace_backend::kt::engine::KtEngine;
use cognitrace_backend::kt::types::QuestionDraft;
use cognitrace_backend::routes::build_router;
use cognitrace_backend::services::question_provider::{
    MockQuestionProvider, QuestionError, QuestionProvider, QuestionRequest,
};
use cognitrace_backend::state::AppState;

pub struct TestApp {
    pub app: Router,
    pub state: AppState,
    pub config: Config,
}

// 直接构造 Config，避免使用 set_var 造成多线程测试环境变量竞态
fn test_config(max_sessions: usize) -> Config {
    Config {
        host: std::net::IpAddr::V4(std::net::Ipv4Addr::new(127, 0, 0, 1)),
        port: 3000,
        log_level: "info".to_string(),
        enable_file_logs: false,
        log_dir: "./logs".to_string(),
        cors_origin: "http://localhost:5173".to_string(),
        max_sessions,
        kt: KtEnvConfig::default(),
        llm: LLMConfig {
            enabled: true,
            mock: true,
            api_url: String::new(),
            api_key: String::new(),
            model: String::new(),
            timeout_secs: 30,
        },
    }
}

fn spawn(provider: Arc<dyn QuestionProvider>, max_sessions: usize) -> TestApp {
    let config = test_config(max_sessions);
    let engine = Arc::new(KtEngine::new(
        KtConfig::from_env(&config.kt),
        provider,
        config.max_sessions,
    )
    .expect("valid test config"));
    let state = AppState::new(engine, &config);
    let app = build_router(state.clone());

    TestApp { app, state, config }
}

pub async fn spawn_test_app() -> TestApp {
    spawn(Arc::new(MockQuestionProvider::default()), 100)
}

pub async fn spawn_with_provider(provider: Arc<dyn QuestionProvider>) -> TestApp {
    spawn(provider, 100)
}

pub async fn spawn_with_session_limit(max_sessions: usize) -> TestApp {
    spawn(Arc::new(MockQuestionProvider::default()), max_sessions)
}

/// Always answers with option `correct_index`.
pub struct ScriptedProvider {
    pub correct_index: usize,
}

#[axum::async_trait]
impl QuestionProvider for ScriptedProvider {
    async fn request_question(
        &self,
        request: &QuestionRequest,
    ) -> Result<QuestionDraft, QuestionError> {
        Ok(QuestionDraft {
            text: format!("{} 难度 {}", request.topic.label(), request.difficulty),
            options: vec!["A".into(), "B".into(), "C".into(), "D".into()],
            correct_index: self.correct_index,
            explanation: "见课本".to_string(),
            reasoning_for_selection: format!("mastery {:.3}", request.mastery),
        })
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

pub struct FailingProvider;

#[axum::async_trait]
impl QuestionProvider for FailingProvider {
    async fn request_question(
        &self,
        _request: &QuestionRequest,
    ) -> Result<QuestionDraft, QuestionError> {
        Err(QuestionError::Timeout)
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}
