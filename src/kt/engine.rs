use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::kt::config::KtConfig;
use crate::kt::session::LearnerSession;
use crate::kt::types::*;
use crate::response::AppError;
use crate::services::question_provider::{QuestionProvider, QuestionRequest};

pub type SessionHandle = Arc<Mutex<LearnerSession>>;

/// Owns the in-memory session registry and drives the
/// answer → update → difficulty → question cycle.
pub struct KtEngine {
    config: KtConfig,
    provider: Arc<dyn QuestionProvider>,
    sessions: RwLock<HashMap<Uuid, SessionHandle>>,
    max_sessions: usize,
}

impl KtEngine {
    /// Fails if `config` does not pass [`KtConfig::validate`].
    pub fn new(
        config: KtConfig,
        provider: Arc<dyn QuestionProvider>,
        max_sessions: usize,
    ) -> Result<Self, String> {
        config.validate()?;
        Ok(Self {
            config,
            provider,
            sessions: RwLock::new(HashMap::new()),
            max_sessions,
        })
    }

    pub fn config(&self) -> &KtConfig {
        &self.config
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn create_session(
        &self,
        seed: Option<u64>,
        topic: Option<Topic>,
    ) -> Result<SessionSummary, AppError> {
        let mut session = LearnerSession::new(&self.config, seed);
        if let Some(topic) = topic {
            session.select_topic(topic);
        }
        let summary = session.summary();
        let id = session.id();

        let mut sessions = self.sessions.write().await;
        if sessions.len() >= self.max_sessions {
            return Err(AppError::service_unavailable(
                "SESSION_LIMIT_REACHED",
                "Too many active sessions",
            ));
        }
        sessions.insert(id, Arc::new(Mutex::new(session)));
        drop(sessions);

        tracing::info!(session_id = %id, seeded = seed.is_some(), "Learner session created");
        Ok(summary)
    }

    pub async fn remove_session(&self, id: Uuid) -> Result<(), AppError> {
        match self.sessions.write().await.remove(&id) {
            Some(_) => {
                tracing::info!(session_id = %id, "Learner session removed");
                Ok(())
            }
            None => Err(AppError::not_found("Session not found")),
        }
    }

    pub async fn session(&self, id: Uuid) -> Result<SessionHandle, AppError> {
        self.sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::not_found("Session not found"))
    }

    pub async fn summary(&self, id: Uuid) -> Result<SessionSummary, AppError> {
        let handle = self.session(id).await?;
        let session = handle.lock().await;
        Ok(session.summary())
    }

    pub async fn select_topic(&self, id: Uuid, topic: Topic) -> Result<SessionSummary, AppError> {
        let handle = self.session(id).await?;
        let mut session = handle.lock().await;
        session.select_topic(topic);
        Ok(session.summary())
    }

    /// Generates the next question for the active topic.
    ///
    /// The session lock is held across the provider call, so at most one
    /// request is outstanding per session and it always sees the latest
    /// committed mastery. On failure the session is left as it was.
    pub async fn next_question(&self, id: Uuid) -> Result<QuestionView, AppError> {
        let handle = self.session(id).await?;
        let mut session = handle.lock().await;

        let topic = session.active_topic();
        let mastery = session.mastery().get(topic).mastery_level;
        let difficulty = session.next_target_difficulty(&self.config.difficulty);
        let request = QuestionRequest {
            topic,
            mastery,
            difficulty,
        };

        let draft = match self.provider.request_question(&request).await {
            Ok(draft) => draft,
            Err(e) => {
                tracing::warn!(
                    session_id = %id,
                    topic = topic.id(),
                    difficulty,
                    provider = self.provider.name(),
                    error = %e,
                    "Question generation failed"
                );
                return Err(AppError::service_unavailable(
                    "QUESTION_UNAVAILABLE",
                    "No question available, please retry",
                ));
            }
        };

        let question = Question::from_draft(draft, topic, difficulty);
        let view = question.view();
        tracing::info!(
            session_id = %id,
            question_id = %question.id,
            topic = topic.id(),
            mastery,
            difficulty,
            "Question issued"
        );
        session.install_question(question);
        Ok(view)
    }

    pub async fn answer(
        &self,
        id: Uuid,
        question_id: Uuid,
        selected_index: usize,
    ) -> Result<AnswerFeedback, AppError> {
        let handle = self.session(id).await?;
        let mut session = handle.lock().await;
        Ok(session.answer_current(question_id, selected_index)?)
    }

    pub async fn observe(
        &self,
        id: Uuid,
        topic: Topic,
        is_correct: bool,
    ) -> Result<AnswerOutcome, AppError> {
        let handle = self.session(id).await?;
        let mut session = handle.lock().await;
        Ok(session.record_observation(topic, is_correct))
    }

    pub async fn mastery_records(&self, id: Uuid) -> Result<Vec<MasteryRecord>, AppError> {
        let handle = self.session(id).await?;
        let session = handle.lock().await;
        Ok(session.mastery().records().to_vec())
    }

    pub async fn mastery_record(&self, id: Uuid, topic: Topic) -> Result<MasteryRecord, AppError> {
        let handle = self.session(id).await?;
        let session = handle.lock().await;
        Ok(session.mastery().get(topic).clone())
    }

    pub async fn step_log(&self, id: Uuid) -> Result<Vec<StepLogEntry>, AppError> {
        let handle = self.session(id).await?;
        let session = handle.lock().await;
        Ok(session.step_log().to_vec())
    }

    pub async fn session_log(&self, id: Uuid) -> Result<Vec<SessionLogEntry>, AppError> {
        let handle = self.session(id).await?;
        let session = handle.lock().await;
        Ok(session.session_log().to_vec())
    }
}
