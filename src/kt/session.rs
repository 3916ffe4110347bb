use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use uuid::Uuid;

use crate::kt::config::{DifficultyPolicy, KtConfig, ModelConfig};
use crate::kt::difficulty::select_difficulty;
use crate::kt::store::MasteryStore;
use crate::kt::types::*;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("no question is currently active")]
    NoActiveQuestion,
    #[error("question {0} has already been answered")]
    AlreadyAnswered(Uuid),
    #[error("question {answered} is not the question on display ({current})")]
    StaleQuestion { answered: Uuid, current: Uuid },
    #[error("option index {index} is out of range (question has {options} options)")]
    OptionOutOfRange { index: usize, options: usize },
}

#[derive(Debug, Clone)]
struct ActiveQuestion {
    question: Question,
    answered: bool,
}

/// All learner state for one session: mastery, both logs, the active topic,
/// the question on display and the session's random source.
#[derive(Debug)]
pub struct LearnerSession {
    id: Uuid,
    created_at: DateTime<Utc>,
    model: ModelConfig,
    mastery: MasteryStore,
    step_log: Vec<StepLogEntry>,
    session_log: Vec<SessionLogEntry>,
    active_topic: Topic,
    current: Option<ActiveQuestion>,
    rng: StdRng,
}

impl LearnerSession {
    pub fn new(config: &KtConfig, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            model: config.model,
            mastery: MasteryStore::new(config.initial_mastery),
            step_log: Vec::new(),
            session_log: Vec::new(),
            active_topic: Topic::default(),
            current: None,
            rng,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn active_topic(&self) -> Topic {
        self.active_topic
    }

    pub fn select_topic(&mut self, topic: Topic) {
        self.active_topic = topic;
    }

    pub fn mastery(&self) -> &MasteryStore {
        &self.mastery
    }

    pub fn step_log(&self) -> &[StepLogEntry] {
        &self.step_log
    }

    pub fn session_log(&self) -> &[SessionLogEntry] {
        &self.session_log
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.current.as_ref().map(|c| &c.question)
    }

    /// Commits one observed answer: mastery, history, step log and session log
    /// all change together.
    pub fn record_observation(&mut self, topic: Topic, is_correct: bool) -> AnswerOutcome {
        let prior = self.mastery.get(topic).mastery_level;
        let posterior = self
            .mastery
            .apply_update(topic, is_correct, &self.model)
            .mastery_level;
        let delta = posterior - prior;

        let step_index = self.step_log.len() as u64;
        self.step_log.push(StepLogEntry {
            step_index,
            topic,
            is_correct,
            mastery_snapshot: self.mastery.snapshot_all(),
        });
        self.session_log.push(SessionLogEntry {
            topic,
            result: AnswerResult::from(is_correct),
            delta,
        });

        tracing::debug!(
            session_id = %self.id,
            topic = topic.id(),
            is_correct,
            prior,
            posterior,
            step_index,
            "Mastery updated"
        );

        AnswerOutcome {
            topic,
            is_correct,
            prior,
            posterior,
            delta,
            step_index,
        }
    }

    /// Grades `selected_index` against the question on display. `question_id`
    /// must name that question; an answer for any other question is rejected
    /// without touching mastery or the logs.
    pub fn answer_current(
        &mut self,
        question_id: Uuid,
        selected_index: usize,
    ) -> Result<AnswerFeedback, SessionError> {
        let active = self.current.as_mut().ok_or(SessionError::NoActiveQuestion)?;
        if active.question.id != question_id {
            return Err(SessionError::StaleQuestion {
                answered: question_id,
                current: active.question.id,
            });
        }
        if active.answered {
            return Err(SessionError::AlreadyAnswered(active.question.id));
        }
        let options = active.question.options.len();
        if selected_index >= options {
            return Err(SessionError::OptionOutOfRange {
                index: selected_index,
                options,
            });
        }

        active.answered = true;
        let topic = active.question.topic;
        let correct_index = active.question.correct_index;
        let explanation = active.question.explanation.clone();

        let outcome = self.record_observation(topic, selected_index == correct_index);

        Ok(AnswerFeedback {
            question_id,
            selected_index,
            correct_index,
            explanation,
            outcome,
        })
    }

    pub fn next_target_difficulty(&mut self, policy: &DifficultyPolicy) -> u8 {
        let mastery = self.mastery.get(self.active_topic).mastery_level;
        select_difficulty(mastery, policy, &mut self.rng)
    }

    pub fn install_question(&mut self, question: Question) {
        self.current = Some(ActiveQuestion {
            question,
            answered: false,
        });
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            session_id: self.id,
            created_at: self.created_at,
            active_topic: self.active_topic,
            total_answered: self.step_log.len() as u64,
            topics: self
                .mastery
                .records()
                .iter()
                .map(|r| TopicMastery {
                    topic: r.topic,
                    label: r.topic.label().to_string(),
                    mastery_level: r.mastery_level,
                })
                .collect(),
            current_question: self.current.as_ref().map(|c| c.question.view()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(topic: Topic, correct_index: usize) -> Question {
        Question::from_draft(
            QuestionDraft {
                text: "q".to_string(),
                options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
                correct_index,
                explanation: "e".to_string(),
                reasoning_for_selection: "r".to_string(),
            },
            topic,
            3,
        )
    }

    #[test]
    fn correct_observation_scenario() {
        let mut session = LearnerSession::new(&KtConfig::default(), Some(1));
        let outcome = session.record_observation(Topic::Arithmetic, true);

        assert!((outcome.posterior - 0.611).abs() < 1e-3);
        assert!((outcome.delta - (outcome.posterior - 0.15)).abs() < 1e-12);

        let record = session.mastery().get(Topic::Arithmetic);
        assert_eq!(record.history.len(), 2);

        assert_eq!(session.step_log().len(), 1);
        let step = &session.step_log()[0];
        assert_eq!(step.step_index, 0);
        assert!(step.is_correct);
        assert!((step.mastery_snapshot[&Topic::Arithmetic] - 0.611).abs() < 1e-3);
        for topic in Topic::ALL.into_iter().skip(1) {
            assert_eq!(step.mastery_snapshot[&topic], 0.15);
        }

        assert_eq!(session.session_log()[0].result, AnswerResult::Correct);
    }

    #[test]
    fn incorrect_observation_scenario() {
        let mut session = LearnerSession::new(&KtConfig::default(), Some(1));
        let outcome = session.record_observation(Topic::Probability, false);
        assert!((outcome.posterior - 0.216).abs() < 1e-3);
        assert!(outcome.delta > 0.0);
        assert_eq!(session.session_log()[0].result, AnswerResult::Incorrect);
    }

    #[test]
    fn step_indices_increase() {
        let mut session = LearnerSession::new(&KtConfig::default(), None);
        for i in 0..5 {
            let outcome = session.record_observation(Topic::ALL[i % Topic::COUNT], i % 2 == 0);
            assert_eq!(outcome.step_index, i as u64);
        }
        assert_eq!(session.summary().total_answered, 5);
    }

    #[test]
    fn answering_without_question_fails() {
        let mut session = LearnerSession::new(&KtConfig::default(), None);
        assert_eq!(
            session.answer_current(Uuid::new_v4(), 0),
            Err(SessionError::NoActiveQuestion)
        );
        assert!(session.step_log().is_empty());
    }

    #[test]
    fn answer_grades_against_question_topic() {
        let mut session = LearnerSession::new(&KtConfig::default(), None);
        let q = question(Topic::Geometry, 2);
        let id = q.id;
        session.install_question(q);
        session.select_topic(Topic::Algebra);

        let feedback = session.answer_current(id, 2).unwrap();
        assert_eq!(feedback.question_id, id);
        assert!(feedback.outcome.is_correct);
        assert_eq!(feedback.outcome.topic, Topic::Geometry);
        assert_eq!(feedback.correct_index, 2);
        assert!(session.mastery().get(Topic::Geometry).mastery_level > 0.15);
        assert_eq!(session.mastery().get(Topic::Algebra).mastery_level, 0.15);
    }

    #[test]
    fn question_cannot_be_answered_twice() {
        let mut session = LearnerSession::new(&KtConfig::default(), None);
        let q = question(Topic::Arithmetic, 0);
        let id = q.id;
        session.install_question(q);

        session.answer_current(id, 1).unwrap();
        assert_eq!(
            session.answer_current(id, 0),
            Err(SessionError::AlreadyAnswered(id))
        );
        assert_eq!(session.step_log().len(), 1);
    }

    #[test]
    fn out_of_range_option_leaves_state_untouched() {
        let mut session = LearnerSession::new(&KtConfig::default(), None);
        let q = question(Topic::Arithmetic, 0);
        let id = q.id;
        session.install_question(q);

        assert_eq!(
            session.answer_current(id, 4),
            Err(SessionError::OptionOutOfRange { index: 4, options: 4 })
        );
        assert!(session.step_log().is_empty());
        assert!(session.answer_current(id, 0).is_ok());
    }

    #[test]
    fn answer_for_replaced_question_is_rejected() {
        let mut session = LearnerSession::new(&KtConfig::default(), None);
        let first = question(Topic::Arithmetic, 0);
        let first_id = first.id;
        session.install_question(first);
        let second = question(Topic::Arithmetic, 1);
        let second_id = second.id;
        session.install_question(second);

        assert_eq!(
            session.answer_current(first_id, 0),
            Err(SessionError::StaleQuestion {
                answered: first_id,
                current: second_id,
            })
        );
        assert!(session.step_log().is_empty());
        assert!(session.session_log().is_empty());
        assert_eq!(session.mastery().get(Topic::Arithmetic).history.len(), 1);

        let feedback = session.answer_current(second_id, 1).unwrap();
        assert!(feedback.outcome.is_correct);
    }

    #[test]
    fn seeded_sessions_pick_same_difficulties() {
        let policy = DifficultyPolicy::default();
        let mut a = LearnerSession::new(&KtConfig::default(), Some(5));
        let mut b = LearnerSession::new(&KtConfig::default(), Some(5));
        for _ in 0..10 {
            assert_eq!(
                a.next_target_difficulty(&policy),
                b.next_target_difficulty(&policy)
            );
        }
    }

    #[test]
    fn difficulty_follows_active_topic() {
        let policy = DifficultyPolicy {
            stretch_probability: 0.0,
            ..DifficultyPolicy::default()
        };
        let mut session = LearnerSession::new(&KtConfig::default(), Some(5));
        session.record_observation(Topic::Algebra, true);

        assert_eq!(session.next_target_difficulty(&policy), 2);
        session.select_topic(Topic::Algebra);
        assert_eq!(session.next_target_difficulty(&policy), 7);
    }

    #[test]
    fn summary_hides_answer_key() {
        let mut session = LearnerSession::new(&KtConfig::default(), None);
        session.install_question(question(Topic::Arithmetic, 3));
        let json = serde_json::to_value(session.summary()).unwrap();
        assert!(json["currentQuestion"].get("correctIndex").is_none());
        assert_eq!(json["topics"].as_array().unwrap().len(), Topic::COUNT);
    }
}
