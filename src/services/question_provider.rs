use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use crate::config::LLMConfig;
use crate::constants::OPTIONS_PER_QUESTION;
use crate::kt::types::{QuestionDraft, Topic};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuestionRequest {
    pub topic: Topic,
    pub mastery: f64,
    pub difficulty: u8,
}

#[derive(Debug, thiserror::Error)]
pub enum QuestionError {
    #[error("question generation is disabled")]
    Disabled,
    #[error("question provider request timed out")]
    Timeout,
    #[error("question provider network error: {0}")]
    Network(String),
    #[error("question provider api error: status={status}, message={message}")]
    ApiError { status: u16, message: String },
    #[error("malformed question provider response: {0}")]
    MalformedResponse(String),
    #[error("generated question failed validation: {0}")]
    Schema(String),
}

impl From<reqwest::Error> for QuestionError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_timeout() {
            QuestionError::Timeout
        } else {
            QuestionError::Network(value.to_string())
        }
    }
}

#[axum::async_trait]
pub trait QuestionProvider: Send + Sync {
    async fn request_question(
        &self,
        request: &QuestionRequest,
    ) -> Result<QuestionDraft, QuestionError>;

    fn name(&self) -> &'static str;
}

pub fn validate_draft(draft: &QuestionDraft) -> Result<(), QuestionError> {
    if draft.text.trim().is_empty() {
        return Err(QuestionError::Schema("text is empty".to_string()));
    }
    if draft.options.len() != OPTIONS_PER_QUESTION {
        return Err(QuestionError::Schema(format!(
            "expected {OPTIONS_PER_QUESTION} options, got {}",
            draft.options.len()
        )));
    }
    if draft.correct_index >= OPTIONS_PER_QUESTION {
        return Err(QuestionError::Schema(format!(
            "correctIndex {} out of range",
            draft.correct_index
        )));
    }
    Ok(())
}

/// Picks the provider for the configured LLM mode.
pub fn build_provider(config: &LLMConfig) -> Arc<dyn QuestionProvider> {
    match (config.enabled, config.mock) {
        (false, _) => Arc::new(DisabledQuestionProvider),
        (true, true) => Arc::new(MockQuestionProvider::default()),
        (true, false) => Arc::new(GeminiQuestionProvider::new(config)),
    }
}

/// Validate LLM configuration at startup.
pub fn validate_config(config: &LLMConfig) -> Result<(), String> {
    if config.enabled && !config.mock {
        if config.api_key.trim().is_empty() {
            return Err("LLM_ENABLED=true and LLM_MOCK=false require LLM_API_KEY".to_string());
        }
        if config.model.trim().is_empty() {
            return Err("LLM_MODEL must not be empty".to_string());
        }
    }
    Ok(())
}

pub struct DisabledQuestionProvider;

#[axum::async_trait]
impl QuestionProvider for DisabledQuestionProvider {
    async fn request_question(
        &self,
        _request: &QuestionRequest,
    ) -> Result<QuestionDraft, QuestionError> {
        Err(QuestionError::Disabled)
    }

    fn name(&self) -> &'static str {
        "disabled"
    }
}

/// Offline provider producing deterministic arithmetic-style drafts.
#[derive(Default)]
pub struct MockQuestionProvider {
    counter: AtomicU64,
}

#[axum::async_trait]
impl QuestionProvider for MockQuestionProvider {
    async fn request_question(
        &self,
        request: &QuestionRequest,
    ) -> Result<QuestionDraft, QuestionError> {
        let n = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        let d = u64::from(request.difficulty);
        let answer = n * d + 7;
        let correct_index = (n % OPTIONS_PER_QUESTION as u64) as usize;

        let options = (0..OPTIONS_PER_QUESTION as u64)
            .map(|i| {
                let offset = i as i64 - correct_index as i64;
                (answer as i64 + offset * (d as i64 + 1)).to_string()
            })
            .collect();

        Ok(QuestionDraft {
            text: format!(
                "【{}】练习题 #{n}（难度 {}/10）：{n} × {d} + 7 = ?",
                request.topic.label(),
                request.difficulty
            ),
            options,
            correct_index,
            explanation: format!("{n} × {d} = {}，再加 7 得 {answer}。", n * d),
            reasoning_for_selection: selection_rationale(request.mastery),
        })
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

fn selection_rationale(mastery: f64) -> String {
    let pct = mastery * 100.0;
    if mastery < 0.4 {
        format!("当前掌握度 {pct:.1}% 较低，侧重基础概念巩固。")
    } else if mastery > 0.7 {
        format!("当前掌握度 {pct:.1}% 较高，提供进阶挑战以探测能力边界。")
    } else {
        format!("当前掌握度 {pct:.1}% 处于中等水平，适度提升难度。")
    }
}

pub fn build_prompt(request: &QuestionRequest) -> String {
    let pct = request.mastery * 100.0;
    format!(
        "为正在学习「{label}」的学生出一道单项选择题。\n\
         学生当前的估计掌握度：{pct:.1}%。\n\
         目标难度：{difficulty}（1 为最基础概念，10 为高难度综合应用）。\n\
         要求：\n\
         1. 题目紧扣该知识点，难度与目标一致；\n\
         2. 恰好 {options} 个选项，correctIndex 为正确选项下标（0-{max_index}）；\n\
         3. explanation 给出简短的解题思路；\n\
         4. reasoningForSelection 用一句话说明为何在掌握度 {pct:.1}% 时选择该难度；\n\
         5. 全部使用简体中文。",
        label = request.topic.label(),
        difficulty = request.difficulty,
        options = OPTIONS_PER_QUESTION,
        max_index = OPTIONS_PER_QUESTION - 1,
    )
}

fn response_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "OBJECT",
        "properties": {
            "text": { "type": "STRING", "description": "题目文本" },
            "options": {
                "type": "ARRAY",
                "items": { "type": "STRING" },
                "description": "4 个选项"
            },
            "correctIndex": { "type": "INTEGER", "description": "正确选项下标 (0-3)" },
            "explanation": { "type": "STRING", "description": "答案解析" },
            "reasoningForSelection": { "type": "STRING", "description": "选择该难度的理由" }
        },
        "required": ["text", "options", "correctIndex", "explanation", "reasoningForSelection"]
    })
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ContentPart>,
}

#[derive(Debug, Deserialize)]
struct ContentPart {
    text: Option<String>,
}

impl GenerateContentResponse {
    fn first_text(&self) -> Option<&str> {
        self.candidates
            .iter()
            .filter_map(|c| c.content.as_ref())
            .flat_map(|c| c.parts.iter())
            .find_map(|p| p.text.as_deref())
            .filter(|t| !t.trim().is_empty())
    }
}

pub fn parse_generated_text(text: &str) -> Result<QuestionDraft, QuestionError> {
    let draft: QuestionDraft = serde_json::from_str(text.trim())
        .map_err(|e| QuestionError::MalformedResponse(e.to_string()))?;
    validate_draft(&draft)?;
    Ok(draft)
}

/// Gemini `generateContent` adapter with a structured JSON response schema.
#[derive(Debug, Clone)]
pub struct GeminiQuestionProvider {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
}

impl GeminiQuestionProvider {
    pub fn new(config: &LLMConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.api_url, self.model)
    }
}

#[axum::async_trait]
impl QuestionProvider for GeminiQuestionProvider {
    async fn request_question(
        &self,
        request: &QuestionRequest,
    ) -> Result<QuestionDraft, QuestionError> {
        let payload = serde_json::json!({
            "contents": [{ "role": "user", "parts": [{ "text": build_prompt(request) }] }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": response_schema(),
            }
        });

        let resp = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(QuestionError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        let bytes = resp.bytes().await?;
        let body: GenerateContentResponse = serde_json::from_slice(&bytes)
            .map_err(|e| QuestionError::MalformedResponse(e.to_string()))?;
        let text = body
            .first_text()
            .ok_or_else(|| QuestionError::MalformedResponse("empty response".to_string()))?;

        parse_generated_text(text)
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}
