use std::env;
use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;

use std::fmt;

use crate::constants::{
    DEFAULT_GUESS_RATE, DEFAULT_INITIAL_MASTERY, DEFAULT_LEARN_RATE, DEFAULT_MAX_SESSIONS,
    DEFAULT_SLIP_RATE, DEFAULT_STRETCH_PROBABILITY,
};

const DEFAULT_LLM_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_LLM_MODEL: &str = "gemini-2.5-flash";

#[derive(Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub log_level: String,
    pub enable_file_logs: bool,
    pub log_dir: String,
    pub cors_origin: String,
    pub max_sessions: usize,
    pub kt: KtEnvConfig,
    pub llm: LLMConfig,
}

#[derive(Debug, Clone)]
pub struct KtEnvConfig {
    pub initial_mastery: f64,
    pub learn_rate: f64,
    pub slip_rate: f64,
    pub guess_rate: f64,
    pub stretch_probability: f64,
}

impl Default for KtEnvConfig {
    fn default() -> Self {
        Self {
            initial_mastery: DEFAULT_INITIAL_MASTERY,
            learn_rate: DEFAULT_LEARN_RATE,
            slip_rate: DEFAULT_SLIP_RATE,
            guess_rate: DEFAULT_GUESS_RATE,
            stretch_probability: DEFAULT_STRETCH_PROBABILITY,
        }
    }
}

#[derive(Clone)]
pub struct LLMConfig {
    pub enabled: bool,
    pub mock: bool,
    pub api_url: String,
    pub api_key: String,
    pub model: String,
    pub timeout_secs: u64,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("log_level", &self.log_level)
            .field("enable_file_logs", &self.enable_file_logs)
            .field("log_dir", &self.log_dir)
            .field("cors_origin", &self.cors_origin)
            .field("max_sessions", &self.max_sessions)
            .field("kt", &self.kt)
            .field("llm", &self.llm)
            .finish()
    }
}

impl fmt::Debug for LLMConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LLMConfig")
            .field("enabled", &self.enabled)
            .field("mock", &self.mock)
            .field("api_url", &self.api_url)
            .field("api_key", &"***REDACTED***")
            .field("model", &self.model)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            host: env_or_parse("HOST", IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))),
            port: env_or_parse("PORT", 3000_u16),
            log_level: env_or("RUST_LOG", "info"),
            enable_file_logs: env_or_bool("ENABLE_FILE_LOGS", false),
            log_dir: env_or("LOG_DIR", "./logs"),
            cors_origin: env_or("CORS_ORIGIN", "http://localhost:5173"),
            max_sessions: env_or_parse("MAX_SESSIONS", DEFAULT_MAX_SESSIONS),
            kt: KtEnvConfig {
                initial_mastery: env_or_parse("KT_INITIAL_MASTERY", DEFAULT_INITIAL_MASTERY),
                learn_rate: env_or_parse("KT_LEARN_RATE", DEFAULT_LEARN_RATE),
                slip_rate: env_or_parse("KT_SLIP_RATE", DEFAULT_SLIP_RATE),
                guess_rate: env_or_parse("KT_GUESS_RATE", DEFAULT_GUESS_RATE),
                stretch_probability: env_or_parse(
                    "KT_STRETCH_PROBABILITY",
                    DEFAULT_STRETCH_PROBABILITY,
                ),
            },
            llm: LLMConfig {
                enabled: env_or_bool("LLM_ENABLED", true),
                mock: env_or_bool("LLM_MOCK", true),
                api_url: env_or("LLM_API_URL", DEFAULT_LLM_API_URL),
                api_key: env_or("LLM_API_KEY", ""),
                model: env_or("LLM_MODEL", DEFAULT_LLM_MODEL),
                timeout_secs: env_or_parse("LLM_TIMEOUT_SECS", 30_u64),
            },
        }
    }
}

pub fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

pub fn env_or_parse<T>(key: &str, default: T) -> T
where
    T: FromStr + Copy,
{
    match env::var(key) {
        Ok(raw) => match raw.trim().parse::<T>() {
            Ok(v) => v,
            Err(_) => {
                tracing::warn!(
                    key,
                    value = %raw,
                    "Failed to parse env var, using default"
                );
                default
            }
        },
        Err(_) => default,
    }
}

pub fn env_or_bool(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => default,
        },
        Err(_) => default,
    }
}
