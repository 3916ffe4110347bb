use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_GUESS_RATE, DEFAULT_INITIAL_MASTERY, DEFAULT_LEARN_RATE, DEFAULT_SLIP_RATE,
    DEFAULT_STRETCH_PROBABILITY, MASTERY_CEILING, MASTERY_FLOOR, MAX_DIFFICULTY, MIN_DIFFICULTY,
};

/// BKT 参数，进程生命周期内固定
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelConfig {
    pub learn_rate: f64,
    /// Probability of a wrong answer despite mastery.
    pub slip_rate: f64,
    /// Probability of a right answer without mastery.
    pub guess_rate: f64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            learn_rate: DEFAULT_LEARN_RATE,
            slip_rate: DEFAULT_SLIP_RATE,
            guess_rate: DEFAULT_GUESS_RATE,
        }
    }
}

/// 难度选择策略。上浮概率是经验值，保持可配置。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DifficultyPolicy {
    pub stretch_probability: f64,
    pub stretch_step: u8,
    pub min_difficulty: u8,
    pub max_difficulty: u8,
}

impl Default for DifficultyPolicy {
    fn default() -> Self {
        Self {
            stretch_probability: DEFAULT_STRETCH_PROBABILITY,
            stretch_step: 1,
            min_difficulty: MIN_DIFFICULTY,
            max_difficulty: MAX_DIFFICULTY,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KtConfig {
    pub initial_mastery: f64,
    pub model: ModelConfig,
    pub difficulty: DifficultyPolicy,
}

impl Default for KtConfig {
    fn default() -> Self {
        Self {
            initial_mastery: DEFAULT_INITIAL_MASTERY,
            model: ModelConfig::default(),
            difficulty: DifficultyPolicy::default(),
        }
    }
}

fn in_open_unit(v: f64) -> bool {
    v > 0.0 && v < 1.0
}

impl KtConfig {
    pub fn from_env(env_config: &crate::config::KtEnvConfig) -> Self {
        let mut config = Self::default();
        config.initial_mastery = env_config.initial_mastery;
        config.model.learn_rate = env_config.learn_rate;
        config.model.slip_rate = env_config.slip_rate;
        config.model.guess_rate = env_config.guess_rate;
        config.difficulty.stretch_probability = env_config.stretch_probability;
        config
    }

    pub fn validate(&self) -> Result<(), String> {
        if !in_open_unit(self.model.learn_rate) {
            return Err("model.learn_rate must be in (0,1)".to_string());
        }
        if !in_open_unit(self.model.slip_rate) {
            return Err("model.slip_rate must be in (0,1)".to_string());
        }
        if !in_open_unit(self.model.guess_rate) {
            return Err("model.guess_rate must be in (0,1)".to_string());
        }
        if !(MASTERY_FLOOR..=MASTERY_CEILING).contains(&self.initial_mastery) {
            return Err(format!(
                "initial_mastery must be in [{MASTERY_FLOOR},{MASTERY_CEILING}]"
            ));
        }

        if !(0.0..=1.0).contains(&self.difficulty.stretch_probability) {
            return Err("difficulty.stretch_probability must be in [0,1]".to_string());
        }
        if self.difficulty.min_difficulty == 0 {
            return Err("difficulty.min_difficulty must be >= 1".to_string());
        }
        if self.difficulty.min_difficulty > self.difficulty.max_difficulty {
            return Err("difficulty.min_difficulty must be <= max_difficulty".to_string());
        }

        Ok(())
    }
}
