/// 掌握度下限，避免退化为绝对确定
pub const MASTERY_FLOOR: f64 = 0.01;

/// 掌握度上限
pub const MASTERY_CEILING: f64 = 0.99;

/// 新会话中每个知识点的初始掌握度
pub const DEFAULT_INITIAL_MASTERY: f64 = 0.15;

/// BKT 学习率（迁移概率）
pub const DEFAULT_LEARN_RATE: f64 = 0.20;

/// BKT 失误率
pub const DEFAULT_SLIP_RATE: f64 = 0.10;

/// BKT 猜对率
pub const DEFAULT_GUESS_RATE: f64 = 0.15;

/// 题目难度下限
pub const MIN_DIFFICULTY: u8 = 1;

/// 题目难度上限
pub const MAX_DIFFICULTY: u8 = 10;

/// 难度上浮概率（"合意困难"偏置）
pub const DEFAULT_STRETCH_PROBABILITY: f64 = 0.7;

/// 每道题的选项数量
pub const OPTIONS_PER_QUESTION: usize = 4;

/// 内存中同时存在的最大会话数
pub const DEFAULT_MAX_SESSIONS: usize = 1_000;
