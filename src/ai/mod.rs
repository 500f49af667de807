//! 电脑对手：Minimax 搜索与难度调制。

pub mod difficulty;
pub mod minimax;

pub use difficulty::{choose_move, decide, AiAgent, AiDecision, Difficulty, DifficultyConfig};
pub use minimax::{best_move, minimax, search, SearchResult, SearchStats};
