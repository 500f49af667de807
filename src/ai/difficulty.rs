use std::fmt;
use std::str::FromStr;

use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::game::Board;

use super::minimax::{search, SearchStats};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Normal,
    Hard,
    Perfect,
}

impl Difficulty {
    pub const ALL: [Difficulty; 4] = [
        Difficulty::Easy,
        Difficulty::Normal,
        Difficulty::Hard,
        Difficulty::Perfect,
    ];

    /// 每个档位随机走子的概率。
    pub fn mistake_probability(self) -> f64 {
        match self {
            Difficulty::Easy => 0.90,
            Difficulty::Normal => 0.50,
            Difficulty::Hard => 0.15,
            Difficulty::Perfect => 0.0,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Normal => "normal",
            Difficulty::Hard => "hard",
            Difficulty::Perfect => "perfect",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Difficulty {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "easy" | "facil" | "fácil" => Ok(Difficulty::Easy),
            "normal" | "medium" => Ok(Difficulty::Normal),
            "hard" => Ok(Difficulty::Hard),
            // 桌面版的“Difícil”按钮始终走最优解。
            "perfect" | "impossible" | "imposible" | "expert" | "dificil" | "difícil" => {
                Ok(Difficulty::Perfect)
            }
            _ => Err(()),
        }
    }
}

/// 难度配置：只有一个随机失误概率，新增或调整档位无需改动搜索。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct DifficultyConfig {
    pub mistake_probability: f64,
}

impl DifficultyConfig {
    pub fn from_difficulty(difficulty: Difficulty) -> Self {
        Self {
            mistake_probability: difficulty.mistake_probability(),
        }
    }

    /// 自定义概率，截断到 [0, 1]，NaN 视为 0。
    pub fn with_mistake_probability(probability: f64) -> Self {
        let mistake_probability = if probability.is_nan() {
            0.0
        } else {
            probability.clamp(0.0, 1.0)
        };
        Self {
            mistake_probability,
        }
    }

    pub fn is_perfect(&self) -> bool {
        self.mistake_probability <= 0.0
    }
}

impl Default for DifficultyConfig {
    fn default() -> Self {
        DifficultyConfig::from_difficulty(Difficulty::Normal)
    }
}

impl From<Difficulty> for DifficultyConfig {
    fn from(difficulty: Difficulty) -> Self {
        DifficultyConfig::from_difficulty(difficulty)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AiDecision {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cell: Option<usize>,
    /// 本次是否用随机空格替换了最优解。
    pub mistake: bool,
    /// 最优解的搜索分数；随机走子时不搜索。
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evaluation: Option<i32>,
    pub nodes: u64,
    pub cutoffs: u64,
    pub config: DifficultyConfig,
}

impl AiDecision {
    fn idle(config: DifficultyConfig) -> Self {
        Self {
            cell: None,
            mistake: false,
            evaluation: None,
            nodes: 0,
            cutoffs: 0,
            config,
        }
    }
}

/// 按难度决定电脑落点，并附带搜索统计。
pub fn decide<R: Rng + ?Sized>(
    board: &Board,
    config: &DifficultyConfig,
    rng: &mut R,
) -> AiDecision {
    let empty = board.empty_cells();
    if empty.is_empty() {
        return AiDecision::idle(*config);
    }

    let roll: f64 = rng.gen();
    if roll < config.mistake_probability {
        let cell = empty.choose(rng).copied();
        log::debug!("random move {cell:?} on {board} (roll {roll:.3})");
        return AiDecision {
            cell,
            mistake: true,
            ..AiDecision::idle(*config)
        };
    }

    let result = search(board);
    let SearchStats { nodes, cutoffs } = result.stats;
    log::debug!(
        "optimal move {:?} on {board}: score {}, {nodes} nodes, {cutoffs} cutoffs",
        result.best_move,
        result.score
    );
    AiDecision {
        cell: result.best_move,
        mistake: false,
        evaluation: Some(result.score),
        nodes,
        cutoffs,
        config: *config,
    }
}

/// 难度调制器：以配置的概率随机走子，否则返回最优解。
pub fn choose_move<R: Rng + ?Sized>(
    board: &Board,
    config: &DifficultyConfig,
    rng: &mut R,
) -> Option<usize> {
    decide(board, config, rng).cell
}

pub struct AiAgent {
    config: DifficultyConfig,
    rng: SmallRng,
}

impl AiAgent {
    pub fn new(config: DifficultyConfig) -> Self {
        Self {
            config,
            rng: SmallRng::from_entropy(),
        }
    }

    pub fn with_seed(config: DifficultyConfig, seed: u64) -> Self {
        Self {
            config,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    pub fn config(&self) -> &DifficultyConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: DifficultyConfig) {
        self.config = config;
    }

    pub fn decide(&mut self, board: &Board) -> AiDecision {
        decide(board, &self.config, &mut self.rng)
    }

    pub fn choose_move(&mut self, board: &Board) -> Option<usize> {
        self.decide(board).cell
    }
}
