use serde::{Deserialize, Serialize};

use super::board::{Board, Player};

/// 构成一条连线的三个格子下标。
pub type Line = [usize; 3];

/// 三行、三列、两条对角线。
pub const WINNING_LINES: [Line; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum Outcome {
    #[default]
    InProgress,
    Draw,
    Win { player: Player, line: Line },
}

impl Outcome {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Outcome::InProgress)
    }

    pub fn winner(&self) -> Option<Player> {
        match self {
            Outcome::Win { player, .. } => Some(*player),
            _ => None,
        }
    }

    pub fn line(&self) -> Option<Line> {
        match self {
            Outcome::Win { line, .. } => Some(*line),
            _ => None,
        }
    }
}

/// 第一条被同一方占满的连线。
pub fn winning_line(board: &Board) -> Option<(Player, Line)> {
    WINNING_LINES.iter().find_map(|&line| {
        let [a, b, c] = line;
        match board.get(a) {
            Some(player) if board.get(b) == Some(player) && board.get(c) == Some(player) => {
                Some((player, line))
            }
            _ => None,
        }
    })
}

/// 判定棋盘状态：获胜、平局或对局继续。每一步落子后都要调用。
pub fn evaluate(board: &Board) -> Outcome {
    if let Some((player, line)) = winning_line(board) {
        return Outcome::Win { player, line };
    }
    if board.is_full() {
        return Outcome::Draw;
    }
    Outcome::InProgress
}
