//! 游戏核心逻辑：棋盘、胜负判定与对局会话。

pub mod board;
pub mod rules;
pub mod state;

pub use board::{Board, BoardError, Player, ScopedMove, BOARD_CELLS, BOARD_SIDE};
pub use rules::{evaluate, winning_line, Line, Outcome, WINNING_LINES};
pub use state::{GameEvent, GameSession, Scoreboard, SessionConfig, TurnError, TurnResolution};
