use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::ai::{decide, AiDecision, DifficultyConfig};

use super::board::{Board, BoardError, Player};
use super::rules::{evaluate, Outcome};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SessionConfig {
    pub difficulty: DifficultyConfig,
    pub first_player: Player,
}

impl SessionConfig {
    pub fn new(difficulty: DifficultyConfig) -> Self {
        Self {
            difficulty,
            ..Self::default()
        }
    }

    pub fn with_first_player(mut self, first_player: Player) -> Self {
        self.first_player = first_player;
        self
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            difficulty: crate::ai::Difficulty::Easy.into(),
            first_player: Player::Human,
        }
    }
}

/// 记分牌，新一局不清零。
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Scoreboard {
    pub human: u32,
    pub computer: u32,
    pub draws: u32,
}

impl Scoreboard {
    pub fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Win {
                player: Player::Human,
                ..
            } => self.human += 1,
            Outcome::Win {
                player: Player::Computer,
                ..
            } => self.computer += 1,
            Outcome::Draw => self.draws += 1,
            Outcome::InProgress => {}
        }
    }

    pub fn games(&self) -> u32 {
        self.human + self.computer + self.draws
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum GameEvent {
    RoundStarted { round: u32, first_player: Player },
    MovePlayed { player: Player, index: usize },
    RoundEnded { outcome: Outcome },
    DifficultyChanged { config: DifficultyConfig },
    ScoresReset,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum TurnError {
    GameFinished,
    NotPlayerTurn { expected: Player },
    Board { error: BoardError },
}

impl fmt::Display for TurnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TurnError::GameFinished => f.write_str("the round is already over"),
            TurnError::NotPlayerTurn { expected } => {
                write!(f, "it is {}'s turn", expected.symbol())
            }
            TurnError::Board { error } => write!(f, "{error}"),
        }
    }
}

impl std::error::Error for TurnError {}

impl From<BoardError> for TurnError {
    fn from(error: BoardError) -> Self {
        TurnError::Board { error }
    }
}

/// 对局会话：持有棋盘、轮次、记分牌与当前难度，负责串行化人机回合。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GameSession {
    pub board: Board,
    pub current_player: Player,
    pub active: bool,
    pub outcome: Outcome,
    pub config: SessionConfig,
    pub scoreboard: Scoreboard,
    pub round: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub event_log: Vec<GameEvent>,
}

impl GameSession {
    pub fn new(config: SessionConfig) -> Self {
        let mut session = Self {
            board: Board::new(),
            current_player: config.first_player,
            active: true,
            outcome: Outcome::InProgress,
            config,
            scoreboard: Scoreboard::default(),
            round: 0,
            event_log: Vec::new(),
        };
        session.new_round();
        session
    }

    pub fn is_finished(&self) -> bool {
        !self.active
    }

    pub fn is_human_turn(&self) -> bool {
        self.active && self.current_player == Player::Human
    }

    pub fn difficulty(&self) -> &DifficultyConfig {
        &self.config.difficulty
    }

    fn record_event(&mut self, event: GameEvent) {
        self.event_log.push(event);
    }

    fn ensure_turn(&self, player: Player) -> Result<(), TurnError> {
        if !self.active {
            return Err(TurnError::GameFinished);
        }
        if self.current_player != player {
            return Err(TurnError::NotPlayerTurn {
                expected: self.current_player,
            });
        }
        Ok(())
    }

    /// 落子、判定，终局时结算记分牌，否则交换回合。
    fn play(&mut self, player: Player, index: usize) -> Result<Vec<GameEvent>, TurnError> {
        self.ensure_turn(player)?;
        self.board.place(index, player)?;

        let mut events = vec![GameEvent::MovePlayed { player, index }];

        let outcome = evaluate(&self.board);
        if outcome.is_terminal() {
            self.active = false;
            self.outcome = outcome;
            self.scoreboard.record(&outcome);
            log::info!("round {} ended: {outcome:?} on {}", self.round, self.board);
            events.push(GameEvent::RoundEnded { outcome });
        } else {
            self.current_player = player.opponent();
        }

        self.event_log.extend(events.iter().cloned());
        Ok(events)
    }

    pub fn play_human(&mut self, index: usize) -> Result<Vec<GameEvent>, TurnError> {
        self.play(Player::Human, index)
    }

    /// 应用在别处算好的电脑落点（例如延迟思考后返回的结果）。
    pub fn apply_computer_move(&mut self, index: usize) -> Result<Vec<GameEvent>, TurnError> {
        self.play(Player::Computer, index)
    }

    /// 由难度调制器决定电脑落点并立即应用。
    pub fn play_computer<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
    ) -> Result<(AiDecision, Vec<GameEvent>), TurnError> {
        self.ensure_turn(Player::Computer)?;
        let decision = decide(&self.board, &self.config.difficulty, rng);
        let index = decision.cell.ok_or(TurnError::GameFinished)?;
        let events = self.play(Player::Computer, index)?;
        Ok((decision, events))
    }

    /// 清空棋盘开始新一局，记分牌保留。
    pub fn new_round(&mut self) -> Vec<GameEvent> {
        self.board.clear();
        self.active = true;
        self.outcome = Outcome::InProgress;
        self.current_player = self.config.first_player;
        self.round += 1;
        self.event_log.clear();

        let event = GameEvent::RoundStarted {
            round: self.round,
            first_player: self.config.first_player,
        };
        self.record_event(event.clone());
        vec![event]
    }

    /// 清零记分牌并开始新一局。
    pub fn reset_scores(&mut self) -> Vec<GameEvent> {
        self.scoreboard = Scoreboard::default();
        let mut events = self.new_round();
        self.record_event(GameEvent::ScoresReset);
        events.push(GameEvent::ScoresReset);
        events
    }

    /// 切换难度会放弃当前一局（记分牌保留）。
    pub fn set_difficulty(&mut self, difficulty: DifficultyConfig) -> Vec<GameEvent> {
        self.config.difficulty = difficulty;
        log::info!(
            "difficulty set to {:.0}% random moves",
            difficulty.mistake_probability * 100.0
        );
        let mut events = self.new_round();
        let event = GameEvent::DifficultyChanged { config: difficulty };
        self.record_event(event.clone());
        events.push(event);
        events
    }
}

impl Default for GameSession {
    fn default() -> Self {
        GameSession::new(SessionConfig::default())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnResolution {
    pub session: GameSession,
    pub events: Vec<GameEvent>,
    pub outcome: Outcome,
}

impl TurnResolution {
    pub fn new(session: &GameSession, events: Vec<GameEvent>) -> Self {
        Self {
            session: session.clone(),
            events,
            outcome: session.outcome,
        }
    }
}
