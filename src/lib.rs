//! 井字棋核心：胜负判定、Alpha-Beta Minimax 电脑对手与难度调制，
//! 通过 wasm-bindgen 导出给前端界面调用。

pub mod ai;
pub mod game;
pub mod utils;

use gloo_timers::future::TimeoutFuture;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use serde::Serialize;
use serde_wasm_bindgen::{from_value, to_value};
use std::str::FromStr;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;
use web_sys::js_sys::Promise;

pub use ai::{
    best_move, choose_move, decide, AiAgent, AiDecision, Difficulty, DifficultyConfig,
    SearchResult, SearchStats,
};
pub use game::{
    evaluate, Board, BoardError, GameEvent, GameSession, Line, Outcome, Player, Scoreboard,
    SessionConfig, TurnError, TurnResolution, WINNING_LINES,
};

#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn start() {
    utils::set_panic_hook();
    utils::init_logging();
    log::info!("tic-tac-toe core ready");
}

fn to_js_error<E: Serialize + std::fmt::Display>(error: E) -> JsValue {
    to_value(&error).unwrap_or_else(|_| JsValue::from_str(&error.to_string()))
}

fn serde_to_js_error<E: std::fmt::Display>(error: E) -> JsValue {
    JsValue::from_str(&error.to_string())
}

/// 前端棋盘：9 个 `null | "X" | "O"`。
fn board_from_js(board: JsValue) -> Result<Board, JsValue> {
    let symbols: Vec<Option<String>> = from_value(board).map_err(JsValue::from)?;
    let board = Board::from_symbols(&symbols).map_err(to_js_error)?;
    board.integrity_check().map_err(to_js_error)?;
    Ok(board)
}

fn difficulty_from_name(name: Option<&str>) -> DifficultyConfig {
    name.and_then(|value| Difficulty::from_str(value).ok())
        .map(DifficultyConfig::from_difficulty)
        .unwrap_or_default()
}

fn parse_difficulty(name: &str) -> Result<Difficulty, String> {
    Difficulty::from_str(name).map_err(|_| format!("unknown difficulty {name:?}"))
}

fn cell_to_js(cell: Option<usize>) -> Option<u32> {
    cell.map(|index| index as u32)
}

#[derive(Serialize)]
struct AiMoveResponse {
    decision: AiDecision,
    #[serde(skip_serializing_if = "Option::is_none")]
    applied: Option<TurnResolution>,
}

#[wasm_bindgen]
pub struct GameEngine {
    session: GameSession,
    rng: SmallRng,
}

#[wasm_bindgen]
impl GameEngine {
    #[wasm_bindgen(constructor)]
    pub fn new(difficulty: Option<String>) -> Result<GameEngine, JsValue> {
        let mut config = SessionConfig::default();
        if let Some(name) = difficulty.as_deref() {
            let difficulty = parse_difficulty(name).map_err(|message| JsValue::from_str(&message))?;
            config.difficulty = difficulty.into();
        }
        Ok(GameEngine {
            session: GameSession::new(config),
            rng: SmallRng::from_entropy(),
        })
    }

    #[wasm_bindgen(js_name = "stateJson")]
    pub fn state_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.session).map_err(serde_to_js_error)
    }

    fn resolution_json(&self, events: Vec<GameEvent>) -> Result<String, JsValue> {
        serde_json::to_string(&TurnResolution::new(&self.session, events))
            .map_err(serde_to_js_error)
    }

    #[wasm_bindgen(js_name = "playHuman")]
    pub fn play_human(&mut self, index: u32) -> Result<String, JsValue> {
        let events = self
            .session
            .play_human(index as usize)
            .map_err(to_js_error)?;
        self.resolution_json(events)
    }

    #[wasm_bindgen(js_name = "playComputer")]
    pub fn play_computer(&mut self) -> Result<String, JsValue> {
        let (decision, events) = self
            .session
            .play_computer(&mut self.rng)
            .map_err(to_js_error)?;
        let response = AiMoveResponse {
            decision,
            applied: Some(TurnResolution::new(&self.session, events)),
        };
        serde_json::to_string(&response).map_err(serde_to_js_error)
    }

    #[wasm_bindgen(js_name = "applyComputerMove")]
    pub fn apply_computer_move(&mut self, index: u32) -> Result<String, JsValue> {
        let events = self
            .session
            .apply_computer_move(index as usize)
            .map_err(to_js_error)?;
        self.resolution_json(events)
    }

    /// 延迟 `delay_ms` 后给出电脑的决定，不修改会话；
    /// 前端随后调用 `applyComputerMove` 落子。
    #[wasm_bindgen(js_name = "thinkMove")]
    pub fn think_move(&self, delay_ms: Option<u32>) -> Promise {
        let board = self.session.board;
        let config = self.session.config.difficulty;
        let delay = delay_ms.unwrap_or(0);

        future_to_promise(async move {
            if delay > 0 {
                TimeoutFuture::new(delay).await;
            }
            let mut agent = AiAgent::new(config);
            let decision = agent.decide(&board);
            let response = AiMoveResponse {
                decision,
                applied: None,
            };
            let json = serde_json::to_string(&response).map_err(serde_to_js_error)?;
            Ok(JsValue::from_str(&json))
        })
    }

    #[wasm_bindgen(js_name = "newRound")]
    pub fn new_round(&mut self) -> Result<String, JsValue> {
        let events = self.session.new_round();
        self.resolution_json(events)
    }

    #[wasm_bindgen(js_name = "resetScores")]
    pub fn reset_scores(&mut self) -> Result<String, JsValue> {
        let events = self.session.reset_scores();
        self.resolution_json(events)
    }

    #[wasm_bindgen(js_name = "setDifficulty")]
    pub fn set_difficulty(&mut self, name: &str) -> Result<String, JsValue> {
        let difficulty = parse_difficulty(name).map_err(|message| JsValue::from_str(&message))?;
        let events = self.session.set_difficulty(difficulty.into());
        self.resolution_json(events)
    }

    #[wasm_bindgen(js_name = "setMistakeProbability")]
    pub fn set_mistake_probability(&mut self, probability: f64) -> Result<String, JsValue> {
        let events = self
            .session
            .set_difficulty(DifficultyConfig::with_mistake_probability(probability));
        self.resolution_json(events)
    }
}

/// 判定棋盘：`{ type: "InProgress" | "Draw" | "Win", player?, line? }`。
#[wasm_bindgen(js_name = "evaluateBoard")]
pub fn evaluate_board(board: JsValue) -> Result<JsValue, JsValue> {
    let board = board_from_js(board)?;
    to_value(&evaluate(&board)).map_err(JsValue::from)
}

/// 电脑的最优落点，棋盘已满时返回 `undefined`。
#[wasm_bindgen(js_name = "bestMove")]
pub fn compute_best_move(board: JsValue) -> Result<Option<u32>, JsValue> {
    let board = board_from_js(board)?;
    Ok(cell_to_js(best_move(&board)))
}

/// 按难度选择电脑落点；未知或缺省难度按 normal 处理。
#[wasm_bindgen(js_name = "chooseMove")]
pub fn compute_ai_move(
    board: JsValue,
    difficulty: Option<String>,
) -> Result<Option<u32>, JsValue> {
    let board = board_from_js(board)?;
    let config = difficulty_from_name(difficulty.as_deref());
    let mut rng = SmallRng::from_entropy();
    Ok(cell_to_js(choose_move(&board, &config, &mut rng)))
}

#[wasm_bindgen(js_name = "winningLines")]
pub fn winning_lines() -> Result<JsValue, JsValue> {
    to_value(&WINNING_LINES).map_err(JsValue::from)
}
