//! 带 Alpha-Beta 剪枝的完整 Minimax 搜索。
//!
//! 3×3 棋盘最多 9 层，直接穷举整棵博弈树。分数始终站在电脑（O）一方：
//! 电脑获胜 `10 - depth`，人类获胜 `depth - 10`，平局 `0`。
//! 深度项让电脑更早取胜、更晚落败。

use serde::{Deserialize, Serialize};

use crate::game::{evaluate, Board, Outcome, Player};

/// 终局基础分。
pub const WIN_SCORE: i32 = 10;
/// Alpha-Beta 初始窗口的边界，严格大于任何可达分数。
pub const INF: i32 = WIN_SCORE + 1;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchStats {
    pub nodes: u64,
    pub cutoffs: u64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchResult {
    pub best_move: Option<usize>,
    pub score: i32,
    pub stats: SearchStats,
}

/// 终局分数；对局未结束时返回 `None`。
pub fn terminal_score(outcome: &Outcome, depth: u8) -> Option<i32> {
    let depth = i32::from(depth);
    match outcome {
        Outcome::Win {
            player: Player::Computer,
            ..
        } => Some(WIN_SCORE - depth),
        Outcome::Win {
            player: Player::Human,
            ..
        } => Some(depth - WIN_SCORE),
        Outcome::Draw => Some(0),
        Outcome::InProgress => None,
    }
}

/// 递归搜索原语。返回时棋盘与调用前完全一致。
pub fn minimax(board: &mut Board, maximizing: bool, depth: u8, alpha: i32, beta: i32) -> i32 {
    let mut stats = SearchStats::default();
    minimax_rec(board, maximizing, depth, alpha, beta, &mut stats)
}

fn minimax_rec(
    board: &mut Board,
    maximizing: bool,
    depth: u8,
    mut alpha: i32,
    mut beta: i32,
    stats: &mut SearchStats,
) -> i32 {
    stats.nodes += 1;

    if let Some(score) = terminal_score(&evaluate(board), depth) {
        return score;
    }

    let empty = board.empty_cells();
    if empty.is_empty() {
        return 0;
    }

    if maximizing {
        let mut value = -INF;
        for index in empty {
            let score = {
                let mut child = board.scoped(index, Player::Computer);
                minimax_rec(&mut child, false, depth + 1, alpha, beta, stats)
            };
            value = value.max(score);
            alpha = alpha.max(value);
            if beta <= alpha {
                stats.cutoffs += 1;
                break;
            }
        }
        value
    } else {
        let mut value = INF;
        for index in empty {
            let score = {
                let mut child = board.scoped(index, Player::Human);
                minimax_rec(&mut child, true, depth + 1, alpha, beta, stats)
            };
            value = value.min(score);
            beta = beta.min(value);
            if beta <= alpha {
                stats.cutoffs += 1;
                break;
            }
        }
        value
    }
}

/// 根节点驱动：逐个尝试空格，每个候选都用完整窗口评估，
/// 只在分数严格更高时替换，因此同分时下标最小者胜出。
pub fn search(board: &Board) -> SearchResult {
    let mut scratch = *board;
    let mut stats = SearchStats::default();
    let mut best_move = None;
    let mut best_score = -INF;

    for index in scratch.empty_cells() {
        let score = {
            let mut child = scratch.scoped(index, Player::Computer);
            minimax_rec(&mut child, false, 0, -INF, INF, &mut stats)
        };
        if score > best_score {
            best_score = score;
            best_move = Some(index);
        }
    }

    if best_move.is_none() {
        best_score = terminal_score(&evaluate(board), 0).unwrap_or(0);
    }

    SearchResult {
        best_move,
        score: best_score,
        stats,
    }
}

/// 电脑的最优落点；棋盘已满时返回 `None`。
pub fn best_move(board: &Board) -> Option<usize> {
    search(board).best_move
}

#[cfg(test)]
mod tests {
    use super::*;

    const X: Option<Player> = Some(Player::Human);
    const O: Option<Player> = Some(Player::Computer);
    const E: Option<Player> = None;

    /// 不剪枝的参考实现，用来确认剪枝不改变结果。
    fn plain_minimax(board: &mut Board, maximizing: bool, depth: u8) -> i32 {
        if let Some(score) = terminal_score(&evaluate(board), depth) {
            return score;
        }
        let scores = board.empty_cells().into_iter().map(|index| {
            let mover = if maximizing {
                Player::Computer
            } else {
                Player::Human
            };
            let mut child = board.scoped(index, mover);
            plain_minimax(&mut child, !maximizing, depth + 1)
        });
        let scores: Vec<i32> = scores.collect();
        if maximizing {
            scores.into_iter().max().unwrap_or(0)
        } else {
            scores.into_iter().min().unwrap_or(0)
        }
    }

    fn plain_best_move(board: &Board) -> Option<(usize, i32)> {
        let mut scratch = *board;
        let mut best: Option<(usize, i32)> = None;
        for index in scratch.empty_cells() {
            let score = {
                let mut child = scratch.scoped(index, Player::Computer);
                plain_minimax(&mut child, false, 0)
            };
            if best.map_or(true, |(_, best_score)| score > best_score) {
                best = Some((index, score));
            }
        }
        best
    }

    /// 电脑始终走 `best_move`，人类穷举所有应对，断言人类从未获胜。
    fn assert_computer_never_loses(board: &mut Board, to_move: Player) {
        match evaluate(board) {
            Outcome::Win { player, line } => {
                assert_eq!(
                    player,
                    Player::Computer,
                    "human completed {line:?} on {board}"
                );
                return;
            }
            Outcome::Draw => return,
            Outcome::InProgress => {}
        }

        match to_move {
            Player::Computer => {
                let index = best_move(board).expect("open board must have a move");
                assert!(board.is_empty_cell(index), "best move {index} is taken on {board}");
                let mut child = board.scoped(index, Player::Computer);
                assert_computer_never_loses(&mut child, Player::Human);
            }
            Player::Human => {
                for index in board.empty_cells() {
                    let mut child = board.scoped(index, Player::Human);
                    assert_computer_never_loses(&mut child, Player::Computer);
                }
            }
        }
    }

    #[test]
    fn blocks_immediate_human_win() {
        let board = Board::from_cells([X, X, E, E, O, E, E, E, E]);
        assert_eq!(best_move(&board), Some(2));
    }

    #[test]
    fn takes_immediate_win_over_block() {
        // O 可在 5 完成中行，同时 X 威胁 2。
        let board = Board::from_cells([X, X, E, O, O, E, X, E, E]);
        let result = search(&board);
        assert_eq!(result.best_move, Some(5));
        assert_eq!(result.score, WIN_SCORE);
    }

    #[test]
    fn terminal_score_rewards_early_wins_and_late_losses() {
        let computer = Outcome::Win {
            player: Player::Computer,
            line: [0, 1, 2],
        };
        let human = Outcome::Win {
            player: Player::Human,
            line: [0, 1, 2],
        };
        assert_eq!(terminal_score(&computer, 1), Some(9));
        assert!(terminal_score(&computer, 1) > terminal_score(&computer, 3));
        assert_eq!(terminal_score(&human, 2), Some(-8));
        assert!(terminal_score(&human, 4) > terminal_score(&human, 2));
        assert_eq!(terminal_score(&Outcome::Draw, 7), Some(0));
        assert_eq!(terminal_score(&Outcome::InProgress, 0), None);
    }

    #[test]
    fn empty_board_picks_lowest_index_draw() {
        let result = search(&Board::new());
        assert_eq!(result.best_move, Some(0));
        assert_eq!(result.score, 0, "tic-tac-toe is a draw under perfect play");
    }

    #[test]
    fn full_board_has_no_move() {
        let board = Board::from_cells([X, O, X, X, O, O, O, X, X]);
        let result = search(&board);
        assert_eq!(result.best_move, None);
        assert_eq!(result.score, 0);
        assert_eq!(best_move(&board), None);
    }

    #[test]
    fn search_restores_board() {
        let mut board = Board::from_cells([X, E, E, E, O, E, E, E, X]);
        let before = board;
        let _ = minimax(&mut board, true, 0, -INF, INF);
        let _ = minimax(&mut board, false, 0, -INF, INF);
        assert_eq!(board, before);
        let _ = search(&board);
        assert_eq!(board, before);
    }

    #[test]
    fn best_move_is_deterministic() {
        let board = Board::from_cells([X, E, E, E, E, E, E, E, E]);
        let first = search(&board);
        for _ in 0..5 {
            assert_eq!(search(&board), first);
        }
    }

    #[test]
    fn corner_against_center_is_a_draw() {
        let mut board = Board::from_cells([O, E, E, E, X, E, E, E, E]);
        assert_eq!(minimax(&mut board, true, 0, -INF, INF), 0);
        assert_eq!(minimax(&mut board, false, 0, -INF, INF), 0);
        assert_computer_never_loses(&mut board, Player::Computer);
        assert_computer_never_loses(&mut board, Player::Human);
    }

    #[test]
    fn optimal_play_never_loses_from_empty_board() {
        let mut board = Board::new();
        assert_computer_never_loses(&mut board, Player::Human);
        assert_computer_never_loses(&mut board, Player::Computer);
        assert!(board.is_blank());
    }

    #[test]
    fn pruning_matches_plain_minimax() {
        let mut boards = Vec::new();
        for first in 0..9 {
            let mut cells = [E; 9];
            cells[first] = X;
            boards.push(Board::from_cells(cells));
            for second in (0..9).filter(|&index| index != first) {
                let mut cells = cells;
                cells[second] = O;
                let mut cells_next = cells;
                for third in (0..9).filter(|&index| cells[index].is_none()) {
                    cells_next[third] = X;
                    boards.push(Board::from_cells(cells_next));
                    cells_next[third] = None;
                }
            }
        }

        for board in boards {
            let pruned = search(&board);
            let (index, score) = plain_best_move(&board).expect("board has empty cells");
            assert_eq!(pruned.best_move, Some(index), "move differs on {board}");
            assert_eq!(pruned.score, score, "score differs on {board}");
        }
    }

    #[test]
    fn pruning_skips_nodes() {
        let result = search(&Board::new());
        assert!(result.stats.cutoffs > 0);
        // 无剪枝的完整博弈树有 549 945 个节点。
        assert!(result.stats.nodes < 549_945, "visited {}", result.stats.nodes);
    }
}
