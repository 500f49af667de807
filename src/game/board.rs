use std::fmt;
use std::ops::{Deref, DerefMut};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// 棋盘格子数量（3×3，按行优先编号 0-8）。
pub const BOARD_CELLS: usize = 9;
/// 棋盘边长。
pub const BOARD_SIDE: usize = 3;

/// 对局双方。前端约定人类执 X，电脑执 O。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Player {
    #[serde(rename = "X")]
    Human,
    #[serde(rename = "O")]
    Computer,
}

impl Player {
    pub fn opponent(self) -> Player {
        match self {
            Player::Human => Player::Computer,
            Player::Computer => Player::Human,
        }
    }

    pub fn symbol(self) -> char {
        match self {
            Player::Human => 'X',
            Player::Computer => 'O',
        }
    }
}

impl FromStr for Player {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "X" | "x" => Ok(Player::Human),
            "O" | "o" => Ok(Player::Computer),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum BoardError {
    InvalidLength { len: usize },
    InvalidCell { index: usize, value: String },
    CellOutOfRange { index: usize },
    CellOccupied { index: usize },
    TurnOrderViolation { human: usize, computer: usize },
}

impl fmt::Display for BoardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoardError::InvalidLength { len } => {
                write!(f, "board must have {BOARD_CELLS} cells, got {len}")
            }
            BoardError::InvalidCell { index, value } => {
                write!(f, "cell {index} holds unknown symbol {value:?}")
            }
            BoardError::CellOutOfRange { index } => write!(f, "cell {index} is outside the board"),
            BoardError::CellOccupied { index } => write!(f, "cell {index} is already taken"),
            BoardError::TurnOrderViolation { human, computer } => write!(
                f,
                "turns must alternate, found {human} human and {computer} computer marks"
            ),
        }
    }
}

impl std::error::Error for BoardError {}

/// 3×3 棋盘。`None` 表示空格。
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Board {
    cells: [Option<Player>; BOARD_CELLS],
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_cells(cells: [Option<Player>; BOARD_CELLS]) -> Self {
        Self { cells }
    }

    /// 从前端传入的符号数组构建棋盘，`null`、空串视为空格。
    pub fn from_symbols(symbols: &[Option<String>]) -> Result<Self, BoardError> {
        if symbols.len() != BOARD_CELLS {
            return Err(BoardError::InvalidLength { len: symbols.len() });
        }

        let mut board = Board::new();
        for (index, symbol) in symbols.iter().enumerate() {
            let Some(value) = symbol.as_deref() else {
                continue;
            };
            if value.trim().is_empty() {
                continue;
            }
            let player = Player::from_str(value).map_err(|_| BoardError::InvalidCell {
                index,
                value: value.to_string(),
            })?;
            board.cells[index] = Some(player);
        }
        Ok(board)
    }

    pub fn cells(&self) -> &[Option<Player>; BOARD_CELLS] {
        &self.cells
    }

    /// # Panics
    /// 当 `index >= 9` 时 panic，越界属于调用方的编程错误。
    pub fn get(&self, index: usize) -> Option<Player> {
        self.cells[index]
    }

    pub fn is_empty_cell(&self, index: usize) -> bool {
        index < BOARD_CELLS && self.cells[index].is_none()
    }

    pub fn empty_cells(&self) -> Vec<usize> {
        self.cells
            .iter()
            .enumerate()
            .filter_map(|(index, cell)| cell.is_none().then_some(index))
            .collect()
    }

    pub fn is_full(&self) -> bool {
        self.cells.iter().all(Option::is_some)
    }

    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(Option::is_none)
    }

    pub fn count(&self, player: Player) -> usize {
        self.cells
            .iter()
            .filter(|cell| **cell == Some(player))
            .count()
    }

    /// 落子并校验格子合法性。
    pub fn place(&mut self, index: usize, player: Player) -> Result<(), BoardError> {
        if index >= BOARD_CELLS {
            return Err(BoardError::CellOutOfRange { index });
        }
        if self.cells[index].is_some() {
            return Err(BoardError::CellOccupied { index });
        }
        self.cells[index] = Some(player);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.cells = [None; BOARD_CELLS];
    }

    /// 临时落子，返回的守卫在 drop 时撤销该步。
    ///
    /// 搜索中所有分支（包括剪枝提前退出）都依赖这个守卫恢复棋盘。
    pub fn scoped(&mut self, index: usize, player: Player) -> ScopedMove<'_> {
        debug_assert!(self.cells[index].is_none(), "cell {index} is occupied");
        self.cells[index] = Some(player);
        ScopedMove { board: self, index }
    }

    /// 双方落子数之差不得超过 1。
    pub fn integrity_check(&self) -> Result<(), BoardError> {
        let human = self.count(Player::Human);
        let computer = self.count(Player::Computer);
        if human.abs_diff(computer) > 1 {
            return Err(BoardError::TurnOrderViolation { human, computer });
        }
        Ok(())
    }
}

impl TryFrom<Vec<Option<Player>>> for Board {
    type Error = BoardError;

    fn try_from(cells: Vec<Option<Player>>) -> Result<Self, Self::Error> {
        let len = cells.len();
        let cells: [Option<Player>; BOARD_CELLS] = cells
            .try_into()
            .map_err(|_| BoardError::InvalidLength { len })?;
        Ok(Board { cells })
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (row, cells) in self.cells.chunks(BOARD_SIDE).enumerate() {
            if row > 0 {
                f.write_str("/")?;
            }
            for cell in cells {
                let symbol = cell.map(Player::symbol).unwrap_or('.');
                write!(f, "{symbol}")?;
            }
        }
        Ok(())
    }
}

pub struct ScopedMove<'a> {
    board: &'a mut Board,
    index: usize,
}

impl Deref for ScopedMove<'_> {
    type Target = Board;

    fn deref(&self) -> &Board {
        self.board
    }
}

impl DerefMut for ScopedMove<'_> {
    fn deref_mut(&mut self) -> &mut Board {
        self.board
    }
}

impl Drop for ScopedMove<'_> {
    fn drop(&mut self) {
        self.board.cells[self.index] = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const X: Option<Player> = Some(Player::Human);
    const O: Option<Player> = Some(Player::Computer);

    #[test]
    fn scoped_move_is_undone_on_drop() {
        let mut board = Board::from_cells([X, None, None, None, O, None, None, None, None]);
        let before = board;
        {
            let mut child = board.scoped(2, Player::Computer);
            assert_eq!(child.get(2), Some(Player::Computer));
            let grandchild = child.scoped(8, Player::Human);
            assert_eq!(grandchild.count(Player::Human), 2);
        }
        assert_eq!(board, before);
    }

    #[test]
    fn place_rejects_occupied_and_out_of_range_cells() {
        let mut board = Board::new();
        board.place(4, Player::Human).expect("center should be free");
        assert_eq!(
            board.place(4, Player::Computer),
            Err(BoardError::CellOccupied { index: 4 })
        );
        assert_eq!(
            board.place(9, Player::Computer),
            Err(BoardError::CellOutOfRange { index: 9 })
        );
    }

    #[test]
    fn from_symbols_validates_shape_and_symbols() {
        let symbols: Vec<Option<String>> = vec![
            Some("X".into()),
            None,
            Some("".into()),
            None,
            Some("o".into()),
            None,
            None,
            None,
            None,
        ];
        let board = Board::from_symbols(&symbols).expect("symbols should parse");
        assert_eq!(board.get(0), Some(Player::Human));
        assert_eq!(board.get(4), Some(Player::Computer));
        assert_eq!(board.empty_cells(), vec![1, 2, 3, 5, 6, 7, 8]);

        assert_eq!(
            Board::from_symbols(&symbols[..8]),
            Err(BoardError::InvalidLength { len: 8 })
        );

        let mut bad = symbols.clone();
        bad[3] = Some("Z".into());
        assert_eq!(
            Board::from_symbols(&bad),
            Err(BoardError::InvalidCell {
                index: 3,
                value: "Z".into()
            })
        );
    }

    #[test]
    fn integrity_check_flags_skipped_turns() {
        let board = Board::from_cells([X, X, None, None, O, None, None, None, None]);
        assert!(board.integrity_check().is_ok());

        let board = Board::from_cells([X, X, X, None, None, None, None, None, None]);
        assert_eq!(
            board.integrity_check(),
            Err(BoardError::TurnOrderViolation {
                human: 3,
                computer: 0
            })
        );
    }

    #[test]
    fn board_serializes_as_symbol_array() {
        let board = Board::from_cells([X, None, None, None, O, None, None, None, None]);
        let json = serde_json::to_string(&board).expect("board should serialize");
        assert_eq!(json, r#"["X",null,null,null,"O",null,null,null,null]"#);
        assert_eq!(board.to_string(), "X../.O./...");
    }
}
