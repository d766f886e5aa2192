use serde::{Deserialize, Serialize};

use super::player::Player;

pub const ROWS: usize = 6;
pub const COLS: usize = 7;
pub const WIN_LENGTH: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Cell {
    Empty,
    One,
    Two,
}

impl Cell {
    pub fn player(self) -> Option<Player> {
        match self {
            Cell::Empty => None,
            Cell::One => Some(Player::One),
            Cell::Two => Some(Player::Two),
        }
    }
}

impl From<Cell> for u8 {
    fn from(cell: Cell) -> u8 {
        match cell {
            Cell::Empty => 0,
            Cell::One => 1,
            Cell::Two => 2,
        }
    }
}

impl TryFrom<u8> for Cell {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Cell::Empty),
            1 => Ok(Cell::One),
            2 => Ok(Cell::Two),
            other => Err(format!("invalid cell value {other}")),
        }
    }
}

/// One of the four directions scanned for a line, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    Horizontal,
    Vertical,
    /// `\`: row and column grow together.
    DiagonalDownRight,
    /// `/`: row grows while column shrinks.
    DiagonalDownLeft,
}

impl Axis {
    pub const ALL: [Axis; 4] = [
        Axis::Horizontal,
        Axis::Vertical,
        Axis::DiagonalDownRight,
        Axis::DiagonalDownLeft,
    ];

    fn delta(self) -> (isize, isize) {
        match self {
            Axis::Horizontal => (0, 1),
            Axis::Vertical => (1, 0),
            Axis::DiagonalDownRight => (1, 1),
            Axis::DiagonalDownLeft => (1, -1),
        }
    }
}

/// The cells that completed a line, for highlighting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinningLine {
    pub player: Player,
    pub axis: Axis,
    pub cells: Vec<(usize, usize)>,
}

/// 6x7 grid. Row 0 is the top, row 5 is the bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "[[Cell; COLS]; ROWS]", try_from = "[[Cell; COLS]; ROWS]")]
pub struct Board {
    cells: [[Cell; COLS]; ROWS],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveError {
    ColumnFull,
    InvalidColumn,
}

impl Board {
    /// Create a new empty board
    pub fn new() -> Self {
        Board {
            cells: [[Cell::Empty; COLS]; ROWS],
        }
    }

    /// Build a board from raw rows, rejecting grids with a filled cell
    /// above an empty one.
    pub fn from_rows(cells: [[Cell; COLS]; ROWS]) -> Result<Self, String> {
        for col in 0..COLS {
            let mut seen_empty_below = false;
            for row in (0..ROWS).rev() {
                match cells[row][col] {
                    Cell::Empty => seen_empty_below = true,
                    _ if seen_empty_below => {
                        return Err(format!("floating disc at row {row}, column {col}"));
                    }
                    _ => {}
                }
            }
        }
        Ok(Board { cells })
    }

    pub fn rows(&self) -> &[[Cell; COLS]; ROWS] {
        &self.cells
    }

    /// Get the cell at a specific position
    pub fn get(&self, row: usize, col: usize) -> Cell {
        self.cells[row][col]
    }

    /// Check if a column is full
    pub fn is_column_full(&self, col: usize) -> bool {
        if col >= COLS {
            return true;
        }
        self.cells[0][col] != Cell::Empty
    }

    /// Lowest empty row in a column (the highest row index), or `None` when
    /// the column is full.
    pub fn lowest_empty_row(&self, col: usize) -> Option<usize> {
        assert!(col < COLS, "column {col} out of range");
        (0..ROWS).rev().find(|&row| self.cells[row][col] == Cell::Empty)
    }

    /// Write a disc without checking legality. The caller resolves the row
    /// through [`Board::lowest_empty_row`].
    pub fn place(&mut self, row: usize, col: usize, player: Player) {
        self.cells[row][col] = player.to_cell();
    }

    /// Empty a cell. Only valid for the topmost disc of a column.
    pub fn clear(&mut self, row: usize, col: usize) {
        self.cells[row][col] = Cell::Empty;
    }

    /// Drop a piece in a column, returns the row where it landed
    pub fn drop_piece(&mut self, col: usize, player: Player) -> Result<usize, MoveError> {
        if col >= COLS {
            return Err(MoveError::InvalidColumn);
        }
        let row = self.lowest_empty_row(col).ok_or(MoveError::ColumnFull)?;
        self.place(row, col, player);
        Ok(row)
    }

    /// Columns that can still take a disc, left to right.
    pub fn legal_columns(&self) -> Vec<usize> {
        (0..COLS).filter(|&col| !self.is_column_full(col)).collect()
    }

    pub fn disc_count(&self) -> usize {
        self.cells
            .iter()
            .flatten()
            .filter(|&&cell| cell != Cell::Empty)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.disc_count() == 0
    }

    /// True when the top row is filled, which under gravity means the whole
    /// board is.
    pub fn check_draw(&self) -> bool {
        self.cells[0].iter().all(|&cell| cell != Cell::Empty)
    }

    /// Check if the disc at (row, col) completes a line. Axes are tried in
    /// [`Axis::ALL`] order and the first one reaching four is reported.
    pub fn check_win(&self, row: usize, col: usize) -> Option<WinningLine> {
        let player = self.get(row, col).player()?;

        Axis::ALL.into_iter().find_map(|axis| {
            let cells = self.line_through(row, col, axis, player);
            (cells.len() >= WIN_LENGTH).then(|| WinningLine {
                player,
                axis,
                cells,
            })
        })
    }

    /// Contiguous same-player cells through (row, col) along one axis,
    /// ordered from the backward end to the forward end.
    fn line_through(
        &self,
        row: usize,
        col: usize,
        axis: Axis,
        player: Player,
    ) -> Vec<(usize, usize)> {
        let (dr, dc) = axis.delta();
        let mut backward = self.run(row, col, -dr, -dc, player);
        backward.reverse();
        backward.push((row, col));
        backward.extend(self.run(row, col, dr, dc, player));
        backward
    }

    fn run(
        &self,
        row: usize,
        col: usize,
        dr: isize,
        dc: isize,
        player: Player,
    ) -> Vec<(usize, usize)> {
        let cell = player.to_cell();
        let mut cells = Vec::new();
        let mut r = row as isize + dr;
        let mut c = col as isize + dc;
        while (0..ROWS as isize).contains(&r)
            && (0..COLS as isize).contains(&c)
            && self.cells[r as usize][c as usize] == cell
        {
            cells.push((r as usize, c as usize));
            r += dr;
            c += dc;
        }
        cells
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Board> for [[Cell; COLS]; ROWS] {
    fn from(board: Board) -> Self {
        board.cells
    }
}

impl TryFrom<[[Cell; COLS]; ROWS]> for Board {
    type Error = String;

    fn try_from(cells: [[Cell; COLS]; ROWS]) -> Result<Self, Self::Error> {
        Board::from_rows(cells)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gravity_holds(board: &Board) -> bool {
        Board::from_rows(*board.rows()).is_ok()
    }

    #[test]
    fn test_new_board_is_empty() {
        let board = Board::new();
        for row in 0..ROWS {
            for col in 0..COLS {
                assert_eq!(board.get(row, col), Cell::Empty);
            }
        }
        assert!(board.is_empty());
    }

    #[test]
    fn test_lowest_empty_row_tracks_stack() {
        let mut board = Board::new();
        assert_eq!(board.lowest_empty_row(2), Some(5));

        for expected in (0..ROWS).rev() {
            let row = board.lowest_empty_row(2).unwrap();
            assert_eq!(row, expected);
            board.place(row, 2, Player::One);
            assert_ne!(board.get(row, 2), Cell::Empty);
            assert!(gravity_holds(&board));
        }

        assert_eq!(board.lowest_empty_row(2), None);
    }

    #[test]
    fn test_drop_piece() {
        let mut board = Board::new();

        let row = board.drop_piece(3, Player::One).unwrap();
        assert_eq!(row, 5);
        assert_eq!(board.get(5, 3), Cell::One);

        let row = board.drop_piece(3, Player::Two).unwrap();
        assert_eq!(row, 4);
        assert_eq!(board.get(4, 3), Cell::Two);
    }

    #[test]
    fn test_column_full() {
        let mut board = Board::new();
        for _ in 0..ROWS {
            board.drop_piece(0, Player::One).unwrap();
        }

        assert!(board.is_column_full(0));
        assert_eq!(board.drop_piece(0, Player::Two), Err(MoveError::ColumnFull));
        assert_eq!(board.legal_columns(), vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_invalid_column() {
        let mut board = Board::new();
        assert_eq!(board.drop_piece(7, Player::One), Err(MoveError::InvalidColumn));
    }

    #[test]
    fn test_horizontal_win_reports_cells() {
        let mut board = Board::new();
        for col in 0..3 {
            board.drop_piece(col, Player::One).unwrap();
        }
        assert!(board.check_win(5, 2).is_none());

        board.drop_piece(3, Player::One).unwrap();
        let line = board.check_win(5, 3).unwrap();
        assert_eq!(line.axis, Axis::Horizontal);
        assert_eq!(line.player, Player::One);
        assert_eq!(line.cells, vec![(5, 0), (5, 1), (5, 2), (5, 3)]);
    }

    #[test]
    fn test_vertical_win() {
        let mut board = Board::new();
        for _ in 0..4 {
            board.drop_piece(3, Player::Two).unwrap();
        }
        let line = board.check_win(2, 3).unwrap();
        assert_eq!(line.axis, Axis::Vertical);
        assert_eq!(line.cells.len(), 4);
    }

    #[test]
    fn test_diagonal_down_left_win() {
        let mut board = Board::new();
        // `/` pattern
        board.drop_piece(0, Player::One).unwrap();

        board.drop_piece(1, Player::Two).unwrap();
        board.drop_piece(1, Player::One).unwrap();

        board.drop_piece(2, Player::Two).unwrap();
        board.drop_piece(2, Player::Two).unwrap();
        board.drop_piece(2, Player::One).unwrap();

        board.drop_piece(3, Player::Two).unwrap();
        board.drop_piece(3, Player::Two).unwrap();
        board.drop_piece(3, Player::Two).unwrap();
        let row = board.drop_piece(3, Player::One).unwrap();

        let line = board.check_win(row, 3).unwrap();
        assert_eq!(line.axis, Axis::DiagonalDownLeft);
        assert_eq!(line.cells, vec![(2, 3), (3, 2), (4, 1), (5, 0)]);
    }

    #[test]
    fn test_diagonal_down_right_win() {
        let mut board = Board::new();
        // `\` pattern
        board.drop_piece(6, Player::One).unwrap();

        board.drop_piece(5, Player::Two).unwrap();
        board.drop_piece(5, Player::One).unwrap();

        board.drop_piece(4, Player::Two).unwrap();
        board.drop_piece(4, Player::Two).unwrap();
        board.drop_piece(4, Player::One).unwrap();

        board.drop_piece(3, Player::Two).unwrap();
        board.drop_piece(3, Player::Two).unwrap();
        board.drop_piece(3, Player::Two).unwrap();
        let row = board.drop_piece(3, Player::One).unwrap();

        let line = board.check_win(row, 3).unwrap();
        assert_eq!(line.axis, Axis::DiagonalDownRight);
    }

    #[test]
    fn test_first_axis_wins_tie() {
        let mut board = Board::new();
        // Columns 0..=2 carry three Two discs under a One disc; column 3
        // holds three One discs. Landing at (2, 3) completes both a
        // horizontal and a vertical line.
        for col in 0..3 {
            for row in 3..ROWS {
                board.place(row, col, Player::Two);
            }
            board.place(2, col, Player::One);
        }
        for row in 3..ROWS {
            board.place(row, 3, Player::One);
        }
        let row = board.lowest_empty_row(3).unwrap();
        assert_eq!(row, 2);
        board.place(row, 3, Player::One);

        let line = board.check_win(row, 3).unwrap();
        assert_eq!(line.axis, Axis::Horizontal);
        assert_eq!(line.cells, vec![(2, 0), (2, 1), (2, 2), (2, 3)]);
    }

    #[test]
    fn test_no_win_with_three() {
        let mut board = Board::new();
        for col in 0..3 {
            board.drop_piece(col, Player::One).unwrap();
        }
        assert!(board.check_win(5, 1).is_none());
    }

    #[test]
    fn test_check_win_on_empty_cell() {
        let board = Board::new();
        assert!(board.check_win(5, 0).is_none());
    }

    #[test]
    fn test_draw_on_full_board_without_lines() {
        let mut board = Board::new();
        // Colours alternate up each column and flip every second column
        // pair, so no four ever line up.
        for col in 0..COLS {
            for row in (0..ROWS).rev() {
                let band = (row + col / 2) % 2;
                let player = if band == 0 { Player::One } else { Player::Two };
                board.place(row, col, player);
            }
        }
        assert!(board.check_draw());
        for row in 0..ROWS {
            for col in 0..COLS {
                assert!(board.check_win(row, col).is_none(), "line at ({row}, {col})");
            }
        }
    }

    #[test]
    fn test_not_draw_until_top_row_full() {
        let mut board = Board::new();
        for col in 0..COLS - 1 {
            for _ in 0..ROWS {
                board.drop_piece(col, Player::One).unwrap();
            }
        }
        assert!(!board.check_draw());
    }

    #[test]
    fn test_serializes_as_number_grid() {
        let mut board = Board::new();
        board.drop_piece(0, Player::Two).unwrap();
        let json = serde_json::to_string(&board).unwrap();
        assert!(json.starts_with("[[0,0,0,0,0,0,0]"));
        assert!(json.ends_with("[2,0,0,0,0,0,0]]"));
    }

    #[test]
    fn test_deserialize_rejects_floating_disc() {
        let mut rows = [[0u8; COLS]; ROWS];
        rows[2][4] = 1;
        let json = serde_json::to_string(&rows).unwrap();
        assert!(serde_json::from_str::<Board>(&json).is_err());
    }
}
