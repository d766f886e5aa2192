use super::{Board, Player, COLS};

/// Column preference when no immediate win or block exists.
pub const CENTER_OUT: [usize; COLS] = [3, 2, 4, 1, 5, 0, 6];

/// Suggest a column for `player`: an immediate win, else a block of the
/// opponent's immediate win, else the most central open column. `None` when
/// the board is full.
pub fn suggest_move(board: &Board, player: Player) -> Option<usize> {
    winning_column(board, player)
        .or_else(|| winning_column(board, player.other()))
        .or_else(|| CENTER_OUT.into_iter().find(|&col| !board.is_column_full(col)))
}

/// First column, left to right, where dropping `player`'s disc wins at once.
pub fn winning_column(board: &Board, player: Player) -> Option<usize> {
    board.legal_columns().into_iter().find(|&col| {
        let mut probe = *board;
        probe
            .drop_piece(col, player)
            .is_ok_and(|row| probe.check_win(row, col).is_some())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::ROWS;

    #[test]
    fn test_empty_board_prefers_center() {
        assert_eq!(suggest_move(&Board::new(), Player::One), Some(3));
    }

    #[test]
    fn test_takes_immediate_win() {
        let mut board = Board::new();
        for col in 0..3 {
            board.drop_piece(col, Player::One).unwrap();
            board.drop_piece(col, Player::Two).unwrap();
        }
        // One threatens the bottom row at column 3: One takes it, Two blocks it.
        assert_eq!(suggest_move(&board, Player::Two), Some(3));
        assert_eq!(suggest_move(&board, Player::One), Some(3));
    }

    #[test]
    fn test_blocks_opponent() {
        let mut board = Board::new();
        for _ in 0..3 {
            board.drop_piece(5, Player::Two).unwrap();
        }
        board.drop_piece(0, Player::One).unwrap();
        assert_eq!(suggest_move(&board, Player::One), Some(5));
    }

    #[test]
    fn test_skips_full_center() {
        let mut board = Board::new();
        for i in 0..ROWS {
            let player = if i % 2 == 0 { Player::One } else { Player::Two };
            board.drop_piece(3, player).unwrap();
        }
        assert_eq!(suggest_move(&board, Player::One), Some(2));
    }

    #[test]
    fn test_full_board_has_no_suggestion() {
        let mut board = Board::new();
        for col in 0..COLS {
            for row in (0..ROWS).rev() {
                let player = if (row + col / 2) % 2 == 0 { Player::One } else { Player::Two };
                board.place(row, col, player);
            }
        }
        assert_eq!(suggest_move(&board, Player::Two), None);
    }

    #[test]
    fn test_probe_leaves_board_untouched() {
        let board = Board::new();
        let _ = suggest_move(&board, Player::One);
        assert!(board.is_empty());
    }
}
