use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Side length of the board. Fixed; the engine never resizes.
pub const SIZE: usize = 4;

/// The tile that wins the game. Matched exactly, not as a lower bound.
pub const WIN_TILE: Tile = 2048;

/// Largest tile a 4x4 game can reach. Boards never hold anything bigger, and
/// two of these never merge, so tile arithmetic cannot overflow.
pub const MAX_TILE: Tile = 1 << 17;

/// Probability that a spawned tile is a 4 rather than a 2.
pub const SPAWN_FOUR_PROBABILITY: f64 = 0.1;

pub type Tile = u32;
pub type Score = u64;
type Rows = [[Tile; SIZE]; SIZE];

/// A direction to move/merge tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Move {
    Up,
    Down,
    Left,
    Right,
}

impl Move {
    pub const ALL: [Move; 4] = [Move::Up, Move::Down, Move::Left, Move::Right];
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Move::Up => "up",
            Move::Down => "down",
            Move::Left => "left",
            Move::Right => "right",
        };
        f.write_str(name)
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum BoardError {
    #[error("invalid tile {value} at row {row}, col {col}: must be 0 or a power of two >= 2")]
    InvalidTile { row: usize, col: usize, value: Tile },
    #[error("tile {value} at row {row}, col {col} exceeds the maximum of {}", MAX_TILE)]
    TileTooLarge { row: usize, col: usize, value: Tile },
}

/// Outcome of a directional move, before any tile is spawned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveResult {
    pub board: Board,
    /// Sum of the tiles created by merges during this move.
    pub score: Score,
    /// True iff any cell differs from the input board.
    pub moved: bool,
}

/// A 4x4 2048 board, row-major, 0 for empty cells.
///
/// Boards are plain values: every operation returns a new board and never
/// mutates the receiver, so a session can compare or keep old boards freely.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "Rows", into = "Rows")]
pub struct Board(Rows);

impl Board {
    /// A constant empty board (all zeros).
    pub const EMPTY: Board = Board([[0; SIZE]; SIZE]);

    /// Build a board from rows, checking that every cell is 0 or 2^k
    /// (1 <= k <= 17).
    ///
    /// ```
    /// use game_2048::engine::Board;
    /// assert!(Board::from_rows([[2, 0, 0, 0], [0; 4], [0; 4], [0; 4]]).is_ok());
    /// assert!(Board::from_rows([[3, 0, 0, 0], [0; 4], [0; 4], [0; 4]]).is_err());
    /// ```
    pub fn from_rows(rows: [[Tile; SIZE]; SIZE]) -> Result<Self, BoardError> {
        for (row, cells) in rows.iter().enumerate() {
            for (col, &value) in cells.iter().enumerate() {
                if value == 1 || (value != 0 && !value.is_power_of_two()) {
                    return Err(BoardError::InvalidTile { row, col, value });
                }
                if value > MAX_TILE {
                    return Err(BoardError::TileTooLarge { row, col, value });
                }
            }
        }
        Ok(Board(rows))
    }

    /// Borrow the rows of this board.
    #[inline]
    pub fn rows(&self) -> &[[Tile; SIZE]; SIZE] { &self.0 }

    /// Value at (`row`, `col`); 0 if empty.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> Tile { self.0[row][col] }

    /// All cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = Tile> + '_ {
        self.0.iter().flat_map(|row| row.iter().copied())
    }

    /// Slide and merge tiles in `dir` without spawning.
    ///
    /// ```
    /// use game_2048::engine::{Board, Move};
    /// let b = Board::from_rows([[2, 2, 0, 0], [0; 4], [0; 4], [0; 4]]).unwrap();
    /// let r = b.shift(Move::Left);
    /// assert_eq!(r.board.rows()[0], [4, 0, 0, 0]);
    /// assert_eq!(r.score, 4);
    /// assert!(r.moved);
    /// ```
    pub fn shift(self, dir: Move) -> MoveResult {
        let (board, score) = match dir {
            Move::Left => shift_rows(self, false),
            Move::Right => shift_rows(self, true),
            Move::Up => {
                let (b, s) = shift_rows(transpose(self), false);
                (transpose(b), s)
            }
            Move::Down => {
                let (b, s) = shift_rows(transpose(self), true);
                (transpose(b), s)
            }
        };
        MoveResult { board, score, moved: board != self }
    }

    /// Place a 2 (90%) or 4 (10%) in a uniformly chosen empty cell.
    ///
    /// A full board comes back unchanged.
    ///
    /// ```
    /// use game_2048::engine::Board;
    /// use rand::{SeedableRng, rngs::StdRng};
    /// let mut rng = StdRng::seed_from_u64(123);
    /// let b = Board::EMPTY.with_random_tile(&mut rng).with_random_tile(&mut rng);
    /// assert_eq!(b.count_empty(), 14);
    /// ```
    pub fn with_random_tile<R: Rng + ?Sized>(self, rng: &mut R) -> Self {
        let empty: Vec<(usize, usize)> = (0..SIZE)
            .flat_map(|r| (0..SIZE).map(move |c| (r, c)))
            .filter(|&(r, c)| self.0[r][c] == 0)
            .collect();
        if empty.is_empty() {
            return self;
        }
        let (row, col) = empty[rng.gen_range(0..empty.len())];
        let mut next = self.0;
        next[row][col] = generate_random_tile(rng);
        Board(next)
    }

    /// True iff some cell holds exactly [`WIN_TILE`].
    #[inline]
    pub fn is_won(self) -> bool { check_win(self) }

    /// True iff no move in any direction can change the board.
    #[inline]
    pub fn is_game_over(self) -> bool { check_game_over(self) }

    /// Return the highest tile value present (0 for an empty board).
    #[inline]
    pub fn highest_tile(self) -> Tile { self.cells().max().unwrap_or(0) }

    /// Count the number of empty cells on the board.
    #[inline]
    pub fn count_empty(self) -> usize { self.cells().filter(|&v| v == 0).count() }

    /// Sum of all tile values.
    #[inline]
    pub fn tile_sum(self) -> u64 { self.cells().map(u64::from).sum() }
}

impl TryFrom<Rows> for Board {
    type Error = BoardError;
    fn try_from(rows: Rows) -> Result<Self, Self::Error> { Board::from_rows(rows) }
}

impl From<Board> for Rows {
    fn from(b: Board) -> Self { b.0 }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Board({:?})", self.0)
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let divider = "-".repeat(SIZE * 8 - 1);
        for (idx, row) in self.0.iter().enumerate() {
            if idx > 0 {
                writeln!(f, "{divider}")?;
            }
            let cells: Vec<String> = row.iter().map(|&v| format_val(v)).collect();
            writeln!(f, "{}", cells.join("|"))?;
        }
        Ok(())
    }
}

/// A 4x4 board of zeros.
pub fn create_empty_board() -> Board { Board::EMPTY }

/// Empty board with two tiles spawned in sequence.
pub fn initialize_board<R: Rng + ?Sized>(rng: &mut R) -> Board {
    Board::EMPTY.with_random_tile(rng).with_random_tile(rng)
}

/// See [`Board::with_random_tile`].
pub fn spawn_tile<R: Rng + ?Sized>(board: Board, rng: &mut R) -> Board {
    board.with_random_tile(rng)
}

pub fn move_left(board: Board) -> MoveResult { board.shift(Move::Left) }

pub fn move_right(board: Board) -> MoveResult { board.shift(Move::Right) }

pub fn move_up(board: Board) -> MoveResult { board.shift(Move::Up) }

pub fn move_down(board: Board) -> MoveResult { board.shift(Move::Down) }

/// True iff any cell equals [`WIN_TILE`]. A 4096 alone does not count.
pub fn check_win(board: Board) -> bool {
    board.cells().any(|v| v == WIN_TILE)
}

/// True iff an empty cell exists or two orthogonal neighbours are equal and
/// below [`MAX_TILE`].
pub fn can_move(board: Board) -> bool {
    let b = board.0;
    if board.cells().any(|v| v == 0) {
        return true;
    }
    for r in 0..SIZE {
        for c in 0..SIZE {
            let current = b[r][c];
            if current >= MAX_TILE {
                continue;
            }
            if c + 1 < SIZE && b[r][c + 1] == current {
                return true;
            }
            if r + 1 < SIZE && b[r + 1][c] == current {
                return true;
            }
        }
    }
    false
}

pub fn check_game_over(board: Board) -> bool { !can_move(board) }

/// Swap rows and columns. Self-inverse.
pub fn transpose(board: Board) -> Board {
    let mut out = [[0; SIZE]; SIZE];
    for (r, row) in board.0.iter().enumerate() {
        for (c, &v) in row.iter().enumerate() {
            out[c][r] = v;
        }
    }
    Board(out)
}

/// Compact one row toward index 0, merging equal neighbours once each.
/// A pair of [`MAX_TILE`]s stays unmerged.
///
/// Returns the new row and the sum of the merged tiles.
///
/// ```
/// use game_2048::engine::slide_row;
/// assert_eq!(slide_row([2, 2, 2, 2]), ([4, 4, 0, 0], 8));
/// assert_eq!(slide_row([2, 0, 0, 2]), ([4, 0, 0, 0], 4));
/// ```
pub fn slide_row(row: [Tile; SIZE]) -> ([Tile; SIZE], Score) {
    let mut out = [0; SIZE];
    let mut len = 0;
    let mut score = 0;
    let mut pending: Option<Tile> = None;
    for val in row.into_iter().filter(|&v| v != 0) {
        match pending {
            Some(prev) if prev == val && prev < MAX_TILE => {
                let merged = prev * 2;
                out[len] = merged;
                len += 1;
                score += Score::from(merged);
                pending = None;
            }
            Some(prev) => {
                out[len] = prev;
                len += 1;
                pending = Some(val);
            }
            None => pending = Some(val),
        }
    }
    if let Some(prev) = pending {
        out[len] = prev;
    }
    (out, score)
}

fn shift_rows(board: Board, reversed: bool) -> (Board, Score) {
    let mut out = [[0; SIZE]; SIZE];
    let mut score = 0;
    for (dst, &row) in out.iter_mut().zip(board.0.iter()) {
        let (new_row, gained) = if reversed {
            let mut rev = row;
            rev.reverse();
            let (mut slid, gained) = slide_row(rev);
            slid.reverse();
            (slid, gained)
        } else {
            slide_row(row)
        };
        *dst = new_row;
        score += gained;
    }
    (Board(out), score)
}

fn generate_random_tile<R: Rng + ?Sized>(rng: &mut R) -> Tile {
    if rng.gen_bool(SPAWN_FOUR_PROBABILITY) { 4 } else { 2 }
}

fn format_val(val: Tile) -> String {
    match val {
        0 => " ".repeat(7),
        x => format!("{x:^7}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn board(rows: [[Tile; 4]; 4]) -> Board {
        Board::from_rows(rows).unwrap()
    }

    #[test]
    fn it_slide_row() {
        assert_eq!(slide_row([0, 0, 0, 0]), ([0, 0, 0, 0], 0));
        assert_eq!(slide_row([2, 4, 2, 4]), ([2, 4, 2, 4], 0));
        assert_eq!(slide_row([2, 2, 4, 4]), ([4, 8, 0, 0], 12));
        assert_eq!(slide_row([2, 0, 0, 2]), ([4, 0, 0, 0], 4));
        assert_eq!(slide_row([2, 2, 2, 2]), ([4, 4, 0, 0], 8));
        assert_eq!(slide_row([4, 2, 2, 0]), ([4, 4, 0, 0], 4));
        assert_eq!(slide_row([0, 2, 2, 2]), ([4, 2, 0, 0], 4));
        assert_eq!(slide_row([8, 0, 8, 16]), ([16, 16, 0, 0], 16));
    }

    #[test]
    fn test_shift_left() {
        let game = board([[2, 4, 8, 16], [2, 8, 8, 4], [4, 0, 0, 4], [2, 0, 0, 4]]);
        let r = game.shift(Move::Left);
        assert_eq!(r.board, board([[2, 4, 8, 16], [2, 16, 4, 0], [8, 0, 0, 0], [2, 4, 0, 0]]));
        assert_eq!(r.score, 16 + 8);
        assert!(r.moved);
    }

    #[test]
    fn test_shift_right() {
        let game = board([[2, 4, 8, 16], [2, 8, 8, 4], [4, 0, 0, 4], [2, 0, 0, 4]]);
        let r = game.shift(Move::Right);
        assert_eq!(r.board, board([[2, 4, 8, 16], [0, 2, 16, 4], [0, 0, 0, 8], [0, 0, 2, 4]]));
        assert_eq!(r.score, 24);
    }

    #[test]
    fn test_shift_right_prefers_trailing_pair() {
        let r = board([[0, 2, 2, 2], [0; 4], [0; 4], [0; 4]]).shift(Move::Right);
        assert_eq!(r.board.rows()[0], [0, 0, 2, 4]);
    }

    #[test]
    fn test_shift_up() {
        let game = board([[2, 2, 4, 2], [4, 8, 0, 0], [8, 8, 0, 0], [16, 4, 4, 4]]);
        let r = game.shift(Move::Up);
        assert_eq!(r.board, board([[2, 2, 8, 2], [4, 16, 0, 4], [8, 4, 0, 0], [16, 0, 0, 0]]));
        assert_eq!(r.score, 16 + 8);
    }

    #[test]
    fn test_shift_down() {
        let game = board([[2, 2, 4, 2], [4, 8, 0, 0], [8, 8, 0, 0], [16, 4, 4, 4]]);
        let r = game.shift(Move::Down);
        assert_eq!(r.board, board([[2, 0, 0, 0], [4, 2, 0, 0], [8, 16, 0, 2], [16, 4, 8, 4]]));
        assert_eq!(r.score, 24);
    }

    #[test]
    fn vertical_moves_match_transposed_horizontal() {
        let game = board([[2, 0, 4, 4], [2, 8, 0, 4], [0, 8, 4, 2], [4, 2, 2, 2]]);
        assert_eq!(move_up(game).board, transpose(move_left(transpose(game)).board));
        assert_eq!(move_down(game).board, transpose(move_right(transpose(game)).board));
    }

    #[test]
    fn unchanged_board_is_not_moved() {
        let game = board([[2, 4, 0, 0], [4, 2, 0, 0], [0; 4], [0; 4]]);
        let r = move_left(game);
        assert!(!r.moved);
        assert_eq!(r.score, 0);
        assert_eq!(r.board, game);
    }

    #[test]
    fn transpose_is_self_inverse() {
        let game = board([[2, 4, 8, 16], [32, 64, 128, 256], [0, 2, 0, 4], [8, 0, 0, 2]]);
        assert_eq!(transpose(transpose(game)), game);
        assert_eq!(transpose(game).get(0, 1), 32);
    }

    #[test]
    fn it_check_win_exact() {
        assert!(check_win(board([[2048, 0, 0, 0], [0; 4], [0; 4], [0; 4]])));
        assert!(!check_win(board([[4096, 0, 0, 0], [0; 4], [0; 4], [0; 4]])));
        assert!(!check_win(Board::EMPTY));
    }

    #[test]
    fn it_can_move() {
        let stuck = board([[2, 4, 2, 4], [4, 2, 4, 2], [2, 4, 2, 4], [4, 2, 4, 2]]);
        assert!(!can_move(stuck));
        assert!(check_game_over(stuck));

        let horizontal_pair = board([[2, 2, 8, 16], [4, 8, 16, 32], [8, 16, 32, 64], [16, 32, 64, 128]]);
        assert!(can_move(horizontal_pair));

        let vertical_pair = board([[2, 4, 8, 16], [2, 8, 16, 32], [8, 16, 32, 64], [16, 32, 64, 128]]);
        assert!(can_move(vertical_pair));

        let one_gap = board([[2, 4, 2, 4], [4, 2, 4, 2], [2, 4, 2, 4], [4, 2, 4, 0]]);
        assert!(can_move(one_gap));
        assert!(can_move(Board::EMPTY));
    }

    #[test]
    fn it_spawn_tile() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut game = Board::EMPTY;
        for filled in 1..=16 {
            let before = game;
            game = spawn_tile(game, &mut rng);
            assert_eq!(game.count_empty(), 16 - filled);
            let added = game.tile_sum() - before.tile_sum();
            assert!(added == 2 || added == 4);
        }
        assert_eq!(spawn_tile(game, &mut rng), game);
    }

    #[test]
    fn spawn_is_deterministic_for_seed() {
        let a = initialize_board(&mut StdRng::seed_from_u64(99));
        let b = initialize_board(&mut StdRng::seed_from_u64(99));
        assert_eq!(a, b);
        assert_eq!(a.count_empty(), 14);
    }

    #[test]
    fn spawn_mostly_twos() {
        let mut rng = StdRng::seed_from_u64(2024);
        let fours = (0..10_000)
            .filter(|_| Board::EMPTY.with_random_tile(&mut rng).highest_tile() == 4)
            .count();
        assert!((700..1300).contains(&fours), "fours={fours}");
    }

    #[test]
    fn it_rejects_invalid_tiles() {
        assert_eq!(
            Board::from_rows([[0, 0, 0, 0], [0, 6, 0, 0], [0; 4], [0; 4]]),
            Err(BoardError::InvalidTile { row: 1, col: 1, value: 6 })
        );
        assert!(Board::from_rows([[1, 0, 0, 0], [0; 4], [0; 4], [0; 4]]).is_err());
    }

    #[test]
    fn it_caps_tile_size() {
        assert!(Board::from_rows([[MAX_TILE, 0, 0, 0], [0; 4], [0; 4], [0; 4]]).is_ok());
        assert_eq!(
            Board::from_rows([[0, 0, 0, 0], [0; 4], [0, 0, 1 << 18, 0], [0; 4]]),
            Err(BoardError::TileTooLarge { row: 2, col: 2, value: 1 << 18 })
        );
        assert!(matches!(
            Board::from_rows([[1 << 31, 1 << 31, 0, 0], [0; 4], [0; 4], [0; 4]]),
            Err(BoardError::TileTooLarge { .. })
        ));
        let huge = "[[2147483648,2147483648,0,0],[0,0,0,0],[0,0,0,0],[0,0,0,0]]";
        assert!(serde_json::from_str::<Board>(huge).is_err());
    }

    #[test]
    fn max_tiles_do_not_merge() {
        assert_eq!(slide_row([MAX_TILE, MAX_TILE, 0, 0]), ([MAX_TILE, MAX_TILE, 0, 0], 0));
        assert_eq!(slide_row([0, MAX_TILE, 0, MAX_TILE]), ([MAX_TILE, MAX_TILE, 0, 0], 0));

        let half = MAX_TILE / 2;
        let game = board([[half, half, MAX_TILE, 0], [0; 4], [0; 4], [0; 4]]);
        let r = game.shift(Move::Left);
        assert_eq!(r.board.rows()[0], [MAX_TILE, MAX_TILE, 0, 0]);
        assert_eq!(r.score, u64::from(MAX_TILE));
        assert_eq!(r.board.tile_sum(), game.tile_sum());

        let stuck = board([[MAX_TILE, MAX_TILE, 2, 4], [4, 2, 4, 2], [2, 4, 2, 4], [4, 2, 4, 2]]);
        assert!(!can_move(stuck));
        assert!(Move::ALL.iter().all(|&d| !stuck.shift(d).moved));

        let r = r.board.shift(Move::Left);
        assert!(!r.moved);
        assert_eq!(r.board.tile_sum(), game.tile_sum());
        assert!(Board::from_rows(*r.board.rows()).is_ok());
    }

    #[test]
    fn board_json_uses_nested_rows() {
        let game = board([[2, 0, 0, 0], [0; 4], [0; 4], [0, 0, 0, 4]]);
        let json = serde_json::to_string(&game).unwrap();
        assert_eq!(json, "[[2,0,0,0],[0,0,0,0],[0,0,0,0],[0,0,0,4]]");
        let loaded: Board = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded, game);
        assert!(serde_json::from_str::<Board>("[[3,0,0,0],[0,0,0,0],[0,0,0,0],[0,0,0,0]]").is_err());
    }

    #[test]
    fn it_highest_tile() {
        assert_eq!(Board::EMPTY.highest_tile(), 0);
        assert_eq!(board([[2, 0, 0, 0], [0, 512, 0, 0], [0; 4], [0; 4]]).highest_tile(), 512);
    }

    #[test]
    fn display_renders_four_rows() {
        let text = board([[2, 0, 0, 0], [0; 4], [0; 4], [0, 0, 0, 2048]]).to_string();
        assert_eq!(text.lines().count(), 7);
        assert!(text.contains("2048"));
    }
}
