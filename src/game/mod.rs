//! Falling-block game rules, without rendering or input handling.
//!
//! A [`Game`] is advanced by calling [`Game::update`] from a fixed-rate timer
//! and the movement methods from key handlers, all on one thread.

mod bag;
mod board;
mod piece;

use std::time::{Duration, Instant};

use tracing::debug;

pub use bag::Bag;
pub use board::{Board, COLUMNS, ROWS};
pub use piece::{Piece, PieceKind};

/// Offsets tried in order after a rotation
const KICKS: [(i32, i32); 9] = [
    (0, 0),
    (1, 0),
    (-1, 0),
    (0, -1),
    (2, 0),
    (-2, 0),
    (0, 1),
    (1, -1),
    (-1, -1),
];

const POINTS_PER_LEVEL: u32 = 1000;
const BASE_GRAVITY_MS: u64 = 800;
const GRAVITY_STEP_MS: u64 = 55;
const MIN_GRAVITY_MS: u64 = 80;

const SOFT_DROP_POINTS: u32 = 1;
const HARD_DROP_POINTS_PER_ROW: u32 = 2;

/// Bonus for clearing `lines` rows with one lock
pub fn line_clear_score(lines: usize) -> u32 {
    match lines {
        0 => 0,
        1 => 100,
        2 => 300,
        3 => 500,
        _ => 800,
    }
}

pub fn level_for_score(score: u32) -> u32 {
    score / POINTS_PER_LEVEL
}

/// Time between gravity steps at `level`
pub fn gravity_interval(level: u32) -> Duration {
    let slowdown = GRAVITY_STEP_MS.saturating_mul(u64::from(level));
    Duration::from_millis(BASE_GRAVITY_MS.saturating_sub(slowdown).max(MIN_GRAVITY_MS))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Falling,
    Paused,
    GameOver,
}

/// What a gravity step did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Not due yet, paused, or over
    Idle,
    Fell,
    /// The piece locked and `lines` rows cleared; a new piece is falling
    Locked { lines: usize },
    GameOver,
}

pub struct Game {
    board: Board,
    bag: Bag,
    seed: Option<u64>,
    current: Piece,
    next: PieceKind,
    score: u32,
    level: u32,
    lines_cleared: u32,
    phase: Phase,
    last_gravity: Instant,
}

impl Game {
    pub fn new() -> Self {
        Self::with_bag(Bag::new(), None)
    }

    /// Game whose piece order is fixed by `seed`, across resets too
    pub fn with_seed(seed: u64) -> Self {
        Self::with_bag(Bag::seeded(seed), Some(seed))
    }

    fn with_bag(mut bag: Bag, seed: Option<u64>) -> Self {
        let first = bag.draw();
        let next = bag.draw();
        Game {
            board: Board::new(),
            bag,
            seed,
            current: Piece::spawn(first),
            next,
            score: 0,
            level: 0,
            lines_cleared: 0,
            phase: Phase::Falling,
            last_gravity: Instant::now(),
        }
    }

    /// Start over with an empty board. A seeded game replays its piece order.
    pub fn reset(&mut self) {
        *self = match self.seed {
            Some(seed) => Self::with_seed(seed),
            None => Self::new(),
        };
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Board access for setting up positions
    pub fn board_mut(&mut self) -> &mut Board {
        &mut self.board
    }

    pub fn current(&self) -> &Piece {
        &self.current
    }

    pub fn next_kind(&self) -> PieceKind {
        self.next
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn lines_cleared(&self) -> u32 {
        self.lines_cleared
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_game_over(&self) -> bool {
        self.phase == Phase::GameOver
    }

    pub fn gravity_interval(&self) -> Duration {
        gravity_interval(self.level)
    }

    pub fn toggle_pause(&mut self) {
        self.phase = match self.phase {
            Phase::Falling => Phase::Paused,
            Phase::Paused => Phase::Falling,
            Phase::GameOver => Phase::GameOver,
        };
    }

    pub fn move_left(&mut self) -> bool {
        self.try_move(-1, 0)
    }

    pub fn move_right(&mut self) -> bool {
        self.try_move(1, 0)
    }

    /// Move down one row. Scores a point even when the piece is resting.
    pub fn soft_drop(&mut self) -> bool {
        if self.phase != Phase::Falling {
            return false;
        }

        self.score += SOFT_DROP_POINTS;
        self.try_move(0, 1)
    }

    /// Turn clockwise, kicking the piece if needed. Returns false and leaves
    /// the piece alone when no kick fits.
    pub fn rotate(&mut self) -> bool {
        if self.phase != Phase::Falling {
            return false;
        }

        let rotated = self.current.rotated();
        let placed = KICKS
            .iter()
            .map(|(dx, dy)| rotated.shifted(*dx, *dy))
            .find(|candidate| !self.board.collides(candidate));

        match placed {
            Some(piece) => {
                self.current = piece;
                true
            }
            None => false,
        }
    }

    /// Drop straight to the bottom and lock
    pub fn hard_drop(&mut self) -> Tick {
        if self.phase != Phase::Falling {
            return Tick::Idle;
        }

        while self.try_move(0, 1) {
            self.score += HARD_DROP_POINTS_PER_ROW;
        }
        self.lock_current()
    }

    /// Advance gravity if a full interval has passed since the last step
    pub fn update(&mut self, now: Instant) -> Tick {
        if self.phase != Phase::Falling {
            return Tick::Idle;
        }
        if now.saturating_duration_since(self.last_gravity) < self.gravity_interval() {
            return Tick::Idle;
        }

        self.last_gravity = now;
        self.step()
    }

    /// One gravity step: fall a row, or lock when blocked
    pub fn step(&mut self) -> Tick {
        if self.phase != Phase::Falling {
            return Tick::Idle;
        }

        if self.try_move(0, 1) {
            Tick::Fell
        } else {
            self.lock_current()
        }
    }

    fn try_move(&mut self, dx: i32, dy: i32) -> bool {
        if self.phase != Phase::Falling {
            return false;
        }

        let moved = self.current.shifted(dx, dy);
        if self.board.collides(&moved) {
            return false;
        }
        self.current = moved;
        true
    }

    fn lock_current(&mut self) -> Tick {
        if self.current.cells().any(|(_, y)| y < 0) {
            debug!("Piece locked above the top row, game over");
            self.phase = Phase::GameOver;
            return Tick::GameOver;
        }

        self.board.merge(&self.current);

        let lines = self.board.clear_full_rows();
        self.score += line_clear_score(lines);
        self.lines_cleared += lines as u32;
        if lines > 0 {
            self.level = level_for_score(self.score);
        }

        self.spawn();
        Tick::Locked { lines }
    }

    // Spawn rows are above the board and cannot collide; a full stack ends
    // the game when the new piece locks there.
    fn spawn(&mut self) {
        let kind = std::mem::replace(&mut self.next, self.bag.draw());
        self.current = Piece::spawn(kind);
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}
