//! Game session state machine.
//!
//! [`Session::apply`] is the pure transition function: it takes a command,
//! returns the next session and, at most, one [`Effect`] for the caller to
//! run. [`Game`] is the single writer that owns a session together with its
//! RNG and score store and runs those effects.

use log::{debug, info, warn};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::engine::{self, Board, Move, Score};
use crate::storage::{ScoreEntry, ScoreStore};

/// Stage of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Waiting for a player name.
    #[default]
    Start,
    Playing,
    /// 2048 reached for the first time this game.
    Won,
    /// No legal move remains.
    Lost,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub board: Board,
    pub score: Score,
    pub best_score: Score,
    pub player_name: String,
    pub phase: Phase,
    /// Set on the first win so that later 2048 tiles do not win again.
    pub has_won: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start { player_name: String },
    Move(Move),
    ContinueAfterWin,
    Reset,
}

/// Side effect requested by a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Persist a finished game. Values are those of the terminal transition.
    RecordScore { name: String, score: Score },
    /// Re-read the best score from storage.
    ReloadBestScore,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub session: Session,
    pub effect: Option<Effect>,
}

impl Transition {
    fn unchanged(session: &Session) -> Self {
        Transition { session: session.clone(), effect: None }
    }
}

impl Session {
    /// Fresh session in [`Phase::Start`] with an empty board.
    pub fn new(best_score: Score) -> Self {
        Session {
            board: engine::create_empty_board(),
            score: 0,
            best_score,
            player_name: String::new(),
            phase: Phase::Start,
            has_won: false,
        }
    }

    /// Compute the session that follows `command`.
    ///
    /// Commands that do not apply to the current phase leave the session
    /// unchanged and request no effect.
    ///
    /// ```
    /// use game_2048::session::{Command, Phase, Session};
    /// use rand::{rngs::StdRng, SeedableRng};
    /// let mut rng = StdRng::seed_from_u64(1);
    /// let t = Session::new(0).apply(Command::Start { player_name: " ann ".into() }, &mut rng);
    /// assert_eq!(t.session.phase, Phase::Playing);
    /// assert_eq!(t.session.player_name, "ann");
    /// assert_eq!(t.session.board.count_empty(), 14);
    /// ```
    pub fn apply<R: Rng + ?Sized>(&self, command: Command, rng: &mut R) -> Transition {
        match command {
            Command::Start { player_name } => Transition {
                session: Session {
                    board: engine::initialize_board(rng),
                    score: 0,
                    best_score: self.best_score,
                    player_name: player_name.trim().to_string(),
                    phase: Phase::Playing,
                    has_won: false,
                },
                effect: None,
            },
            Command::Move(dir) => self.apply_move(dir, rng),
            Command::ContinueAfterWin if self.phase == Phase::Won => Transition {
                session: Session { phase: Phase::Playing, ..self.clone() },
                effect: None,
            },
            Command::ContinueAfterWin => Transition::unchanged(self),
            Command::Reset => Transition {
                session: Session::new(self.best_score),
                effect: Some(Effect::ReloadBestScore),
            },
        }
    }

    fn apply_move<R: Rng + ?Sized>(&self, dir: Move, rng: &mut R) -> Transition {
        if self.phase != Phase::Playing {
            return Transition::unchanged(self);
        }
        let result = self.board.shift(dir);
        if !result.moved {
            return Transition::unchanged(self);
        }
        let board = engine::spawn_tile(result.board, rng);
        let score = self.score + result.score;
        let mut next = Session {
            board,
            score,
            best_score: self.best_score.max(score),
            ..self.clone()
        };
        if !self.has_won && engine::check_win(board) {
            next.phase = Phase::Won;
            next.has_won = true;
        } else if !engine::can_move(board) {
            next.phase = Phase::Lost;
        } else {
            return Transition { session: next, effect: None };
        }
        let effect = Effect::RecordScore { name: next.player_name.clone(), score };
        Transition { session: next, effect: Some(effect) }
    }

    /// True in [`Phase::Won`] and [`Phase::Lost`].
    pub fn is_finished(&self) -> bool {
        matches!(self.phase, Phase::Won | Phase::Lost)
    }
}

/// Owns the authoritative [`Session`] and applies commands to it.
pub struct Game<S, R> {
    session: Session,
    store: S,
    rng: R,
}

impl<S: ScoreStore, R: Rng> Game<S, R> {
    /// New game in [`Phase::Start`], seeded with the store's best score.
    pub fn new(store: S, rng: R) -> Self {
        let best = load_best_score(&store);
        Game { session: Session::new(best), store, rng }
    }

    /// Current session, read-only.
    pub fn session(&self) -> &Session { &self.session }

    pub fn store(&self) -> &S { &self.store }

    pub fn store_mut(&mut self) -> &mut S { &mut self.store }

    /// Apply `command` and run whatever effect it requests.
    pub fn dispatch(&mut self, command: Command) -> &Session {
        let Transition { session, effect } = self.session.apply(command, &mut self.rng);
        if session.phase != self.session.phase {
            debug!("phase {:?} -> {:?} (score {})", self.session.phase, session.phase, session.score);
        }
        self.session = session;
        match effect {
            Some(Effect::RecordScore { name, score }) => {
                info!("{name} finished ({:?}) with score {score}", self.session.phase);
                if let Err(e) = self.store.record_score(&name, score) {
                    warn!("failed to record score for {name}: {e}");
                }
            }
            Some(Effect::ReloadBestScore) => {
                self.session.best_score = load_best_score(&self.store);
            }
            None => {}
        }
        &self.session
    }

    pub fn start(&mut self, player_name: &str) -> &Session {
        self.dispatch(Command::Start { player_name: player_name.to_string() })
    }

    pub fn move_tiles(&mut self, dir: Move) -> &Session {
        self.dispatch(Command::Move(dir))
    }

    pub fn continue_after_win(&mut self) -> &Session {
        self.dispatch(Command::ContinueAfterWin)
    }

    pub fn reset(&mut self) -> &Session {
        self.dispatch(Command::Reset)
    }

    /// High-score list; empty when storage cannot be read.
    pub fn high_scores(&self) -> Vec<ScoreEntry> {
        self.store.high_scores().unwrap_or_else(|e| {
            warn!("failed to read high scores: {e}");
            Vec::new()
        })
    }
}

fn load_best_score<S: ScoreStore + ?Sized>(store: &S) -> Score {
    store.best_score().unwrap_or_else(|e| {
        warn!("failed to read best score, using 0: {e}");
        0
    })
}
