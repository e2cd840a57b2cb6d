//! game-2048: an embeddable 2048 engine
//!
//! This crate provides:
//! - A value-type `Board` with pure move transforms, spawning and win/loss checks (`engine`)
//! - The session state machine and a `Game` driver that owns it (`session`)
//! - Score persistence behind the `ScoreStore` trait (`storage`)
//! - Keyboard/swipe translation and player-name checks for front ends (`input`)
//! - TOML settings for the terminal front end (`config`)
//!
//! Quick start:
//! ```
//! use game_2048::engine::Move;
//! use game_2048::session::{Game, Phase};
//! use game_2048::storage::MemoryStore;
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! // Deterministic game with an in-memory score store
//! let mut game = Game::new(MemoryStore::new(), StdRng::seed_from_u64(42));
//! game.start("ann");
//! assert_eq!(game.session().phase, Phase::Playing);
//!
//! for dir in [Move::Left, Move::Up, Move::Right, Move::Down] {
//!     game.move_tiles(dir);
//! }
//! assert!(game.session().best_score >= game.session().score);
//! ```
//!
//! The transition function itself is pure: `Session::apply` returns the next
//! session plus an optional `Effect`, so embedders that manage their own
//! storage can drive it directly instead of going through `Game`.
//!
pub mod config;
pub mod engine;
pub mod input;
pub mod session;
pub mod storage;
