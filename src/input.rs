//! Translation of raw device input into session commands.

use crate::engine::Move;
use crate::session::Phase;

/// Minimum swipe length, in device-independent pixels.
pub const DEFAULT_SWIPE_THRESHOLD: f64 = 30.0;

/// Longest accepted player name, in characters.
pub const MAX_NAME_LEN: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
    Char(char),
    Other,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("player name must not be empty")]
    EmptyName,
    #[error("player name is longer than {} characters", MAX_NAME_LEN)]
    NameTooLong,
}

/// Arrow keys, plus `wasd` and `hjkl`.
pub fn direction_for_key(key: Key) -> Option<Move> {
    match key {
        Key::ArrowLeft => Some(Move::Left),
        Key::ArrowRight => Some(Move::Right),
        Key::ArrowUp => Some(Move::Up),
        Key::ArrowDown => Some(Move::Down),
        Key::Char(c) => match c.to_ascii_lowercase() {
            'a' | 'h' => Some(Move::Left),
            'd' | 'l' => Some(Move::Right),
            'w' | 'k' => Some(Move::Up),
            's' | 'j' => Some(Move::Down),
            _ => None,
        },
        Key::Other => None,
    }
}

/// Direction of a swipe from its displacement; positive `dy` points down.
///
/// Returns `None` for swipes shorter than `threshold` on both axes. The
/// horizontal axis wins only when strictly dominant.
///
/// ```
/// use game_2048::engine::Move;
/// use game_2048::input::classify_swipe;
/// assert_eq!(classify_swipe(-40.0, 10.0, 30.0), Some(Move::Left));
/// assert_eq!(classify_swipe(5.0, 12.0, 30.0), None);
/// ```
pub fn classify_swipe(dx: f64, dy: f64, threshold: f64) -> Option<Move> {
    let (ax, ay) = (dx.abs(), dy.abs());
    if ax.max(ay) < threshold {
        return None;
    }
    if ax > ay {
        Some(if dx > 0.0 { Move::Right } else { Move::Left })
    } else {
        Some(if dy > 0.0 { Move::Down } else { Move::Up })
    }
}

/// Tracks one touch gesture at a time.
#[derive(Debug, Clone)]
pub struct SwipeTracker {
    threshold: f64,
    start: Option<(f64, f64)>,
}

impl Default for SwipeTracker {
    fn default() -> Self { SwipeTracker::new(DEFAULT_SWIPE_THRESHOLD) }
}

impl SwipeTracker {
    pub fn new(threshold: f64) -> Self {
        SwipeTracker { threshold, start: None }
    }

    /// Remember where a touch began. Ignored outside [`Phase::Playing`].
    pub fn touch_start(&mut self, phase: Phase, x: f64, y: f64) {
        if phase == Phase::Playing {
            self.start = Some((x, y));
        }
    }

    /// Finish the gesture and return the swipe direction, if any.
    pub fn touch_end(&mut self, phase: Phase, x: f64, y: f64) -> Option<Move> {
        if phase != Phase::Playing {
            return None;
        }
        let (x0, y0) = self.start.take()?;
        classify_swipe(x - x0, y - y0, self.threshold)
    }

    /// Whether default scrolling should be blocked while a finger drags.
    pub fn should_suppress_scroll(&self, phase: Phase) -> bool {
        phase == Phase::Playing
    }
}

/// Trim a player name and check it is usable.
pub fn validate_player_name(raw: &str) -> Result<String, InputError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(InputError::EmptyName);
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(InputError::NameTooLong);
    }
    Ok(name.to_string())
}
