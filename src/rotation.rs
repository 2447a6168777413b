//! Selection state machine behind the slideshow.
//!
//! | Event            | Running             | Paused              | Override             |
//! |------------------|---------------------|---------------------|----------------------|
//! | `tick`           | draw from the pool  | keep selection      | keep override        |
//! | `pause`          | -> Paused           | no-op               | no-op                |
//! | `resume`         | no-op               | -> Running          | no-op                |
//! | `set_override`   | -> Override         | -> Override         | replace override     |
//! | `clear_override` | no-op               | no-op               | -> Paused            |

use std::path::{Path, PathBuf};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, trace};

use crate::catalog::CandidatePool;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationState {
    /// Every tick draws a fresh selection.
    Running,
    /// Selection frozen until `resume`.
    Paused,
    /// Showing a forced picture; frozen until `clear_override`.
    Override,
}

/// Picks which file the slideshow shows.
///
/// The random source is injected so draws can be replayed from a seed.
#[derive(Debug)]
pub struct RotationEngine<R = StdRng> {
    pool: CandidatePool,
    state: RotationState,
    current: Option<PathBuf>,
    rng: R,
}

impl RotationEngine<StdRng> {
    /// Engine with a deterministic draw sequence.
    #[must_use]
    pub fn seeded(pool: CandidatePool, seed: u64) -> Self {
        Self::new(pool, StdRng::seed_from_u64(seed))
    }

    /// Engine seeded from the operating system.
    #[must_use]
    pub fn from_os_rng(pool: CandidatePool) -> Self {
        Self::new(pool, StdRng::from_os_rng())
    }
}

impl<R: Rng> RotationEngine<R> {
    pub fn new(pool: CandidatePool, rng: R) -> Self {
        Self {
            pool,
            state: RotationState::Running,
            current: None,
            rng,
        }
    }

    /// Advance one step and return the path to render.
    ///
    /// Never fails: whether the file decodes is only discovered at render time.
    pub fn tick(&mut self) -> &Path {
        let kept = match self.state {
            RotationState::Running => None,
            // Paused before the first tick falls through to a draw.
            RotationState::Paused | RotationState::Override => self.current.take(),
        };
        let next = match kept {
            Some(path) => path,
            None => self.draw(),
        };
        self.current.insert(next).as_path()
    }

    fn draw(&mut self) -> PathBuf {
        let idx = self.rng.random_range(0..self.pool.len());
        let path = self.pool[idx].clone();
        trace!(path = %path.display(), "drew");
        path
    }

    /// The selection currently on display; `None` before the first tick.
    #[must_use]
    pub fn current_path(&self) -> Option<&Path> {
        self.current.as_deref()
    }

    #[must_use]
    pub fn state(&self) -> RotationState {
        self.state
    }

    #[must_use]
    pub fn pool(&self) -> &CandidatePool {
        &self.pool
    }

    /// Freeze the current selection. Returns `false` unless running.
    pub fn pause(&mut self) -> bool {
        self.transition(RotationState::Running, RotationState::Paused)
    }

    /// Go back to drawing on every tick. Returns `false` unless paused.
    pub fn resume(&mut self) -> bool {
        self.transition(RotationState::Paused, RotationState::Running)
    }

    /// Force `path` on screen regardless of state. It need not be in the pool.
    pub fn set_override(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        debug!(path = %path.display(), from = ?self.state, "override set");
        self.current = Some(path);
        self.state = RotationState::Override;
    }

    /// Drop the override but keep its picture up, paused. Returns `false` unless overridden.
    pub fn clear_override(&mut self) -> bool {
        self.transition(RotationState::Override, RotationState::Paused)
    }

    fn transition(&mut self, from: RotationState, to: RotationState) -> bool {
        if self.state != from {
            debug!(state = ?self.state, wanted = ?to, "ignored state change");
            return false;
        }
        debug!(from = ?from, to = ?to, "rotation state");
        self.state = to;
        true
    }
}
