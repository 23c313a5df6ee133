//! Window sampling over a user's trail.
//!
//! ## Algorithm
//! A window is `seq_len + 1` ratings taken from one timestamp-sorted trail:
//! 1. `Consecutive`: pick a start uniformly among every position that leaves
//!    room for a full window and take the contiguous slice
//! 2. `Scattered`: pick `seq_len + 1` positions without replacement; the
//!    first `seq_len` picks are re-sorted by time, the last is the target
//! 3. The first `seq_len` ratings are the input sequence, the last one is
//!    the supervised target
//!
//! Trails shorter than `seq_len + 1` never yield a window.

use crate::types::{SamplingMode, Window};
use data_loader::{DenseIdx, TrailEntry};
use rand::Rng;
use rand::seq::index;

/// Cuts fixed-size windows out of user trails
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSampler {
    seq_len: usize,
    mode: SamplingMode,
}

impl WindowSampler {
    /// Create a sampler producing `seq_len` inputs plus one target
    pub fn new(seq_len: usize) -> Self {
        Self {
            seq_len,
            mode: SamplingMode::default(),
        }
    }

    /// Configure the sampling mode (default: consecutive)
    pub fn with_mode(mut self, mode: SamplingMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn seq_len(&self) -> usize {
        self.seq_len
    }

    /// Inputs plus target
    pub fn window_len(&self) -> usize {
        self.seq_len + 1
    }

    pub fn mode(&self) -> SamplingMode {
        self.mode
    }

    pub fn can_sample(&self, trail_len: usize) -> bool {
        self.seq_len > 0 && trail_len >= self.window_len()
    }

    /// Draw one window from `trail`, `None` if the trail is too short
    pub fn sample<R: Rng + ?Sized>(
        &self,
        user: DenseIdx,
        trail: &[TrailEntry],
        rng: &mut R,
    ) -> Option<Window> {
        if !self.can_sample(trail.len()) {
            return None;
        }

        let picks = match self.mode {
            SamplingMode::Consecutive => self.consecutive_positions(trail.len(), rng),
            SamplingMode::Scattered => self.scattered_positions(trail.len(), rng),
        };

        let (inputs, target) = picks.split_at(self.seq_len);
        let target = trail[target[0]];

        Some(Window {
            user,
            items: inputs.iter().map(|&pos| trail[pos].movie).collect(),
            ratings: inputs.iter().map(|&pos| trail[pos].rating).collect(),
            target_item: target.movie,
            target_rating: target.rating,
        })
    }

    fn consecutive_positions<R: Rng + ?Sized>(&self, trail_len: usize, rng: &mut R) -> Vec<usize> {
        let last_start = trail_len - self.window_len();
        let start = rng.random_range(0..=last_start);
        (start..start + self.window_len()).collect()
    }

    fn scattered_positions<R: Rng + ?Sized>(&self, trail_len: usize, rng: &mut R) -> Vec<usize> {
        // index::sample returns the positions in random order
        let mut picks = index::sample(rng, trail_len, self.window_len()).into_vec();
        // Trail is time-sorted, so ordering positions orders by timestamp
        picks[..self.seq_len].sort_unstable();
        picks
    }
}
