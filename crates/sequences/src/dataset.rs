//! Sequence dataset: one window per user, redrawn every epoch.

use crate::traits::{BatchSource, batch_order};
use crate::types::{SequenceBatch, Window};
use crate::window::WindowSampler;
use data_loader::{DenseIdx, TrailEntry};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use rayon::prelude::*;
use tracing::{debug, info, warn};

/// Groups rating logs into user behaviour sequences.
///
/// Holds borrowed trails (the `DataIndex` owns them) and the current
/// window of every user. Users whose trail is too short for a full window
/// are dropped at construction.
pub struct SequenceDataset<'a> {
    name: String,
    sampler: WindowSampler,
    trails: Vec<(DenseIdx, &'a [TrailEntry])>,
    windows: Vec<Window>,
    skipped_users: usize,
}

impl<'a> SequenceDataset<'a> {
    /// Build the dataset and draw the first set of windows
    pub fn new(
        name: impl Into<String>,
        trails: Vec<(DenseIdx, &'a [TrailEntry])>,
        sampler: WindowSampler,
        rng: &mut dyn RngCore,
    ) -> Self {
        let name = name.into();
        let total = trails.len();
        let trails: Vec<_> = trails
            .into_iter()
            .filter(|(_, trail)| sampler.can_sample(trail.len()))
            .collect();
        let skipped_users = total - trails.len();

        if skipped_users > 0 {
            warn!(
                "{}: dropping {} users with fewer than {} ratings",
                name,
                skipped_users,
                sampler.window_len()
            );
        }

        let mut dataset = Self {
            name,
            sampler,
            trails,
            windows: Vec::new(),
            skipped_users,
        };
        dataset.make_seq(rng);
        info!("generated dataset {}: {} sequences", dataset.name, dataset.windows.len());
        dataset
    }

    /// Redraw every user's window
    ///
    /// Each user gets its own RNG seeded from `rng`, so the draw is
    /// reproducible regardless of how Rayon schedules the work.
    pub fn make_seq(&mut self, rng: &mut dyn RngCore) {
        let seeds: Vec<u64> = (0..self.trails.len()).map(|_| rng.next_u64()).collect();
        let sampler = self.sampler;

        self.windows = self
            .trails
            .par_iter()
            .zip(seeds.par_iter())
            .filter_map(|(&(user, trail), &seed)| {
                let mut user_rng = StdRng::seed_from_u64(seed);
                sampler.sample(user, trail, &mut user_rng)
            })
            .collect();
        debug!("{}: resampled {} windows", self.name, self.windows.len());
    }

    pub fn windows(&self) -> &[Window] {
        &self.windows
    }

    /// Users left out because their trail was too short
    pub fn skipped_users(&self) -> usize {
        self.skipped_users
    }
}

impl BatchSource for SequenceDataset<'_> {
    type Batch = SequenceBatch;

    fn name(&self) -> &str {
        &self.name
    }

    fn len(&self) -> usize {
        self.windows.len()
    }

    fn batches(&self, batch_size: usize, shuffle: bool, rng: &mut dyn RngCore) -> Vec<SequenceBatch> {
        batch_order(self.windows.len(), batch_size, shuffle, rng)
            .into_iter()
            .map(|rows| {
                SequenceBatch::from_windows(
                    rows.iter().map(|&row| &self.windows[row]),
                    self.sampler.seq_len(),
                )
            })
            .collect()
    }

    fn resample(&mut self, rng: &mut dyn RngCore) {
        self.make_seq(rng);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SamplingMode;

    fn trail(offset: u32, len: usize) -> Vec<TrailEntry> {
        (0..len)
            .map(|i| TrailEntry {
                movie: offset + i as u32,
                rating: 0.5,
                timestamp: i as i64,
            })
            .collect()
    }

    #[test]
    fn test_short_users_are_dropped() {
        let long = trail(0, 30);
        let short = trail(100, 5);
        let mut rng = StdRng::seed_from_u64(0);

        let dataset = SequenceDataset::new(
            "train",
            vec![(0, long.as_slice()), (1, short.as_slice())],
            WindowSampler::new(19),
            &mut rng,
        );

        assert_eq!(dataset.len(), 1);
        assert_eq!(dataset.skipped_users(), 1);
        assert_eq!(dataset.windows()[0].user, 0);
    }

    #[test]
    fn test_resample_changes_windows() {
        let trails: Vec<Vec<TrailEntry>> = (0..20).map(|u| trail(u * 1000, 200)).collect();
        let refs = trails
            .iter()
            .enumerate()
            .map(|(u, t)| (u as DenseIdx, t.as_slice()))
            .collect();
        let mut rng = StdRng::seed_from_u64(1);
        let mut dataset = SequenceDataset::new("train", refs, WindowSampler::new(19), &mut rng);

        let before = dataset.windows().to_vec();
        dataset.resample(&mut rng);
        assert_eq!(dataset.len(), before.len());
        assert_ne!(dataset.windows(), before.as_slice());
    }

    #[test]
    fn test_same_seed_same_windows() {
        let long = trail(0, 100);
        let build = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            SequenceDataset::new(
                "valid",
                vec![(0, long.as_slice()), (1, long.as_slice())],
                WindowSampler::new(19).with_mode(SamplingMode::Scattered),
                &mut rng,
            )
            .windows()
            .to_vec()
        };
        assert_eq!(build(42), build(42));
    }

    #[test]
    fn test_batches_layout() {
        let trails: Vec<Vec<TrailEntry>> = (0..5).map(|u| trail(u * 100, 25)).collect();
        let refs = trails
            .iter()
            .enumerate()
            .map(|(u, t)| (u as DenseIdx, t.as_slice()))
            .collect();
        let mut rng = StdRng::seed_from_u64(2);
        let dataset = SequenceDataset::new("train", refs, WindowSampler::new(4), &mut rng);

        let batches = dataset.batches(2, false, &mut rng);
        assert_eq!(batches.len(), 3);
        assert_eq!(batches[0].len(), 2);
        assert_eq!(batches[0].items.len(), 2 * 4);
        assert_eq!(batches[0].ratings.len(), 2 * 4);
        assert_eq!(batches[0].seq_len, 4);
        assert_eq!(batches[2].len(), 1);
    }
}
