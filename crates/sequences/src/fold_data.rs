//! Per-fold dataset assembly
//!
//! Builds everything one fold trains on from the global index and a
//! user split: fold-local user indices, the pretraining pairs, and the
//! training / validation sequence datasets.

use crate::dataset::SequenceDataset;
use crate::pairs::PairDataset;
use crate::window::WindowSampler;
use anyhow::{Result, bail};
use data_loader::{DataIndex, DenseIdx, FoldSplit, IdIndex, TrailEntry};
use rand::RngCore;
use tracing::{info, instrument};

/// All datasets of one fold
pub struct FoldData<'a> {
    pub fold: usize,
    /// Dense index over the fold's training users (cross-filter rows)
    pub train_users: IdIndex,
    pub valid_users: IdIndex,
    pub pairs: PairDataset,
    pub train: SequenceDataset<'a>,
    pub valid: SequenceDataset<'a>,
}

impl<'a> FoldData<'a> {
    #[instrument(skip_all, fields(fold = split.fold))]
    pub fn build(
        index: &'a DataIndex,
        split: &FoldSplit,
        sampler: WindowSampler,
        rng: &mut dyn RngCore,
    ) -> Result<Self> {
        // User ids are remapped per fold, the user population changes
        let train_users = split.train_index();
        let valid_users = split.valid_index();

        if train_users.is_empty() {
            bail!("fold {} has no training users", split.fold);
        }

        info!(
            "{} windows of {} ratings",
            sampler.mode(),
            sampler.window_len()
        );
        let pairs = PairDataset::new(
            format!("fold_{}_pretrain", split.fold),
            trails_of(index, &train_users),
        );
        info!("generating dataset train");
        let train = SequenceDataset::new(
            format!("fold_{}_train", split.fold),
            trails_of(index, &train_users),
            sampler,
            rng,
        );
        info!("generating dataset valid");
        let valid = SequenceDataset::new(
            format!("fold_{}_valid", split.fold),
            trails_of(index, &valid_users),
            sampler,
            rng,
        );

        if train.windows().is_empty() {
            bail!(
                "fold {}: no training user has {} ratings",
                split.fold,
                sampler.window_len()
            );
        }
        info!(
            "dataset generated: {} pairs, {} train / {} valid sequences, {} users too short",
            pairs.rows().len(),
            train.windows().len(),
            valid.windows().len(),
            train.skipped_users() + valid.skipped_users()
        );

        Ok(Self {
            fold: split.fold,
            train_users,
            valid_users,
            pairs,
            train,
            valid,
        })
    }
}

/// Trails of every user in `users`, keyed by the user's dense index
fn trails_of<'a>(index: &'a DataIndex, users: &IdIndex) -> Vec<(DenseIdx, &'a [TrailEntry])> {
    users
        .raw_ids()
        .iter()
        .enumerate()
        .map(|(dense, &raw)| (dense as DenseIdx, index.get_user_trail(raw)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use data_loader::{FoldAssignment, Rating};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn index(users: u32, per_user: u32) -> DataIndex {
        mixed_index(&[(users, per_user)])
    }

    // (users, ratings per user) groups, user ids continue across groups
    fn mixed_index(groups: &[(u32, u32)]) -> DataIndex {
        let mut ratings = Vec::new();
        let mut next_user = 1;
        for &(users, per_user) in groups {
            for user in next_user..next_user + users {
                for i in 0..per_user {
                    ratings.push(Rating {
                        user_id: user,
                        movie_id: (user * 7 + i) % 50,
                        rating: 1.0 + (i % 5) as f32,
                        timestamp: i as i64,
                    });
                }
            }
            next_user += users;
        }
        DataIndex::from_ratings(ratings, 5.0).unwrap()
    }

    #[test]
    fn test_fold_data_uses_fold_local_users() {
        let index = index(40, 25);
        let mut rng = StdRng::seed_from_u64(5);
        let folds = FoldAssignment::random(index.user_ids(), 2, &mut rng).unwrap();
        let split = folds.split(0).unwrap();

        let data = FoldData::build(&index, &split, WindowSampler::new(19), &mut rng).unwrap();

        assert_eq!(data.train_users.len(), split.train_users.len());
        assert_eq!(data.pairs.rows().len(), split.train_users.len() * 25);
        assert_eq!(data.train.windows().len(), split.train_users.len());
        assert_eq!(data.valid.windows().len(), split.valid_users.len());

        let max_user = data.train_users.len() as DenseIdx;
        assert!(data.pairs.rows().iter().all(|&(u, _, _)| u < max_user));
        assert!(data.train.windows().iter().all(|w| w.user < max_user));
    }

    #[test]
    fn test_short_trails_skipped_but_pretrained() {
        // 20 users can fill a window of 20, 10 users cannot
        let index = mixed_index(&[(20, 25), (10, 5)]);
        let mut rng = StdRng::seed_from_u64(8);
        let folds = FoldAssignment::random(index.user_ids(), 2, &mut rng).unwrap();
        let split = folds.split(1).unwrap();

        let data = FoldData::build(&index, &split, WindowSampler::new(19), &mut rng).unwrap();

        let short = |users: &[u32]| users.iter().filter(|&&user| user > 20).count();
        assert_eq!(data.train.skipped_users(), short(&split.train_users));
        assert_eq!(data.valid.skipped_users(), short(&split.valid_users));
        assert_eq!(
            data.train.windows().len() + data.valid.windows().len() + data.train.skipped_users()
                + data.valid.skipped_users(),
            30
        );

        // Short trails still feed the cross filter
        let pairs: usize = split
            .train_users
            .iter()
            .map(|&user| if user > 20 { 5 } else { 25 })
            .sum();
        assert_eq!(data.pairs.rows().len(), pairs);
    }

    #[test]
    fn test_fold_without_long_trails_fails() {
        let index = index(10, 5);
        let mut rng = StdRng::seed_from_u64(6);
        let folds = FoldAssignment::random(index.user_ids(), 2, &mut rng).unwrap();
        let split = folds.split(0).unwrap();

        assert!(FoldData::build(&index, &split, WindowSampler::new(19), &mut rng).is_err());
    }
}
