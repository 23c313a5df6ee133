//! K-fold split over users.
//!
//! Every user draws one uniform number `r` in `[0, 1)`. Fold `f` of `k`
//! validates the users with `f/k <= r < (f+1)/k` and trains on the rest,
//! so across all folds each user is validated exactly once.

use crate::error::{DataLoadError, Result};
use crate::types::{IdIndex, UserId};
use rand::Rng;
use tracing::info;

/// Random assignment of users to validation folds
#[derive(Debug, Clone)]
pub struct FoldAssignment {
    /// (user, fold that validates this user)
    assignments: Vec<(UserId, usize)>,
    folds: usize,
}

/// One train/validation partition of the user population
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoldSplit {
    pub fold: usize,
    pub train_users: Vec<UserId>,
    pub valid_users: Vec<UserId>,
}

impl FoldAssignment {
    /// Assign every user to one of `folds` validation folds
    pub fn random<R: Rng + ?Sized>(users: &[UserId], folds: usize, rng: &mut R) -> Result<Self> {
        if folds < 2 {
            return Err(DataLoadError::InvalidFoldCount { fold: 0, folds });
        }

        info!("making train/valid split over {} users, k = {}", users.len(), folds);
        let assignments = users
            .iter()
            .map(|&user| {
                let r: f64 = rng.random();
                // r < 1.0, the min() only guards float rounding
                let fold = ((r * folds as f64) as usize).min(folds - 1);
                (user, fold)
            })
            .collect();

        Ok(Self { assignments, folds })
    }

    pub fn folds(&self) -> usize {
        self.folds
    }

    /// Partition users into train and validation sets for `fold`
    pub fn split(&self, fold: usize) -> Result<FoldSplit> {
        if fold >= self.folds {
            return Err(DataLoadError::InvalidFoldCount {
                fold,
                folds: self.folds,
            });
        }

        let (valid, train): (Vec<_>, Vec<_>) = self
            .assignments
            .iter()
            .partition(|(_, assigned)| *assigned == fold);

        Ok(FoldSplit {
            fold,
            train_users: train.into_iter().map(|(user, _)| user).collect(),
            valid_users: valid.into_iter().map(|(user, _)| user).collect(),
        })
    }
}

impl FoldSplit {
    /// Dense index over this fold's training users (rebuilt per fold)
    pub fn train_index(&self) -> IdIndex {
        IdIndex::from_ids(self.train_users.iter().copied())
    }

    /// Dense index over this fold's validation users
    pub fn valid_index(&self) -> IdIndex {
        IdIndex::from_ids(self.valid_users.iter().copied())
    }
}
