//! Flat (user, movie, rating) rows used to pretrain the cross-filter model.

use crate::traits::{BatchSource, batch_order};
use crate::types::PairBatch;
use data_loader::{DenseIdx, TrailEntry};
use rand::RngCore;

/// Every rating of a set of users, with fold-local dense user indices
pub struct PairDataset {
    name: String,
    rows: Vec<(DenseIdx, DenseIdx, f32)>,
}

impl PairDataset {
    pub fn new<'t, I>(name: impl Into<String>, trails: I) -> Self
    where
        I: IntoIterator<Item = (DenseIdx, &'t [TrailEntry])>,
    {
        let rows = trails
            .into_iter()
            .flat_map(|(user, trail)| {
                trail
                    .iter()
                    .map(move |entry| (user, entry.movie, entry.rating))
            })
            .collect();

        Self {
            name: name.into(),
            rows,
        }
    }

    pub fn rows(&self) -> &[(DenseIdx, DenseIdx, f32)] {
        &self.rows
    }
}

impl BatchSource for PairDataset {
    type Batch = PairBatch;

    fn name(&self) -> &str {
        &self.name
    }

    fn len(&self) -> usize {
        self.rows.len()
    }

    fn batches(&self, batch_size: usize, shuffle: bool, rng: &mut dyn RngCore) -> Vec<PairBatch> {
        batch_order(self.rows.len(), batch_size, shuffle, rng)
            .into_iter()
            .map(|order| {
                let mut batch = PairBatch::default();
                for row in order {
                    let (user, item, rating) = self.rows[row];
                    batch.users.push(user);
                    batch.items.push(item);
                    batch.ratings.push(rating);
                }
                batch
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_pairs_flatten_trails() {
        let a = vec![
            TrailEntry { movie: 3, rating: 0.2, timestamp: 1 },
            TrailEntry { movie: 4, rating: 0.8, timestamp: 2 },
        ];
        let b = vec![TrailEntry { movie: 3, rating: 1.0, timestamp: 5 }];

        let dataset = PairDataset::new("pretrain", vec![(0, a.as_slice()), (1, b.as_slice())]);
        assert_eq!(dataset.len(), 3);
        assert_eq!(dataset.rows()[2], (1, 3, 1.0));

        let mut rng = StdRng::seed_from_u64(0);
        let batches = dataset.batches(2, true, &mut rng);
        assert_eq!(batches.len(), 2);
        assert_eq!(batches.iter().map(PairBatch::len).sum::<usize>(), 3);
    }
}
