//! Core trait for datasets the trainer iterates over.

use rand::RngCore;
use rand::seq::SliceRandom;

/// A dataset that can be cut into batches, once per epoch.
///
/// ## Design Note
/// - `batches` borrows the dataset; batches own their rows so a training
///   step can hold one while the dataset is resampled afterwards
/// - `resample` is the epoch-boundary hook; fixed datasets keep the default
pub trait BatchSource {
    type Batch: TrainBatch;

    /// Returns the name of this dataset (for logging)
    fn name(&self) -> &str;

    /// Number of rows (windows or rating pairs)
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Split the dataset into batches of at most `batch_size` rows
    fn batches(&self, batch_size: usize, shuffle: bool, rng: &mut dyn RngCore) -> Vec<Self::Batch>;

    /// Draw fresh rows for the next epoch
    fn resample(&mut self, _rng: &mut dyn RngCore) {}
}

/// A batch that knows how many rows it carries
pub trait TrainBatch {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Row order for one epoch, chunked into batches of `batch_size`
pub fn batch_order(
    len: usize,
    batch_size: usize,
    shuffle: bool,
    rng: &mut dyn RngCore,
) -> Vec<Vec<usize>> {
    let mut order: Vec<usize> = (0..len).collect();
    if shuffle {
        order.shuffle(rng);
    }
    order
        .chunks(batch_size.max(1))
        .map(|chunk| chunk.to_vec())
        .collect()
}
