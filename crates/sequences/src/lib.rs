//! # Sequences Crate
//!
//! This crate turns indexed rating logs into training data.
//!
//! ## Components
//!
//! ### Window sampling
//! Each user's chronological trail is cut into `seq_len` input ratings plus
//! one target rating:
//! - `Consecutive`: a random contiguous slice
//! - `Scattered`: random picks, inputs re-sorted by time
//!
//! ### Datasets
//! - `SequenceDataset`: one window per user, redrawn at every epoch boundary
//! - `PairDataset`: flat (user, movie, rating) rows for cross-filter pretraining
//! - `FoldData`: both of the above for one k-fold split
//!
//! ## Example Usage
//!
//! ```ignore
//! use sequences::{BatchSource, FoldData, WindowSampler};
//!
//! let sampler = WindowSampler::new(19);
//! let mut fold = FoldData::build(&index, &split, sampler, &mut rng)?;
//!
//! for batch in fold.train.batches(16, true, &mut rng) {
//!     // feed the batch to the sequence model
//! }
//! fold.train.resample(&mut rng);
//! ```

// Public modules
pub mod types;
pub mod window;
pub mod traits;
pub mod dataset;
pub mod pairs;
pub mod fold_data;

// Re-export commonly used types
pub use types::{PairBatch, SamplingMode, SequenceBatch, Window};
pub use window::WindowSampler;
pub use traits::{BatchSource, TrainBatch};
pub use dataset::SequenceDataset;
pub use pairs::PairDataset;
pub use fold_data::FoldData;
