//! Training loop and experiment orchestration.
//!
//! This crate provides:
//! - `TrainingConfig`: every hyperparameter of a run, with the tuned defaults
//! - `TrainStep`: one model + optimiser behind a common step interface
//!   (`PretrainStep` for the cross filter, `FinetuneStep` for the link net)
//! - `Trainer`: the epoch loop (train pass, validation pass, resampling)
//! - `Experiment`: folds, epochs and the item-embedding transfers between
//!   the two models
//!
//! ## Example Usage
//! ```ignore
//! use data_loader::DataIndex;
//! use trainer::{Experiment, TrainingConfig};
//!
//! let config = TrainingConfig::default();
//! let index = DataIndex::load_from_csv(path, config.rating_scale)?;
//! let outcome = Experiment::new(config)?.run(&index)?;
//! outcome.save_weights(Path::new("/data/rnn_cf_0.0.5.transfer_learning.safetensors"))?;
//! ```

pub mod config;
pub mod metrics;
pub mod steps;
pub mod trainer;
pub mod experiment;

// Re-export main types
pub use config::TrainingConfig;
pub use metrics::{EpochReport, MetricsAccumulator, Phase, PhaseRecord, StepMetrics};
pub use steps::{FinetuneStep, PretrainStep, TrainStep};
pub use trainer::Trainer;
pub use experiment::{Experiment, ExperimentOutcome, PhaseModels, PhaseObserver};
