//! Loss / error bookkeeping for the training loop.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Metrics of one step (or the mean over a pass)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepMetrics {
    /// Mean squared error on the scaled ratings
    pub loss: f32,
    /// Mean absolute error on the scaled ratings
    pub mae: f32,
}

impl StepMetrics {
    pub fn is_finite(&self) -> bool {
        self.loss.is_finite() && self.mae.is_finite()
    }
}

impl fmt::Display for StepMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "loss {:.5} mae {:.5}", self.loss, self.mae)
    }
}

/// Running mean over the steps of a pass
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsAccumulator {
    loss_sum: f64,
    mae_sum: f64,
    steps: usize,
}

impl MetricsAccumulator {
    pub fn add(&mut self, metrics: StepMetrics) {
        self.loss_sum += f64::from(metrics.loss);
        self.mae_sum += f64::from(metrics.mae);
        self.steps += 1;
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    /// `None` until a step has been recorded
    pub fn mean(&self) -> Option<StepMetrics> {
        if self.steps == 0 {
            return None;
        }
        let n = self.steps as f64;
        Some(StepMetrics {
            loss: (self.loss_sum / n) as f32,
            mae: (self.mae_sum / n) as f32,
        })
    }
}

/// Summary of one `Trainer::run_epoch` call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochReport {
    pub name: String,
    pub train: Option<StepMetrics>,
    pub valid: Option<StepMetrics>,
    pub train_steps: usize,
    pub valid_steps: usize,
    /// Training batches dropped for having a single row
    pub skipped_batches: usize,
    pub elapsed_secs: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Pretrain,
    Finetune,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Pretrain => write!(f, "pretrain"),
            Phase::Finetune => write!(f, "finetune"),
        }
    }
}

/// One entry of the experiment history (`--metrics-out`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseRecord {
    pub fold: usize,
    pub epoch: usize,
    pub phase: Phase,
    #[serde(flatten)]
    pub report: EpochReport,
}
