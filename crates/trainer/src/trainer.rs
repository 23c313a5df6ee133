//! Epoch loop shared by both training phases.

use crate::metrics::{EpochReport, MetricsAccumulator};
use crate::steps::TrainStep;
use anyhow::{Result, bail};
use rand::RngCore;
use sequences::{BatchSource, TrainBatch};
use std::time::Instant;
use tracing::{info, warn};

/// Drives a `TrainStep` over a dataset for one epoch
#[derive(Debug, Clone, Copy)]
pub struct Trainer {
    batch_size: usize,
    print_on: usize,
}

impl Trainer {
    pub fn new(batch_size: usize) -> Self {
        Self {
            batch_size: batch_size.max(1),
            print_on: 1,
        }
    }

    pub fn with_print_on(mut self, print_on: usize) -> Self {
        self.print_on = print_on.max(1);
        self
    }

    /// One shuffled training pass over `train`, then one evaluation pass over
    /// `valid` if given. Each dataset is resampled after its own pass.
    ///
    /// Aborts on the first non-finite training loss.
    pub fn run_epoch<S, D>(
        &self,
        name: &str,
        step: &mut S,
        train: &mut D,
        valid: Option<&mut D>,
        rng: &mut dyn RngCore,
    ) -> Result<EpochReport>
    where
        S: TrainStep<Batch = D::Batch>,
        D: BatchSource,
    {
        let start = Instant::now();
        info!(
            "{}: {} on {} rows of {}",
            name,
            step.name(),
            train.len(),
            train.name()
        );

        // Training pass
        let batches = train.batches(self.batch_size, true, rng);
        let total = batches.len();
        let mut train_acc = MetricsAccumulator::default();
        let mut skipped_batches = 0;

        for (ite, batch) in batches.iter().enumerate() {
            // Batch norm statistics are undefined on one row
            if batch.len() < 2 {
                skipped_batches += 1;
                continue;
            }

            let metrics = step.train_step(batch)?;
            if !metrics.is_finite() {
                bail!("{}: training diverged at step {} ({})", name, ite + 1, metrics);
            }
            train_acc.add(metrics);

            if (ite + 1) % self.print_on == 0 {
                if let Some(mean) = train_acc.mean() {
                    info!("{} [{}/{}] {}", name, ite + 1, total, mean);
                }
            }
        }
        if skipped_batches > 0 {
            warn!("{}: skipped {} single-row batch(es)", name, skipped_batches);
        }
        train.resample(rng);

        // Validation pass
        let mut valid_acc = MetricsAccumulator::default();
        if let Some(valid) = valid {
            for batch in valid.batches(self.batch_size, false, rng) {
                if batch.is_empty() {
                    continue;
                }
                valid_acc.add(step.val_step(&batch)?);
            }
            valid.resample(rng);
        }

        let report = EpochReport {
            name: name.to_string(),
            train: train_acc.mean(),
            valid: valid_acc.mean(),
            train_steps: train_acc.steps(),
            valid_steps: valid_acc.steps(),
            skipped_batches,
            elapsed_secs: start.elapsed().as_secs_f64(),
        };

        match (report.train, report.valid) {
            (Some(train), Some(valid)) => info!(
                "{} done in {:.1}s: train {} | valid {}",
                name, report.elapsed_secs, train, valid
            ),
            (Some(train), None) => {
                info!("{} done in {:.1}s: train {}", name, report.elapsed_secs, train)
            }
            _ => warn!("{}: no training step ran", name),
        }

        Ok(report)
    }
}
