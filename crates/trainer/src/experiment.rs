//! # Experiment Orchestrator
//!
//! Runs the whole transfer-learning experiment:
//! 1. Split users into folds
//! 2. Per fold: build the datasets, a fresh cross-filter and a fresh
//!    sequence model, each with its own optimiser
//! 3. Per epoch: copy item embeddings link net -> cross filter, pretrain
//!    one epoch, copy cross filter -> link net, fine-tune one epoch
//! 4. Keep the last fold's sequence-model weights for saving
//!
//! The first copy of each fold moves the link net's freshly initialised
//! table into the cross filter, so both models start from the same items.

use crate::config::TrainingConfig;
use crate::metrics::{Phase, PhaseRecord, StepMetrics};
use crate::steps::{FinetuneStep, PretrainStep};
use crate::trainer::Trainer;
use anyhow::{Context, Result};
use candle_core::Device;
use candle_nn::VarMap;
use data_loader::{DataIndex, FoldAssignment, FoldSplit};
use models::{CrossFilter, LinkNet, transfer_item_embeddings};
use rand::SeedableRng;
use rand::rngs::StdRng;
use sequences::FoldData;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;
use std::time::Instant;
use tracing::{info, instrument};

/// Both models of a fold, as seen between a transfer and the phase it feeds
pub struct PhaseModels<'a> {
    pub cross_filter: &'a CrossFilter,
    pub link_net: &'a LinkNet,
}

/// Hooks around every training phase of a run
pub trait PhaseObserver {
    /// Called once the item embeddings have been copied into the model
    /// that is about to train
    fn before_phase(
        &mut self,
        _fold: usize,
        _epoch: usize,
        _phase: Phase,
        _models: PhaseModels<'_>,
    ) -> Result<()> {
        Ok(())
    }

    /// Called with the record of every finished phase
    fn after_phase(&mut self, _record: &PhaseRecord) {}
}

impl PhaseObserver for () {}

/// Main orchestrator of a training run
pub struct Experiment {
    config: TrainingConfig,
    device: Device,
}

impl Experiment {
    /// Validate the configuration and pick CUDA when available
    pub fn new(config: TrainingConfig) -> Result<Self> {
        config.validate().context("Invalid training configuration")?;
        let device = Device::cuda_if_available(0).context("Failed to select device")?;
        info!("has GPU: {}", device.is_cuda());
        Ok(Self { config, device })
    }

    pub fn with_device(mut self, device: Device) -> Self {
        self.device = device;
        self
    }

    /// Train every fold; the returned weights are the last fold's
    pub fn run(&self, index: &DataIndex) -> Result<ExperimentOutcome> {
        self.run_with(index, &mut ())
    }

    /// `run`, reporting every phase to `observer`
    #[instrument(skip_all, fields(folds = self.config.folds, epochs = self.config.epochs))]
    pub fn run_with(
        &self,
        index: &DataIndex,
        observer: &mut dyn PhaseObserver,
    ) -> Result<ExperimentOutcome> {
        let start = Instant::now();
        let mut rng = StdRng::seed_from_u64(self.config.seed);

        let assignment = FoldAssignment::random(index.user_ids(), self.config.folds, &mut rng)
            .context("Failed to split users into folds")?;

        let mut history = Vec::with_capacity(self.config.folds * self.config.epochs * 2);
        let mut weights = None;

        for fold in 0..assignment.folds() {
            let split = assignment.split(fold)?;
            let (varmap, records) = self
                .run_fold(index, &split, &mut rng, observer)
                .with_context(|| format!("Fold {fold} failed"))?;
            history.extend(records);
            weights = Some(varmap);
        }

        let weights = weights.context("No fold was trained")?;
        info!("finished in {:.1?}", start.elapsed());
        Ok(ExperimentOutcome { weights, history })
    }

    fn run_fold(
        &self,
        index: &DataIndex,
        split: &FoldSplit,
        rng: &mut StdRng,
        observer: &mut dyn PhaseObserver,
    ) -> Result<(VarMap, Vec<PhaseRecord>)> {
        let fold = split.fold;
        info!(
            "fold {}: {} train users, {} valid users",
            fold,
            split.train_users.len(),
            split.valid_users.len()
        );

        let mut data = FoldData::build(index, split, self.config.sampler(), rng)?;
        let n_items = index.movies().len();

        info!("creating model");
        let mut pretrain = PretrainStep::new(
            format!("cross_filter_fold_{fold}"),
            &self.config,
            data.train_users.len(),
            n_items,
            &self.device,
        )?;
        let mut finetune = FinetuneStep::new(
            format!("attlstm_fold_{fold}"),
            &self.config,
            n_items,
            &self.device,
        )?;

        let pretrainer =
            Trainer::new(self.config.pretrain_batch).with_print_on(self.config.pretrain_print_on);
        let finetuner =
            Trainer::new(self.config.finetune_batch).with_print_on(self.config.finetune_print_on);

        let mut records = Vec::with_capacity(self.config.epochs * 2);
        for epoch in 0..self.config.epochs {
            transfer_item_embeddings(finetune.model(), pretrain.varmap_mut())
                .context("Failed to copy item embeddings into the cross filter")?;
            observer.before_phase(fold, epoch, Phase::Pretrain, models(&pretrain, &finetune))?;
            let report = pretrainer.run_epoch(
                &format!("attlstm_cf_fold_{fold}_pretrain_ep_{epoch}"),
                &mut pretrain,
                &mut data.pairs,
                None,
                rng,
            )?;
            let record = PhaseRecord { fold, epoch, phase: Phase::Pretrain, report };
            observer.after_phase(&record);
            records.push(record);

            transfer_item_embeddings(pretrain.model(), finetune.varmap_mut())
                .context("Failed to copy item embeddings into the sequence model")?;
            observer.before_phase(fold, epoch, Phase::Finetune, models(&pretrain, &finetune))?;
            let report = finetuner.run_epoch(
                &format!("attlstm_cf_fold_{fold}_ep_{epoch}"),
                &mut finetune,
                &mut data.train,
                Some(&mut data.valid),
                rng,
            )?;
            let record = PhaseRecord { fold, epoch, phase: Phase::Finetune, report };
            observer.after_phase(&record);
            records.push(record);
        }

        Ok((finetune.into_varmap(), records))
    }
}

/// Weights and history of a finished run
pub struct ExperimentOutcome {
    /// Sequence-model variables of the last fold
    pub weights: VarMap,
    pub history: Vec<PhaseRecord>,
}

impl ExperimentOutcome {
    /// Write the weights as safetensors, creating parent directories
    pub fn save_weights(&self, path: &Path) -> Result<()> {
        create_parent(path)?;
        self.weights
            .save(path)
            .with_context(|| format!("Failed to save weights to {}", path.display()))?;
        info!("saved model weights to {}", path.display());
        Ok(())
    }

    /// Write the per-epoch history as a JSON array
    pub fn save_history(&self, path: &Path) -> Result<()> {
        create_parent(path)?;
        let file = File::create(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        serde_json::to_writer_pretty(BufWriter::new(file), &self.history)
            .context("Failed to write metrics history")?;
        info!("saved metrics history to {}", path.display());
        Ok(())
    }

    /// Validation metrics of the last fine-tuning epoch that had any
    pub fn final_validation(&self) -> Option<StepMetrics> {
        self.history
            .iter()
            .rev()
            .filter(|record| record.phase == Phase::Finetune)
            .find_map(|record| record.report.valid)
    }
}

fn models<'a>(pretrain: &'a PretrainStep, finetune: &'a FinetuneStep) -> PhaseModels<'a> {
    PhaseModels {
        cross_filter: pretrain.model(),
        link_net: finetune.model(),
    }
}

fn create_parent(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display())),
        _ => Ok(()),
    }
}
