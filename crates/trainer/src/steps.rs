//! Per-model training steps
//!
//! A `TrainStep` owns one model, its variables and its optimiser, and knows
//! how to turn a batch into tensors. The `Trainer` only sees this trait,
//! the same way the loop never needs to know which model it drives.

use crate::config::TrainingConfig;
use crate::metrics::StepMetrics;
use anyhow::{Context, Result};
use candle_core::{DType, Device, Tensor};
use candle_nn::{AdamW, Optimizer, ParamsAdamW, VarBuilder, VarMap, loss};
use models::{CrossFilter, LinkNet};
use sequences::{PairBatch, SequenceBatch};

/// One optimisation / evaluation step of a model on a batch
pub trait TrainStep {
    type Batch;

    /// Returns the name of this step (for logging)
    fn name(&self) -> &str;

    /// Forward in training mode, backward, optimiser update
    fn train_step(&mut self, batch: &Self::Batch) -> Result<StepMetrics>;

    /// Forward in evaluation mode only
    fn val_step(&mut self, batch: &Self::Batch) -> Result<StepMetrics>;
}

// ============================================================================
// Shared helpers
// ============================================================================

/// Adam: AdamW with the weight decay switched off
fn adam(varmap: &VarMap, learning_rate: f64) -> Result<AdamW> {
    let params = ParamsAdamW {
        lr: learning_rate,
        weight_decay: 0.0,
        ..Default::default()
    };
    AdamW::new(varmap.all_vars(), params).context("Failed to create optimizer")
}

/// MSE loss tensor plus the scalar metrics of a prediction
fn score(preds: &Tensor, targets: &Tensor) -> Result<(Tensor, StepMetrics)> {
    let mse = loss::mse(preds, targets)?;
    let mae = preds.sub(targets)?.abs()?.mean_all()?.to_scalar::<f32>()?;
    let metrics = StepMetrics {
        loss: mse.to_scalar::<f32>()?,
        mae,
    };
    Ok((mse, metrics))
}

// ============================================================================
// Cross-filter pretraining
// ============================================================================

pub struct PretrainStep {
    name: String,
    varmap: VarMap,
    model: CrossFilter,
    optimizer: AdamW,
}

impl PretrainStep {
    /// Fresh cross-filter model over `n_users` fold-local users
    pub fn new(
        name: impl Into<String>,
        config: &TrainingConfig,
        n_users: usize,
        n_items: usize,
        device: &Device,
    ) -> Result<Self> {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, device);
        let model = CrossFilter::new(vb, n_users, n_items, config.dim, &config.head())
            .context("Failed to build cross-filter model")?;
        let optimizer = adam(&varmap, config.learning_rate)?;

        Ok(Self {
            name: name.into(),
            varmap,
            model,
            optimizer,
        })
    }

    pub fn model(&self) -> &CrossFilter {
        &self.model
    }

    pub fn varmap_mut(&mut self) -> &mut VarMap {
        &mut self.varmap
    }

    fn predict(&self, batch: &PairBatch, train: bool) -> Result<(Tensor, Tensor)> {
        let device = self.model.device();
        let n = batch.len();
        let users = Tensor::from_slice(&batch.users, n, device)?;
        let items = Tensor::from_slice(&batch.items, n, device)?;
        let targets = Tensor::from_slice(&batch.ratings, (n, 1), device)?;

        let preds = self.model.forward_t(&users, &items, train)?;
        Ok((preds, targets))
    }
}

impl TrainStep for PretrainStep {
    type Batch = PairBatch;

    fn name(&self) -> &str {
        &self.name
    }

    fn train_step(&mut self, batch: &PairBatch) -> Result<StepMetrics> {
        let (preds, targets) = self.predict(batch, true)?;
        let (mse, metrics) = score(&preds, &targets)?;
        self.optimizer.backward_step(&mse)?;
        Ok(metrics)
    }

    fn val_step(&mut self, batch: &PairBatch) -> Result<StepMetrics> {
        let (preds, targets) = self.predict(batch, false)?;
        Ok(score(&preds, &targets)?.1)
    }
}

// ============================================================================
// Sequence-model fine-tuning
// ============================================================================

pub struct FinetuneStep {
    name: String,
    varmap: VarMap,
    model: LinkNet,
    optimizer: AdamW,
}

impl FinetuneStep {
    pub fn new(
        name: impl Into<String>,
        config: &TrainingConfig,
        n_items: usize,
        device: &Device,
    ) -> Result<Self> {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, device);
        let model = LinkNet::new(vb, n_items, &config.link_net())
            .context("Failed to build sequence model")?;
        let optimizer = adam(&varmap, config.learning_rate)?;

        Ok(Self {
            name: name.into(),
            varmap,
            model,
            optimizer,
        })
    }

    pub fn model(&self) -> &LinkNet {
        &self.model
    }

    pub fn varmap_mut(&mut self) -> &mut VarMap {
        &mut self.varmap
    }

    /// Give up the weights, e.g. to save them after the last fold
    pub fn into_varmap(self) -> VarMap {
        self.varmap
    }

    fn predict(&self, batch: &SequenceBatch, train: bool) -> Result<(Tensor, Tensor)> {
        let device = self.model.device();
        let (n, seq_len) = (batch.len(), batch.seq_len);
        let items = Tensor::from_slice(&batch.items, (n, seq_len), device)?;
        let ratings = Tensor::from_slice(&batch.ratings, (n, seq_len), device)?;
        let target_items = Tensor::from_slice(&batch.target_items, n, device)?;
        let targets = Tensor::from_slice(&batch.target_ratings, (n, 1), device)?;

        let preds = self
            .model
            .forward_t(&items, &ratings, &target_items, train)?;
        Ok((preds, targets))
    }
}

impl TrainStep for FinetuneStep {
    type Batch = SequenceBatch;

    fn name(&self) -> &str {
        &self.name
    }

    fn train_step(&mut self, batch: &SequenceBatch) -> Result<StepMetrics> {
        let (preds, targets) = self.predict(batch, true)?;
        let (mse, metrics) = score(&preds, &targets)?;
        self.optimizer.backward_step(&mse)?;
        Ok(metrics)
    }

    fn val_step(&mut self, batch: &SequenceBatch) -> Result<StepMetrics> {
        let (preds, targets) = self.predict(batch, false)?;
        Ok(score(&preds, &targets)?.1)
    }
}
