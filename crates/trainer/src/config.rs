//! Experiment configuration
//!
//! Every field defaults to the values the experiment was tuned with, so
//! `TrainingConfig::default()` reproduces the reference run.

use anyhow::{Result, ensure};
use data_loader::DEFAULT_RATING_SCALE;
use models::{HeadConfig, LinkNetConfig, MaskActivation};
use sequences::{SamplingMode, WindowSampler};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Input ratings per window (the target comes on top)
    pub seq_len: usize,
    /// Embedding width shared by both models
    pub dim: usize,
    pub folds: usize,
    pub epochs: usize,
    pub pretrain_batch: usize,
    pub finetune_batch: usize,
    /// Log running metrics every n pretraining steps
    pub pretrain_print_on: usize,
    /// Log running metrics every n fine-tuning steps
    pub finetune_print_on: usize,
    pub learning_rate: f64,
    pub dropout: f32,
    pub head_width: usize,
    pub lstm_layers: usize,
    pub mask_activation: MaskActivation,
    pub sampling: SamplingMode,
    /// Maximum raw rating; ratings are divided by it
    pub rating_scale: f32,
    pub seed: u64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            seq_len: 19,
            dim: 100,
            folds: 2,
            epochs: 12,
            pretrain_batch: 512,
            finetune_batch: 16,
            pretrain_print_on: 2,
            finetune_print_on: 3,
            learning_rate: 1e-3,
            dropout: 0.3,
            head_width: 256,
            lstm_layers: 2,
            mask_activation: MaskActivation::Sigmoid,
            sampling: SamplingMode::Consecutive,
            rating_scale: DEFAULT_RATING_SCALE,
            seed: 42,
        }
    }
}

impl TrainingConfig {
    pub fn validate(&self) -> Result<()> {
        ensure!(self.seq_len > 0, "seq_len must be positive");
        ensure!(self.dim > 0, "dim must be positive");
        ensure!(self.folds >= 2, "need at least 2 folds, got {}", self.folds);
        ensure!(self.epochs > 0, "epochs must be positive");
        ensure!(
            self.pretrain_batch > 0 && self.finetune_batch > 0,
            "batch sizes must be positive"
        );
        ensure!(
            self.pretrain_print_on > 0 && self.finetune_print_on > 0,
            "print intervals must be positive"
        );
        ensure!(
            self.learning_rate > 0.0 && self.learning_rate.is_finite(),
            "learning rate must be a positive number, got {}",
            self.learning_rate
        );
        ensure!(
            (0.0..1.0).contains(&self.dropout),
            "dropout must lie in [0, 1), got {}",
            self.dropout
        );
        ensure!(self.head_width > 0, "head_width must be positive");
        ensure!(self.lstm_layers > 0, "lstm_layers must be positive");
        ensure!(
            self.rating_scale > 0.0,
            "rating scale must be positive, got {}",
            self.rating_scale
        );
        Ok(())
    }

    pub fn head(&self) -> HeadConfig {
        HeadConfig {
            width: self.head_width,
            dropout: self.dropout,
        }
    }

    pub fn link_net(&self) -> LinkNetConfig {
        LinkNetConfig {
            hidden: self.dim,
            lstm_layers: self.lstm_layers,
            mask_activation: self.mask_activation,
            head: self.head(),
        }
    }

    pub fn sampler(&self) -> WindowSampler {
        WindowSampler::new(self.seq_len).with_mode(self.sampling)
    }
}
