//! Scoring head shared by both model variants.
//!
//! `Dropout -> Linear (no bias) -> BatchNorm -> Linear (no bias) -> Sigmoid`,
//! mapping a feature row to a predicted rating in `[0, 1]`.

use candle_core::{ModuleT, Result, Tensor};
use candle_nn::{
    BatchNorm, BatchNormConfig, Dropout, Linear, VarBuilder, batch_norm, linear_no_bias,
};
use serde::{Deserialize, Serialize};

/// Shape of the scoring head
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeadConfig {
    /// Width of the hidden layer
    pub width: usize,
    /// Dropout probability applied to the head input during training
    pub dropout: f32,
}

impl Default for HeadConfig {
    fn default() -> Self {
        Self {
            width: 256,
            dropout: 0.3,
        }
    }
}

pub struct ScoringHead {
    dropout: Dropout,
    hidden: Linear,
    norm: BatchNorm,
    output: Linear,
}

impl ScoringHead {
    pub fn new(in_dim: usize, config: &HeadConfig, vb: VarBuilder) -> Result<Self> {
        Ok(Self {
            dropout: Dropout::new(config.dropout),
            hidden: linear_no_bias(in_dim, config.width, vb.pp("hidden"))?,
            norm: batch_norm(config.width, BatchNormConfig::default(), vb.pp("norm"))?,
            output: linear_no_bias(config.width, 1, vb.pp("output"))?,
        })
    }
}

impl ModuleT for ScoringHead {
    /// `(batch, in_dim)` -> `(batch, 1)`
    fn forward_t(&self, xs: &Tensor, train: bool) -> Result<Tensor> {
        let xs = self.dropout.forward(xs, train)?;
        let xs = xs.apply(&self.hidden)?;
        let xs = xs.apply_t(&self.norm, train)?;
        let xs = xs.apply(&self.output)?;
        candle_nn::ops::sigmoid(&xs)
    }
}
