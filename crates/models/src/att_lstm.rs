//! Attention-augmented LSTM.
//!
//! A stack of LSTM layers runs over the input sequence. A `hidden -> 1`
//! linear layer scores every output step, the mask activation turns the
//! scores into weights, and the weighted outputs are summed over time:
//!
//! ```text
//! xs (batch, seq, input) -> LSTM x layers -> out (batch, seq, hidden)
//! mask = act(linear(out))                 -> (batch, seq)
//! output = sum_t mask[:, t] * out[:, t]   -> (batch, hidden)
//! ```

use candle_core::{D, Result, Tensor};
use candle_nn::rnn::LSTMState;
use candle_nn::{LSTM, LSTMConfig, Linear, RNN, VarBuilder, linear, lstm};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Activation turning per-step scores into attention weights
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaskActivation {
    /// Independent gate per step
    #[default]
    Sigmoid,
    /// Weights normalised over the sequence
    Softmax,
}

impl fmt::Display for MaskActivation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaskActivation::Sigmoid => write!(f, "sigmoid"),
            MaskActivation::Softmax => write!(f, "softmax"),
        }
    }
}

impl FromStr for MaskActivation {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sigmoid" => Ok(MaskActivation::Sigmoid),
            "softmax" => Ok(MaskActivation::Softmax),
            other => Err(format!(
                "unknown mask activation '{other}' (expected 'sigmoid' or 'softmax')"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttentionLstmConfig {
    pub input_size: usize,
    pub hidden_size: usize,
    pub num_layers: usize,
    pub mask_activation: MaskActivation,
}

/// Result of one forward pass
pub struct AttentionOutput {
    /// Attention-pooled outputs, `(batch, hidden)`
    pub output: Tensor,
    /// Final `(h, c)` of every layer, bottom layer first
    pub states: Vec<LSTMState>,
    /// Attention weights, `(batch, seq)`
    pub mask: Tensor,
}

pub struct AttentionLstm {
    layers: Vec<LSTM>,
    scorer: Linear,
    activation: MaskActivation,
}

impl AttentionLstm {
    pub fn new(config: &AttentionLstmConfig, vb: VarBuilder) -> Result<Self> {
        if config.num_layers == 0 {
            candle_core::bail!("attention lstm needs at least one layer");
        }

        let mut layers = Vec::with_capacity(config.num_layers);
        for layer_idx in 0..config.num_layers {
            let in_dim = if layer_idx == 0 {
                config.input_size
            } else {
                config.hidden_size
            };
            let lstm_config = LSTMConfig {
                layer_idx,
                ..Default::default()
            };
            layers.push(lstm(in_dim, config.hidden_size, lstm_config, vb.pp("lstm"))?);
        }

        Ok(Self {
            layers,
            scorer: linear(config.hidden_size, 1, vb.pp("mask"))?,
            activation: config.mask_activation,
        })
    }

    /// `xs`: `(batch, seq, input)`, batch first
    pub fn forward(&self, xs: &Tensor) -> Result<AttentionOutput> {
        let mut outputs = xs.clone();
        let mut states = Vec::with_capacity(self.layers.len());

        for layer in &self.layers {
            let steps = layer.seq(&outputs)?;
            outputs = layer.states_to_tensor(&steps)?;
            if let Some(last) = steps.last() {
                states.push(last.clone());
            }
        }

        let scores = outputs.apply(&self.scorer)?.squeeze(D::Minus1)?;
        let mask = match self.activation {
            MaskActivation::Sigmoid => candle_nn::ops::sigmoid(&scores)?,
            MaskActivation::Softmax => candle_nn::ops::softmax(&scores, D::Minus1)?,
        };
        let output = outputs.broadcast_mul(&mask.unsqueeze(D::Minus1)?)?.sum(1)?;

        Ok(AttentionOutput {
            output,
            states,
            mask,
        })
    }
}
