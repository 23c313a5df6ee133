//! Sequence model ("missing link net").
//!
//! Reads a user's recent ratings instead of a learned user embedding:
//! 1. Each step is the item embedding with the scaled rating appended
//!    (`hidden + 1` wide)
//! 2. An attention LSTM pools the sequence into one `hidden + 1` vector
//! 3. That vector, concatenated with the target item's embedding
//!    (`2 * hidden + 1`), goes through the scoring head

use crate::att_lstm::{AttentionLstm, AttentionLstmConfig, AttentionOutput, MaskActivation};
use crate::head::{HeadConfig, ScoringHead};
use crate::transfer::ItemEmbedder;
use candle_core::{D, Device, Module, ModuleT, Result, Tensor};
use candle_nn::{Embedding, VarBuilder, embedding};
use serde::{Deserialize, Serialize};

/// Sequence-model hyperparameters that don't depend on the data
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinkNetConfig {
    pub hidden: usize,
    pub lstm_layers: usize,
    pub mask_activation: MaskActivation,
    pub head: HeadConfig,
}

impl Default for LinkNetConfig {
    fn default() -> Self {
        Self {
            hidden: 100,
            lstm_layers: 2,
            mask_activation: MaskActivation::Sigmoid,
            head: HeadConfig::default(),
        }
    }
}

pub struct LinkNet {
    item_emb: Embedding,
    rnn: AttentionLstm,
    head: ScoringHead,
}

impl LinkNet {
    pub fn new(vb: VarBuilder, n_items: usize, config: &LinkNetConfig) -> Result<Self> {
        let step_width = config.hidden + 1;
        let rnn = AttentionLstm::new(
            &AttentionLstmConfig {
                input_size: step_width,
                hidden_size: step_width,
                num_layers: config.lstm_layers,
                mask_activation: config.mask_activation,
            },
            vb.pp("rnn"),
        )?;

        Ok(Self {
            item_emb: embedding(n_items, config.hidden, vb.pp("item_emb"))?,
            rnn,
            head: ScoringHead::new(config.hidden * 2 + 1, &config.head, vb.pp("head"))?,
        })
    }

    /// Run the attention LSTM over a batch of sequences
    ///
    /// `items`: `(batch, seq)` u32, `ratings`: `(batch, seq)` f32
    pub fn encode(&self, items: &Tensor, ratings: &Tensor) -> Result<AttentionOutput> {
        let steps = self.item_emb.forward(items)?;
        let ratings = ratings.to_dtype(steps.dtype())?.unsqueeze(D::Minus1)?;
        let steps = Tensor::cat(&[&steps, &ratings], D::Minus1)?;
        self.rnn.forward(&steps)
    }

    /// Predict the rating of `target_items` (`(batch,)` u32) -> `(batch, 1)`
    pub fn forward_t(
        &self,
        items: &Tensor,
        ratings: &Tensor,
        target_items: &Tensor,
        train: bool,
    ) -> Result<Tensor> {
        let encoded = self.encode(items, ratings)?;
        let target = self.item_emb.forward(target_items)?;
        let xs = Tensor::cat(&[&encoded.output, &target], 1)?;
        self.head.forward_t(&xs, train)
    }

    pub fn device(&self) -> &Device {
        self.item_emb.embeddings().device()
    }
}

impl ItemEmbedder for LinkNet {
    fn item_embeddings(&self) -> &Embedding {
        &self.item_emb
    }
}
