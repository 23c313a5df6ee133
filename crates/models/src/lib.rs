//! Model definitions for the rating experiment, built on `candle`.
//!
//! This crate provides:
//! - `CrossFilter`: user and item embeddings scored through a small head
//! - `AttentionLstm`: stacked LSTM with attention pooling over time
//! - `LinkNet`: the sequence model, replacing the user embedding with an
//!   attention LSTM over the user's recent ratings
//! - `transfer_item_embeddings`: value copy of the item table between the two
//!
//! ## Example Usage
//! ```ignore
//! use candle_core::{DType, Device};
//! use candle_nn::{VarBuilder, VarMap};
//! use models::{CrossFilter, HeadConfig, LinkNet, LinkNetConfig, transfer_item_embeddings};
//!
//! let cf_vars = VarMap::new();
//! let cf = CrossFilter::new(
//!     VarBuilder::from_varmap(&cf_vars, DType::F32, &device),
//!     n_users, n_items, 100, &HeadConfig::default(),
//! )?;
//! let mut ln_vars = VarMap::new();
//! let ln = LinkNet::new(
//!     VarBuilder::from_varmap(&ln_vars, DType::F32, &device),
//!     n_items, &LinkNetConfig::default(),
//! )?;
//!
//! // after pretraining the cross filter
//! transfer_item_embeddings(&cf, &mut ln_vars)?;
//! ```

pub mod head;
pub mod att_lstm;
pub mod cross_filter;
pub mod link_net;
pub mod transfer;

// Re-export main types
pub use head::{HeadConfig, ScoringHead};
pub use att_lstm::{AttentionLstm, AttentionLstmConfig, AttentionOutput, MaskActivation};
pub use cross_filter::CrossFilter;
pub use link_net::{LinkNet, LinkNetConfig};
pub use transfer::{ITEM_EMBEDDING, ItemEmbedder, transfer_item_embeddings};
