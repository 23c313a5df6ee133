//! Item-embedding transfer between model variants.
//!
//! Both models register their item table under the same variable name,
//! so a transfer is a value copy into the target's `VarMap`. The tables
//! keep separate storage; training one never moves the other.

use candle_core::Result;
use candle_nn::{Embedding, VarMap};
use tracing::debug;

/// Variable name of the item-embedding table in every model's `VarMap`
pub const ITEM_EMBEDDING: &str = "item_emb.weight";

/// A model that owns an item-embedding table registered as [`ITEM_EMBEDDING`]
pub trait ItemEmbedder {
    fn item_embeddings(&self) -> &Embedding;
}

/// Copy `from`'s item embeddings into the variable held by `to`
///
/// Fails if the target has no item table or the shapes differ.
pub fn transfer_item_embeddings(from: &impl ItemEmbedder, to: &mut VarMap) -> Result<()> {
    let weights = from.item_embeddings().embeddings();
    debug!("transferring item embeddings {:?}", weights.dims());
    to.set_one(ITEM_EMBEDDING, weights)
}
