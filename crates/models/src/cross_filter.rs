//! Deep embedded cross-filtering model.
//!
//! Scores a (user, item) pair from the concatenation of the two
//! embeddings through the shared [`ScoringHead`].

use crate::head::{HeadConfig, ScoringHead};
use crate::transfer::ItemEmbedder;
use candle_core::{Device, Module, ModuleT, Result, Tensor};
use candle_nn::{Embedding, VarBuilder, embedding};

pub struct CrossFilter {
    user_emb: Embedding,
    item_emb: Embedding,
    head: ScoringHead,
}

impl CrossFilter {
    pub fn new(
        vb: VarBuilder,
        n_users: usize,
        n_items: usize,
        hidden: usize,
        head: &HeadConfig,
    ) -> Result<Self> {
        Ok(Self {
            user_emb: embedding(n_users, hidden, vb.pp("user_emb"))?,
            item_emb: embedding(n_items, hidden, vb.pp("item_emb"))?,
            head: ScoringHead::new(hidden * 2, head, vb.pp("head"))?,
        })
    }

    /// `users`, `items`: `(batch,)` u32 indices -> `(batch, 1)` ratings in `[0, 1]`
    pub fn forward_t(&self, users: &Tensor, items: &Tensor, train: bool) -> Result<Tensor> {
        let u = self.user_emb.forward(users)?;
        let v = self.item_emb.forward(items)?;
        let xs = Tensor::cat(&[&u, &v], 1)?;
        self.head.forward_t(&xs, train)
    }

    pub fn user_embeddings(&self) -> &Embedding {
        &self.user_emb
    }

    pub fn device(&self) -> &Device {
        self.item_emb.embeddings().device()
    }
}

impl ItemEmbedder for CrossFilter {
    fn item_embeddings(&self) -> &Embedding {
        &self.item_emb
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use candle_core::DType;
    use candle_nn::VarMap;

    const N_USERS: usize = 10;
    const N_ITEMS: usize = 5;
    const DIM: usize = 8;

    fn head() -> HeadConfig {
        HeadConfig { width: 16, dropout: 0.3 }
    }

    #[test]
    fn test_build_model() -> Result<()> {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);

        let _model = CrossFilter::new(vb, N_USERS, N_ITEMS, DIM, &head())?;

        let v_data = varmap.data().lock().unwrap();
        let user_w = v_data.get("user_emb.weight").unwrap();
        assert_eq!(user_w.dims(), &[N_USERS, DIM]);

        let item_w = v_data.get("item_emb.weight").unwrap();
        assert_eq!(item_w.dims(), &[N_ITEMS, DIM]);

        let hidden_w = v_data.get("head.hidden.weight").unwrap();
        assert_eq!(hidden_w.dims(), &[16, DIM * 2]);
        Ok(())
    }

    #[test]
    fn test_forward_pass() -> Result<()> {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        let model = CrossFilter::new(vb, N_USERS, N_ITEMS, DIM, &head())?;
        let user_ids = Tensor::new(&[0u32, 1, 9], &Device::Cpu)?;
        let item_ids = Tensor::new(&[0u32, 4, 2], &Device::Cpu)?;

        for train in [true, false] {
            let output = model.forward_t(&user_ids, &item_ids, train)?;
            assert_eq!(output.dims(), &[3, 1]);
            for y in output.flatten_all()?.to_vec1::<f32>()? {
                assert!((0.0..=1.0).contains(&y));
            }
        }
        Ok(())
    }
}
