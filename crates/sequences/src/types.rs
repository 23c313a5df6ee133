//! Core types shared by the windowing and batching code

use crate::traits::TrainBatch;
use data_loader::DenseIdx;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How a window is cut out of a user's trail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SamplingMode {
    /// A random contiguous slice of the chronological trail
    #[default]
    Consecutive,
    /// Ratings picked uniformly without replacement; the inputs are put
    /// back in time order, the last pick stays the target
    Scattered,
}

impl fmt::Display for SamplingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SamplingMode::Consecutive => write!(f, "consecutive"),
            SamplingMode::Scattered => write!(f, "scattered"),
        }
    }
}

impl FromStr for SamplingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "consecutive" => Ok(SamplingMode::Consecutive),
            "scattered" => Ok(SamplingMode::Scattered),
            other => Err(format!(
                "unknown sampling mode '{other}' (expected 'consecutive' or 'scattered')"
            )),
        }
    }
}

/// One training example for the sequence model: `seq_len` rated movies
/// followed by the movie whose rating is to be predicted
#[derive(Debug, Clone, PartialEq)]
pub struct Window {
    /// Fold-local dense user index
    pub user: DenseIdx,
    pub items: Vec<DenseIdx>,
    /// Scaled ratings, aligned with `items`
    pub ratings: Vec<f32>,
    pub target_item: DenseIdx,
    pub target_rating: f32,
}

impl Window {
    pub fn seq_len(&self) -> usize {
        self.items.len()
    }
}

/// A batch of windows laid out for tensor construction
///
/// `items` and `ratings` are row-major `(batch, seq_len)`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SequenceBatch {
    pub users: Vec<DenseIdx>,
    pub items: Vec<DenseIdx>,
    pub ratings: Vec<f32>,
    pub target_items: Vec<DenseIdx>,
    pub target_ratings: Vec<f32>,
    pub seq_len: usize,
}

impl SequenceBatch {
    pub fn from_windows<'w, I>(windows: I, seq_len: usize) -> Self
    where
        I: IntoIterator<Item = &'w Window>,
    {
        let mut batch = SequenceBatch {
            seq_len,
            ..Default::default()
        };
        for window in windows {
            batch.users.push(window.user);
            batch.items.extend_from_slice(&window.items);
            batch.ratings.extend_from_slice(&window.ratings);
            batch.target_items.push(window.target_item);
            batch.target_ratings.push(window.target_rating);
        }
        batch
    }

    pub fn len(&self) -> usize {
        self.target_items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.target_items.is_empty()
    }
}

impl TrainBatch for SequenceBatch {
    fn len(&self) -> usize {
        self.target_items.len()
    }
}

/// A batch of (user, movie, rating) rows for the cross-filter model
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PairBatch {
    pub users: Vec<DenseIdx>,
    pub items: Vec<DenseIdx>,
    pub ratings: Vec<f32>,
}

impl PairBatch {
    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl TrainBatch for PairBatch {
    fn len(&self) -> usize {
        self.users.len()
    }
}
