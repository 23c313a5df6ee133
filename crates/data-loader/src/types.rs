//! Core domain types for rating logs.
//!
//! This module defines the fundamental data structures used throughout the system:
//! - Type aliases for raw ids and dense indices
//! - The raw `Rating` row as it appears in `ratings.csv`
//! - `TrailEntry`, one scaled rating inside a user's chronological trail
//! - `IdIndex`, a bijection between raw ids and zero-based dense indices
//! - `DataIndex`, the in-memory rating log grouped by user

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// =============================================================================
// Type Aliases
// =============================================================================

/// Raw user identifier as found in the ratings file
pub type UserId = u32;

/// Raw movie identifier as found in the ratings file
pub type MovieId = u32;

/// Dense zero-based index, the row of an embedding table
pub type DenseIdx = u32;

/// MovieLens ratings go from 0.5 to 5.0 stars
pub const DEFAULT_RATING_SCALE: f32 = 5.0;

// =============================================================================
// Rating Types
// =============================================================================

/// Represents a single row of the ratings file
///
/// Field names follow the CSV header `userId,movieId,rating,timestamp`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    #[serde(rename = "userId")]
    pub user_id: UserId,
    #[serde(rename = "movieId")]
    pub movie_id: MovieId,
    /// Raw rating value, `(0, scale]`
    pub rating: f32,
    /// Unix timestamp when rating was made
    pub timestamp: i64,
}

/// One rating inside a user's trail, already indexed and rescaled
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrailEntry {
    /// Dense movie index (row of the item-embedding table)
    pub movie: DenseIdx,
    /// Rating divided by the rating scale, in `[0, 1]`
    pub rating: f32,
    pub timestamp: i64,
}

// =============================================================================
// IdIndex - raw id <-> dense index bijection
// =============================================================================

/// Bijection between raw identifiers and dense zero-based indices.
///
/// `from_ids` sorts the ids first so the same population always gets the
/// same mapping; `insert` appends unseen ids in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdIndex {
    to_dense: HashMap<u32, DenseIdx>,
    to_raw: Vec<u32>,
}

impl IdIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a deterministic index over a population of raw ids.
    /// Duplicates are collapsed.
    pub fn from_ids<I>(ids: I) -> Self
    where
        I: IntoIterator<Item = u32>,
    {
        let mut to_raw: Vec<u32> = ids.into_iter().collect();
        to_raw.sort_unstable();
        to_raw.dedup();

        let to_dense = to_raw
            .iter()
            .enumerate()
            .map(|(dense, &raw)| (raw, dense as DenseIdx))
            .collect();

        Self { to_dense, to_raw }
    }

    /// Return the dense index of `raw`, allocating the next one if unseen
    pub fn insert(&mut self, raw: u32) -> DenseIdx {
        if let Some(&dense) = self.to_dense.get(&raw) {
            return dense;
        }
        let dense = self.to_raw.len() as DenseIdx;
        self.to_raw.push(raw);
        self.to_dense.insert(raw, dense);
        dense
    }

    pub fn dense(&self, raw: u32) -> Option<DenseIdx> {
        self.to_dense.get(&raw).copied()
    }

    pub fn raw(&self, dense: DenseIdx) -> Option<u32> {
        self.to_raw.get(dense as usize).copied()
    }

    pub fn contains(&self, raw: u32) -> bool {
        self.to_dense.contains_key(&raw)
    }

    /// Raw ids ordered by their dense index
    pub fn raw_ids(&self) -> &[u32] {
        &self.to_raw
    }

    pub fn len(&self) -> usize {
        self.to_raw.len()
    }

    pub fn is_empty(&self) -> bool {
        self.to_raw.is_empty()
    }
}

// =============================================================================
// DataIndex - The In-Memory Rating Log
// =============================================================================

/// The whole rating log, indexed for windowing and fold splitting.
///
/// Movies are indexed globally because the item-embedding table outlives
/// folds. Users keep their raw ids here; each fold builds its own dense
/// user index.
#[derive(Debug)]
pub struct DataIndex {
    pub(crate) users: IdIndex,
    pub(crate) movies: IdIndex,

    /// Each user's ratings, sorted by timestamp once `sort_trails` ran
    pub(crate) user_trails: HashMap<UserId, Vec<TrailEntry>>,

    pub(crate) rating_count: usize,
    pub(crate) scale: f32,
}

impl DataIndex {
    /// Creates a new, empty DataIndex for ratings on `[0, scale]`
    pub fn new(scale: f32) -> Self {
        Self {
            users: IdIndex::new(),
            movies: IdIndex::new(),
            user_trails: HashMap::new(),
            rating_count: 0,
            scale,
        }
    }

    /// Global user index (raw id <-> dense index)
    pub fn users(&self) -> &IdIndex {
        &self.users
    }

    /// Global movie index, shared by every fold and model
    pub fn movies(&self) -> &IdIndex {
        &self.movies
    }

    /// All raw user ids, in dense-index order
    pub fn user_ids(&self) -> &[UserId] {
        self.users.raw_ids()
    }

    /// Get a user's chronological trail
    ///
    /// Returns an empty slice if the user has no ratings
    pub fn get_user_trail(&self, user_id: UserId) -> &[TrailEntry] {
        self.user_trails
            .get(&user_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Length of the shortest trail, `None` for an empty index
    pub fn min_trail_len(&self) -> Option<usize> {
        self.user_trails.values().map(Vec::len).min()
    }

    /// Number of users whose trail is shorter than `min_len`
    pub fn count_short_trails(&self, min_len: usize) -> usize {
        self.user_trails
            .values()
            .filter(|trail| trail.len() < min_len)
            .count()
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Get counts for debugging/validation: (users, movies, ratings)
    pub fn counts(&self) -> (usize, usize, usize) {
        (self.users.len(), self.movies.len(), self.rating_count)
    }
}

impl Default for DataIndex {
    fn default() -> Self {
        Self::new(DEFAULT_RATING_SCALE)
    }
}
