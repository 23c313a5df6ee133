//! DataIndex building and indexing logic.
//!
//! Turns parsed rows into the structures the rest of the workspace needs:
//! - global user and movie index maps
//! - per-user trails with ratings rescaled to `[0, 1]`
//! - trails sorted by timestamp (in parallel with Rayon)

use crate::error::{DataLoadError, Result};
use crate::parser;
use crate::types::*;
use rayon::prelude::*;
use std::path::Path;
use tracing::{debug, info, instrument};

impl DataIndex {
    /// Load and index a ratings CSV
    ///
    /// Steps:
    /// 1. Parse every row
    /// 2. Build deterministic user and movie indices
    /// 3. Rescale ratings and group them per user
    /// 4. Sort each trail by timestamp
    /// 5. Validate
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn load_from_csv(path: &Path, scale: f32) -> Result<Self> {
        info!("loading csv file {}", path.display());
        let ratings = parser::parse_ratings(path)?;
        info!("csv file loaded: {} ratings", ratings.len());

        if ratings.is_empty() {
            return Err(DataLoadError::EmptyDataset(path.display().to_string()));
        }

        Self::from_ratings(ratings, scale)
    }

    /// Build an index from already-parsed ratings
    pub fn from_ratings(ratings: Vec<Rating>, scale: f32) -> Result<Self> {
        if !(scale > 0.0) {
            return Err(DataLoadError::InvalidValue {
                field: "rating scale".to_string(),
                value: scale.to_string(),
            });
        }

        info!("making dictionary");
        let mut index = DataIndex::new(scale);
        // Pre-seeding with sorted ids keeps the mapping independent of row order
        index.users = IdIndex::from_ids(ratings.iter().map(|r| r.user_id));
        index.movies = IdIndex::from_ids(ratings.iter().map(|r| r.movie_id));

        info!("translating the index and normalizing ratings");
        for rating in ratings {
            index.insert_rating(rating)?;
        }

        index.sort_trails();
        index.validate()?;

        let (users, movies, ratings) = index.counts();
        info!(
            "total number of users and movies: {} {} ({} ratings)",
            users, movies, ratings
        );
        Ok(index)
    }

    /// Insert one rating: index its ids, rescale it, append it to the trail
    ///
    /// Trails are left in insertion order; call `sort_trails` once all
    /// ratings are in.
    pub fn insert_rating(&mut self, rating: Rating) -> Result<()> {
        let scaled = scale_rating(rating.rating, self.scale)?;

        self.users.insert(rating.user_id);
        let movie = self.movies.insert(rating.movie_id);

        self.user_trails
            .entry(rating.user_id)
            .or_default()
            .push(TrailEntry {
                movie,
                rating: scaled,
                timestamp: rating.timestamp,
            });
        self.rating_count += 1;
        Ok(())
    }

    /// Sort every trail by timestamp
    ///
    /// The sort is stable: ratings sharing a timestamp keep file order.
    pub fn sort_trails(&mut self) {
        debug!("sorting {} user trails", self.user_trails.len());
        self.user_trails
            .par_iter_mut()
            .for_each(|(_, trail)| trail.sort_by_key(|entry| entry.timestamp));
    }

    /// Validate data integrity
    ///
    /// Check that:
    /// - every trail belongs to an indexed user
    /// - every movie index points into the movie table
    /// - every scaled rating lies in `[0, 1]`
    pub fn validate(&self) -> Result<()> {
        let movie_count = self.movies.len();

        for (&user_id, trail) in &self.user_trails {
            if !self.users.contains(user_id) {
                return Err(DataLoadError::ValidationError(format!(
                    "trail for unindexed user {user_id}"
                )));
            }
            for entry in trail {
                if entry.movie as usize >= movie_count {
                    return Err(DataLoadError::ValidationError(format!(
                        "movie index {} out of range for {} movies",
                        entry.movie, movie_count
                    )));
                }
                if !(0.0..=1.0).contains(&entry.rating) {
                    return Err(DataLoadError::InvalidValue {
                        field: "scaled rating".to_string(),
                        value: entry.rating.to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Rescale a raw rating to `[0, 1]` by dividing by the maximum scale
///
/// Raw ratings must lie in `(0, scale]`.
pub fn scale_rating(raw: f32, scale: f32) -> Result<f32> {
    if !(raw > 0.0 && raw <= scale) {
        return Err(DataLoadError::InvalidValue {
            field: "rating".to_string(),
            value: raw.to_string(),
        });
    }
    Ok(raw / scale)
}
