//! # Data Loader Crate
//!
//! This crate loads rating logs (MovieLens 20M `ratings.csv`) and indexes
//! them for sequence windowing and k-fold training.
//!
//! ## Main Components
//!
//! - **types**: Core domain types (Rating, TrailEntry, IdIndex, DataIndex)
//! - **parser**: Parse the ratings CSV into Rust structs
//! - **index**: Build the index, rescale ratings, sort user trails
//! - **folds**: Random k-fold split over users
//! - **error**: Error types for data loading
//!
//! ## Example Usage
//!
//! ```ignore
//! use data_loader::{DataIndex, FoldAssignment};
//! use std::path::Path;
//!
//! let index = DataIndex::load_from_csv(Path::new("/data/ml-20m/ratings.csv"), 5.0)?;
//! let folds = FoldAssignment::random(index.user_ids(), 2, &mut rng)?;
//! let split = folds.split(0)?;
//!
//! let trail = index.get_user_trail(split.train_users[0]);
//! println!("first training user rated {} movies", trail.len());
//! ```

// Public modules
pub mod error;
pub mod types;
pub mod parser;
pub mod index;
pub mod folds;

// Re-export commonly used types for convenience
pub use error::{DataLoadError, Result};
pub use folds::{FoldAssignment, FoldSplit};
pub use index::scale_rating;
pub use types::{
    // Type aliases
    UserId,
    MovieId,
    DenseIdx,
    // Core types
    Rating,
    TrailEntry,
    IdIndex,
    DataIndex,
    DEFAULT_RATING_SCALE,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_index_creation() {
        let index = DataIndex::default();
        let (users, movies, ratings) = index.counts();

        assert_eq!(users, 0);
        assert_eq!(movies, 0);
        assert_eq!(ratings, 0);
        assert_eq!(index.scale(), DEFAULT_RATING_SCALE);
        assert_eq!(index.min_trail_len(), None);
    }

    #[test]
    fn test_insert_rating() {
        let mut index = DataIndex::new(5.0);

        index
            .insert_rating(Rating {
                user_id: 1,
                movie_id: 1193,
                rating: 5.0,
                timestamp: 978300760,
            })
            .unwrap();

        let trail = index.get_user_trail(1);
        assert_eq!(trail.len(), 1);
        assert_eq!(trail[0].rating, 1.0);
        assert_eq!(trail[0].movie, 0);
        assert_eq!(index.movies().raw(0), Some(1193));
    }

    #[test]
    fn test_id_index_bijection() {
        let index = IdIndex::from_ids(vec![42, 7, 42, 13]);

        assert_eq!(index.len(), 3);
        assert_eq!(index.raw_ids(), &[7, 13, 42]);
        for (dense, &raw) in index.raw_ids().iter().enumerate() {
            assert_eq!(index.dense(raw), Some(dense as DenseIdx));
            assert_eq!(index.raw(dense as DenseIdx), Some(raw));
        }
        assert_eq!(index.dense(99), None);
        assert_eq!(index.raw(3), None);
    }

    #[test]
    fn test_id_index_insert_appends() {
        let mut index = IdIndex::new();
        assert_eq!(index.insert(50), 0);
        assert_eq!(index.insert(10), 1);
        assert_eq!(index.insert(50), 0);
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn test_empty_queries() {
        let index = DataIndex::default();

        assert!(index.get_user_trail(999).is_empty());
        assert!(index.user_ids().is_empty());
        assert!(index.validate().is_ok());
    }
}
