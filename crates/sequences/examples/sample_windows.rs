//! Example: draw training windows for a few users
//!
//! Run with: cargo run --package sequences --example sample_windows
//!
//! This example shows how to:
//! 1. Load the ratings file
//! 2. Split users into folds
//! 3. Build the fold's datasets
//! 4. Display a few windows and a resample

use data_loader::{DataIndex, FoldAssignment, DEFAULT_RATING_SCALE};
use rand::SeedableRng;
use rand::rngs::StdRng;
use sequences::{BatchSource, FoldData, SamplingMode, WindowSampler};
use std::path::Path;
use std::time::Instant;

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter("info")
        .init();

    println!("=== Window Sampling Example ===\n");

    let start = Instant::now();
    let index = DataIndex::load_from_csv(Path::new("/data/ml-20m/ratings.csv"), DEFAULT_RATING_SCALE)?;
    println!("Loaded dataset in {:?}\n", start.elapsed());

    let mut rng = StdRng::seed_from_u64(42);
    let folds = FoldAssignment::random(index.user_ids(), 2, &mut rng)?;
    let split = folds.split(0)?;

    for mode in [SamplingMode::Consecutive, SamplingMode::Scattered] {
        let start = Instant::now();
        let sampler = WindowSampler::new(19).with_mode(mode);
        let mut data = FoldData::build(&index, &split, sampler, &mut rng)?;
        println!("[{}] built fold data in {:?}", mode, start.elapsed());

        for window in data.train.windows().iter().take(3) {
            println!(
                "  user {:>6}: {:?} -> movie {} ({:.2})",
                window.user, window.items, window.target_item, window.target_rating
            );
        }

        let start = Instant::now();
        data.train.resample(&mut rng);
        println!(
            "  resampled {} windows in {:?}\n",
            data.train.len(),
            start.elapsed()
        );
    }

    Ok(())
}
