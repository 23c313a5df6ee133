use anyhow::Result;
use data_loader::{DataIndex, DEFAULT_RATING_SCALE};
use std::path::Path;
use std::time::Instant;

fn main() -> Result<()> {
    let path = Path::new("/data/ml-20m/ratings.csv");

    println!("Loading MovieLens 20M ratings...\n");

    let start = Instant::now();
    let index = DataIndex::load_from_csv(path, DEFAULT_RATING_SCALE)?;
    let elapsed = start.elapsed();

    let (users, movies, ratings) = index.counts();

    println!("\n=== Load Complete ===");
    println!("Time taken: {:?}", elapsed);
    println!("Users: {}", users);
    println!("Movies: {}", movies);
    println!("Ratings: {}", ratings);
    println!("Shortest trail: {:?}", index.min_trail_len());
    println!("\nPerformance: {:.0} ratings/second",
             ratings as f64 / elapsed.as_secs_f64());
    Ok(())
}
