//! Parser for rating log files.
//!
//! Format (MovieLens 20M `ratings.csv`):
//!
//! ```text
//! userId,movieId,rating,timestamp
//! 1,2,3.5,1112486027
//! ```
//!
//! Rows are deserialized straight into [`Rating`] through `csv` + `serde`;
//! any malformed row aborts the load with its line number.

use crate::error::{DataLoadError, Result};
use crate::types::Rating;
use csv::{ReaderBuilder, Trim};
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;

/// Column names in file order
const COLUMNS: [&str; 4] = ["userId", "movieId", "rating", "timestamp"];

/// Parse a ratings CSV file from disk
pub fn parse_ratings(path: &Path) -> Result<Vec<Rating>> {
    let file = File::open(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => DataLoadError::FileNotFound {
            path: path.display().to_string(),
        },
        _ => DataLoadError::IoError(e),
    })?;

    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    parse_ratings_from_reader(file, &file_name)
}

/// Parse ratings from any reader; `file` is only used in error messages
pub fn parse_ratings_from_reader<R: Read>(reader: R, file: &str) -> Result<Vec<Rating>> {
    let mut csv_reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_reader(reader);

    let mut ratings = Vec::new();
    for row in csv_reader.deserialize::<Rating>() {
        let rating = row.map_err(|e| csv_error(file, e))?;
        ratings.push(rating);
    }
    Ok(ratings)
}

fn csv_error(file: &str, err: csv::Error) -> DataLoadError {
    let line = err.position().map(|pos| pos.line()).unwrap_or(0);
    let reason = match err.kind() {
        csv::ErrorKind::Deserialize { err: de, .. } => {
            match de.field().and_then(|idx| COLUMNS.get(idx as usize)) {
                Some(column) => format!("column '{}': {}", column, de.kind()),
                None => de.to_string(),
            }
        }
        _ => err.to_string(),
    };
    DataLoadError::ParseError {
        file: file.to_string(),
        line,
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rows() {
        let data = "userId,movieId,rating,timestamp\n\
                    1,2,3.5,1112486027\n\
                    1,29,3.5,1112484676\n";
        let ratings = parse_ratings_from_reader(data.as_bytes(), "ratings.csv").unwrap();

        assert_eq!(ratings.len(), 2);
        assert_eq!(ratings[0].user_id, 1);
        assert_eq!(ratings[0].movie_id, 2);
        assert_eq!(ratings[0].rating, 3.5);
        assert_eq!(ratings[1].timestamp, 1112484676);
    }

    #[test]
    fn test_header_only() {
        let data = "userId,movieId,rating,timestamp\n";
        let ratings = parse_ratings_from_reader(data.as_bytes(), "ratings.csv").unwrap();
        assert!(ratings.is_empty());
    }

    #[test]
    fn test_malformed_row_reports_line() {
        let data = "userId,movieId,rating,timestamp\n\
                    1,2,3.5,1112486027\n\
                    1,abc,3.5,1112484676\n";
        let err = parse_ratings_from_reader(data.as_bytes(), "ratings.csv").unwrap_err();

        match err {
            DataLoadError::ParseError { file, line, reason } => {
                assert_eq!(file, "ratings.csv");
                assert_eq!(line, 3);
                assert!(reason.contains("movieId"), "reason: {reason}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_file() {
        let err = parse_ratings(Path::new("/definitely/not/here/ratings.csv")).unwrap_err();
        assert!(matches!(err, DataLoadError::FileNotFound { .. }));
    }
}
