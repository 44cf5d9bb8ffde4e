//! This module provides utilities for loading symmetric matrices from text files.
//!
//! The format is deliberately plain so fixtures can be written by hand:
//!
//! ```text
//! # comment lines and blank lines are ignored
//! 3
//! 2.0 -1.0  0.0
//! -1.0 2.0 -1.0
//!  0.0 -1.0 2.0
//! ```
//!
//! The first data token is the dimension `n`, followed by the `n * n` entries in
//! row-major order. Line breaks inside the entries are not significant.

use faer::Mat;
use std::{
    fs::File,
    io::{self, BufRead, BufReader},
    path::Path,
};
use thiserror::Error;

/// Absolute tolerance for the symmetry check, scaled by the largest entry.
const SYMMETRY_TOLERANCE: f64 = 1e-12;

/// Represents all possible errors that can occur during matrix loading and parsing.
#[derive(Error, Debug)]
pub enum DataLoaderError {
    /// Wraps a standard I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// Occurs when the dimension token cannot be parsed.
    #[error("Parse error: Failed to parse dimension from '{0}'")]
    ParseDimension(String),
    /// Occurs when an entry cannot be parsed into a float.
    #[error("Parse error: Failed to parse float from '{0}'")]
    ParseFloat(String),
    /// Occurs if the file has no data at all.
    #[error("Format error: The matrix dimension line was not found.")]
    DimensionMissing,
    /// Occurs if `n * n` entries cannot be addressed for the declared dimension `n`.
    #[error("Format error: Dimension {0} is too large.")]
    DimensionTooLarge(usize),
    /// Occurs if the number of entries does not match the declared dimension.
    #[error("Format error: Expected {expected} entries for the declared dimension, found {found}.")]
    EntryCountMismatch { expected: usize, found: usize },
    /// Occurs if the matrix is not symmetric.
    #[error("Format error: Entry ({row}, {col}) differs from its transpose.")]
    Asymmetric { row: usize, col: usize },
}

/// Parses a symmetric matrix from any buffered reader.
pub fn parse_symmetric_matrix(reader: impl BufRead) -> Result<Mat<f64>, DataLoaderError> {
    // The declared dimension and the entry count it implies.
    let mut dim: Option<(usize, usize)> = None;
    let mut entries: Vec<f64> = Vec::new();

    for line in reader.lines() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        for token in trimmed.split_whitespace() {
            match dim {
                None => {
                    let n = token
                        .parse::<usize>()
                        .map_err(|_| DataLoaderError::ParseDimension(token.to_string()))?;
                    let count = n
                        .checked_mul(n)
                        .ok_or(DataLoaderError::DimensionTooLarge(n))?;
                    dim = Some((n, count));
                }
                Some(_) => entries.push(
                    token
                        .parse::<f64>()
                        .map_err(|_| DataLoaderError::ParseFloat(token.to_string()))?,
                ),
            }
        }
    }

    let (n, count) = dim.ok_or(DataLoaderError::DimensionMissing)?;
    if entries.len() != count {
        return Err(DataLoaderError::EntryCountMismatch {
            expected: count,
            found: entries.len(),
        });
    }

    let matrix = Mat::from_fn(n, n, |i, j| entries[i * n + j]);

    let scale = entries.iter().fold(1.0_f64, |acc, v| acc.max(v.abs()));
    for j in 0..n {
        for i in (j + 1)..n {
            if (matrix[(i, j)] - matrix[(j, i)]).abs() > SYMMETRY_TOLERANCE * scale {
                return Err(DataLoaderError::Asymmetric { row: i, col: j });
            }
        }
    }

    Ok(matrix)
}

/// Loads a symmetric matrix from a text file.
///
/// # Arguments
/// * `path`: Path to the matrix file.
///
/// # Returns
/// The dense matrix, verified to be square and symmetric.
pub fn load_symmetric_matrix(path: impl AsRef<Path>) -> Result<Mat<f64>, DataLoaderError> {
    let file = File::open(path)?;
    parse_symmetric_matrix(BufReader::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_parses_commented_file() {
        let text = "# second difference\n3\n2 -1 0\n-1 2 -1\n\n0 -1 2\n";
        let matrix = parse_symmetric_matrix(Cursor::new(text)).unwrap();
        assert_eq!(matrix.nrows(), 3);
        assert_eq!(matrix[(0, 1)], -1.0);
        assert_eq!(matrix[(2, 2)], 2.0);
    }

    #[test]
    fn test_rejects_wrong_entry_count() {
        let err = parse_symmetric_matrix(Cursor::new("2\n1 2 2\n")).unwrap_err();
        assert!(matches!(
            err,
            DataLoaderError::EntryCountMismatch {
                expected: 4,
                found: 3
            }
        ));
    }

    #[test]
    fn test_rejects_dimension_whose_square_overflows() {
        let text = format!("{}\n1 0 0 1\n", usize::MAX / 2 + 2);
        let err = parse_symmetric_matrix(Cursor::new(text)).unwrap_err();
        assert!(matches!(err, DataLoaderError::DimensionTooLarge(n) if n == usize::MAX / 2 + 2));
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn test_rejects_huge_dimension_without_allocating() {
        // The square fits in a usize, the entry count does not match.
        let err = parse_symmetric_matrix(Cursor::new("4000000000\n1 2\n")).unwrap_err();
        assert!(matches!(
            err,
            DataLoaderError::EntryCountMismatch {
                expected: 16_000_000_000_000_000_000,
                found: 2
            }
        ));
    }

    #[test]
    fn test_rejects_asymmetric_matrix() {
        let err = parse_symmetric_matrix(Cursor::new("2\n1 2\n3 1\n")).unwrap_err();
        assert!(matches!(err, DataLoaderError::Asymmetric { row: 1, col: 0 }));
    }

    #[test]
    fn test_rejects_missing_dimension() {
        let err = parse_symmetric_matrix(Cursor::new("# nothing here\n")).unwrap_err();
        assert!(matches!(err, DataLoaderError::DimensionMissing));
    }

    #[test]
    fn test_rejects_bad_float() {
        let err = parse_symmetric_matrix(Cursor::new("1\nabc\n")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Parse error: Failed to parse float from 'abc'"
        );
    }
}
