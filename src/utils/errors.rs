//! Custom error types for the backup rotator.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RotatorError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Source walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Source not found: {0}")]
    SourceMissing(PathBuf),
}

pub type Result<T> = std::result::Result<T, RotatorError>;
