use ballotbook_shared::ReceiptError;
use thiserror::Error;

/// Errors produced by the store layer.
#[derive(Error, Debug)]
pub enum StoreError {
    /// SQLite error.
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Generic I/O error (e.g. creating the database directory).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A query expected exactly one row but found none.
    #[error("Record not found")]
    NotFound,

    /// Migration failure.
    #[error("Migration error: {0}")]
    Migration(String),

    /// The caller may not vote; carries every reason found.
    #[error("Not eligible to vote: {}", .0.join(" "))]
    Ineligible(Vec<String>),

    /// A registry book row already exists for this voter and evaluation.
    #[error("Voter already holds a registry book entry for this evaluation")]
    AlreadyVoted,

    /// Receipt code generation failed.
    #[error("Receipt error: {0}")]
    Receipt(#[from] ReceiptError),

    /// Seed document could not be parsed.
    #[error("Seed error: {0}")]
    Seed(#[from] serde_json::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StoreError>;
