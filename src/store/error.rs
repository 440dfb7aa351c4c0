//! Store-specific error types
//!
//! Errors are categorized so callers can tell a uniqueness race apart from a
//! genuine persistence failure: `DuplicateNamespaceSlug` signals that another
//! writer claimed the same (namespace, locale, slug) first and the row should
//! be re-read, while the remaining variants propagate unchanged.

use crate::tag::TagId;
use thiserror::Error;

/// Tag store errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// Represents a sled database error
    #[error("Database error: {0}")]
    Sled(#[from] sled::Error),

    /// Represents a bincode encoding error
    #[error("Error while encoding record: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    /// Represents a bincode decoding error
    #[error("Error while decoding record: {0}")]
    Decode(#[from] bincode::error::DecodeError),

    /// No tag row exists for the given id
    #[error("Tag not found: {0}")]
    NotFound(TagId),

    /// Another writer persisted the same slug first; re-read the winning row
    #[error("Duplicate slug {slug:?} for locale {locale:?} in namespace {namespace:?}")]
    DuplicateNamespaceSlug {
        namespace: String,
        slug: String,
        locale: String,
    },

    /// The draft or patch cannot be persisted as given
    #[error("Invalid tag record: {0}")]
    InvalidRecord(String),

    /// The slug index references a row that cannot be read back
    #[error("Corrupted slug index entry: {0}")]
    CorruptIndex(String),
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod error_tests;
