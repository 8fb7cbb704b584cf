//! Archive module
//!
//! Identifier validation, archive lookup and single-entry extraction.

mod error;
mod identifier;
mod store;

pub use error::ArchiveError;
pub use identifier::{Identifier, IdentifierPattern, DEFAULT_IDENTIFIER_PATTERN};
pub use store::ArchiveStore;

#[cfg(test)]
pub use error::{
    MSG_EMPTY_ARCHIVE, MSG_EXTRACT_FAILED, MSG_INVALID_IDENTIFIER, MSG_MISSING_IDENTIFIER,
    MSG_OPEN_FAILED,
};
