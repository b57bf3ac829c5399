//! Document identifiers and sharded-path derivation.
//!
//! Every document is addressed by a store-assigned identifier in canonical form:
//! **32 lowercase hexadecimal characters** (a v4 UUID in simple form, no hyphens).
//!
//! Identifiers arriving from outside the store (URL path segments, CLI arguments) are
//! validated with [`DocumentId::parse`]. Anything that is not canonical is rejected, so
//! an arbitrary string can never be turned into a filesystem path.
//!
//! ## Sharded layout
//! For a canonical id `u`, the file-backed store keeps the document under
//! `collection_dir/<u[0..2]>/<u[2..4]>/<u>/`, which keeps directory fan-out small.

use crate::{StoreError, StoreResult};
use std::path::{Path, PathBuf};
use std::{fmt, str::FromStr};
use uuid::Uuid;

/// Store-assigned document identifier in canonical form.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DocumentId(Uuid);

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentId {
    /// Allocates a fresh random identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Validates an externally supplied identifier.
    ///
    /// Hyphenated or uppercase UUID forms are not normalised; callers must pass the
    /// canonical representation.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidId`] if `input` is not canonical.
    pub fn parse(input: &str) -> StoreResult<Self> {
        if !Self::is_canonical(input) {
            return Err(StoreError::InvalidId(input.to_string()));
        }
        Uuid::parse_str(input)
            .map(Self)
            .map_err(|_| StoreError::InvalidId(input.to_string()))
    }

    /// Returns true if `input` is exactly 32 characters of `0-9a-f`.
    pub fn is_canonical(input: &str) -> bool {
        input.len() == 32
            && input
                .bytes()
                .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
    }

    /// Returns `parent_dir/<s1>/<s2>/<id>/`.
    pub fn sharded_dir(&self, parent_dir: &Path) -> PathBuf {
        let canonical = self.0.simple().to_string();
        parent_dir
            .join(&canonical[0..2])
            .join(&canonical[2..4])
            .join(&canonical)
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

impl FromStr for DocumentId {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DocumentId::parse(s)
    }
}
