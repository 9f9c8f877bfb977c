//! Word pools.
//!
//! A pool is the normalized, de-duplicated, sorted word list a round lineage
//! draws from. Pools are immutable and shared between every round of a
//! lineage, so cloning one only bumps a reference count.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Minimum distinct words in a caller-supplied pool.
pub const MIN_OVERRIDE_WORDS: usize = 25;

/// Maximum distinct words in a caller-supplied pool.
pub const MAX_OVERRIDE_WORDS: usize = 10_000;

/// Word pool validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WordPoolError {
    /// Fewer distinct words than required.
    #[error("need at least {MIN_OVERRIDE_WORDS} words, got {0}")]
    TooFew(usize),
    /// More distinct words than allowed.
    #[error("too many words in the set: {0} (max {MAX_OVERRIDE_WORDS})")]
    TooMany(usize),
}

/// Ordered set of uppercase words.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WordPool(Arc<[String]>);

impl WordPool {
    /// Build a pool from raw words: trimmed, uppercased, blanks dropped,
    /// duplicates removed, sorted.
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let set: BTreeSet<String> = words
            .into_iter()
            .map(|w| w.as_ref().trim().to_uppercase())
            .filter(|w| !w.is_empty())
            .collect();
        Self(set.into_iter().collect())
    }

    /// Parse a caller-supplied override.
    ///
    /// An empty override means "no override" and yields `Ok(None)`. Otherwise
    /// the distinct normalized count must lie in
    /// `MIN_OVERRIDE_WORDS..=MAX_OVERRIDE_WORDS`.
    pub fn from_override<S: AsRef<str>>(words: &[S]) -> Result<Option<Self>, WordPoolError> {
        let pool = Self::new(words);
        match pool.len() {
            0 => Ok(None),
            n if n < MIN_OVERRIDE_WORDS => Err(WordPoolError::TooFew(n)),
            n if n > MAX_OVERRIDE_WORDS => Err(WordPoolError::TooMany(n)),
            _ => Ok(Some(pool)),
        }
    }

    /// Number of words.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if the pool holds no words.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::ops::Index<usize> for WordPool {
    type Output = str;

    fn index(&self, index: usize) -> &str {
        &self.0[index]
    }
}

#[cfg(test)]
pub(crate) fn numbered_words(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("word{i:05}")).collect()
}
