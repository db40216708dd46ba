//! # Config — Validated Search Configuration
//!
//! Everything a node needs to run its share of a search, gathered from the
//! command line (or environment) and checked once at startup. The validated
//! value is handed to the coordinator explicitly; nothing here is global.
//!
//! ## Validation
//!
//! - The key format carries exactly one `%s` marker.
//! - Known characters plus the unknown count equal the target key length.
//! - The secret has exactly the target secret length.
//! - `1 ≤ unknown ≤ 12`, so the keyspace fits a `u64`.
//! - At least one node, one worker and one buffer slot; the node index is
//!   below the node count.
//! - A non-zero verifier timeout.
//! - No shuffle table above [`SHUFFLE_MAX_CANDIDATES`], whether the shuffle
//!   is asked for directly or is the LCG fallback for this node's range.

use std::time::Duration;

use crate::codec;
use crate::coordinator::{KeyTemplate, SearchOptions, MARKER};
use crate::partition::{self, Range};
use crate::sequence::{TraversalMode, SHUFFLE_MAX_CANDIDATES};

/// Access key length the original target format uses.
pub const DEFAULT_KEY_LENGTH: usize = 20;
/// Secret length the original target format uses.
pub const DEFAULT_SECRET_LENGTH: usize = 40;
pub const DEFAULT_BUFSIZE: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("key format must contain exactly one '%s' marker, found {found}")]
    MarkerCount { found: usize },

    #[error("key length must be exactly {expected} characters long, format and unknown count give {actual}")]
    KeyLength { expected: usize, actual: usize },

    #[error("secret length must be exactly {expected} characters long, got {actual}")]
    SecretLength { expected: usize, actual: usize },

    #[error("unknown character count must be between 1 and {max}, got {unknown}")]
    UnknownOutOfRange { unknown: u32, max: u32 },

    #[error("number of nodes must be at least 1")]
    NoNodes,

    #[error("node index {index} is out of range for {count} node(s)")]
    NodeIndex { index: u64, count: u64 },

    #[error("worker count must be at least 1")]
    NoWorkers,

    #[error("buffer size must be at least 1")]
    NoBuffer,

    #[error("verifier timeout must be at least 1 second")]
    NoVerifyTimeout,

    #[error("shuffling {candidates} candidates exceeds the limit of {limit}; use --lcg with a range divisible by 4, or more nodes")]
    ShuffleTooLarge { candidates: u64, limit: u64 },
}

#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Unknown characters in the key.
    pub unknown: u32,
    /// Key format with one `%s` marker where the unknown characters go.
    pub format: String,
    pub secret: String,
    pub random: bool,
    pub lcg: bool,
    pub node_index: u64,
    pub number_of_nodes: u64,
    pub fair_distribution: bool,
    pub workers: usize,
    pub bufsize: usize,
    pub key_length: usize,
    pub secret_length: usize,
    /// Per-call limit for the verifier.
    pub verify_timeout: Duration,
    pub verbose: bool,
}

impl SearchConfig {
    /// Check every constraint and return the parsed key template.
    pub fn validate(&self) -> Result<KeyTemplate, ConfigError> {
        let found = self.format.matches(MARKER).count();
        let template = KeyTemplate::parse(&self.format).ok_or(ConfigError::MarkerCount { found })?;

        if self.unknown == 0 || self.unknown > codec::MAX_LENGTH {
            return Err(ConfigError::UnknownOutOfRange {
                unknown: self.unknown,
                max: codec::MAX_LENGTH,
            });
        }

        let known = self.format.replace(MARKER, "").chars().count();
        let actual = known + self.unknown as usize;
        if actual != self.key_length {
            return Err(ConfigError::KeyLength {
                expected: self.key_length,
                actual,
            });
        }

        let secret_len = self.secret.chars().count();
        if secret_len != self.secret_length {
            return Err(ConfigError::SecretLength {
                expected: self.secret_length,
                actual: secret_len,
            });
        }

        if self.number_of_nodes == 0 {
            return Err(ConfigError::NoNodes);
        }
        if self.node_index >= self.number_of_nodes {
            return Err(ConfigError::NodeIndex {
                index: self.node_index,
                count: self.number_of_nodes,
            });
        }
        if self.workers == 0 {
            return Err(ConfigError::NoWorkers);
        }
        if self.bufsize == 0 {
            return Err(ConfigError::NoBuffer);
        }
        if self.verify_timeout.is_zero() {
            return Err(ConfigError::NoVerifyTimeout);
        }

        let range = self.node_range();
        if self.mode().effective(range) == TraversalMode::Shuffled
            && range.len() > SHUFFLE_MAX_CANDIDATES
        {
            return Err(ConfigError::ShuffleTooLarge {
                candidates: range.len(),
                limit: SHUFFLE_MAX_CANDIDATES,
            });
        }

        Ok(template)
    }

    pub fn mode(&self) -> TraversalMode {
        TraversalMode::from_flags(self.random, self.lcg)
    }

    /// Size of the whole keyspace across all nodes.
    pub fn total(&self) -> u64 {
        codec::keyspace_size(self.unknown)
    }

    /// The partition this node computes from its index.
    pub fn partition(&self) -> Range {
        partition::partition(
            self.total(),
            self.node_index,
            self.number_of_nodes,
            self.fair_distribution,
        )
    }

    /// This node's range, falling back to the whole keyspace when the
    /// partition comes out empty.
    pub fn node_range(&self) -> Range {
        self.partition().or_full(self.total())
    }

    pub fn search_options(&self) -> SearchOptions {
        SearchOptions {
            length: self.unknown as usize,
            mode: self.mode(),
            workers: self.workers,
            bufsize: self.bufsize,
            verbose: self.verbose,
        }
    }
}
