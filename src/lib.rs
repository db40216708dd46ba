//! # keysweep — Distributed Keyspace Search
//!
//! Finds the one key in a finite radix-32 keyspace that an external verifier
//! accepts, splitting the work across a local worker pool and, optionally,
//! across independently started nodes.
//!
//! ## Data Flow
//!
//! ```text
//! partition ──► sequence (producer thread) ──► bounded channel ──► coordinator workers
//!   [offset, limit)   sequential | shuffled | lcg              codec::encode → Verifier
//! ```
//!
//! - [`partition`]: each node's `[offset, limit)` share of `[0, 32^n)`.
//! - [`sequence`]: one offset stream per range in one of three orders.
//! - [`lcg`]: full-period LCG behind the O(1)-memory random order.
//! - [`codec`]: offset to fixed-width base-32 string.
//! - [`coordinator`]: worker pool with first-success cancellation.
//! - [`verifier`] / [`notifier`]: the external collaborators.
//! - [`config`] / [`progress`] / [`cancel`]: validated settings, counters,
//!   and the shared cancellation token.

pub mod cancel;
pub mod codec;
pub mod config;
pub mod coordinator;
pub mod lcg;
pub mod notifier;
pub mod partition;
pub mod progress;
pub mod sequence;
pub mod verifier;

pub use cancel::CancelToken;
pub use coordinator::{KeyTemplate, SearchCoordinator, SearchOptions, SearchOutcome};
pub use partition::Range;
pub use sequence::TraversalMode;
pub use verifier::Verifier;
