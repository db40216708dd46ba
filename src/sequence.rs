//! # Sequence — Offset Traversal Strategies
//!
//! Produces every offset of a [`Range`] exactly once, in one of three orders:
//!
//! | Mode | Order | Memory |
//! |------|-------|--------|
//! | `Sequential` | ascending | O(1) |
//! | `Shuffled` | uniform random permutation (Fisher–Yates) | O(range) |
//! | `Lcg` | full-period LCG permutation | O(1) |
//!
//! All three sit behind [`OffsetSequence`], a plain `Iterator<Item = u64>`, so
//! the producer does not care which one it drives. When an LCG cannot be built
//! for the range length (not a multiple of 4), the sequence falls back to
//! `Shuffled` and logs a warning.
//!
//! ## Producer
//!
//! [`spawn_producer`] runs a sequence on its own thread, feeding a bounded
//! crossbeam channel. The send blocks while the buffer is full. The producer
//! stops early when the [`CancelToken`] fires or every receiver is gone, and
//! dropping its sender is what closes the stream for the workers.

use crossbeam_channel::{Receiver, Sender};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use std::thread;
use tracing::{debug, warn};

use crate::cancel::CancelToken;
use crate::lcg::Lcg;
use crate::partition::Range;

/// Above this many offsets the shuffle table costs over 128 MiB.
pub const SHUFFLE_WARN_LIMIT: u64 = 16 * 1024 * 1024;

/// Largest shuffle table (2 GiB of offsets) a configuration may ask for.
/// [`OffsetSequence`] itself does not enforce it.
pub const SHUFFLE_MAX_CANDIDATES: u64 = 256 * 1024 * 1024;

/// How a range is traversed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TraversalMode {
    Sequential,
    Shuffled,
    Lcg,
}

impl TraversalMode {
    /// Map the `random` / `lcg` flags onto a mode. `lcg` only matters when
    /// `random` is set.
    pub fn from_flags(random: bool, lcg: bool) -> Self {
        match (random, lcg) {
            (false, _) => TraversalMode::Sequential,
            (true, false) => TraversalMode::Shuffled,
            (true, true) => TraversalMode::Lcg,
        }
    }

    /// The mode an [`OffsetSequence`] over `range` actually runs. An empty
    /// range is always sequential; LCG over a length not divisible by 4
    /// becomes a shuffle.
    pub fn effective(self, range: Range) -> TraversalMode {
        let (_, len) = relative(range);
        match self {
            TraversalMode::Lcg if len == 0 => TraversalMode::Sequential,
            TraversalMode::Lcg if len % 4 != 0 => TraversalMode::Shuffled,
            mode => mode,
        }
    }
}

/// Base and length of `range`, rewriting `offset > limit` as `offset - limit`.
fn relative(range: Range) -> (u64, u64) {
    let Range { mut offset, limit } = range;
    if offset > limit {
        offset -= limit;
    }
    (offset, limit.saturating_sub(offset))
}

impl std::fmt::Display for TraversalMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            TraversalMode::Sequential => "sequential",
            TraversalMode::Shuffled => "shuffled",
            TraversalMode::Lcg => "lcg",
        })
    }
}

/// A finite, single-pass stream of offsets covering one range.
#[derive(Debug)]
pub enum OffsetSequence {
    Sequential(std::ops::Range<u64>),
    Shuffled {
        base: u64,
        values: std::vec::IntoIter<u64>,
    },
    Lcg {
        base: u64,
        lcg: Lcg,
        remaining: u64,
    },
}

impl OffsetSequence {
    pub fn new(range: Range, mode: TraversalMode) -> Self {
        Self::with_rng(range, mode, &mut rand::rng())
    }

    /// Build the sequence for `range`, drawing all randomness from `rng`.
    pub fn with_rng<R: Rng + ?Sized>(range: Range, mode: TraversalMode, rng: &mut R) -> Self {
        let (offset, relative_limit) = relative(range);

        match mode {
            TraversalMode::Sequential => OffsetSequence::Sequential(offset..offset + relative_limit),
            TraversalMode::Shuffled => Self::shuffled(offset, relative_limit, rng),
            TraversalMode::Lcg if relative_limit == 0 => OffsetSequence::Sequential(offset..offset),
            TraversalMode::Lcg => {
                let seed = rng.random_range(0..relative_limit);
                match Lcg::with_rng(seed, relative_limit, rng) {
                    Ok(lcg) => {
                        debug!(
                            modulus = lcg.modulus(),
                            multiplier = lcg.multiplier(),
                            increment = lcg.increment(),
                            seed,
                            "LCG traversal ready"
                        );
                        OffsetSequence::Lcg {
                            base: offset,
                            lcg,
                            remaining: relative_limit,
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, "LCG unavailable, falling back to shuffled traversal");
                        Self::shuffled(offset, relative_limit, rng)
                    }
                }
            }
        }
    }

    fn shuffled<R: Rng + ?Sized>(base: u64, len: u64, rng: &mut R) -> Self {
        if len > SHUFFLE_WARN_LIMIT {
            warn!(
                candidates = len,
                bytes = len.saturating_mul(8),
                "Materializing a large shuffle table"
            );
        }
        let mut values: Vec<u64> = (0..len).collect();
        values.shuffle(rng);
        OffsetSequence::Shuffled {
            base,
            values: values.into_iter(),
        }
    }

    /// The strategy actually in use (after any LCG fallback).
    pub fn mode(&self) -> TraversalMode {
        match self {
            OffsetSequence::Sequential(_) => TraversalMode::Sequential,
            OffsetSequence::Shuffled { .. } => TraversalMode::Shuffled,
            OffsetSequence::Lcg { .. } => TraversalMode::Lcg,
        }
    }

    /// Offsets not yet emitted.
    pub fn remaining(&self) -> u64 {
        match self {
            OffsetSequence::Sequential(r) => r.end - r.start,
            OffsetSequence::Shuffled { values, .. } => values.len() as u64,
            OffsetSequence::Lcg { remaining, .. } => *remaining,
        }
    }
}

impl Iterator for OffsetSequence {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        match self {
            OffsetSequence::Sequential(r) => r.next(),
            OffsetSequence::Shuffled { base, values } => values.next().map(|v| *base + v),
            OffsetSequence::Lcg {
                base,
                lcg,
                remaining,
            } => {
                if *remaining == 0 {
                    return None;
                }
                *remaining -= 1;
                Some(*base + lcg.step())
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = usize::try_from(self.remaining()).unwrap_or(usize::MAX);
        (n, Some(n))
    }
}

/// Run `sequence` on a producer thread feeding a channel of capacity `bufsize`.
///
/// Returns the receiving end and a handle yielding the number of offsets sent.
pub fn spawn_producer(
    sequence: OffsetSequence,
    bufsize: usize,
    cancel: CancelToken,
) -> std::io::Result<(Receiver<u64>, thread::JoinHandle<u64>)> {
    let (tx, rx) = crossbeam_channel::bounded(bufsize);
    let handle = thread::Builder::new()
        .name("keysweep-producer".into())
        .spawn(move || produce(sequence, &tx, &cancel))?;
    Ok((rx, handle))
}

fn produce(sequence: OffsetSequence, tx: &Sender<u64>, cancel: &CancelToken) -> u64 {
    let mut sent = 0u64;
    for offset in sequence {
        if cancel.is_cancelled() {
            debug!(sent, "Producer cancelled");
            break;
        }
        if tx.send(offset).is_err() {
            // All workers are gone.
            break;
        }
        sent += 1;
    }
    sent
}

/// Build the sequence for `range` and start producing it.
pub fn generate(
    range: Range,
    mode: TraversalMode,
    bufsize: usize,
    cancel: CancelToken,
) -> std::io::Result<(Receiver<u64>, thread::JoinHandle<u64>)> {
    spawn_producer(OffsetSequence::new(range, mode), bufsize, cancel)
}
