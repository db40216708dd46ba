//! # Coordinator — First-Success Worker Pool
//!
//! Drives one search over a pre-computed [`Range`]: a producer thread streams
//! offsets into a bounded channel and `workers` threads of a dedicated rayon
//! pool pull from it first-come first-served. Each worker encodes the offset,
//! renders it into the key template, and asks the [`Verifier`].
//!
//! ## Termination
//!
//! - A success is admitted through a `OnceLock`: the first `set` wins and
//!   cancels the shared token, later successes are discarded.
//! - Workers check the token before and after every verifier call, and stop
//!   when the channel closes. An in-flight verifier call is never interrupted.
//! - The coordinator keeps no receiver of its own, so once every worker has
//!   left the producer's next send fails and it exits even if it was blocked
//!   on a full buffer.

use crossbeam_channel::Receiver;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::cancel::CancelToken;
use crate::codec;
use crate::partition::Range;
use crate::progress::Progress;
use crate::sequence::{self, TraversalMode};
use crate::verifier::{Verifier, VerifyError};

/// Substitution marker for the unknown characters in a key format.
pub const MARKER: &str = "%s";

/// Known key text around the unknown characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyTemplate {
    prefix: String,
    suffix: String,
}

impl KeyTemplate {
    /// Split `format` at its single [`MARKER`]. `None` unless exactly one is present.
    pub fn parse(format: &str) -> Option<Self> {
        if format.matches(MARKER).count() != 1 {
            return None;
        }
        let (prefix, suffix) = format.split_once(MARKER)?;
        Some(KeyTemplate {
            prefix: prefix.to_string(),
            suffix: suffix.to_string(),
        })
    }

    /// The candidate on its own, with no surrounding text.
    pub fn bare() -> Self {
        KeyTemplate {
            prefix: String::new(),
            suffix: String::new(),
        }
    }

    /// Characters contributed by the template itself.
    pub fn fixed_len(&self) -> usize {
        self.prefix.len() + self.suffix.len()
    }

    pub fn render_into(&self, out: &mut String, candidate: &[u8]) {
        out.clear();
        out.push_str(&self.prefix);
        out.extend(candidate.iter().map(|&b| char::from(b)));
        out.push_str(&self.suffix);
    }

    pub fn render(&self, candidate: &[u8]) -> String {
        let mut out = String::with_capacity(self.fixed_len() + candidate.len());
        self.render_into(&mut out, candidate);
        out
    }
}

/// Per-search knobs, passed in explicitly.
#[derive(Debug, Clone)]
pub struct SearchOptions {
    /// Unknown characters per candidate.
    pub length: usize,
    pub mode: TraversalMode,
    pub workers: usize,
    /// Producer channel capacity.
    pub bufsize: usize,
    /// Log every attempted candidate at debug level.
    pub verbose: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Winner {
    pub key: String,
    pub offset: u64,
}

#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub winner: Option<Winner>,
    /// Verifier calls made.
    pub tested: u64,
    /// Offsets the producer handed out.
    pub produced: u64,
    /// Traversal actually used, after any LCG fallback.
    pub mode: TraversalMode,
    /// Stopped by an outside cancel rather than by success or exhaustion.
    pub cancelled: bool,
    pub elapsed_secs: f64,
}

impl SearchOutcome {
    pub fn key(&self) -> Option<&str> {
        self.winner.as_ref().map(|w| w.key.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("failed to spawn producer thread: {0}")]
    Producer(#[from] std::io::Error),

    #[error("producer thread panicked")]
    ProducerPanicked,
}

pub struct SearchCoordinator {
    options: SearchOptions,
    template: KeyTemplate,
    secret: String,
}

struct Shared<'a> {
    verifier: &'a dyn Verifier,
    cancel: &'a CancelToken,
    winner: &'a OnceLock<Winner>,
    tested: &'a AtomicU64,
    progress: Option<&'a Progress>,
}

impl SearchCoordinator {
    pub fn new(options: SearchOptions, template: KeyTemplate, secret: impl Into<String>) -> Self {
        SearchCoordinator {
            options,
            template,
            secret: secret.into(),
        }
    }

    /// Search `range` until a verifier call succeeds, the range is exhausted,
    /// or `cancel` fires.
    pub fn search(
        &self,
        range: Range,
        verifier: &dyn Verifier,
        cancel: &CancelToken,
        progress: Option<&Progress>,
    ) -> Result<SearchOutcome, SearchError> {
        let start = Instant::now();
        let workers = self.options.workers.max(1);

        let mode = self.options.mode.effective(range);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("keysweep-worker-{}", i))
            .build()?;
        let (rx, producer) = sequence::generate(
            range,
            self.options.mode,
            self.options.bufsize.max(1),
            cancel.clone(),
        )?;

        let receivers: Vec<Receiver<u64>> = (0..workers).map(|_| rx.clone()).collect();
        drop(rx);

        info!(
            offset = range.offset,
            limit = range.limit,
            mode = %mode,
            workers,
            bufsize = self.options.bufsize,
            "Search started"
        );

        let winner = OnceLock::new();
        let tested = AtomicU64::new(0);
        let shared = Shared {
            verifier,
            cancel,
            winner: &winner,
            tested: &tested,
            progress,
        };
        let shared = &shared;

        pool.scope(|s| {
            for rx in receivers {
                s.spawn(move |_| self.run_worker(rx, shared));
            }
        });

        let produced = producer.join().map_err(|_| SearchError::ProducerPanicked)?;
        let winner = winner.into_inner();
        let cancelled = winner.is_none() && cancel.is_cancelled();
        if cancelled {
            warn!(produced, "Search cancelled before completion");
        }

        Ok(SearchOutcome {
            winner,
            tested: tested.load(Ordering::Relaxed),
            produced,
            mode,
            cancelled,
            elapsed_secs: start.elapsed().as_secs_f64(),
        })
    }

    fn run_worker(&self, rx: Receiver<u64>, shared: &Shared<'_>) {
        let mut buf = vec![0u8; self.options.length];
        let mut key = String::with_capacity(self.template.fixed_len() + self.options.length);

        for offset in rx.iter() {
            if shared.cancel.is_cancelled() {
                break;
            }
            codec::encode_into(&mut buf, offset);
            self.template.render_into(&mut key, &buf);
            if self.options.verbose {
                debug!(offset, key = %key, "Trying candidate");
                if let Some(p) = shared.progress {
                    p.set_current(&key);
                }
            }

            let result = shared.verifier.verify(&key, &self.secret);
            shared.tested.fetch_add(1, Ordering::Relaxed);
            if let Some(p) = shared.progress {
                p.tested.fetch_add(1, Ordering::Relaxed);
            }

            match result {
                Ok(()) => {
                    self.admit(offset, &key, shared);
                    break;
                }
                Err(VerifyError::Rejected) => {}
                Err(e) => debug!(offset, error = %e, "Verifier error, treating as rejection"),
            }

            if shared.cancel.is_cancelled() {
                break;
            }
        }
    }

    fn admit(&self, offset: u64, key: &str, shared: &Shared<'_>) {
        let candidate = Winner {
            key: key.to_string(),
            offset,
        };
        match shared.winner.set(candidate) {
            Ok(()) => {
                shared.cancel.cancel();
                if let Some(p) = shared.progress {
                    p.found.fetch_add(1, Ordering::Relaxed);
                }
                info!(offset, key = %key, "Key found");
            }
            Err(_) => debug!(offset, key = %key, "Discarding concurrent success"),
        }
    }
}
