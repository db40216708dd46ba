//! # Progress — Atomic Search Progress Counters
//!
//! Thread-safe progress tracking shared between the worker pool and the
//! background status reporter. Workers bump `tested` once per verifier call
//! (lock-free); `current` holds the most recent candidate key and is only
//! written when verbose reporting is enabled.
//!
//! ## Background Reporter
//!
//! A dedicated thread logs tested count, share of the range covered, rate
//! (candidates/sec) and the latest candidate at a fixed interval. It wakes
//! every 100 ms to check the `shutdown` flag, so `stop()` followed by `join()`
//! returns promptly.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};
use tracing::info;

const SHUTDOWN_POLL: Duration = Duration::from_millis(100);

pub struct Progress {
    pub tested: AtomicU64,
    pub found: AtomicU64,
    pub current: Mutex<String>,
    total: u64,
    start: Instant,
    shutdown: AtomicBool,
}

impl Progress {
    /// `total` is the number of candidates in this node's range.
    pub fn new(total: u64) -> Arc<Self> {
        Arc::new(Progress {
            tested: AtomicU64::new(0),
            found: AtomicU64::new(0),
            current: Mutex::new(String::new()),
            total,
            start: Instant::now(),
            shutdown: AtomicBool::new(false),
        })
    }

    pub fn start_reporter(self: &Arc<Self>, interval: Duration) -> thread::JoinHandle<()> {
        let progress = Arc::clone(self);
        thread::spawn(move || {
            let mut last = Instant::now();
            loop {
                thread::sleep(SHUTDOWN_POLL.min(interval));
                if progress.shutdown.load(Ordering::Relaxed) {
                    break;
                }
                if last.elapsed() >= interval {
                    progress.print_status();
                    last = Instant::now();
                }
            }
        })
    }

    pub fn set_current(&self, key: &str) {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        current.clear();
        current.push_str(key);
    }

    /// Fraction of the range tested so far, in percent.
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            return 100.0;
        }
        self.tested.load(Ordering::Relaxed) as f64 * 100.0 / self.total as f64
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn print_status(&self) {
        let elapsed = self.elapsed();
        let tested = self.tested.load(Ordering::Relaxed);
        let found = self.found.load(Ordering::Relaxed);
        let current = self
            .current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        let rate = if elapsed.as_secs() > 0 {
            tested as f64 / elapsed.as_secs_f64()
        } else {
            0.0
        };
        let h = elapsed.as_secs() / 3600;
        let m = (elapsed.as_secs() % 3600) / 60;
        let s = elapsed.as_secs() % 60;
        info!(
            current = %current,
            tested,
            total = self.total,
            percent = format_args!("{:.2}", self.percent()),
            rate = format_args!("{:.2}", rate),
            found,
            elapsed = format_args!("{:02}:{:02}:{:02}", h, m, s),
            "search progress"
        );
    }

    pub fn stop(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }
}
