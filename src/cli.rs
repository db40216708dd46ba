//! # CLI Execution
//!
//! Extracted from `main.rs` to keep the entry point slim. Wires the validated
//! configuration to the collaborators: verifier and notifier selection, the
//! cancellation sources (signal handler, timeout watchdog), the progress
//! reporter, and the final summary.

use anyhow::{bail, Result};
use keysweep::cancel::CancelToken;
use keysweep::coordinator::{SearchCoordinator, SearchOutcome};
use keysweep::notifier::{Notifier, WebhookNotifier};
use keysweep::partition::Range;
use keysweep::progress::Progress;
use keysweep::sequence::TraversalMode;
use keysweep::config::SearchConfig;
use keysweep::verifier::{CommandVerifier, HttpVerifier, Verifier};
use serde::Serialize;
use std::thread;
use std::time::Duration;
use tracing::{info, warn};

use super::Cli;

/// Machine-readable result printed with `--json`.
#[derive(Serialize)]
struct Report<'a> {
    node_index: u64,
    range: Range,
    mode: TraversalMode,
    workers: usize,
    tested: u64,
    key: Option<&'a str>,
    cancelled: bool,
    elapsed_secs: f64,
}

// ── Search ──────────────────────────────────────────────────────

/// Run this node's share of the search, print the summary, and notify.
pub fn run_search(cli: &Cli) -> Result<()> {
    let config = cli.search_config();
    let template = config.validate()?;

    let partition = config.partition();
    let range = config.node_range();
    if partition.is_degenerate() {
        warn!(
            offset = partition.offset,
            limit = partition.limit,
            total = config.total(),
            "Node partition is empty, searching the full keyspace"
        );
    }
    info!(
        node_index = config.node_index,
        number_of_nodes = config.number_of_nodes,
        offset = range.offset,
        limit = range.limit,
        total = config.total(),
        fair_distribution = config.fair_distribution,
        "keysweep starting"
    );

    let verifier = build_verifier(cli, &config)?;
    let notifier = cli.notify_url.as_deref().map(WebhookNotifier::new);

    let cancel = CancelToken::new();
    spawn_signal_handler(cancel.clone());
    let finished = CancelToken::new();
    let watchdog = cli
        .timeout_secs
        .map(|secs| spawn_watchdog(Duration::from_secs(secs), cancel.clone(), finished.clone()));

    let progress = Progress::new(range.len());
    let reporter = (cli.progress_secs > 0)
        .then(|| progress.start_reporter(Duration::from_secs(cli.progress_secs)));

    let coordinator = SearchCoordinator::new(config.search_options(), template, config.secret.clone());
    let result = coordinator.search(range, verifier.as_ref(), &cancel, Some(progress.as_ref()));

    finished.cancel();
    if let Some(handle) = watchdog {
        let _ = handle.join();
    }
    progress.stop();
    if let Some(handle) = reporter {
        let _ = handle.join();
    }
    progress.print_status();

    let outcome = result?;
    let message = summary_message(config.node_index, range, &outcome);

    if cli.json {
        let report = Report {
            node_index: config.node_index,
            range,
            mode: outcome.mode,
            workers: config.workers,
            tested: outcome.tested,
            key: outcome.key(),
            cancelled: outcome.cancelled,
            elapsed_secs: outcome.elapsed_secs,
        };
        println!("{}", serde_json::to_string(&report)?);
    } else {
        println!("{}", message);
    }

    if let Some(notifier) = notifier {
        match notifier.notify(&message) {
            Ok(()) => info!("Completion notification sent"),
            Err(e) => warn!(error = %e, "Completion notification failed"),
        }
    }

    info!(tested = outcome.tested, found = outcome.winner.is_some(), "Search complete");
    Ok(())
}

fn build_verifier(cli: &Cli, config: &SearchConfig) -> Result<Box<dyn Verifier>> {
    let timeout = config.verify_timeout;
    match (&cli.verify_url, &cli.verify_command) {
        (Some(url), _) => {
            info!(url = %url, "Using HTTP verifier");
            Ok(Box::new(HttpVerifier::new(url, timeout)))
        }
        (None, Some(command)) => {
            info!("Using command verifier");
            Ok(Box::new(CommandVerifier::new(command, timeout)))
        }
        (None, None) => bail!("one of --verify-url or --verify-command is required"),
    }
}

/// Human-readable one-line summary, also used as the notification body.
fn summary_message(node_index: u64, range: Range, outcome: &SearchOutcome) -> String {
    let head = format!(
        "Node Index: {}, Offset: {}, limit: {} - ",
        node_index, range.offset, range.limit
    );
    let taken = format!("Time Taken(s): {:.3}s", outcome.elapsed_secs);
    match outcome.key() {
        Some(key) => format!("{}Found access key: {} - {}", head, key, taken),
        None if outcome.cancelled => format!("{}Search cancelled - {}", head, taken),
        None => format!("{}Unable to find access key - {}", head, taken),
    }
}

// ── Cancellation Sources ────────────────────────────────────────

/// Cancel the search on SIGINT/SIGTERM. In-flight verifier calls finish first.
fn spawn_signal_handler(cancel: CancelToken) {
    thread::spawn(move || {
        let sig_rt = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(rt) => rt,
            Err(e) => {
                warn!(error = %e, "Signal handler unavailable");
                return;
            }
        };
        sig_rt.block_on(async {
            let ctrl_c = tokio::signal::ctrl_c();
            #[cfg(unix)]
            {
                match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                    Ok(mut sigterm) => {
                        tokio::select! {
                            _ = ctrl_c => {},
                            _ = sigterm.recv() => {},
                        }
                    }
                    Err(_) => {
                        let _ = ctrl_c.await;
                    }
                }
            }
            #[cfg(not(unix))]
            {
                let _ = ctrl_c.await;
            }
        });
        if cancel.cancel() {
            info!("Interrupt received, stopping search");
        }
    });
}

/// Cancel the search once `limit` has passed, unless `finished` fires first.
fn spawn_watchdog(limit: Duration, cancel: CancelToken, finished: CancelToken) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let start = std::time::Instant::now();
        while !finished.is_cancelled() {
            if start.elapsed() >= limit {
                if cancel.cancel() {
                    info!(timeout_secs = limit.as_secs(), "Timeout reached, stopping search");
                }
                return;
            }
            thread::sleep(Duration::from_millis(100));
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use keysweep::coordinator::Winner;

    fn outcome(winner: Option<Winner>, cancelled: bool) -> SearchOutcome {
        SearchOutcome {
            winner,
            tested: 10,
            produced: 10,
            mode: TraversalMode::Sequential,
            cancelled,
            elapsed_secs: 1.5,
        }
    }

    #[test]
    fn summary_reports_found_key() {
        let w = Winner {
            key: "AKIABK".into(),
            offset: 42,
        };
        let msg = summary_message(0, Range::new(0, 1024), &outcome(Some(w), false));
        assert_eq!(
            msg,
            "Node Index: 0, Offset: 0, limit: 1024 - Found access key: AKIABK - Time Taken(s): 1.500s"
        );
    }

    #[test]
    fn summary_reports_exhaustion() {
        let msg = summary_message(2, Range::new(10, 20), &outcome(None, false));
        assert!(msg.starts_with("Node Index: 2, Offset: 10, limit: 20 - Unable to find access key"));
    }

    #[test]
    fn summary_reports_cancellation() {
        let msg = summary_message(0, Range::new(0, 32), &outcome(None, true));
        assert!(msg.contains("Search cancelled"));
    }

    fn parse(args: &[&str]) -> Cli {
        use clap::Parser;
        let base = ["keysweep", "--format", "AKIA%s", "--secret", "abc"];
        Cli::parse_from(base.iter().chain(args))
    }

    #[test]
    fn verifier_follows_flags() {
        let cli = parse(&["--verify-command", "true"]);
        assert!(build_verifier(&cli, &cli.search_config()).is_ok());
        let cli = parse(&["--verify-url", "http://127.0.0.1:9/"]);
        assert!(build_verifier(&cli, &cli.search_config()).is_ok());
    }

    #[test]
    fn missing_verifier_is_an_error() {
        let mut cli = parse(&["--verify-command", "true"]);
        cli.verify_command = None;
        let err = build_verifier(&cli, &cli.search_config()).err().unwrap();
        assert!(err.to_string().contains("--verify-command"));
    }

    #[test]
    fn watchdog_cancels_after_limit() {
        let cancel = CancelToken::new();
        let handle = spawn_watchdog(Duration::from_millis(10), cancel.clone(), CancelToken::new());
        handle.join().unwrap();
        assert!(cancel.is_cancelled());
    }

    #[test]
    fn watchdog_exits_when_finished() {
        let cancel = CancelToken::new();
        let finished = CancelToken::new();
        let handle = spawn_watchdog(Duration::from_secs(3600), cancel.clone(), finished.clone());
        finished.cancel();
        handle.join().unwrap();
        assert!(!cancel.is_cancelled());
    }
}
