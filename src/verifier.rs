//! # Verifier — External Candidate Oracle
//!
//! A verifier answers one question per candidate: does this key, paired with
//! the configured secret, authenticate? The search engine treats every
//! failure mode the same way (rejected, unreachable, timed out) and never
//! retries a candidate.
//!
//! ## Implementations
//!
//! - [`HttpVerifier`]: `POST {"key", "secret"}` to an endpoint; 2xx accepts.
//! - [`CommandVerifier`]: runs a shell command with the candidate in its
//!   environment; exit status 0 accepts.
//! - Any `Fn(&str, &str) -> bool + Send + Sync` closure.

use serde::Serialize;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

/// Environment variable carrying the candidate key for [`CommandVerifier`].
pub const KEY_ENV: &str = "KEYSWEEP_KEY";
/// Environment variable carrying the secret for [`CommandVerifier`].
pub const SECRET_ENV: &str = "KEYSWEEP_SECRET";

#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    /// The oracle answered and said no.
    #[error("candidate rejected")]
    Rejected,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("verifier command failed: {0}")]
    Command(#[from] std::io::Error),

    #[error("verifier timed out after {0:?}")]
    Timeout(Duration),
}

/// Call-and-get-boolean oracle, shared by every worker thread.
pub trait Verifier: Send + Sync {
    /// `Ok(())` means the candidate is the key.
    fn verify(&self, key: &str, secret: &str) -> Result<(), VerifyError>;
}

impl<F> Verifier for F
where
    F: Fn(&str, &str) -> bool + Send + Sync,
{
    fn verify(&self, key: &str, secret: &str) -> Result<(), VerifyError> {
        if self(key, secret) {
            Ok(())
        } else {
            Err(VerifyError::Rejected)
        }
    }
}

// ── HTTP ────────────────────────────────────────────────────────

#[derive(Serialize)]
struct VerifyPayload<'a> {
    key: &'a str,
    secret: &'a str,
}

pub struct HttpVerifier {
    url: String,
    agent: ureq::Agent,
}

impl HttpVerifier {
    pub fn new(url: &str, timeout: Duration) -> Self {
        let agent = ureq::Agent::new_with_config(
            ureq::config::Config::builder()
                .timeout_connect(Some(Duration::from_secs(5)))
                .timeout_global(Some(timeout))
                .build(),
        );
        HttpVerifier {
            url: url.to_string(),
            agent,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Verifier for HttpVerifier {
    fn verify(&self, key: &str, secret: &str) -> Result<(), VerifyError> {
        match self.agent.post(&self.url).send_json(&VerifyPayload { key, secret }) {
            Ok(_) => Ok(()),
            Err(ureq::Error::StatusCode(_)) => Err(VerifyError::Rejected),
            Err(e) => Err(VerifyError::Transport(e.to_string())),
        }
    }
}

// ── Subprocess ──────────────────────────────────────────────────

/// Runs `sh -c <command>` per candidate with [`KEY_ENV`] and [`SECRET_ENV`] set.
pub struct CommandVerifier {
    command: String,
    timeout: Duration,
}

impl CommandVerifier {
    pub fn new(command: &str, timeout: Duration) -> Self {
        CommandVerifier {
            command: command.to_string(),
            timeout,
        }
    }
}

impl Verifier for CommandVerifier {
    fn verify(&self, key: &str, secret: &str) -> Result<(), VerifyError> {
        let mut child = Command::new("sh")
            .arg("-c")
            .arg(&self.command)
            .env(KEY_ENV, key)
            .env(SECRET_ENV, secret)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;

        let start = Instant::now();
        let mut backoff = Duration::from_millis(1);
        loop {
            if let Some(status) = child.try_wait()? {
                return if status.success() {
                    Ok(())
                } else {
                    Err(VerifyError::Rejected)
                };
            }
            if start.elapsed() > self.timeout {
                let _ = child.kill();
                let _ = child.wait();
                return Err(VerifyError::Timeout(self.timeout));
            }
            std::thread::sleep(backoff);
            backoff = (backoff * 2).min(Duration::from_millis(50));
        }
    }
}
