//! Rendering-service credential pool with failure-aware rotation.
//!
//! Credentials are configured once at startup and never removed; a failed
//! credential is only excluded for a cooldown window, then eligible again.
//! Selection uses wall-clock seconds modulo the available count, a
//! stateless approximation of round-robin that lets independent process
//! instances converge on similar usage without shared memory. Failure
//! memory is per-process: horizontally scaled instances each keep their
//! own view of which credentials are failed.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

/// Placeholder credential synthesized when no tokens are configured.
pub const PLACEHOLDER_TOKEN: &str = "your-browserless-token-here";

/// How long a failed credential is excluded from selection.
const COOLDOWN_MS: u64 = 60_000;

/// Opaque rendering-service token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential(Arc<str>);

impl Credential {
    fn new(token: &str) -> Self {
        Self(Arc::from(token))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_placeholder(&self) -> bool {
        self.as_str() == PLACEHOLDER_TOKEN
    }

    /// Shortened form safe for log output.
    pub fn redacted(&self) -> String {
        let token = self.as_str();
        let head: String = token.chars().take(10).collect();
        if token.len() > head.len() {
            format!("{head}...")
        } else {
            head
        }
    }
}

/// Wall-clock source, injectable so cooldown expiry is testable without
/// sleeping.
pub trait Clock: Send + Sync {
    /// Milliseconds since the Unix epoch.
    fn now_millis(&self) -> u64;
}

/// System wall clock.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }
}

/// Process-wide pool of rendering-service credentials.
pub struct TokenPool {
    tokens: Vec<Credential>,
    /// Token string -> last failure, unix millis. Last write wins.
    failures: Mutex<HashMap<String, u64>>,
    clock: Arc<dyn Clock>,
}

impl TokenPool {
    /// Parse a comma-separated token list. An empty list yields a single
    /// placeholder credential so the pool is never empty.
    pub fn new(token_list: &str) -> Self {
        Self::with_clock(token_list, Arc::new(SystemClock))
    }

    pub fn with_clock(token_list: &str, clock: Arc<dyn Clock>) -> Self {
        let mut tokens: Vec<Credential> = token_list
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(Credential::new)
            .collect();

        if tokens.is_empty() {
            tokens.push(Credential::new(PLACEHOLDER_TOKEN));
        }

        Self {
            tokens,
            failures: Mutex::new(HashMap::new()),
            clock,
        }
    }

    /// Pick the credential the next rendering attempt should use.
    ///
    /// Available credentials are those with no recorded failure or whose
    /// failure is older than the cooldown window. If every credential has
    /// failed recently, the one with the oldest failure is returned as a
    /// best-effort recovery attempt.
    pub fn available(&self) -> Credential {
        let now = self.clock.now_millis();
        let failures = self.failures.lock().unwrap();

        let available: Vec<&Credential> = self
            .tokens
            .iter()
            .filter(|t| match failures.get(t.as_str()) {
                None => true,
                Some(&failed_at) => now.saturating_sub(failed_at) > COOLDOWN_MS,
            })
            .collect();

        if available.is_empty() {
            if let Some((token, _)) = failures.iter().min_by_key(|(_, &failed_at)| failed_at) {
                if let Some(credential) = self.tokens.iter().find(|t| t.as_str() == token) {
                    return credential.clone();
                }
            }
            return self.tokens[0].clone();
        }

        let index = (now / 1000) as usize % available.len();
        available[index].clone()
    }

    /// Record a failure for a credential. Overwrites any earlier record.
    pub fn mark_failed(&self, credential: &Credential) {
        let now = self.clock.now_millis();
        self.failures
            .lock()
            .unwrap()
            .insert(credential.as_str().to_string(), now);
        tracing::warn!(
            token = %credential.redacted(),
            "Marked rendering credential as failed"
        );
    }

    /// All configured credentials, in configuration order.
    pub fn all(&self) -> &[Credential] {
        &self.tokens
    }
}
