//! LLM client used for topic extraction.
//!
//! - [`Ask`]: the seam the analyser depends on; tests substitute canned answers
//! - [`AwfulAjClient`]: sends prompts through `awful_aj` to an OpenAI-compatible API
//! - [`Backoff`]: retries transport failures of any [`Ask`] with exponential
//!   backoff and jitter, then gives up and returns the last error
//!
//! Only transport failures are retried. A response that arrives but is not
//! valid JSON is the caller's problem and is never re-asked.

use awful_aj::api::ask;
use awful_aj::{config::AwfulJadeConfig, template::ChatTemplate};
use rand::{Rng, rng};
use std::error::Error;
use std::fmt;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{error, instrument, warn};

/// Sends a prompt to a language model and returns its raw text answer.
pub trait Ask {
    /// # Arguments
    ///
    /// * `prompt` - The full prompt, article text included
    ///
    /// # Returns
    ///
    /// The model's raw answer, or an error if the request failed.
    async fn ask(&self, prompt: &str) -> Result<String, Box<dyn Error>>;
}

/// [`Ask`] implementation backed by `awful_aj`.
#[derive(Debug)]
pub struct AwfulAjClient {
    /// API endpoint, key and model settings.
    pub config: AwfulJadeConfig,
    /// System prompt and conversation scaffold.
    pub template: ChatTemplate,
}

impl Ask for AwfulAjClient {
    #[instrument(level = "info", skip_all, fields(prompt_bytes = prompt.len()))]
    async fn ask(&self, prompt: &str) -> Result<String, Box<dyn Error>> {
        let t0 = Instant::now();
        let res = ask(&self.config, prompt.to_string(), &self.template, None, None).await;
        if let Err(e) = &res {
            warn!(elapsed_ms = t0.elapsed().as_millis() as u64, error = %e, "LLM request failed");
        }
        res
    }
}

/// Retry decorator for any [`Ask`].
///
/// ```text
/// delay(attempt) = min(base_delay * 2^(attempt-1), max_delay) + jitter(0..=250ms)
/// ```
pub struct Backoff<T> {
    inner: T,
    max_retries: usize,
    base_delay: Duration,
    max_delay: Duration,
}

impl<T: Ask> Backoff<T> {
    /// Wrap `inner` with retries; the delay between attempts is capped at 30 seconds.
    ///
    /// # Arguments
    ///
    /// * `inner` - The client whose transport failures are retried
    /// * `max_retries` - Retries after the first attempt (0 means call once)
    /// * `base_delay` - Delay before the first retry, doubled for each later one
    ///
    /// # Example
    ///
    /// ```ignore
    /// let client = AwfulAjClient { config, template };
    /// let client = Backoff::new(client, 2, Duration::from_secs(1));
    /// ```
    pub fn new(inner: T, max_retries: usize, base_delay: Duration) -> Self {
        Self {
            inner,
            max_retries,
            base_delay,
            max_delay: Duration::from_secs(30),
        }
    }

    fn delay_for(&self, attempt: usize) -> Duration {
        let exponent = u32::try_from(attempt.saturating_sub(1)).unwrap_or(u32::MAX).min(16);
        let delay = self.base_delay.saturating_mul(1 << exponent).min(self.max_delay);
        let jitter_ms: u64 = rng().random_range(0..=250);
        delay + Duration::from_millis(jitter_ms)
    }
}

impl<T> fmt::Debug for Backoff<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Backoff")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .finish()
    }
}

impl<T: Ask> Ask for Backoff<T> {
    #[instrument(level = "debug", skip_all)]
    async fn ask(&self, prompt: &str) -> Result<String, Box<dyn Error>> {
        let t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            match self.inner.ask(prompt).await {
                Ok(resp) => return Ok(resp),
                Err(e) => {
                    attempt += 1;
                    if attempt > self.max_retries {
                        error!(
                            attempt,
                            max = self.max_retries,
                            elapsed_ms_total = t0.elapsed().as_millis() as u64,
                            error = %e,
                            "LLM request exhausted retries"
                        );
                        return Err(e);
                    }

                    let delay = self.delay_for(attempt);
                    warn!(attempt, max = self.max_retries, ?delay, error = %e, "LLM request failed; backing off");
                    sleep(delay).await;
                }
            }
        }
    }
}
