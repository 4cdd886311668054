use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, instrument};

use crate::element::PageElement;
use crate::engine::BrowserEngine;
use crate::errors::UCheckError;

// Default timeout if none is specified on the wait call
const DEFAULT_LOCATOR_TIMEOUT: Duration = Duration::from_secs(10);

// Interval between lookup attempts while waiting
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Finds elements by XPath, with bounded waiting for content that client-side
/// scripts produce after the page-load call has already returned.
#[derive(Clone)]
pub struct Locator {
    engine: Arc<dyn BrowserEngine>,
    xpath: String,
    timeout: Duration,
}

impl Locator {
    pub(crate) fn new(engine: Arc<dyn BrowserEngine>, xpath: String) -> Self {
        Self {
            engine,
            xpath,
            timeout: DEFAULT_LOCATOR_TIMEOUT,
        }
    }

    /// Set a default timeout for waiting operations on this locator instance.
    pub fn set_default_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Looks the element up exactly once, without waiting. `Ok(None)` means
    /// no match right now; only driver-level failures are errors.
    pub async fn try_find(&self) -> Result<Option<PageElement>, UCheckError> {
        self.engine.try_find(&self.xpath).await
    }

    /// Waits for an element matching the locator to appear, polling until it
    /// exists or `timeout` (the locator default if `None`) elapses.
    ///
    /// Returns the first match in document order as soon as one is present.
    /// Fails with [`UCheckError::Timeout`] if nothing matches within the
    /// deadline. Driver-level failures propagate immediately, unretried.
    #[instrument(level = "debug", skip(self, timeout), fields(xpath = %self.xpath))]
    pub async fn wait(&self, timeout: Option<Duration>) -> Result<PageElement, UCheckError> {
        let effective_timeout = timeout.unwrap_or(self.timeout);
        let deadline = Instant::now() + effective_timeout;
        debug!("Waiting for element");

        loop {
            if let Some(element) = self.engine.try_find(&self.xpath).await? {
                return Ok(element);
            }
            if Instant::now() >= deadline {
                return Err(UCheckError::Timeout(format!(
                    "timed out after {effective_timeout:?} waiting for element {}",
                    self.xpath
                )));
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    pub fn xpath(&self) -> &str {
        &self.xpath
    }
}
