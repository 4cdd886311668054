//! The seam between the orchestration logic and the browser.

pub mod webdriver;

pub use webdriver::{DriverSettings, WebDriverEngine};

use crate::element::PageElement;
use crate::errors::UCheckError;

/// The common trait a browser backend must implement: navigation, one-shot
/// element lookup, and session teardown.
///
/// `try_find` models "element absent" as `Ok(None)` rather than an error.
/// Login validation depends on that distinction: there, an absent element is
/// the success path and a present one is the failure path.
#[async_trait::async_trait]
pub trait BrowserEngine: Send + Sync {
    /// Loads `url` into the session's current page. Returns once the initial
    /// page-load signal fires; content produced by client-side scripts may
    /// not be present yet.
    async fn goto(&self, url: &str) -> Result<(), UCheckError>;

    /// Looks up the first element matching the XPath once, immediately.
    /// `Ok(None)` when nothing matches; `Err` only for driver-level failures.
    async fn try_find(&self, xpath: &str) -> Result<Option<PageElement>, UCheckError>;

    /// Like [`try_find`](Self::try_find), but absence is a fatal
    /// [`UCheckError::ElementNotFound`].
    async fn find(&self, xpath: &str) -> Result<PageElement, UCheckError> {
        self.try_find(xpath)
            .await?
            .ok_or_else(|| UCheckError::ElementNotFound(format!("no element matches {xpath}")))
    }

    /// Ends the browser session.
    async fn close(&self) -> Result<(), UCheckError>;
}
