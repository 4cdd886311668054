//! Handle to a single node in the browser's current page.

use std::fmt;
use std::sync::Arc;

use crate::errors::UCheckError;

/// Backend-specific element operations.
///
/// Implemented by the WebDriver backend for live pages and by test doubles
/// for simulated ones.
#[async_trait::async_trait]
pub trait ElementImpl: Send + Sync {
    /// Visible text content of the element.
    async fn text(&self) -> Result<String, UCheckError>;

    /// Clears any pre-existing content (input fields).
    async fn clear(&self) -> Result<(), UCheckError>;

    /// Types the given text into the element.
    async fn type_text(&self, text: &str) -> Result<(), UCheckError>;

    /// Sends an Enter keystroke to the element.
    async fn press_enter(&self) -> Result<(), UCheckError>;

    /// Clicks the element through a DOM-level script, bypassing the driver's
    /// visibility and interactability checks. The form's radio controls can
    /// be occluded, so a simulated pointer click is not reliable here.
    async fn force_click(&self) -> Result<(), UCheckError>;

    /// The locator this element was found by, for error messages.
    fn locator(&self) -> &str;
}

/// A single element on the current page.
#[derive(Clone)]
pub struct PageElement {
    inner: Arc<dyn ElementImpl>,
}

impl PageElement {
    pub fn new(inner: Arc<dyn ElementImpl>) -> Self {
        Self { inner }
    }

    pub async fn text(&self) -> Result<String, UCheckError> {
        self.inner.text().await
    }

    pub async fn clear(&self) -> Result<(), UCheckError> {
        self.inner.clear().await
    }

    pub async fn type_text(&self, text: &str) -> Result<(), UCheckError> {
        self.inner.type_text(text).await
    }

    pub async fn press_enter(&self) -> Result<(), UCheckError> {
        self.inner.press_enter().await
    }

    pub async fn force_click(&self) -> Result<(), UCheckError> {
        self.inner.force_click().await
    }

    pub fn locator(&self) -> &str {
        self.inner.locator()
    }
}

impl fmt::Debug for PageElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageElement")
            .field("locator", &self.inner.locator())
            .finish()
    }
}
