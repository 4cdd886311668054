//! WebDriver-backed browser engine.
//!
//! Spawns a chromedriver process from a configurable filesystem path, opens a
//! session against it with fantoccini, and serves the [`BrowserEngine`]
//! operations over that session.

use std::fmt::Display;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use fantoccini::elements::Element;
use fantoccini::key::Key;
use fantoccini::{Client, ClientBuilder, Locator as WebDriverLocator};
use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

use crate::element::{ElementImpl, PageElement};
use crate::engine::BrowserEngine;
use crate::errors::UCheckError;

// Give a freshly spawned chromedriver up to 5 seconds to start listening.
const CONNECT_ATTEMPTS: u32 = 20;
const CONNECT_RETRY_DELAY: Duration = Duration::from_millis(250);

/// Where and how to run the browser driver.
#[derive(Debug, Clone)]
pub struct DriverSettings {
    /// Path to the driver executable (e.g. chromedriver).
    pub driver_path: PathBuf,
    /// Local port the driver listens on.
    pub port: u16,
    /// Run the browser without a visible window.
    pub headless: bool,
}

impl Default for DriverSettings {
    fn default() -> Self {
        Self {
            driver_path: PathBuf::from("/opt/WebDriver/bin/chromedriver"),
            port: 9515,
            headless: false,
        }
    }
}

fn driver_err(e: impl Display) -> UCheckError {
    UCheckError::Driver(e.to_string())
}

/// Live browser session driven over the WebDriver protocol.
pub struct WebDriverEngine {
    client: Client,
    driver: Mutex<Option<Child>>,
}

impl WebDriverEngine {
    /// Spawns the driver executable and opens a WebDriver session against it.
    ///
    /// The child process is killed when the engine is dropped; the WebDriver
    /// session itself is ended by [`BrowserEngine::close`].
    #[instrument(skip(settings), fields(driver = %settings.driver_path.display(), port = settings.port))]
    pub async fn launch(settings: &DriverSettings) -> Result<Self, UCheckError> {
        info!("Starting browser driver");
        let child = Command::new(&settings.driver_path)
            .arg(format!("--port={}", settings.port))
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                UCheckError::Driver(format!(
                    "cannot start driver {}: {e}",
                    settings.driver_path.display()
                ))
            })?;

        let client = Self::connect(settings).await?;
        Ok(Self {
            client,
            driver: Mutex::new(Some(child)),
        })
    }

    async fn connect(settings: &DriverSettings) -> Result<Client, UCheckError> {
        let url = format!("http://localhost:{}", settings.port);
        let mut builder = ClientBuilder::rustls().map_err(driver_err)?;
        builder.capabilities(Self::capabilities(settings));

        // The driver needs a moment before it accepts connections.
        let mut last_error = None;
        for attempt in 0..CONNECT_ATTEMPTS {
            match builder.connect(&url).await {
                Ok(client) => {
                    debug!(attempt, "WebDriver session established");
                    return Ok(client);
                }
                Err(e) => last_error = Some(e),
            }
            tokio::time::sleep(CONNECT_RETRY_DELAY).await;
        }
        Err(UCheckError::Driver(format!(
            "cannot reach driver at {url}: {}",
            last_error.map_or_else(|| "no connection attempts made".into(), |e| e.to_string())
        )))
    }

    fn capabilities(settings: &DriverSettings) -> serde_json::Map<String, serde_json::Value> {
        let mut caps = serde_json::Map::new();
        if settings.headless {
            caps.insert(
                "goog:chromeOptions".to_string(),
                serde_json::json!({ "args": ["--headless=new", "--disable-gpu"] }),
            );
        }
        caps
    }
}

#[async_trait::async_trait]
impl BrowserEngine for WebDriverEngine {
    async fn goto(&self, url: &str) -> Result<(), UCheckError> {
        debug!(url, "Navigating");
        self.client.goto(url).await.map_err(driver_err)
    }

    async fn try_find(&self, xpath: &str) -> Result<Option<PageElement>, UCheckError> {
        match self.client.find(WebDriverLocator::XPath(xpath)).await {
            Ok(element) => Ok(Some(PageElement::new(Arc::new(WebDriverElement {
                element,
                client: self.client.clone(),
                xpath: xpath.to_string(),
            })))),
            Err(e) if e.is_no_such_element() => Ok(None),
            Err(e) => Err(driver_err(e)),
        }
    }

    async fn close(&self) -> Result<(), UCheckError> {
        debug!("Closing WebDriver session");
        let result = self.client.clone().close().await.map_err(driver_err);
        if let Some(mut child) = self.driver.lock().await.take() {
            let _ = child.start_kill();
        }
        result
    }
}

struct WebDriverElement {
    element: Element,
    client: Client,
    xpath: String,
}

#[async_trait::async_trait]
impl ElementImpl for WebDriverElement {
    async fn text(&self) -> Result<String, UCheckError> {
        self.element.text().await.map_err(driver_err)
    }

    async fn clear(&self) -> Result<(), UCheckError> {
        self.element.clear().await.map_err(driver_err)
    }

    async fn type_text(&self, text: &str) -> Result<(), UCheckError> {
        self.element.send_keys(text).await.map_err(driver_err)
    }

    async fn press_enter(&self) -> Result<(), UCheckError> {
        let enter = String::from(char::from(Key::Enter));
        self.element.send_keys(&enter).await.map_err(driver_err)
    }

    async fn force_click(&self) -> Result<(), UCheckError> {
        // DOM-level click; the driver's own click refuses occluded targets.
        let target = serde_json::to_value(&self.element).map_err(driver_err)?;
        self.client
            .execute("arguments[0].click();", vec![target])
            .await
            .map_err(driver_err)?;
        Ok(())
    }

    fn locator(&self) -> &str {
        &self.xpath
    }
}
