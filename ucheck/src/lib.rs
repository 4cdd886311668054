//! Automated filling and submission of the University of Toronto's UCheck
//! COVID-19 self-assessment form.
//!
//! The crate drives a real browser through a WebDriver-compatible driver:
//! log into the UCheck portal with UTORid credentials, answer the fixed
//! sequence of form questions, and submit. [`UCheck`] is the entry point; it
//! owns the browser session and runs the whole sequence through
//! [`UCheck::complete_ucheck`].

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, instrument};

pub mod config;
pub mod element;
pub mod engine;
pub mod errors;
pub mod locator;

pub use config::Config;
pub use element::{ElementImpl, PageElement};
pub use engine::{BrowserEngine, DriverSettings, WebDriverEngine};
pub use errors::UCheckError;
pub use locator::Locator;

// Per-element cap while waiting for the form's radio buttons to render.
const FORM_ELEMENT_TIMEOUT: Duration = Duration::from_secs(10);

/// UTORid username/password pair. Held only for the duration of the login
/// step; never persisted.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Handles the UTORid login and the filling and submission of the UCheck
/// COVID-19 self-assessment form.
///
/// Owns one browser session for its lifetime. The session is never touched
/// before construction completes; after [`close`](UCheck::close) it is gone.
pub struct UCheck {
    engine: Arc<dyn BrowserEngine>,
    config: Config,
    closed: AtomicBool,
}

impl UCheck {
    /// Builds an orchestrator over an already-running engine.
    pub fn new(engine: Arc<dyn BrowserEngine>, config: Config) -> Self {
        Self {
            engine,
            config,
            closed: AtomicBool::new(false),
        }
    }

    /// Spawns the configured browser driver and builds an orchestrator over
    /// the resulting WebDriver session.
    pub async fn launch(config: Config, settings: &DriverSettings) -> Result<Self, UCheckError> {
        let engine = WebDriverEngine::launch(settings).await?;
        Ok(Self::new(Arc::new(engine), config))
    }

    /// Returns a [`Locator`] for the given XPath on the current page.
    pub fn locator(&self, xpath: impl Into<String>) -> Locator {
        Locator::new(self.engine.clone(), xpath.into())
    }

    /// 1) Logs into the UCheck portal using UTORid credentials, 2) completes
    /// the UCheck forms, 3) submits the completed UCheck.
    ///
    /// The sequence is strictly linear; there is no partial-submission
    /// recovery. If any step fails the caller must restart from the top.
    #[instrument(skip(self, credentials))]
    pub async fn complete_ucheck(&self, credentials: &Credentials) -> Result<(), UCheckError> {
        self.login_to_portal(credentials).await?;
        self.complete_ucheck_forms().await?;
        self.submit_ucheck().await?;
        info!("UCheck submitted");
        Ok(())
    }

    /// Logs into the UCheck portal. Fails with
    /// [`UCheckError::InvalidCredentials`] if the portal rejects the login.
    async fn login_to_portal(&self, credentials: &Credentials) -> Result<(), UCheckError> {
        self.engine.goto(&self.config.ucheck_url).await?;

        // Login fields are part of the initial document; absence is fatal.
        let user_field = self.engine.find(&self.config.utorid_user_field).await?;
        user_field.clear().await?;
        user_field.type_text(&credentials.username).await?;

        let pass_field = self.engine.find(&self.config.utorid_pass_field).await?;
        pass_field.clear().await?;
        pass_field.type_text(&credentials.password).await?;

        // Enter on the password field submits the login form.
        pass_field.press_enter().await?;

        self.validate_login().await
    }

    /// Checks the page that follows the login submission for a recognized
    /// failure message.
    ///
    /// Each configured keyword is probed with a single immediate lookup: a
    /// match means the login failed for that credential field, absence of
    /// every probe means success. No wait is applied before the lookups, so
    /// a banner rendered late by client-side scripts can be missed; the
    /// original behaves the same way and the timing is kept as-is.
    async fn validate_login(&self) -> Result<(), UCheckError> {
        for (field, keywords) in &self.config.failure_keywords {
            for keyword in keywords {
                let probe = format!(
                    "{}[contains(text(), '{keyword}')]",
                    self.config.invalid_login_banner
                );
                if self.engine.try_find(&probe).await?.is_some() {
                    return Err(UCheckError::InvalidCredentials(format!(
                        "the portal reported a failed login; verify your UTORid {field} and try again"
                    )));
                }
            }
        }
        debug!("No failure banner found, login accepted");
        Ok(())
    }

    /// Answers every configured form question in order.
    async fn complete_ucheck_forms(&self) -> Result<(), UCheckError> {
        for form_xpath in &self.config.ucheck_forms {
            self.click_radio_button(form_xpath).await?;
        }
        Ok(())
    }

    /// Waits for a form's radio button to render, then clicks it.
    async fn click_radio_button(&self, form_xpath: &str) -> Result<(), UCheckError> {
        let radio_button = self
            .locator(form_xpath)
            .wait(Some(FORM_ELEMENT_TIMEOUT))
            .await?;
        radio_button.force_click().await
    }

    /// Submits the completed UCheck.
    async fn submit_ucheck(&self) -> Result<(), UCheckError> {
        let submit = self.engine.find(&self.config.ucheck_submit).await?;
        submit.press_enter().await
    }

    /// Ends the browser session. Safe to call on every exit path; only the
    /// first call reaches the engine.
    #[instrument(skip(self))]
    pub async fn close(&self) -> Result<(), UCheckError> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.engine.close().await
    }
}
