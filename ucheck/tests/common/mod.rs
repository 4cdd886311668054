//! Scripted browser engine for driving the orchestrator without a browser.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use ucheck::{BrowserEngine, Config, ElementImpl, PageElement, UCheckError};

pub const TEST_CONFIG: &str = r#"
constants:
  ucheck-url: "https://example/ucheck"
  elements:
    abs-xpath:
      input:
        utorid-user: "/html/body/form/input[1]"
        utorid-pass: "/html/body/form/input[2]"
        ucheck-forms:
          - "/html/body/div[1]/label/span"
          - "/html/body/div[2]/label/span"
          - "/html/body/div[3]/label/span"
      p:
        invalid-utorid-login: "/html/body/form/p"
      button:
        ucheck-submit: "/html/body/div[4]/button"
  keywords:
    contains:
      invalid-utorid-login:
        username: ["not recognized"]
        password: ["invalid login"]
"#;

pub fn test_config() -> Config {
    Config::from_yaml(TEST_CONFIG).unwrap()
}

struct MockEntry {
    text: String,
    /// Lookups that must happen before the element becomes visible.
    appear_after: usize,
    lookups: usize,
}

/// In-memory page: elements keyed by XPath, with optional delayed appearance,
/// an action log shared with the element handles, and a close counter.
#[derive(Default)]
pub struct MockEngine {
    elements: Mutex<HashMap<String, MockEntry>>,
    log: Arc<Mutex<Vec<String>>>,
    close_count: AtomicUsize,
    /// XPath whose lookup fails at the driver level, for fatal-error paths.
    fail_on: Mutex<Option<String>>,
}

impl MockEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_element(&self, xpath: &str) {
        self.add_element_with_text(xpath, "");
    }

    pub fn add_element_with_text(&self, xpath: &str, text: &str) {
        self.elements.lock().unwrap().insert(
            xpath.to_string(),
            MockEntry {
                text: text.to_string(),
                appear_after: 0,
                lookups: 0,
            },
        );
    }

    /// Element that only becomes visible after `appear_after` failed lookups.
    pub fn add_delayed_element(&self, xpath: &str, appear_after: usize) {
        self.elements.lock().unwrap().insert(
            xpath.to_string(),
            MockEntry {
                text: String::new(),
                appear_after,
                lookups: 0,
            },
        );
    }

    pub fn remove_element(&self, xpath: &str) {
        self.elements.lock().unwrap().remove(xpath);
    }

    pub fn fail_lookups_of(&self, xpath: &str) {
        *self.fail_on.lock().unwrap() = Some(xpath.to_string());
    }

    /// Registers everything a successful run needs: login fields, all form
    /// questions, and the submit button. No failure banner.
    pub fn with_standard_page(config: &Config) -> Self {
        let engine = Self::new();
        engine.add_element(&config.utorid_user_field);
        engine.add_element(&config.utorid_pass_field);
        for form in &config.ucheck_forms {
            engine.add_element(form);
        }
        engine.add_element(&config.ucheck_submit);
        engine
    }

    pub fn actions(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    pub fn close_count(&self) -> usize {
        self.close_count.load(Ordering::SeqCst)
    }

    /// Looks `xpath` up against the scripted page. Supports the
    /// `base[contains(text(), 'needle')]` form the login validation probes
    /// with: the probe matches when the element at `base` exists and its text
    /// contains the needle.
    fn lookup(&self, xpath: &str) -> Option<(String, String)> {
        let mut elements = self.elements.lock().unwrap();

        if let Some((base, needle)) = split_contains_probe(xpath) {
            return match elements.get(base) {
                Some(entry) if entry.text.contains(needle) => {
                    Some((xpath.to_string(), entry.text.clone()))
                }
                _ => None,
            };
        }

        let entry = elements.get_mut(xpath)?;
        entry.lookups += 1;
        if entry.lookups <= entry.appear_after {
            return None;
        }
        Some((xpath.to_string(), entry.text.clone()))
    }
}

fn split_contains_probe(xpath: &str) -> Option<(&str, &str)> {
    let open = xpath.find("[contains(text(), '")?;
    let base = &xpath[..open];
    let rest = &xpath[open + "[contains(text(), '".len()..];
    let needle = rest.strip_suffix("')]")?;
    Some((base, needle))
}

#[async_trait::async_trait]
impl BrowserEngine for MockEngine {
    async fn goto(&self, url: &str) -> Result<(), UCheckError> {
        self.log.lock().unwrap().push(format!("goto:{url}"));
        Ok(())
    }

    async fn try_find(&self, xpath: &str) -> Result<Option<PageElement>, UCheckError> {
        if let Some(failing) = self.fail_on.lock().unwrap().as_deref() {
            if failing == xpath {
                return Err(UCheckError::Driver(format!("lost session probing {xpath}")));
            }
        }
        Ok(self.lookup(xpath).map(|(xpath, text)| {
            PageElement::new(Arc::new(MockElement {
                xpath,
                text,
                log: self.log.clone(),
            }))
        }))
    }

    async fn close(&self) -> Result<(), UCheckError> {
        self.close_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct MockElement {
    xpath: String,
    text: String,
    log: Arc<Mutex<Vec<String>>>,
}

impl MockElement {
    fn record(&self, action: &str) {
        self.log.lock().unwrap().push(format!("{action}:{}", self.xpath));
    }
}

#[async_trait::async_trait]
impl ElementImpl for MockElement {
    async fn text(&self) -> Result<String, UCheckError> {
        Ok(self.text.clone())
    }

    async fn clear(&self) -> Result<(), UCheckError> {
        self.record("clear");
        Ok(())
    }

    async fn type_text(&self, _text: &str) -> Result<(), UCheckError> {
        self.record("type");
        Ok(())
    }

    async fn press_enter(&self) -> Result<(), UCheckError> {
        self.record("enter");
        Ok(())
    }

    async fn force_click(&self) -> Result<(), UCheckError> {
        self.record("click");
        Ok(())
    }

    fn locator(&self) -> &str {
        &self.xpath
    }
}
