//! Static configuration for the UCheck portal: target URL, absolute XPath
//! locators for every element the orchestrator touches, and the keyword
//! substrings used to recognize a failed login.
//!
//! Loaded once at startup from a YAML file and treated as immutable for the
//! rest of the process.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::errors::UCheckError;

/// Immutable runtime configuration, flattened from the on-disk schema.
#[derive(Debug, Clone)]
pub struct Config {
    /// URL of the UCheck portal landing page.
    pub ucheck_url: String,
    /// XPath of the UTORid username input field.
    pub utorid_user_field: String,
    /// XPath of the UTORid password input field.
    pub utorid_pass_field: String,
    /// XPath of the paragraph that carries the invalid-login message.
    pub invalid_login_banner: String,
    /// Ordered XPaths of the form-question radio buttons, answered in order.
    pub ucheck_forms: Vec<String>,
    /// XPath of the final submit button.
    pub ucheck_submit: String,
    /// Credential field name -> substrings expected in the banner text when
    /// the login failed because of that field.
    pub failure_keywords: BTreeMap<String, Vec<String>>,
}

// On-disk schema, kept compatible with the original config.yaml layout:
// constants.ucheck-url, constants.elements.abs-xpath.{input,p,button},
// constants.keywords.contains.

#[derive(Deserialize)]
struct RawConfig {
    constants: RawConstants,
}

#[derive(Deserialize)]
struct RawConstants {
    #[serde(rename = "ucheck-url")]
    ucheck_url: String,
    elements: RawElements,
    keywords: RawKeywords,
}

#[derive(Deserialize)]
struct RawElements {
    #[serde(rename = "abs-xpath")]
    abs_xpath: RawAbsXpath,
}

#[derive(Deserialize)]
struct RawAbsXpath {
    input: RawInputElements,
    p: RawParagraphElements,
    button: RawButtonElements,
}

#[derive(Deserialize)]
struct RawInputElements {
    #[serde(rename = "utorid-user")]
    utorid_user: String,
    #[serde(rename = "utorid-pass")]
    utorid_pass: String,
    #[serde(rename = "ucheck-forms")]
    ucheck_forms: Vec<String>,
}

#[derive(Deserialize)]
struct RawParagraphElements {
    #[serde(rename = "invalid-utorid-login")]
    invalid_utorid_login: String,
}

#[derive(Deserialize)]
struct RawButtonElements {
    #[serde(rename = "ucheck-submit")]
    ucheck_submit: String,
}

#[derive(Deserialize)]
struct RawKeywords {
    contains: RawContains,
}

#[derive(Deserialize)]
struct RawContains {
    #[serde(rename = "invalid-utorid-login")]
    invalid_utorid_login: BTreeMap<String, Vec<String>>,
}

impl Config {
    /// Reads and validates the configuration file at `path`.
    ///
    /// Fails with [`UCheckError::ConfigLoad`] if the file is missing,
    /// unreadable, not valid YAML, or missing/empty in any required value.
    /// Never returns a partially populated configuration.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, UCheckError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            UCheckError::ConfigLoad(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_yaml(&contents)
    }

    /// Parses and validates configuration from a YAML string.
    pub fn from_yaml(contents: &str) -> Result<Self, UCheckError> {
        let raw: RawConfig = serde_yaml::from_str(contents)
            .map_err(|e| UCheckError::ConfigLoad(format!("malformed configuration: {e}")))?;

        let constants = raw.constants;
        let xpaths = constants.elements.abs_xpath;
        let config = Self {
            ucheck_url: constants.ucheck_url,
            utorid_user_field: xpaths.input.utorid_user,
            utorid_pass_field: xpaths.input.utorid_pass,
            invalid_login_banner: xpaths.p.invalid_utorid_login,
            ucheck_forms: xpaths.input.ucheck_forms,
            ucheck_submit: xpaths.button.ucheck_submit,
            failure_keywords: constants.keywords.contains.invalid_utorid_login,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), UCheckError> {
        let required = [
            ("constants.ucheck-url", &self.ucheck_url),
            (
                "constants.elements.abs-xpath.input.utorid-user",
                &self.utorid_user_field,
            ),
            (
                "constants.elements.abs-xpath.input.utorid-pass",
                &self.utorid_pass_field,
            ),
            (
                "constants.elements.abs-xpath.p.invalid-utorid-login",
                &self.invalid_login_banner,
            ),
            (
                "constants.elements.abs-xpath.button.ucheck-submit",
                &self.ucheck_submit,
            ),
        ];
        for (key, value) in required {
            if value.trim().is_empty() {
                return Err(UCheckError::ConfigLoad(format!("empty value for {key}")));
            }
        }

        if self.ucheck_forms.is_empty() {
            return Err(UCheckError::ConfigLoad(
                "constants.elements.abs-xpath.input.ucheck-forms must list at least one form question".into(),
            ));
        }
        if self.ucheck_forms.iter().any(|x| x.trim().is_empty()) {
            return Err(UCheckError::ConfigLoad(
                "constants.elements.abs-xpath.input.ucheck-forms contains an empty locator".into(),
            ));
        }

        if self.failure_keywords.is_empty() {
            return Err(UCheckError::ConfigLoad(
                "constants.keywords.contains.invalid-utorid-login must name at least one credential field".into(),
            ));
        }
        for (field, keywords) in &self.failure_keywords {
            if keywords.is_empty() || keywords.iter().any(|k| k.trim().is_empty()) {
                return Err(UCheckError::ConfigLoad(format!(
                    "constants.keywords.contains.invalid-utorid-login.{field} must list non-empty substrings"
                )));
            }
        }

        Ok(())
    }
}
