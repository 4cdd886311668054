use thiserror::Error;

#[derive(Error, Debug)]
pub enum UCheckError {
    #[error("Failed to load configuration: {0}")]
    ConfigLoad(String),

    #[error("Invalid UTORid credentials: {0}")]
    InvalidCredentials(String),

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Operation timed out: {0}")]
    Timeout(String),

    #[error("WebDriver error: {0}")]
    Driver(String),
}
