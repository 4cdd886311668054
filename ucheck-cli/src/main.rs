//! UCheck CLI
//!
//! Runs one full UCheck submission: load the page constants, start the
//! browser driver, log in with the UTORid credentials from the environment,
//! answer the form, submit, and tear the session down.
//!
//! Usage:
//!   UTORID_USER=jdoe UTORID_PASS=... ucheck --config config.yaml

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use ucheck::{Config, Credentials, DriverSettings, UCheck, UCheckError};

#[derive(Parser)]
#[command(name = "ucheck")]
#[command(about = "Automatically fill and submit the UofT UCheck self-assessment form")]
struct Cli {
    /// UTORid username
    #[arg(long = "user", env = "UTORID_USER", hide_env_values = true)]
    utorid_user: String,

    /// UTORid password
    #[arg(long = "pass", env = "UTORID_PASS", hide_env_values = true)]
    utorid_pass: String,

    /// Path to the page-constants file
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,

    /// Path to the chromedriver executable
    #[arg(long, default_value = "/opt/WebDriver/bin/chromedriver")]
    driver_path: PathBuf,

    /// Local port the driver listens on
    #[arg(long, default_value_t = 9515)]
    port: u16,

    /// Run the browser without a visible window
    #[arg(long)]
    headless: bool,

    /// Seconds to hold the final page open after a successful submission
    #[arg(long, default_value_t = 5)]
    settle_secs: u64,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => {
            info!("UCheck run finished");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e}");
            exit_code_for(&e)
        }
    }
}

async fn run(cli: Cli) -> Result<(), UCheckError> {
    let config = Config::load(&cli.config)?;
    let settings = DriverSettings {
        driver_path: cli.driver_path,
        port: cli.port,
        headless: cli.headless,
    };

    let ucheck = UCheck::launch(config, &settings).await?;
    let credentials = Credentials::new(cli.utorid_user, cli.utorid_pass);

    let result = ucheck.complete_ucheck(&credentials).await;
    if result.is_ok() {
        // Let the confirmation page settle before the browser goes away.
        tokio::time::sleep(Duration::from_secs(cli.settle_secs)).await;
    }

    // Teardown runs on every exit path; a completion error takes precedence
    // over a teardown error.
    let close_result = ucheck.close().await;
    result.and(close_result)
}

fn exit_code_for(error: &UCheckError) -> ExitCode {
    let code: u8 = match error {
        UCheckError::ConfigLoad(_) => 2,
        UCheckError::InvalidCredentials(_) => 3,
        UCheckError::ElementNotFound(_) | UCheckError::Timeout(_) => 4,
        UCheckError::Driver(_) => 5,
    };
    ExitCode::from(code)
}
