// src/config.rs
use crate::api::RetryPolicy;
use crate::error::AppError;
use crate::types::{ApiKey, NotionId};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Parsed and validated command-line input.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CommandLineInput {
    /// Path to the workspace specification JSON file ("-" for stdin)
    pub spec_file: String,

    /// Notion page URL or ID to deploy under (defaults to the most
    /// recently edited page the integration can access)
    #[arg(long)]
    pub parent_page: Option<String>,

    /// Validate the spec against Notion API limits and exit without deploying
    #[arg(long, default_value_t = false)]
    pub validate_only: bool,

    /// Enable verbose logging (debug level)
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Maximum retries for rate-limited API calls
    #[arg(long, default_value_t = crate::constants::BACKOFF_MAX_RETRIES)]
    pub max_retries: u32,

    /// Base delay in milliseconds for exponential backoff
    #[arg(long, default_value_t = crate::constants::BACKOFF_BASE_DELAY_MS)]
    pub base_delay_ms: u64,

    /// Write the deployment report as JSON to this file
    #[arg(long)]
    pub report_file: Option<String>,
}

/// Resolved deployment configuration — validated and ready to drive the
/// load → validate → deploy pipeline.
#[derive(Debug, Clone)]
pub struct DeployConfig {
    pub spec_path: PathBuf,
    /// Absent only in validate-only mode, which never touches the network.
    pub api_key: Option<ApiKey>,
    pub parent_page: Option<NotionId>,
    pub validate_only: bool,
    #[allow(dead_code)] // Used by bin crate
    pub verbose: bool,
    pub retry: RetryPolicy,
    pub report_file: Option<PathBuf>,
}

impl DeployConfig {
    /// Resolves a complete configuration from CLI input and environment.
    pub fn resolve(cli: CommandLineInput) -> Result<Self, AppError> {
        let api_key = match std::env::var("NOTION_API_KEY") {
            Ok(raw) => Some(ApiKey::new(raw)?),
            Err(_) if cli.validate_only => None,
            Err(_) => {
                return Err(AppError::MissingConfiguration(
                    "NOTION_API_KEY environment variable not set".to_string(),
                ))
            }
        };

        let parent_page = cli
            .parent_page
            .or_else(|| std::env::var("NOTION_PARENT_PAGE_ID").ok())
            .map(|raw| NotionId::parse(&raw))
            .transpose()?;

        let retry = RetryPolicy {
            max_retries: cli.max_retries,
            base_delay: Duration::from_millis(cli.base_delay_ms),
            ..RetryPolicy::default()
        };

        Ok(DeployConfig {
            spec_path: PathBuf::from(cli.spec_file),
            api_key,
            parent_page,
            validate_only: cli.validate_only,
            verbose: cli.verbose,
            retry,
            report_file: cli.report_file.map(PathBuf::from),
        })
    }
}
