// src/main.rs

// Modules defined in the crate
mod api;
mod config;
mod constants;
mod deploy;
mod error;
mod model;
mod payload;
mod pipeline;
mod types;

// Specific imports
use crate::api::NotionHttpClient;
use crate::config::{CommandLineInput, DeployConfig};
use crate::deploy::{DeployedWorkspace, Deployer};
use crate::error::{classify_deploy_failure, AppError};
use crate::model::{SpecReport, WorkspaceSpec};
use crate::pipeline::{SpecGate, SpecSource, WorkspaceSink};
use clap::Parser;
use log::LevelFilter;
use log4rs::{
    append::console::ConsoleAppender,
    append::file::FileAppender,
    config::{Appender, Root},
    encode::pattern::PatternEncoder,
    filter::threshold::ThresholdFilter,
    Config,
};
use std::fs;
use std::io::Read;

/// Sets up logging configuration.
fn setup_logging(verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let log_level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };

    let log_file_path = std::env::temp_dir().join("spec2notion.log");
    if let Some(parent) = log_file_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let pattern = if verbose {
        "{d(%Y-%m-%d %H:%M:%S)} [{l}] - {m}{n}"
    } else {
        "{m}{n}"
    };

    let stdout_appender = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new(pattern)))
        .build();

    let file_appender = FileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(
            "{d(%Y-%m-%d %H:%M:%S)} [{l}] - {m}{n}",
        )))
        .build(&log_file_path)?;

    let config = Config::builder()
        .appender(Appender::builder().build("stdout", Box::new(stdout_appender)))
        .appender(
            Appender::builder()
                .filter(Box::new(ThresholdFilter::new(LevelFilter::Debug)))
                .build("file", Box::new(file_appender)),
        )
        .build(
            Root::builder()
                .appender("stdout")
                .appender("file")
                .build(log_level),
        )?;

    log4rs::init_config(config)?;
    log::info!("Logging initialized. Log file: {}", log_file_path.display());
    Ok(())
}

/// Executes the three-stage pipeline: load → validate → deploy.
async fn execute_pipeline(config: &DeployConfig) -> Result<(), AppError> {
    let runner = SpecToNotion::new(config);

    let spec = runner.load()?;
    let report = runner.check(&spec);
    runner.report_validation(&report)?;

    if config.validate_only {
        println!("✓ Spec \"{}\" is compatible with the Notion API.", spec.title);
        return Ok(());
    }

    let deployed = runner.deploy(&spec).await?;
    runner.report_completion(&spec, &deployed)?;

    Ok(())
}

/// Orchestrates loading, validating, and deploying one workspace spec.
struct SpecToNotion<'a> {
    config: &'a DeployConfig,
}

impl<'a> SpecToNotion<'a> {
    fn new(config: &'a DeployConfig) -> Self {
        Self { config }
    }

    /// Surfaces the validation report; an invalid spec stops the run
    /// before any network call.
    fn report_validation(&self, report: &SpecReport) -> Result<(), AppError> {
        for warning in &report.warnings {
            eprintln!("⚠️  {}", warning);
        }

        if !report.is_valid() {
            eprintln!(
                "Workspace specification is incompatible with the Notion API:"
            );
            for error in &report.errors {
                eprintln!("  ✗ {}", error);
            }
            return Err(AppError::IncompatibleSpec {
                errors: report.errors.clone(),
                warnings: report.warnings.clone(),
            });
        }

        Ok(())
    }

    /// Reports completion to the user with stats and the partial-failure list.
    fn report_completion(
        &self,
        spec: &WorkspaceSpec,
        deployed: &DeployedWorkspace,
    ) -> Result<(), AppError> {
        println!(
            "✓ Workspace \"{}\" deployed to Notion account {} ({})",
            spec.title, deployed.account.email, deployed.account.name
        );
        println!("  {}", deployed.url);
        println!(
            "📦 Created {} of {} database(s).",
            deployed.databases.len(),
            spec.databases.len()
        );

        if !deployed.is_complete() {
            eprintln!(
                "⚠️  {} item(s) failed to deploy (the workspace itself was created):",
                deployed.failures.len()
            );
            for failure in &deployed.failures {
                eprintln!("  ✗ {}", failure);
            }
        }

        if let Some(path) = &self.config.report_file {
            let json = serde_json::to_string_pretty(deployed)?;
            fs::write(path, json)?;
            println!("✓ Deployment report saved to {}", path.display());
        }

        Ok(())
    }
}

impl SpecSource for SpecToNotion<'_> {
    fn load(&self) -> Result<WorkspaceSpec, AppError> {
        let raw = if self.config.spec_path.as_os_str() == "-" {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            buffer
        } else {
            fs::read_to_string(&self.config.spec_path)?
        };

        serde_json::from_str(&raw).map_err(|source| AppError::SpecParse {
            path: self.config.spec_path.clone(),
            source,
        })
    }
}

impl SpecGate for SpecToNotion<'_> {
    fn check(&self, spec: &WorkspaceSpec) -> SpecReport {
        model::validate(spec)
    }
}

#[async_trait::async_trait]
impl WorkspaceSink for SpecToNotion<'_> {
    async fn deploy(&self, spec: &WorkspaceSpec) -> Result<DeployedWorkspace, AppError> {
        let api_key = self.config.api_key.as_ref().ok_or_else(|| {
            AppError::MissingConfiguration(
                "NOTION_API_KEY environment variable not set".to_string(),
            )
        })?;
        let client = NotionHttpClient::new(api_key)?;

        let mut deployer = Deployer::new(&client).with_retry(self.config.retry.clone());
        if let Some(parent) = &self.config.parent_page {
            deployer = deployer.with_parent_page(parent.clone());
        }

        deployer.deploy(spec).await
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = CommandLineInput::parse();

    setup_logging(cli.verbose)?;

    let config = DeployConfig::resolve(cli)?;

    if let Err(error) = execute_pipeline(&config).await {
        let failure = classify_deploy_failure(&error);
        eprintln!("✗ Deployment failed: {}", error);
        eprintln!("  Suggestion: {}", failure.suggestion());
        eprintln!("  Docs: {}", failure.docs_url());
        std::process::exit(1);
    }

    Ok(())
}
