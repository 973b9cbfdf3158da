// crates/stage-sync-cli/src/main.rs
// ============================================================================
// Module: Stage Sync CLI Entry Point
// Description: Command dispatcher for stage reconciliation workflows.
// Purpose: Run, preview, and validate API Gateway stage reconciliation.
// Dependencies: clap, stage-sync-aws, stage-sync-config, stage-sync-core, tokio
// ============================================================================

//! ## Overview
//! `stage-sync reconcile` runs one reconciliation against AWS after a
//! deployment. Externally managed or undeclared APIs end before any AWS
//! client is built. `stage-sync plan` prints the patch operations, tag set, and
//! cleanup target without any network access. `stage-sync config` validates
//! or prints configuration. Results go to stdout as JSON and audit events go
//! to the configured sink.

// ============================================================================
// SECTION: Modules
// ============================================================================


// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Args;
use clap::Parser;
use clap::Subcommand;
use serde::Serialize;
use stage_sync_aws::AwsClientSettings;
use stage_sync_aws::AwsClients;
use stage_sync_aws::AwsStageControlPlane;
use stage_sync_aws::StsIdentityResolver;
use stage_sync_config::AuditConfig;
use stage_sync_config::AuditSinkKind;
use stage_sync_config::StageSyncConfig;
use stage_sync_config::config_toml_example;
use stage_sync_config::resolve_deployment;
use stage_sync_core::IdentityResolver;
use stage_sync_core::PatchPlanner;
use stage_sync_core::ReconcileRequest;
use stage_sync_core::StagePlan;
use stage_sync_core::StageReconciler;
use stage_sync_core::StaticIdentityResolver;
use stage_sync_core::TagReconciler;
use stage_sync_core::runtime::FileAuditSink;
use stage_sync_core::runtime::NoopAuditSink;
use stage_sync_core::runtime::ReconcileAuditSink;
use stage_sync_core::runtime::StderrAuditSink;
use stage_sync_core::runtime::settle_without_lookup;
use thiserror::Error;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "stage-sync", version, disable_help_subcommand = true)]
struct Cli {
    /// Config file path (defaults to stage-sync.toml or `STAGE_SYNC_CONFIG`).
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Reconcile the deployed stage with the descriptor.
    Reconcile(TargetArgs),
    /// Print the planned stage changes without calling AWS.
    Plan(TargetArgs),
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Validate the config file and the deployment inputs it points to.
    Check,
    /// Print an example config file.
    Example,
}

/// Overrides applied on top of the `[deployment]` and `[identity]` sections.
#[derive(Args, Debug, Default)]
struct TargetArgs {
    /// Service name override.
    #[arg(long, value_name = "NAME")]
    service: Option<String>,
    /// Stage name override.
    #[arg(long, value_name = "NAME")]
    stage: Option<String>,
    /// Region override.
    #[arg(long, value_name = "REGION")]
    region: Option<String>,
    /// Account id; skips the STS identity lookup.
    #[arg(long, value_name = "ID")]
    account_id: Option<String>,
    /// Partition for the account id.
    #[arg(long, value_name = "PARTITION", requires = "account_id")]
    partition: Option<String>,
}

/// Offline preview of one reconciliation.
#[derive(Debug, Serialize)]
struct PlanReport {
    /// Request the reconciler would run.
    request: ReconcileRequest,
    /// Patch operations and log group cleanup.
    plan: StagePlan,
    /// Merged tags the stage should carry.
    tags: BTreeMap<String, String>,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for user-facing messages.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`].
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
async fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Reconcile(args) => command_reconcile(cli.config.as_deref(), &args).await,
        Commands::Plan(args) => command_plan(cli.config.as_deref(), &args),
        Commands::Config {
            command,
        } => command_config(cli.config.as_deref(), &command),
    }
}

// ============================================================================
// SECTION: Commands
// ============================================================================

/// Executes the `reconcile` command.
async fn command_reconcile(config_path: Option<&Path>, args: &TargetArgs) -> CliResult<ExitCode> {
    let config = load_config(config_path, args)?;
    let deployment = resolve_deployment(&config.deployment)
        .map_err(|err| CliError::new(format!("deployment inputs invalid: {err}")))?;
    let audit = build_audit_sink(&config.audit)?;
    if let Some(outcome) = settle_without_lookup(
        audit.as_ref(),
        &deployment.service,
        &deployment.stage,
        &deployment.api,
    ) {
        write_json(&outcome)?;
        return Ok(ExitCode::SUCCESS);
    }

    let settings = AwsClientSettings {
        region: Some(deployment.region.clone()),
        profile: config.aws.profile.clone(),
        endpoint: config.aws.endpoint.clone(),
    };
    let clients = AwsClients::load(&settings).await.map_err(|err| CliError::new(err.to_string()))?;
    let resolver = identity_resolver(&config, &clients)?;
    let identity = resolver
        .account_identity()
        .await
        .map_err(|err| CliError::new(err.to_string()))?;
    let request = deployment.into_request(identity);

    let reconciler = StageReconciler::new(
        AwsStageControlPlane::from_clients(&clients),
        audit,
        config.reconcile.options(),
    );
    let outcome = reconciler
        .reconcile(&request)
        .await
        .map_err(|err| CliError::new(format!("reconcile failed: {err}")))?;
    write_json(&outcome)?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the `plan` command.
fn command_plan(config_path: Option<&Path>, args: &TargetArgs) -> CliResult<ExitCode> {
    let config = load_config(config_path, args)?;
    let report = build_plan_report(&config)?;
    write_json(&report)?;
    Ok(ExitCode::SUCCESS)
}

/// Dispatches config subcommands.
fn command_config(config_path: Option<&Path>, command: &ConfigCommand) -> CliResult<ExitCode> {
    match command {
        ConfigCommand::Check => {
            let config = load_config(config_path, &TargetArgs::default())?;
            let deployment = resolve_deployment(&config.deployment)
                .map_err(|err| CliError::new(format!("deployment inputs invalid: {err}")))?;
            write_stdout_line(&format!(
                "config ok: service={} stage={} region={}",
                deployment.service, deployment.stage, deployment.region
            ))
            .map_err(|err| CliError::new(output_error("stdout", &err)))?;
        }
        ConfigCommand::Example => {
            let mut stdout = std::io::stdout();
            stdout
                .write_all(config_toml_example().as_bytes())
                .map_err(|err| CliError::new(output_error("stdout", &err)))?;
        }
    }
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Loads the config file and applies command-line overrides.
fn load_config(path: Option<&Path>, args: &TargetArgs) -> CliResult<StageSyncConfig> {
    let mut config = StageSyncConfig::load_or_default(path)
        .map_err(|err| CliError::new(format!("config load failed: {err}")))?;
    apply_overrides(&mut config, args)?;
    Ok(config)
}

/// Applies overrides and revalidates the result.
fn apply_overrides(config: &mut StageSyncConfig, args: &TargetArgs) -> CliResult<()> {
    if let Some(service) = &args.service {
        config.deployment.service = Some(service.clone());
    }
    if let Some(stage) = &args.stage {
        config.deployment.stage = Some(stage.clone());
    }
    if let Some(region) = &args.region {
        config.deployment.region = Some(region.clone());
    }
    if let Some(account_id) = &args.account_id {
        config.identity.account_id = Some(account_id.clone());
        config.identity.partition.clone_from(&args.partition);
    }
    config.validate().map_err(|err| CliError::new(format!("invalid override: {err}")))
}

/// Builds the offline plan; requires a configured account identity.
fn build_plan_report(config: &StageSyncConfig) -> CliResult<PlanReport> {
    let identity = config
        .identity
        .static_identity()
        .map_err(|err| CliError::new(err.to_string()))?
        .ok_or_else(|| {
            CliError::new("plan requires identity.account_id or --account-id".to_string())
        })?;
    let deployment = resolve_deployment(&config.deployment)
        .map_err(|err| CliError::new(format!("deployment inputs invalid: {err}")))?;
    let request = deployment.into_request(identity);
    let plan = PatchPlanner::plan(&request.desired, &request.context);
    let tags = TagReconciler::merge(&request.desired);
    Ok(PlanReport {
        request,
        plan,
        tags,
    })
}

/// Selects the configured identity or falls back to STS.
fn identity_resolver(
    config: &StageSyncConfig,
    clients: &AwsClients,
) -> CliResult<Box<dyn IdentityResolver>> {
    let configured =
        config.identity.static_identity().map_err(|err| CliError::new(err.to_string()))?;
    Ok(match configured {
        Some(identity) => Box::new(StaticIdentityResolver::new(identity)),
        None => Box::new(StsIdentityResolver::from_clients(clients)),
    })
}

/// Builds the audit sink selected by the `[audit]` section.
fn build_audit_sink(config: &AuditConfig) -> CliResult<Box<dyn ReconcileAuditSink>> {
    match config.sink {
        AuditSinkKind::Stderr => Ok(Box::new(StderrAuditSink)),
        AuditSinkKind::None => Ok(Box::new(NoopAuditSink)),
        AuditSinkKind::File => {
            let path = config
                .path
                .as_deref()
                .ok_or_else(|| CliError::new("audit.path is required".to_string()))?;
            let sink = FileAuditSink::new(path).map_err(|err| {
                CliError::new(format!("audit log {} open failed: {err}", path.display()))
            })?;
            Ok(Box::new(sink))
        }
    }
}

// ============================================================================
// SECTION: Output
// ============================================================================

/// Writes a value as pretty JSON followed by a newline.
fn write_json<T: Serialize>(value: &T) -> CliResult<()> {
    let rendered = serde_json::to_string_pretty(value)
        .map_err(|err| CliError::new(format!("json output failed: {err}")))?;
    write_stdout_line(&rendered).map_err(|err| CliError::new(output_error("stdout", &err)))
}

/// Writes a line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats an output stream error message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    format!("failed to write to {stream}: {error}")
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
