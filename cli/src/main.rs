//! CLI entrypoint for moa
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use colored::Colorize;
use moa_application::{MoaOrchestrator, NoProgress, ProgressNotifier};
use moa_domain::{ConfigIssue, OutputFormat, Severity};
use moa_infrastructure::{
    ConfigLoader, FileAgentEntry, FileConfig, JsonlRunLogger, ProviderRegistry,
};
use moa_presentation::{Cli, ConsoleFormatter, ProgressReporter, SimpleProgress};
use std::io::{IsTerminal, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.show_config {
        print_config_sources(cli.config.as_deref());
        return Ok(());
    }

    let mut config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_deref())
            .map_err(|e| anyhow!("failed to load configuration: {}", e))?
    };
    apply_overrides(&cli, &mut config)?;

    // Held until exit so buffered log lines reach the file
    let _log_guard = init_logging(cli.verbose, config.logging.file_path().as_deref())?;
    info!("Starting moa");

    let issues = config.validate();
    report_issues(&issues);
    if ConfigIssue::has_errors(&issues) {
        bail!("configuration has errors; nothing was sent to any backend");
    }
    let moa_config = config.to_moa_config()?;

    // === Dependency Injection ===
    let registry = ProviderRegistry::new(config.providers.clone());
    let mut orchestrator = MoaOrchestrator::new(moa_config, &registry)?;

    if let Some(path) = config.logging.run_log_path() {
        match JsonlRunLogger::open(&path) {
            Some(logger) => {
                info!("Run log: {} (run {})", path.display(), logger.run_id());
                orchestrator = orchestrator.with_run_logger(Arc::new(logger));
            }
            None => warn!("Continuing without run log"),
        }
    }

    let question = read_question(cli.question.as_deref())?;

    let cancel = CancellationToken::new();
    let ctrl_c_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling run");
            ctrl_c_token.cancel();
        }
    });

    let format: OutputFormat = cli
        .output
        .map(Into::into)
        .or(config.output.format)
        .unwrap_or_default();

    if !config.output.color || format == OutputFormat::Json {
        colored::control::set_override(false);
    }

    let progress: Box<dyn ProgressNotifier> =
        if cli.quiet || !config.output.show_progress || format == OutputFormat::Json {
            Box::new(NoProgress)
        } else if std::io::stderr().is_terminal() {
            Box::new(ProgressReporter::new())
        } else {
            Box::new(SimpleProgress)
        };

    let run = orchestrator
        .generate_detailed(&question, &cancel, progress.as_ref())
        .await?;

    print!("{}", ConsoleFormatter::render(&run, format));
    Ok(())
}

/// Command-line flags win over every configuration source.
fn apply_overrides(cli: &Cli, config: &mut FileConfig) -> Result<()> {
    if !cli.agents.is_empty() {
        config.agents = cli
            .agents
            .iter()
            .map(|spec| FileAgentEntry::from_spec(spec))
            .collect::<Result<_, _>>()?;
    }
    if let Some(spec) = &cli.aggregator {
        config.aggregator = Some(FileAgentEntry::from_spec(spec)?);
    }
    if let Some(iterations) = cli.iterations {
        config.moa.iterations = iterations;
    }
    if let Some(max_parallel) = cli.max_parallel {
        config.moa.max_parallel = Some(max_parallel);
    }
    if let Some(secs) = cli.agent_timeout {
        config.moa.agent_timeout_secs = secs;
    }
    if let Some(attempts) = cli.max_attempts {
        config.retry.max_attempts = attempts;
    }
    if let Some(path) = &cli.log_file {
        config.logging.file = Some(path.clone());
    }
    if let Some(path) = &cli.run_log {
        config.logging.run_log = Some(path.clone());
    }
    Ok(())
}

/// Initialize tracing from `-v`; `RUST_LOG` overrides it when set.
fn init_logging(verbose: u8, log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace", // -vvv or more
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let Some(path) = log_file else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
        return Ok(None);
    };

    let directory = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    let file_name = path
        .file_name()
        .with_context(|| format!("log file path has no file name: {}", path.display()))?;
    std::fs::create_dir_all(&directory)
        .with_context(|| format!("could not create log directory {}", directory.display()))?;

    let appender = tracing_appender::rolling::never(directory, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(writer)
        .init();
    Ok(Some(guard))
}

fn report_issues(issues: &[ConfigIssue]) {
    for issue in issues {
        match issue.severity {
            Severity::Error => eprintln!("{} {}", "error:".red().bold(), issue.message),
            Severity::Warning => eprintln!("{} {}", "warning:".yellow().bold(), issue.message),
        }
    }
}

/// The positional question, or all of stdin when it is piped in.
fn read_question(arg: Option<&str>) -> Result<String> {
    let question = match arg {
        Some(q) => q.to_string(),
        None => {
            if std::io::stdin().is_terminal() {
                bail!("Question is required: pass it as an argument or pipe it on stdin.");
            }
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("failed to read question from stdin")?;
            buffer
        }
    };

    let question = question.trim();
    if question.is_empty() {
        bail!("Question is empty.");
    }
    Ok(question.to_string())
}

fn print_config_sources(config_path: Option<&Path>) {
    println!("{}", "Configuration sources (highest priority first):".bold());
    for source in ConfigLoader::sources(config_path) {
        let status = if source.found {
            "found".green()
        } else {
            "not found".dimmed()
        };
        println!("  {:<9} {} ({})", source.label, source.location, status);
    }
}
