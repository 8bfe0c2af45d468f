//! CLI command definitions

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Output format for MOA results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Only the final synthesized answer
    Text,
    /// Every round's agent answers and every aggregation
    Full,
    /// The full run record as JSON
    Json,
}

impl From<OutputFormat> for moa_domain::OutputFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Text => moa_domain::OutputFormat::Text,
            OutputFormat::Full => moa_domain::OutputFormat::Full,
            OutputFormat::Json => moa_domain::OutputFormat::Json,
        }
    }
}

/// CLI arguments for moa
#[derive(Parser, Debug)]
#[command(name = "moa")]
#[command(author, version, about = "Mixture-of-Agents - several LLMs answer, one synthesizes")]
#[command(long_about = r#"
moa sends your question to several LLM agents in parallel, then asks an
aggregator agent to synthesize their answers. With --iterations N the
synthesis is fed back to the agents N-1 more times.

Agents that fail or time out are skipped; a round only fails when every
agent fails.

Configuration files are loaded from (lowest to highest priority):
1. ~/.config/moa/config.toml   Global config
2. ./moa.toml or ./.moa.toml   Project-level config
3. --config <path>             Explicit config file
4. MOA_* environment variables (MOA_MOA__ITERATIONS=2)

Example:
  moa -a openai/gpt-4o-mini -a anthropic/claude-3-5-haiku-latest \
      --aggregator anthropic/claude-3-5-sonnet-latest "Explain Rust lifetimes"
  echo "What is a monad?" | moa -a echo/a -a echo/b --aggregator echo/judge -o full
"#)]
pub struct Cli {
    /// The question to ask (read from stdin when omitted)
    pub question: Option<String>,

    /// Agents as provider/model (can be specified multiple times; replaces configured agents)
    #[arg(short, long = "agent", value_name = "PROVIDER/MODEL")]
    pub agents: Vec<String>,

    /// Aggregator as provider/model
    #[arg(long, value_name = "PROVIDER/MODEL")]
    pub aggregator: Option<String>,

    /// Number of fan-out/aggregate rounds
    #[arg(short = 'n', long, value_name = "N")]
    pub iterations: Option<usize>,

    /// Maximum number of agents called at once
    #[arg(short = 'p', long, value_name = "N")]
    pub max_parallel: Option<usize>,

    /// Per-agent timeout in seconds (0 disables it)
    #[arg(long, value_name = "SECS")]
    pub agent_timeout: Option<u64>,

    /// Attempts per backend call, including the first
    #[arg(long, value_name = "N")]
    pub max_attempts: Option<u32>,

    /// Output format
    #[arg(short, long, value_enum)]
    pub output: Option<OutputFormat>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,

    /// Write diagnostic logs to this file instead of stderr
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Append structured run events (JSONL) to this file
    #[arg(long, value_name = "PATH")]
    pub run_log: Option<PathBuf>,
}
