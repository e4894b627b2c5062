mod commands;
#[cfg(feature = "mcp")]
mod mcp;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use gadget_search::core::config::DEFAULT_OVERFETCH;
use gadget_search::core::paths::DEFAULT_PREFIX;
use gadget_search::search::embedding::HTP_MODEL_ID;
use gadget_search::{EngineConfig, PoolStrategy};

/// Results shown by `gase search` unless `-k` is given
const CLI_DEFAULT_K: usize = 3;

#[derive(Parser)]
#[command(name = "gase")]
#[command(about = "Gadget Assisted Search Engine: find gadgets by describing what they do", long_about = None)]
#[command(version)]
struct Cli {
    #[command(flatten)]
    engine: EngineArgs,

    #[arg(short, long, global = true, help = "Debug logging on stderr")]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct EngineArgs {
    #[arg(long, global = true, env = "GASE_PREFIX", default_value = DEFAULT_PREFIX, help = "Directory holding gadgets.index and gadget_data.csv")]
    prefix: PathBuf,
    #[arg(long, global = true, env = "GASE_MODEL", default_value = HTP_MODEL_ID, help = "Embedding model identifier")]
    model: String,
    #[arg(long, global = true, default_value_t = DEFAULT_OVERFETCH, help = "Candidate pool multiplier")]
    overfetch: usize,
    #[arg(long, global = true, help = "Grow the candidate pool until k unique gadgets are found")]
    adaptive: bool,
}

impl EngineArgs {
    fn to_config(&self) -> EngineConfig {
        let strategy = if self.adaptive {
            PoolStrategy::Adaptive
        } else {
            PoolStrategy::Fixed
        };
        EngineConfig::new(&self.prefix)
            .with_model(&self.model)
            .with_overfetch(self.overfetch)
            .with_strategy(strategy)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Search gadgets by describing their function
    Search {
        query: String,
        #[arg(short, help = "Number of unique gadgets to return")]
        k: Option<usize>,
        #[arg(long, help = "JSON output")]
        json: bool,
    },
    /// Show index and catalog status
    Status {
        #[arg(long, help = "JSON output")]
        json: bool,
    },

    // ===== MCP Server =====
    /// Start MCP server for Claude integration
    #[cfg(feature = "mcp")]
    Mcp {
        #[arg(long, help = "Show Claude configuration instructions")]
        install: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = cli.engine.to_config();

    match cli.command {
        Commands::Search { query, k, json } => {
            commands::search::run(&config, &query, k.unwrap_or(CLI_DEFAULT_K), json)
        }
        Commands::Status { json } => commands::status::run(&config, json),

        // MCP Server
        #[cfg(feature = "mcp")]
        Commands::Mcp { install } => {
            if install {
                print_mcp_install_instructions(&config);
                Ok(())
            } else {
                run_mcp_server(config)
            }
        }
    }
}

/// Logs go to stderr: stdout carries results and the MCP transport
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[cfg(feature = "mcp")]
fn run_mcp_server(config: EngineConfig) -> anyhow::Result<()> {
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(mcp::run_mcp_server(config))
}

#[cfg(feature = "mcp")]
fn print_mcp_install_instructions(config: &EngineConfig) {
    use colored::Colorize;

    let prefix = std::fs::canonicalize(&config.prefix)
        .unwrap_or_else(|_| config.prefix.clone())
        .to_string_lossy()
        .to_string();

    let binary_path = std::env::current_exe()
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(|_| "gase".to_string());

    println!("{}", "MCP Server Installation Guide".bold().cyan());
    println!();
    println!("Add the following to your Claude configuration:");
    println!();
    println!("{}", "For Claude Desktop (~/.config/claude/claude_desktop_config.json):".dimmed());
    println!(r#"{{
  "mcpServers": {{
    "gadget-search": {{
      "command": "{}",
      "args": ["mcp", "--prefix", "{}"]
    }}
  }}
}}"#, binary_path, prefix);
    println!();
    println!("{}", "Available tools:".bold());
    println!("  • {} - Find gadgets by describing their function", "gadget_search".green());
    println!("  • {} - Index and catalog sizes", "gadget_status".green());
}
