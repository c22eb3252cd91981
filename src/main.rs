use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use jacors::config::Config;
use jacors::mcp::McpServer;
use jacors::model::BucketSet;
use jacors::report;

/// jacors — JaCoCo coverage bucket classification with JSON output.
#[derive(Parser)]
#[command(name = "jacors", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify a JaCoCo XML report and print the JSON document.
    Report {
        /// Path to the JaCoCo XML report file.
        file: PathBuf,

        /// Comma-separated buckets to include (nocovered, partiallycovered,
        /// fullcovered). Defaults to COVERED_TYPES from the environment,
        /// else all three.
        #[arg(long)]
        covered_types: Option<String>,
    },

    /// Run the MCP stdio server exposing the classification tool.
    Serve,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env()?;

    match cli.command {
        Commands::Report {
            file,
            covered_types,
        } => {
            let requested = match covered_types.as_deref() {
                Some(list) => BucketSet::parse_list(list)?,
                None => config.default_buckets,
            };
            let json = report::run(&file, &requested)?;
            println!("{json}");
            Ok(())
        }
        Commands::Serve => {
            let server = McpServer::new(config);
            server.run_stdio()?;
            Ok(())
        }
    }
}
