use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

mod client;
mod commands;
mod config;
mod core;
mod engine;
mod mcp;

use client::CrowdinClient;
use config::Config;

#[derive(Parser)]
#[command(name = "crowdin-tools")]
#[command(author, version, about, long_about = None)]
#[command(
    about = "Crowdin translation maintenance tools for AI agents and humans",
    long_about = "Translation maintenance tools for Crowdin projects - bulk search and \
                  replace over translation text, approval reconciliation, progress \
                  reports, and an MCP server exposing the Crowdin API to agents."
)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format (text, json)
    #[arg(short = 'f', long, global = true, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Debug, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the MCP server on stdio
    Serve,

    /// Find and replace a literal term across a language's translations
    SearchReplace {
        /// Project ID
        project_id: u64,

        /// Target language ID (e.g. 'en')
        language_id: String,

        /// Text to search for
        search: String,

        /// Replacement text
        replace: String,

        /// Restrict to one file
        #[arg(long)]
        file_id: Option<u64>,

        /// Commit the replacements (default: preview only)
        #[arg(long)]
        apply: bool,

        /// Page size while reading translations
        #[arg(long, default_value = "100")]
        limit: usize,
    },

    /// Move a string's approval onto the translation matching an exact text
    SwitchApproval {
        /// Project ID
        project_id: u64,

        /// Target language ID
        language_id: String,

        /// Source string ID
        string_id: u64,

        /// Exact text of the translation that should end up approved
        expected_new_text: String,

        /// Text of the stale translation, for reporting only
        #[arg(long)]
        expected_old_text: Option<String>,
    },

    /// Remove all approvals for one or more languages
    RevokeApprovals {
        /// Project ID
        project_id: u64,

        /// Language IDs to sweep
        #[arg(short, long, required = true, num_args = 1..)]
        languages: Vec<String>,

        /// Count approvals without removing anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Show per-language translation and approval progress
    Progress {
        /// Project ID
        project_id: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so the MCP stdio transport stays clean.
    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter("crowdin_tools=debug")
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter("crowdin_tools=info")
            .with_writer(std::io::stderr)
            .init();
    }

    // A missing token is fatal here, before any command logic runs.
    let config = Config::from_env().context("invalid configuration")?;

    match cli.command {
        Commands::Serve => mcp::server::run_mcp_server(&config).await?,
        Commands::SearchReplace {
            project_id,
            language_id,
            search,
            replace,
            file_id,
            apply,
            limit,
        } => {
            let client = CrowdinClient::new(&config)?;
            commands::search_replace::run(
                &client,
                project_id,
                language_id,
                search,
                replace,
                file_id,
                apply,
                limit,
                &cli.format,
            )
            .await?
        }
        Commands::SwitchApproval {
            project_id,
            language_id,
            string_id,
            expected_new_text,
            expected_old_text,
        } => {
            let client = CrowdinClient::new(&config)?;
            commands::switch_approval::run(
                &client,
                project_id,
                language_id,
                string_id,
                expected_old_text,
                expected_new_text,
                &cli.format,
            )
            .await?
        }
        Commands::RevokeApprovals {
            project_id,
            languages,
            dry_run,
        } => {
            let client = CrowdinClient::new(&config)?;
            commands::revoke_approvals::run(&client, project_id, languages, dry_run, &cli.format)
                .await?
        }
        Commands::Progress { project_id } => {
            let client = CrowdinClient::new(&config)?;
            commands::progress::run(&client, project_id, &cli.format).await?
        }
    }

    Ok(())
}
