mod commands;
#[cfg(feature = "mcp")]
mod mcp;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use commands::search::KeywordArgs;

#[derive(Parser)]
#[command(name = "jobsearch")]
#[command(about = "Keyword and semantic search over job postings", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    // ===== Workspace =====
    Init {
        #[arg(long, help = "Overwrite config.yaml with defaults")]
        force: bool,
    },
    Import {
        #[arg(help = "Dataset JSON file or directory of them")]
        path: PathBuf,
        #[arg(long, help = "JSON output")]
        json: bool,
    },
    Status {
        #[arg(long, help = "JSON output")]
        json: bool,
    },

    // ===== Search =====
    /// Embed postings that have no vector for a model yet
    Index {
        #[arg(long, help = "Model id (default: 1)")]
        model: Option<i64>,
        #[arg(long, help = "Drop the model's embeddings first")]
        rebuild: bool,
        #[arg(long, help = "JSON output")]
        json: bool,
    },
    /// Keyword search (exact list matching)
    Search {
        #[arg(long = "industry", help = "Required industry (repeatable)")]
        industries: Vec<String>,
        #[arg(long = "skill", help = "Required skill (repeatable)")]
        skills: Vec<String>,
        #[arg(long = "company", help = "Always include this company (repeatable)")]
        companies: Vec<String>,
        #[arg(
            long,
            conflicts_with_all = ["industries", "skills", "companies"],
            help = "Raw filters object, e.g. '{\"keyword_search\": {...}}'"
        )]
        filters: Option<String>,
        #[arg(long, short, help = "Limit results")]
        limit: Option<usize>,
        #[arg(long, help = "JSON output")]
        json: bool,
    },
    /// Semantic search using embeddings
    #[command(name = "semantic-search", alias = "ss")]
    SemanticSearch {
        query: String,
        #[arg(long, help = "Model id (default: 1)")]
        model: Option<i64>,
        #[arg(long, short, help = "Minimum similarity in [0, 1]")]
        threshold: Option<f32>,
        #[arg(long, short, help = "Limit results")]
        limit: Option<usize>,
        #[arg(long, help = "JSON output")]
        json: bool,
    },

    // ===== MCP Server =====
    /// Start MCP server over stdio
    #[cfg(feature = "mcp")]
    Mcp {
        #[arg(long, help = "Show client configuration instructions")]
        install: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = commands::Workspace::load()
        .ok()
        .and_then(|w| w.config.log_level);
    job_search::logging::init_tracing(log_level.as_deref());

    match cli.command {
        Commands::Init { force } => commands::init::run(force),
        Commands::Import { path, json } => commands::import::run(&path, json),
        Commands::Status { json } => commands::status::run(json),

        Commands::Index {
            model,
            rebuild,
            json,
        } => commands::index::run(model, rebuild, json),
        Commands::Search {
            industries,
            skills,
            companies,
            filters,
            limit,
            json,
        } => {
            let args = KeywordArgs {
                industries,
                skills,
                companies,
                filters,
            };
            commands::search::run(&args, limit, json)
        }
        Commands::SemanticSearch {
            query,
            model,
            threshold,
            limit,
            json,
        } => commands::semantic_search::run(&query, model, threshold, limit, json),

        #[cfg(feature = "mcp")]
        Commands::Mcp { install } => {
            if install {
                print_mcp_install_instructions();
                Ok(())
            } else {
                run_mcp_server()
            }
        }
    }
}

#[cfg(feature = "mcp")]
fn run_mcp_server() -> anyhow::Result<()> {
    let root = std::env::current_dir()?;
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(mcp::run_mcp_server(root))
}

#[cfg(feature = "mcp")]
fn print_mcp_install_instructions() {
    use colored::Colorize;

    let root = std::env::current_dir()
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(|_| "/path/to/workspace".to_string());

    let binary_path = std::env::current_exe()
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(|_| "jobsearch".to_string());

    println!("{}", "MCP Server Installation Guide".bold().cyan());
    println!();
    println!("Add the following to your MCP client configuration:");
    println!();
    println!(
        r#"{{
  "mcpServers": {{
    "job-search": {{
      "command": "{}",
      "args": ["mcp"],
      "cwd": "{}"
    }}
  }}
}}"#,
        binary_path, root
    );
    println!();
    println!("{}", "Available tools:".bold());
    println!("  • {} - Keyword or semantic search with a filters object", "job_search".green());
    println!("  • {} - Rank postings by similarity to text", "job_semantic_search".green());
    println!("  • {} - Get one posting by job id", "job_get_posting".green());
    println!("  • {} - Store and model summary", "job_status".green());
}
