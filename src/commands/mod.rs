pub mod import;
pub mod index;
pub mod init;
pub mod search;
pub mod semantic_search;
pub mod status;

use anyhow::{Context, Result};
use colored::Colorize;
use serde_json::Value;

use job_search::{
    build_search_posts_request, AppConfig, AppPaths, HtpEmbedder, JobPosting, Response,
    ResponseFailure, SearchEngine, SearchHits, SearchRequest, SqliteStore,
};

/// Paths and settings shared by every command
pub struct Workspace {
    pub paths: AppPaths,
    pub config: AppConfig,
}

impl Workspace {
    pub fn load() -> Result<Self> {
        Self::at(AppPaths::new())
    }

    pub fn at(paths: AppPaths) -> Result<Self> {
        let config = AppConfig::load(&paths)?;
        Ok(Self { paths, config })
    }

    pub fn db_path(&self) -> std::path::PathBuf {
        self.config.db_path(&self.paths)
    }

    /// Open the store, creating its directory when `create` is set
    pub fn open_store(&self, create: bool) -> Result<SqliteStore> {
        let db_path = self.db_path();
        if !db_path.exists() {
            if !create {
                anyhow::bail!(
                    "No data store at {}. Run `jobsearch import <path>` first.",
                    db_path.display()
                );
            }
            if let Some(parent) = db_path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
        }
        SqliteStore::open(&db_path)
            .with_context(|| format!("Failed to open store {}", db_path.display()))
    }

    /// HTP embedder sized for a registered model
    pub fn embedder_for(&self, model_id: i64) -> Result<HtpEmbedder> {
        let registry = self.config.registry();
        let model = registry
            .get(model_id)
            .with_context(|| format!("Model {} is not listed in the config", model_id))?;
        HtpEmbedder::new(model.dimension)
            .with_context(|| format!("Model {} ({}) cannot be embedded locally", model.id, model.name))
    }

    /// Run nested filters, embedding the query with whichever model they name.
    /// Keyword and unfiltered searches never build an embedder.
    pub fn search_posts(
        &self,
        store: &SqliteStore,
        filters: Option<&Value>,
    ) -> Result<Response<SearchHits>> {
        let embedder = requested_model(filters)
            .map(|model_id| self.embedder_for(model_id))
            .transpose()?;

        let engine = match &embedder {
            Some(embedder) => SearchEngine::new(store, store, embedder),
            None => SearchEngine::keyword_only(store, store),
        }
        .with_models(store)
        .with_registry(self.config.registry());

        Ok(engine.search_posts(filters))
    }
}

/// Model id of a well-formed nested `semantic_search` payload
fn requested_model(filters: Option<&Value>) -> Option<i64> {
    match build_search_posts_request(filters) {
        SearchRequest::Valid(valid) => valid
            .semantic_query()
            .and_then(|query| query.ok())
            .map(|query| query.model_id),
        SearchRequest::Invalid(_) => None,
    }
}

pub fn print_failure(failure: &ResponseFailure, json: bool) {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(failure).unwrap_or_else(|_| failure.to_string())
        );
    } else {
        eprintln!("{} {}", "Error:".red().bold(), failure.kind.to_string().red());
        for line in failure.message.lines() {
            eprintln!("  {}", line);
        }
    }
}

pub fn print_posting(index: usize, posting: &JobPosting, score: Option<f32>) {
    let prefix = match score {
        Some(score) => {
            let score_str = format!("{:.2}", score);
            let score_colored = if score > 0.8 {
                score_str.green()
            } else if score > 0.6 {
                score_str.yellow()
            } else {
                score_str.dimmed()
            };
            format!("{}. [{}]", (index + 1).to_string().bold(), score_colored)
        }
        None => format!("{}.", (index + 1).to_string().bold()),
    };

    println!(
        "{} {} {}",
        prefix,
        posting.title.cyan(),
        format!("({})", posting.job_id).dimmed()
    );
    println!("   {} | {}", posting.company_name, posting.location);

    let listed = posting
        .listed_at()
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "unknown".to_string());
    println!("   {} {}", "listed".dimmed(), listed);

    if !posting.industries.is_empty() {
        println!("   {} {}", "industries".dimmed(), posting.industry_list().join(", "));
    }
    if !posting.skills.is_empty() {
        println!("   {} {}", "skills".dimmed(), posting.skill_list().join(", "));
    }
    println!();
}

pub fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        format!("{}...", s.chars().take(max_chars).collect::<String>())
    }
}
