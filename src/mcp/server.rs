//! Job search MCP server implementation

use anyhow::Result;
use rmcp::{
    handler::server::{tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, Content, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler, ServiceExt,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::PathBuf;

use job_search::config::DEFAULT_MODEL_ID;
use job_search::{AppPaths, HtpEmbedder, Response, SearchEngine, SqliteStore};

use crate::commands::Workspace;

/// Parameters for job_search tool
#[derive(Debug, Deserialize, JsonSchema)]
pub struct SearchParams {
    /// Filters object with `keyword_search` or `semantic_search`
    #[schemars(
        description = "Filters object. Either {\"keyword_search\": {\"industries\": [..], \"skills\": [..], \"include_companies\": [..]}} or {\"semantic_search\": {\"text\": \"..\", \"model_id\": 1, \"threshold\": 0.7}}. Omit to list every posting."
    )]
    #[serde(default)]
    pub filters: Option<Value>,
    /// Maximum number of postings to return (default: 20)
    #[schemars(description = "Maximum number of postings (default: 20)")]
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    20
}

/// Parameters for job_semantic_search tool
#[derive(Debug, Deserialize, JsonSchema)]
pub struct SemanticParams {
    /// Free text to compare against posting embeddings
    #[schemars(description = "Natural language query, e.g. \"remote rust backend role\"")]
    pub text: String,
    #[schemars(description = "Embedding model id (default: 1)")]
    #[serde(default)]
    pub model_id: Option<i64>,
    #[schemars(description = "Minimum cosine similarity in [0, 1] (default from config)")]
    #[serde(default)]
    pub threshold: Option<f32>,
    #[schemars(description = "Maximum number of results (default: 5)")]
    #[serde(default = "default_semantic_limit")]
    pub limit: usize,
}

fn default_semantic_limit() -> usize {
    5
}

/// Parameters for job_get_posting tool
#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetPostingParams {
    #[schemars(description = "Job id of the posting")]
    pub job_id: String,
}

#[derive(Debug, Serialize)]
struct ScoredPostingJson {
    job_id: String,
    title: String,
    company_name: String,
    location: String,
    score: f32,
}

/// Job search MCP Service
#[derive(Clone)]
pub struct JobSearchService {
    root: PathBuf,
    tool_router: ToolRouter<Self>,
}

impl JobSearchService {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            tool_router: Self::tool_router(),
        }
    }

    fn workspace(&self) -> Result<Workspace, McpError> {
        Workspace::at(AppPaths::from_root(self.root.clone()))
            .map_err(|e| McpError::internal_error(format!("Failed to load config: {}", e), None))
    }

    fn open(&self, model_id: i64) -> Result<(Workspace, SqliteStore, HtpEmbedder), McpError> {
        let workspace = self.workspace()?;
        let store = workspace
            .open_store(false)
            .map_err(|e| McpError::internal_error(format!("{:#}", e), None))?;
        let embedder = workspace
            .embedder_for(model_id)
            .map_err(|e| McpError::invalid_params(format!("{:#}", e), None))?;
        Ok((workspace, store, embedder))
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<String, McpError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| McpError::internal_error(format!("JSON serialization failed: {}", e), None))
}

/// Success becomes a JSON payload, failure a tool error carrying `{type, message}`
fn tool_result<T>(response: Response<T>, render: impl FnOnce(T) -> Value) -> Result<CallToolResult, McpError> {
    match response {
        Response::Success(value) => Ok(CallToolResult::success(vec![Content::text(to_json(
            &render(value),
        )?)])),
        Response::Failure(failure) => Ok(CallToolResult::error(vec![Content::text(to_json(
            &failure,
        )?)])),
    }
}

#[tool_router]
impl JobSearchService {
    #[tool(description = "Search job postings with a filters object. keyword_search keeps postings whose industries contain any requested industry term and whose skills contain any requested skill term (case-sensitive substring), then adds every posting from include_companies. semantic_search ranks postings by embedding similarity to text.")]
    async fn job_search(
        &self,
        params: Parameters<SearchParams>,
    ) -> Result<CallToolResult, McpError> {
        let workspace = self.workspace()?;
        let store = workspace
            .open_store(false)
            .map_err(|e| McpError::internal_error(format!("{:#}", e), None))?;
        // Clamp limit: default 20, max 200
        let limit = match params.0.limit {
            0 => default_limit(),
            n => n.min(200),
        };

        let response = workspace
            .search_posts(&store, params.0.filters.as_ref())
            .map_err(|e| McpError::invalid_params(format!("{:#}", e), None))?;
        tool_result(response, |hits| {
            let postings: Vec<_> = hits.postings().iter().take(limit).collect();
            json!({
                "total": hits.postings().len(),
                "postings": postings,
            })
        })
    }

    #[tool(description = "Rank job postings by semantic similarity to free text. Returns postings at or above the threshold with their scores, in store order.")]
    async fn job_semantic_search(
        &self,
        params: Parameters<SemanticParams>,
    ) -> Result<CallToolResult, McpError> {
        let model_id = params.0.model_id.unwrap_or(DEFAULT_MODEL_ID);
        let (workspace, store, embedder) = self.open(model_id)?;
        let threshold = params.0.threshold.unwrap_or(workspace.config.default_threshold);
        let engine = SearchEngine::new(&store, &store, &embedder)
            .with_models(&store)
            .with_registry(workspace.config.registry());
        // Clamp limit: default 5, max 100
        let limit = match params.0.limit {
            0 => default_semantic_limit(),
            n => n.min(100),
        };

        let filters = json!({
            "text": params.0.text,
            "model_id": model_id,
            "threshold": threshold,
        });
        let response = engine.semantic_search(Some(&filters));
        tool_result(response, |matches| {
            let results: Vec<ScoredPostingJson> = matches
                .postings
                .iter()
                .zip(&matches.similarities)
                .take(limit)
                .map(|(p, score)| ScoredPostingJson {
                    job_id: p.job_id.clone(),
                    title: p.title.clone(),
                    company_name: p.company_name.clone(),
                    location: p.location.clone(),
                    score: *score,
                })
                .collect();
            json!({
                "total": matches.len(),
                "results": results,
            })
        })
    }

    #[tool(description = "Get one job posting by job id, including description, skills and industries.")]
    async fn job_get_posting(
        &self,
        params: Parameters<GetPostingParams>,
    ) -> Result<CallToolResult, McpError> {
        let workspace = self.workspace()?;
        let store = workspace
            .open_store(false)
            .map_err(|e| McpError::internal_error(format!("{:#}", e), None))?;

        let posting = store
            .get_posting(&params.0.job_id)
            .map_err(|e| McpError::internal_error(format!("Lookup failed: {}", e), None))?;

        match posting {
            Some(p) => Ok(CallToolResult::success(vec![Content::text(to_json(&p)?)])),
            None => Ok(CallToolResult::success(vec![Content::text(format!(
                "Posting not found: {}",
                params.0.job_id
            ))])),
        }
    }

    #[tool(description = "Get store statistics and the configured embedding models.")]
    async fn job_status(&self) -> Result<CallToolResult, McpError> {
        let workspace = self.workspace()?;
        let db_path = workspace.db_path();

        let stats = if db_path.exists() {
            let store = workspace
                .open_store(false)
                .map_err(|e| McpError::internal_error(format!("{:#}", e), None))?;
            Some(
                store
                    .get_stats()
                    .map_err(|e| McpError::internal_error(format!("Stats failed: {}", e), None))?,
            )
        } else {
            None
        };

        let output = json!({
            "db_path": db_path.display().to_string(),
            "default_threshold": workspace.config.default_threshold,
            "store": stats,
            "models": workspace.config.models,
        });

        Ok(CallToolResult::success(vec![Content::text(to_json(&output)?)]))
    }
}

#[tool_handler]
impl ServerHandler for JobSearchService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Job posting search server. Provides keyword filtering, semantic ranking and posting lookup.".to_string()
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

/// Run the MCP server
pub async fn run_mcp_server(root: PathBuf) -> Result<()> {
    use tokio::io::{stdin, stdout};

    tracing::info!(root = %root.display(), "starting MCP server");
    let service = JobSearchService::new(root);
    let transport = (stdin(), stdout());
    let server = service.serve(transport).await?;
    server.waiting().await?;

    Ok(())
}
