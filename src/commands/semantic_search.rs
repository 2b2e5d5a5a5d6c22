//! Semantic Search command - rank postings by similarity to free text

use anyhow::Result;
use colored::Colorize;
use serde_json::json;

use job_search::config::DEFAULT_MODEL_ID;
use job_search::{Response, SearchEngine};

use super::{print_failure, print_posting, truncate, Workspace};

/// Run semantic search command
pub fn run(
    query: &str,
    model_id: Option<i64>,
    threshold: Option<f32>,
    limit: Option<usize>,
    json: bool,
) -> Result<()> {
    let workspace = Workspace::load()?;
    let model_id = model_id.unwrap_or(DEFAULT_MODEL_ID);
    let threshold = threshold.unwrap_or(workspace.config.default_threshold);
    let limit = limit.unwrap_or(5);

    let store = workspace.open_store(false)?;
    let embedder = workspace.embedder_for(model_id)?;
    let engine = SearchEngine::new(&store, &store, &embedder)
        .with_models(&store)
        .with_registry(workspace.config.registry());

    let filters = json!({
        "text": query,
        "model_id": model_id,
        "threshold": threshold,
    });
    let matches = match engine.semantic_search(Some(&filters)) {
        Response::Success(matches) => matches,
        Response::Failure(failure) => {
            print_failure(&failure, json);
            std::process::exit(1);
        }
    };

    if json {
        let json_results: Vec<_> = matches
            .postings
            .iter()
            .zip(&matches.similarities)
            .take(limit)
            .map(|(posting, score)| {
                json!({
                    "job_id": posting.job_id,
                    "title": posting.title,
                    "company_name": posting.company_name,
                    "location": posting.location,
                    "score": score,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&json_results)?);
        return Ok(());
    }

    if matches.is_empty() {
        println!(
            "{} No postings at or above {:.2} for: {}",
            "→".dimmed(),
            threshold,
            query.cyan()
        );
        return Ok(());
    }

    println!(
        "{} {} results for: {} (model {}, threshold {:.2})",
        "→".dimmed(),
        matches.len(),
        query.cyan(),
        model_id,
        threshold
    );
    println!();

    for (i, (posting, score)) in matches
        .postings
        .iter()
        .zip(&matches.similarities)
        .take(limit)
        .enumerate()
    {
        print_posting(i, posting, Some(*score));
        if !posting.description.is_empty() {
            println!("   {}", truncate(&posting.description, 100).dimmed());
            println!();
        }
    }

    if matches.len() > limit {
        println!(
            "{}",
            format!("... and {} more results", matches.len() - limit).dimmed()
        );
    }

    Ok(())
}
