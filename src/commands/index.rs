//! Index command - embed postings for one model

use std::collections::HashSet;

use anyhow::Result;
use colored::Colorize;

use job_search::config::DEFAULT_MODEL_ID;
use job_search::{Embedder, Embedding, EmbeddingFilter, EmbeddingStore, JobPostingStore};

use super::Workspace;

/// Run index command
pub fn run(model_id: Option<i64>, rebuild: bool, json: bool) -> Result<()> {
    let start = std::time::Instant::now();
    let workspace = Workspace::load()?;
    let model_id = model_id.unwrap_or(DEFAULT_MODEL_ID);
    let embedder = workspace.embedder_for(model_id)?;
    let store = workspace.open_store(false)?;

    let registry = workspace.config.registry();
    if let Some(model) = registry.get(model_id) {
        store.upsert_model(model)?;
    }

    if rebuild {
        let removed = store.delete_model_embeddings(model_id)?;
        if !json {
            println!("{} Removed {} existing embeddings", "→".dimmed(), removed);
        }
    }

    let already_indexed: HashSet<String> = store
        .list_embeddings(Some(&EmbeddingFilter { model_id }), None)?
        .into_iter()
        .map(|e| e.job_id)
        .collect();

    let postings = store.all_postings()?;
    let pending: Vec<_> = postings
        .iter()
        .filter(|p| !already_indexed.contains(&p.job_id))
        .collect();

    if !json {
        println!(
            "{} Embedding {} postings with model {}...",
            "→".dimmed(),
            pending.len(),
            model_id
        );
    }

    let texts: Vec<String> = pending.iter().map(|p| p.embedding_text()).collect();
    let text_refs: Vec<&str> = texts.iter().map(String::as_str).collect();
    let vectors = embedder.embed(&text_refs)?;

    let first_id = store.max_embedding_id()? + 1;
    let embeddings: Vec<Embedding> = pending
        .iter()
        .zip(vectors)
        .enumerate()
        .map(|(i, (posting, vector))| Embedding {
            id: first_id + i as i64,
            job_id: posting.job_id.clone(),
            model_id,
            vector,
        })
        .collect();

    let indexed = store.upsert_embeddings(&embeddings)?;
    let skipped = postings.len() - pending.len();
    store.set_meta(
        &format!("last_index_model_{}", model_id),
        &chrono::Utc::now().timestamp().to_string(),
    )?;
    let duration_ms = start.elapsed().as_millis();

    tracing::info!(model_id, indexed, skipped, duration_ms = duration_ms as u64, "indexing finished");

    if json {
        println!(
            "{}",
            serde_json::json!({
                "model_id": model_id,
                "indexed": indexed,
                "skipped": skipped,
                "duration_ms": duration_ms,
            })
        );
    } else {
        println!();
        println!(
            "{} Indexed {} postings in {:.2}s",
            "✓".green().bold(),
            indexed.to_string().cyan(),
            duration_ms as f64 / 1000.0
        );
        if skipped > 0 {
            println!(
                "  {} {} postings skipped (already embedded)",
                "→".dimmed(),
                skipped
            );
        }
        println!(
            "  {} Store: {}",
            "→".dimmed(),
            workspace.db_path().display()
        );
    }

    Ok(())
}
