use anyhow::Result;
use chrono::{Local, TimeZone, Utc};
use colored::*;
use serde::Serialize;

use job_search::{ModelInfo, SqliteStore, StoreStats};

use super::Workspace;

#[derive(Serialize)]
struct WorkspaceStatus {
    timestamp: String,
    db_path: String,
    default_threshold: f32,
    store: Option<StoreStats>,
    models: Vec<ModelCoverage>,
    /// Models recorded in the store but absent from the config
    unconfigured_models: Vec<ModelInfo>,
    warnings: Vec<String>,
}

#[derive(Serialize)]
struct ModelCoverage {
    id: i64,
    name: String,
    dimension: usize,
    embeddings: usize,
    last_indexed: Option<i64>,
}

pub fn run(json: bool) -> Result<()> {
    let workspace = Workspace::load()?;
    let db_path = workspace.db_path();

    let registry = workspace.config.registry();
    let mut models = coverage(registry.models(), None);
    let mut unconfigured_models = Vec::new();

    let store = if db_path.exists() {
        let store = workspace.open_store(false)?;
        let stats = store.get_stats()?;
        models = coverage(registry.models(), Some(&stats));
        record_last_indexed(&store, &mut models)?;
        unconfigured_models = store
            .list_models()?
            .into_iter()
            .filter(|m| registry.get(m.id).is_none())
            .collect();
        Some(stats)
    } else {
        None
    };

    let mut warnings = collect_warnings(store.as_ref(), &models);
    for model in &unconfigured_models {
        warnings.push(format!(
            "model {} ({}) is in the store but not in config.yaml; its queries cannot be embedded",
            model.id, model.name
        ));
    }

    let status = WorkspaceStatus {
        timestamp: Local::now().to_rfc3339(),
        db_path: db_path.display().to_string(),
        default_threshold: workspace.config.default_threshold,
        store,
        models,
        unconfigured_models,
        warnings,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        print_status(&status);
    }

    Ok(())
}

fn coverage(models: &[ModelInfo], stats: Option<&StoreStats>) -> Vec<ModelCoverage> {
    models
        .iter()
        .map(|m| ModelCoverage {
            id: m.id,
            name: m.name.clone(),
            dimension: m.dimension,
            embeddings: stats
                .and_then(|s| s.embeddings_per_model.iter().find(|(id, _)| *id == m.id))
                .map(|(_, n)| *n)
                .unwrap_or(0),
            last_indexed: None,
        })
        .collect()
}

fn record_last_indexed(store: &SqliteStore, models: &mut [ModelCoverage]) -> Result<()> {
    for model in models {
        model.last_indexed = store
            .get_meta(&format!("last_index_model_{}", model.id))?
            .and_then(|v| v.parse().ok());
    }
    Ok(())
}

fn format_timestamp(ts: i64) -> Option<String> {
    Utc.timestamp_opt(ts, 0)
        .single()
        .map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
}

fn collect_warnings(stats: Option<&StoreStats>, models: &[ModelCoverage]) -> Vec<String> {
    let Some(stats) = stats else {
        return vec!["no data store; run `jobsearch import <path>`".to_string()];
    };

    let mut warnings = Vec::new();
    if stats.posting_count == 0 {
        warnings.push("store has no postings".to_string());
    }
    for model in models {
        if model.embeddings < stats.posting_count {
            warnings.push(format!(
                "model {} covers {}/{} postings; run `jobsearch index --model {}`",
                model.id, model.embeddings, stats.posting_count, model.id
            ));
        }
    }
    warnings
}

fn print_status(status: &WorkspaceStatus) {
    println!("{}", "Job Search Status".bold());
    println!("{}", "=".repeat(50));
    println!("Store: {}", status.db_path);
    println!("Default threshold: {:.2}", status.default_threshold);
    println!();

    if let Some(stats) = &status.store {
        println!("{}", "Store".bold());
        println!("  Postings:   {}", stats.posting_count.to_string().cyan());
        println!("  Embeddings: {}", stats.embedding_count.to_string().cyan());
        println!("  Models:     {}", stats.model_count.to_string().cyan());
        if let Some(imported) = stats.last_imported.and_then(format_timestamp) {
            println!("  Imported:   {}", imported);
        }
        println!();
    }

    println!("{}", "Configured models".bold());
    for model in &status.models {
        let indexed = model
            .last_indexed
            .and_then(format_timestamp)
            .map(|t| format!(", indexed {}", t))
            .unwrap_or_default();
        println!(
            "  {} {} (dim {}) {} embeddings{}",
            format!("[{}]", model.id).dimmed(),
            model.name.cyan(),
            model.dimension,
            model.embeddings,
            indexed
        );
    }
    println!();

    if status.warnings.is_empty() {
        println!("{} No warnings", "✓".green());
    } else {
        println!("{}", "Warnings".yellow().bold());
        for w in &status.warnings {
            println!("  {} {}", "⚠".yellow(), w);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(postings: usize, per_model: Vec<(i64, usize)>) -> StoreStats {
        StoreStats {
            posting_count: postings,
            embedding_count: per_model.iter().map(|(_, n)| n).sum(),
            model_count: per_model.len(),
            embeddings_per_model: per_model,
            last_imported: None,
        }
    }

    fn model(id: i64) -> ModelInfo {
        ModelInfo {
            id,
            name: format!("htp-{}", id),
            dimension: 8,
        }
    }

    #[test]
    fn test_coverage_counts_per_model() {
        let s = stats(3, vec![(1, 3)]);
        let models = coverage(&[model(1), model(2)], Some(&s));
        assert_eq!(models[0].embeddings, 3);
        assert_eq!(models[1].embeddings, 0);

        let warnings = collect_warnings(Some(&s), &models);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].starts_with("model 2 covers 0/3"));
    }

    #[test]
    fn test_last_indexed_comes_from_store_meta() -> Result<()> {
        let store = SqliteStore::open_in_memory()?;
        store.set_meta("last_index_model_2", "1704067200")?;

        let mut models = coverage(&[model(1), model(2)], None);
        record_last_indexed(&store, &mut models)?;
        assert_eq!(models[0].last_indexed, None);
        assert_eq!(models[1].last_indexed, Some(1704067200));
        Ok(())
    }

    #[test]
    fn test_missing_store_warns() {
        let warnings = collect_warnings(None, &[]);
        assert_eq!(warnings.len(), 1);
    }
}
