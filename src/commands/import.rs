//! Import command - load postings, embeddings and models into the store

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use colored::Colorize;
use serde::Deserialize;
use walkdir::WalkDir;

use job_search::{Embedding, JobPosting, ModelInfo};

use super::Workspace;

/// One dataset file. Every section is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Dataset {
    pub postings: Vec<JobPosting>,
    pub embeddings: Vec<Embedding>,
    pub models: Vec<ModelInfo>,
}

impl Dataset {
    pub fn parse(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}

/// Collect `.json` files under `path` (or `path` itself), sorted
fn dataset_files(path: &Path) -> Result<Vec<PathBuf>> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    if !path.is_dir() {
        anyhow::bail!("{} does not exist", path.display());
    }

    let mut files: Vec<PathBuf> = WalkDir::new(path)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| p.extension().map_or(false, |ext| ext == "json"))
        .collect();
    files.sort();
    Ok(files)
}

pub fn run(path: &Path, json: bool) -> Result<()> {
    let workspace = Workspace::load()?;
    let store = workspace.open_store(true)?;
    let files = dataset_files(path)?;

    let (mut postings, mut embeddings, mut models) = (0, 0, 0);
    for file in &files {
        let raw = fs::read_to_string(file)
            .with_context(|| format!("Failed to read {}", file.display()))?;
        let dataset =
            Dataset::parse(&raw).with_context(|| format!("Invalid dataset {}", file.display()))?;

        for model in &dataset.models {
            store.upsert_model(model)?;
        }
        models += dataset.models.len();
        postings += store.upsert_postings(&dataset.postings)?;
        embeddings += store.upsert_embeddings(&dataset.embeddings)?;

        tracing::info!(
            file = %file.display(),
            postings = dataset.postings.len(),
            embeddings = dataset.embeddings.len(),
            models = dataset.models.len(),
            "imported dataset file"
        );
    }

    store.set_meta("last_import", &chrono::Utc::now().timestamp().to_string())?;

    if json {
        println!(
            "{}",
            serde_json::json!({
                "files": files.len(),
                "postings": postings,
                "embeddings": embeddings,
                "models": models,
                "db_path": workspace.db_path().display().to_string(),
            })
        );
    } else {
        println!(
            "{} Imported {} files: {} postings, {} embeddings, {} models",
            "✓".green().bold(),
            files.len().to_string().cyan(),
            postings.to_string().cyan(),
            embeddings.to_string().cyan(),
            models.to_string().cyan()
        );
        println!(
            "  {} Store: {}",
            "→".dimmed(),
            workspace.db_path().display()
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dataset_sections() -> Result<()> {
        let dataset = Dataset::parse(
            r#"{
                "postings": [{
                    "job_id": "1", "title": "title1", "description": "description1",
                    "company_name": "company1", "location": "location1",
                    "original_listed_time": 1, "language": "english",
                    "skills": "Python, Java, C++", "industries": "Technology, Software"
                }],
                "embeddings": [{"id": 1, "job_id": "1", "model_id": 1, "vector": [1.0, 2.0, 3.0]}]
            }"#,
        )?;
        assert_eq!(dataset.postings.len(), 1);
        assert_eq!(dataset.embeddings[0].vector, vec![1.0, 2.0, 3.0]);
        assert!(dataset.models.is_empty());
        Ok(())
    }

    #[test]
    fn test_rejects_unknown_sections() {
        assert!(Dataset::parse(r#"{"jobs": []}"#).is_err());
    }
}
