use anyhow::{Context, Result};
use colored::*;
use serde_json::{json, Map, Value};

use job_search::{Response, SearchHits};

use super::{print_failure, print_posting, Workspace};

pub struct KeywordArgs {
    pub industries: Vec<String>,
    pub skills: Vec<String>,
    pub companies: Vec<String>,
    pub filters: Option<String>,
}

impl KeywordArgs {
    /// Raw filters for the engine; `None` lists every posting
    fn to_filters(&self) -> Result<Option<Value>> {
        if let Some(raw) = &self.filters {
            let value: Value = serde_json::from_str(raw).context("--filters is not valid JSON")?;
            return Ok(Some(value));
        }

        let mut criteria = Map::new();
        for (key, values) in [
            ("industries", &self.industries),
            ("skills", &self.skills),
            ("include_companies", &self.companies),
        ] {
            if !values.is_empty() {
                criteria.insert(key.to_string(), json!(values));
            }
        }

        if criteria.is_empty() {
            return Ok(None);
        }
        Ok(Some(json!({ "keyword_search": criteria })))
    }
}

pub fn run(args: &KeywordArgs, limit: Option<usize>, json: bool) -> Result<()> {
    let workspace = Workspace::load()?;
    let store = workspace.open_store(false)?;

    let filters = args.to_filters()?;
    let hits = match workspace.search_posts(&store, filters.as_ref())? {
        Response::Success(hits) => hits,
        Response::Failure(failure) => {
            print_failure(&failure, json);
            std::process::exit(1);
        }
    };

    let total = hits.postings().len();
    let display_limit = limit.unwrap_or(20);

    if json {
        let shown: Vec<_> = hits.postings().iter().take(display_limit).collect();
        println!(
            "{}",
            serde_json::to_string_pretty(&json!({
                "total": total,
                "postings": shown,
            }))?
        );
        return Ok(());
    }

    println!("{}", "Search Results".bold());
    println!("{}", "=".repeat(60));
    if let Some(filters) = &filters {
        println!("Filters: {}", filters);
    }
    println!("Found: {} postings", total);
    println!();

    if total == 0 {
        println!("{}", "No matches found.".yellow());
        return Ok(());
    }

    match &hits {
        SearchHits::Postings(postings) => {
            for (i, posting) in postings.iter().take(display_limit).enumerate() {
                print_posting(i, posting, None);
            }
        }
        SearchHits::Semantic(matches) => {
            for (i, posting) in matches.postings.iter().take(display_limit).enumerate() {
                print_posting(i, posting, matches.similarities.get(i).copied());
            }
        }
    }

    if total > display_limit {
        println!(
            "{}",
            format!("... and {} more results", total - display_limit).dimmed()
        );
    }

    Ok(())
}
