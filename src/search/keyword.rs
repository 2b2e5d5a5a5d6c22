//! Keyword filtering over job postings
//!
//! Steps run in a fixed order, each a no-op when its criterion is absent or empty:
//! 1. industries: keep postings whose industries text contains any requested term
//! 2. skills: same test on the skills text, applied to what step 1 kept
//! 3. include_companies: union with every posting of the named companies,
//!    deduplicated by `job_id` (first occurrence wins)

use std::collections::HashSet;

use crate::core::error::Result;
use crate::core::{JobPosting, KeywordCriteria};
use crate::repository::JobPostingStore;

/// Run the keyword filter against a store.
pub fn filter(store: &dyn JobPostingStore, criteria: &KeywordCriteria) -> Result<Vec<JobPosting>> {
    let postings = store.list_postings(Some(criteria))?;
    tracing::debug!(
        industries = criteria.industries().len(),
        skills = criteria.skills().len(),
        companies = criteria.include_companies().len(),
        matched = postings.len(),
        "keyword filter applied"
    );
    Ok(postings)
}

/// Apply `criteria` to an already loaded set of postings.
pub fn filter_postings(postings: Vec<JobPosting>, criteria: &KeywordCriteria) -> Vec<JobPosting> {
    if criteria.is_empty() {
        return postings;
    }

    let mut selected: Vec<&JobPosting> = postings.iter().collect();

    if !criteria.industries().is_empty() {
        selected.retain(|p| contains_any(&p.industries, criteria.industries()));
    }

    if !criteria.skills().is_empty() {
        selected.retain(|p| contains_any(&p.skills, criteria.skills()));
    }

    if !criteria.include_companies().is_empty() {
        let companies: HashSet<&str> = criteria
            .include_companies()
            .iter()
            .map(String::as_str)
            .collect();
        selected.extend(
            postings
                .iter()
                .filter(|p| companies.contains(p.company_name.as_str())),
        );

        let mut seen = HashSet::new();
        selected.retain(|p| seen.insert(p.job_id.as_str()));
    }

    selected.into_iter().cloned().collect()
}

fn contains_any(field: &str, terms: &[String]) -> bool {
    terms.iter().any(|term| field.contains(term.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryJobStore;

    fn posting(job_id: &str, company: &str, skills: &str, industries: &str) -> JobPosting {
        JobPosting {
            job_id: job_id.to_string(),
            title: format!("title{}", job_id),
            description: format!("description{}", job_id),
            company_name: company.to_string(),
            location: format!("location{}", job_id),
            original_listed_time: job_id.parse().unwrap_or(0),
            language: "english".to_string(),
            skills: skills.to_string(),
            industries: industries.to_string(),
        }
    }

    fn postings() -> Vec<JobPosting> {
        vec![
            posting("1", "company1", "Python, Java, C++", "Technology, Software"),
            posting("2", "company2", "Java, C++", "Medicine, Software"),
            posting("3", "company3", "Python, Java, C++", "Medicine, Software"),
        ]
    }

    fn ids(postings: &[JobPosting]) -> Vec<&str> {
        postings.iter().map(|p| p.job_id.as_str()).collect()
    }

    fn strings(values: &[&str]) -> Option<Vec<String>> {
        Some(values.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_no_criteria_returns_everything() {
        let result = filter_postings(postings(), &KeywordCriteria::default());
        assert_eq!(ids(&result), vec!["1", "2", "3"]);

        let empty_lists = KeywordCriteria {
            industries: Some(vec![]),
            skills: Some(vec![]),
            include_companies: None,
        };
        assert_eq!(filter_postings(postings(), &empty_lists).len(), 3);
    }

    #[test]
    fn test_industries() {
        let criteria = KeywordCriteria {
            industries: strings(&["Technology"]),
            ..Default::default()
        };
        assert_eq!(ids(&filter_postings(postings(), &criteria)), vec!["1"]);
    }

    #[test]
    fn test_industries_then_skills() {
        let criteria = KeywordCriteria {
            industries: strings(&["Medicine"]),
            skills: strings(&["Python"]),
            ..Default::default()
        };
        assert_eq!(ids(&filter_postings(postings(), &criteria)), vec!["3"]);
    }

    #[test]
    fn test_substring_membership_is_case_sensitive() {
        let criteria = KeywordCriteria {
            skills: strings(&["Pyth"]),
            ..Default::default()
        };
        assert_eq!(ids(&filter_postings(postings(), &criteria)), vec!["1", "3"]);

        let criteria = KeywordCriteria {
            skills: strings(&["python"]),
            ..Default::default()
        };
        assert!(filter_postings(postings(), &criteria).is_empty());
    }

    #[test]
    fn test_include_companies_unions_and_dedupes() {
        let criteria = KeywordCriteria {
            industries: strings(&["Technology"]),
            include_companies: strings(&["company1", "company2"]),
            ..Default::default()
        };
        assert_eq!(ids(&filter_postings(postings(), &criteria)), vec!["1", "2"]);
    }

    #[test]
    fn test_include_companies_alone() {
        let criteria = KeywordCriteria {
            include_companies: strings(&["company3"]),
            ..Default::default()
        };
        // Nothing narrows the working set, so the union keeps every posting
        assert_eq!(ids(&filter_postings(postings(), &criteria)), vec!["1", "2", "3"]);
    }

    #[test]
    fn test_include_companies_never_removes() {
        let base = KeywordCriteria {
            industries: strings(&["Medicine"]),
            skills: strings(&["Python"]),
            ..Default::default()
        };
        let widened = KeywordCriteria {
            include_companies: strings(&["company1"]),
            ..base.clone()
        };
        let before = filter_postings(postings(), &base);
        let after = filter_postings(postings(), &widened);
        for p in &before {
            assert!(after.contains(p));
        }
        assert_eq!(ids(&after), vec!["3", "1"]);
    }

    #[test]
    fn test_idempotent() {
        let criteria = KeywordCriteria {
            industries: strings(&["Software"]),
            skills: strings(&["Python"]),
            include_companies: strings(&["company2"]),
        };
        let once = filter_postings(postings(), &criteria);
        let twice = filter_postings(once.clone(), &criteria);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_filter_through_store() -> Result<()> {
        let store = InMemoryJobStore::new(postings());
        let criteria = KeywordCriteria {
            skills: strings(&["C++"]),
            ..Default::default()
        };
        assert_eq!(filter(&store, &criteria)?.len(), 3);
        Ok(())
    }
}
