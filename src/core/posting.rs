use serde::{Deserialize, Serialize};

/// A job posting as imported from a dataset. Never mutated by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobPosting {
    pub job_id: String,
    pub title: String,
    pub description: String,
    pub company_name: String,
    pub location: String,
    pub original_listed_time: i64,
    pub language: String,
    /// Comma-delimited keyword list
    pub skills: String,
    /// Comma-delimited keyword list
    pub industries: String,
}

impl JobPosting {
    pub fn skill_list(&self) -> Vec<String> {
        split_keywords(&self.skills)
    }

    pub fn industry_list(&self) -> Vec<String> {
        split_keywords(&self.industries)
    }

    /// Text fed to the embedder when indexing a posting.
    pub fn embedding_text(&self) -> String {
        if self.title.is_empty() {
            self.description.clone()
        } else {
            format!("{}\n{}", self.title, self.description)
        }
    }

    pub fn listed_at(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        chrono::DateTime::from_timestamp(self.original_listed_time, 0)
    }
}

fn split_keywords(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn posting() -> JobPosting {
        JobPosting {
            job_id: "1".to_string(),
            title: "Backend Engineer".to_string(),
            description: "Build services".to_string(),
            company_name: "company1".to_string(),
            location: "Berlin".to_string(),
            original_listed_time: 1_700_000_000,
            language: "english".to_string(),
            skills: "Python, Java,, C++ ".to_string(),
            industries: "Technology, Software".to_string(),
        }
    }

    #[test]
    fn test_keyword_lists() {
        let p = posting();
        assert_eq!(p.skill_list(), vec!["Python", "Java", "C++"]);
        assert_eq!(p.industry_list(), vec!["Technology", "Software"]);
    }

    #[test]
    fn test_embedding_text() {
        let mut p = posting();
        assert_eq!(p.embedding_text(), "Backend Engineer\nBuild services");
        p.title.clear();
        assert_eq!(p.embedding_text(), "Build services");
    }

    #[test]
    fn test_serde_shape() {
        let value = serde_json::to_value(posting()).unwrap();
        assert_eq!(value["job_id"], "1");
        assert_eq!(value["original_listed_time"], 1_700_000_000);
        let back: JobPosting = serde_json::from_value(value).unwrap();
        assert_eq!(back, posting());
    }
}
