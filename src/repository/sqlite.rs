//! Job posting store using SQLite
//!
//! Holds postings, embeddings and model metadata in one file. Vectors are
//! stored as little-endian f32 BLOBs and compared in Rust.

use std::collections::HashSet;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{embedding_matches, EmbeddingFilter, EmbeddingStore, JobPostingStore, ModelStore};
use crate::core::error::{Result, SearchError};
use crate::core::{Embedding, JobPosting, ModelInfo};

/// SQLite-backed store implementing all three repository traits
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

/// Store statistics
#[derive(Debug, Clone, serde::Serialize)]
pub struct StoreStats {
    pub posting_count: usize,
    pub embedding_count: usize,
    pub model_count: usize,
    pub embeddings_per_model: Vec<(i64, usize)>,
    pub last_imported: Option<i64>,
}

const POSTING_COLUMNS: &str = "job_id, title, description, company_name, location, \
     original_listed_time, language, skills, industries";

impl SqliteStore {
    /// Open or create database at path
    pub fn open(db_path: &Path) -> Result<Self> {
        let conn = Connection::open(db_path).map_err(|e| {
            SearchError::Unavailable(format!("cannot open {}: {}", db_path.display(), e))
        })?;
        Self::with_connection(conn)
    }

    /// Open in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| SearchError::Unavailable("store connection lock poisoned".to_string()))
    }

    fn init_schema(&self) -> Result<()> {
        self.conn()?.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS job_postings (
                job_id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                description TEXT NOT NULL,
                company_name TEXT NOT NULL,
                location TEXT NOT NULL,
                original_listed_time INTEGER NOT NULL,
                language TEXT NOT NULL,
                skills TEXT NOT NULL,
                industries TEXT NOT NULL
            );

            -- job_id is a reference only; embeddings may be imported before postings
            CREATE TABLE IF NOT EXISTS embeddings (
                id INTEGER PRIMARY KEY,
                job_id TEXT NOT NULL,
                model_id INTEGER NOT NULL,
                dimension INTEGER NOT NULL,
                vector BLOB NOT NULL
            );

            CREATE TABLE IF NOT EXISTS models (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                dimension INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS store_meta (
                key TEXT PRIMARY KEY,
                value TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_embeddings_model ON embeddings(model_id);
            CREATE INDEX IF NOT EXISTS idx_embeddings_job ON embeddings(job_id);
            CREATE INDEX IF NOT EXISTS idx_postings_company ON job_postings(company_name);
            "#,
        )?;
        Ok(())
    }

    /// Insert or update postings in one transaction
    pub fn upsert_postings(&self, postings: &[JobPosting]) -> Result<usize> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO job_postings (job_id, title, description, company_name, location,
                                          original_listed_time, language, skills, industries)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                ON CONFLICT(job_id) DO UPDATE SET
                    title = excluded.title,
                    description = excluded.description,
                    company_name = excluded.company_name,
                    location = excluded.location,
                    original_listed_time = excluded.original_listed_time,
                    language = excluded.language,
                    skills = excluded.skills,
                    industries = excluded.industries
                "#,
            )?;
            for p in postings {
                stmt.execute(params![
                    p.job_id,
                    p.title,
                    p.description,
                    p.company_name,
                    p.location,
                    p.original_listed_time,
                    p.language,
                    p.skills,
                    p.industries,
                ])?;
            }
        }
        tx.commit()?;
        Ok(postings.len())
    }

    /// Insert or update embeddings in one transaction
    pub fn upsert_embeddings(&self, embeddings: &[Embedding]) -> Result<usize> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO embeddings (id, job_id, model_id, dimension, vector)
                VALUES (?1, ?2, ?3, ?4, ?5)
                ON CONFLICT(id) DO UPDATE SET
                    job_id = excluded.job_id,
                    model_id = excluded.model_id,
                    dimension = excluded.dimension,
                    vector = excluded.vector
                "#,
            )?;
            for e in embeddings {
                stmt.execute(params![
                    e.id,
                    e.job_id,
                    e.model_id,
                    e.vector.len() as i64,
                    vector_to_blob(&e.vector),
                ])?;
            }
        }
        tx.commit()?;
        Ok(embeddings.len())
    }

    /// Delete every embedding produced by `model_id`
    pub fn delete_model_embeddings(&self, model_id: i64) -> Result<usize> {
        let deleted = self
            .conn()?
            .execute("DELETE FROM embeddings WHERE model_id = ?1", params![model_id])?;
        Ok(deleted)
    }

    pub fn upsert_model(&self, model: &ModelInfo) -> Result<()> {
        self.conn()?.execute(
            r#"
            INSERT INTO models (id, name, dimension) VALUES (?1, ?2, ?3)
            ON CONFLICT(id) DO UPDATE SET name = excluded.name, dimension = excluded.dimension
            "#,
            params![model.id, model.name, model.dimension as i64],
        )?;
        Ok(())
    }

    /// Get posting by job id
    pub fn get_posting(&self, job_id: &str) -> Result<Option<JobPosting>> {
        let conn = self.conn()?;
        let sql = format!("SELECT {} FROM job_postings WHERE job_id = ?1", POSTING_COLUMNS);
        let posting = conn
            .query_row(&sql, params![job_id], posting_from_row)
            .optional()?;
        Ok(posting)
    }

    pub fn list_models(&self) -> Result<Vec<ModelInfo>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT id, name, dimension FROM models ORDER BY id")?;
        let rows = stmt.query_map([], |row| {
            let dimension: i64 = row.get(2)?;
            Ok(ModelInfo {
                id: row.get(0)?,
                name: row.get(1)?,
                dimension: usize::try_from(dimension)
                    .map_err(|_| rusqlite::Error::IntegralValueOutOfRange(2, dimension))?,
            })
        })?;

        let mut models = Vec::new();
        for row in rows {
            models.push(row?);
        }
        Ok(models)
    }

    /// Highest embedding id in use, 0 when empty
    pub fn max_embedding_id(&self) -> Result<i64> {
        let max: Option<i64> =
            self.conn()?
                .query_row("SELECT MAX(id) FROM embeddings", [], |row| row.get(0))?;
        Ok(max.unwrap_or(0))
    }

    /// Get store statistics
    pub fn get_stats(&self) -> Result<StoreStats> {
        let conn = self.conn()?;
        let count = |sql: &str| -> Result<usize> {
            let n: i64 = conn.query_row(sql, [], |row| row.get(0))?;
            Ok(n as usize)
        };

        let posting_count = count("SELECT COUNT(*) FROM job_postings")?;
        let embedding_count = count("SELECT COUNT(*) FROM embeddings")?;
        let model_count = count("SELECT COUNT(*) FROM models")?;

        let mut stmt = conn.prepare(
            "SELECT model_id, COUNT(*) FROM embeddings GROUP BY model_id ORDER BY model_id",
        )?;
        let rows = stmt.query_map([], |row| {
            let n: i64 = row.get(1)?;
            Ok((row.get::<_, i64>(0)?, n as usize))
        })?;
        let mut embeddings_per_model = Vec::new();
        for row in rows {
            embeddings_per_model.push(row?);
        }

        let last_imported: Option<String> = conn
            .query_row(
                "SELECT value FROM store_meta WHERE key = 'last_import'",
                [],
                |row| row.get::<_, Option<String>>(0),
            )
            .optional()?
            .flatten();

        Ok(StoreStats {
            posting_count,
            embedding_count,
            model_count,
            embeddings_per_model,
            last_imported: last_imported.and_then(|v| v.parse().ok()),
        })
    }

    /// Set store metadata
    pub fn set_meta(&self, key: &str, value: &str) -> Result<()> {
        self.conn()?.execute(
            "INSERT INTO store_meta (key, value) VALUES (?1, ?2) ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    /// Get store metadata
    pub fn get_meta(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn()?
            .query_row(
                "SELECT value FROM store_meta WHERE key = ?1",
                params![key],
                |row| row.get::<_, Option<String>>(0),
            )
            .optional()?
            .flatten();
        Ok(value)
    }
}

impl JobPostingStore for SqliteStore {
    fn all_postings(&self) -> Result<Vec<JobPosting>> {
        let conn = self.conn()?;
        let sql = format!("SELECT {} FROM job_postings ORDER BY rowid", POSTING_COLUMNS);
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], posting_from_row)?;

        let mut postings = Vec::new();
        for row in rows {
            postings.push(row?);
        }
        Ok(postings)
    }
}

impl EmbeddingStore for SqliteStore {
    fn list_embeddings(
        &self,
        filter: Option<&EmbeddingFilter>,
        job_ids: Option<&HashSet<String>>,
    ) -> Result<Vec<Embedding>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, job_id, model_id, dimension, vector FROM embeddings
            WHERE ?1 IS NULL OR model_id = ?1
            ORDER BY id
            "#,
        )?;
        let rows = stmt.query_map(params![filter.map(|f| f.model_id)], |row| {
            let dimension: i64 = row.get(3)?;
            let blob: Vec<u8> = row.get(4)?;
            Ok((
                Embedding {
                    id: row.get(0)?,
                    job_id: row.get(1)?,
                    model_id: row.get(2)?,
                    vector: Vec::new(),
                },
                dimension,
                blob,
            ))
        })?;

        let mut embeddings = Vec::new();
        for row in rows {
            let (mut embedding, dimension, blob) = row?;
            if !embedding_matches(&embedding, filter, job_ids) {
                continue;
            }
            embedding.vector = blob_to_vector(&blob, dimension).ok_or_else(|| {
                tracing::warn!(embedding_id = embedding.id, bytes = blob.len(), dimension, "malformed vector");
                SearchError::Store(format!(
                    "embedding {} has a malformed vector ({} bytes, dimension {})",
                    embedding.id,
                    blob.len(),
                    dimension
                ))
            })?;
            embeddings.push(embedding);
        }
        Ok(embeddings)
    }
}

impl ModelStore for SqliteStore {
    fn model_name(&self, model_id: i64) -> Result<Option<String>> {
        let name = self
            .conn()?
            .query_row(
                "SELECT name FROM models WHERE id = ?1",
                params![model_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(name)
    }
}

fn posting_from_row(row: &Row<'_>) -> rusqlite::Result<JobPosting> {
    Ok(JobPosting {
        job_id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        company_name: row.get(3)?,
        location: row.get(4)?,
        original_listed_time: row.get(5)?,
        language: row.get(6)?,
        skills: row.get(7)?,
        industries: row.get(8)?,
    })
}

/// Convert f32 vector to BLOB
fn vector_to_blob(vector: &[f32]) -> Vec<u8> {
    let mut blob = Vec::with_capacity(vector.len() * 4);
    for &val in vector {
        blob.extend_from_slice(&val.to_le_bytes());
    }
    blob
}

/// Convert BLOB to f32 vector, `None` if the byte length disagrees with `dimension`
fn blob_to_vector(blob: &[u8], dimension: i64) -> Option<Vec<f32>> {
    let expected = usize::try_from(dimension).ok()?.checked_mul(4)?;
    if blob.len() != expected {
        return None;
    }
    Some(
        blob.chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::KeywordCriteria;

    fn posting(job_id: &str, company: &str, industries: &str) -> JobPosting {
        JobPosting {
            job_id: job_id.to_string(),
            title: format!("title{}", job_id),
            description: format!("description{}", job_id),
            company_name: company.to_string(),
            location: "location".to_string(),
            original_listed_time: 1,
            language: "english".to_string(),
            skills: "Python, Java".to_string(),
            industries: industries.to_string(),
        }
    }

    #[test]
    fn test_blob_conversion() {
        let vector = vec![1.0, 2.0, 3.0, -0.5];
        let blob = vector_to_blob(&vector);
        assert_eq!(blob_to_vector(&blob, 4), Some(vector));
        assert_eq!(blob_to_vector(&blob, 3), None);
        assert_eq!(blob_to_vector(&blob, -1), None);
        assert_eq!(blob_to_vector(&blob, i64::MAX), None);
    }

    #[test]
    fn test_corrupt_dimension_is_a_store_error() -> Result<()> {
        let store = SqliteStore::open_in_memory()?;
        store.conn()?.execute(
            "INSERT INTO embeddings (id, job_id, model_id, dimension, vector) VALUES (1, '1', 1, -1, ?1)",
            params![vector_to_blob(&[1.0, 2.0])],
        )?;
        store.conn()?.execute(
            "INSERT INTO models (id, name, dimension) VALUES (1, 'broken', -4)",
            [],
        )?;

        assert!(matches!(
            store.list_embeddings(None, None),
            Err(SearchError::Store(_))
        ));
        assert!(store.list_models().is_err());
        Ok(())
    }

    #[test]
    fn test_posting_round_trip_and_order() -> Result<()> {
        let store = SqliteStore::open_in_memory()?;
        store.upsert_postings(&[
            posting("b", "company1", "Technology"),
            posting("a", "company2", "Medicine"),
        ])?;
        // Updating keeps the original insertion position
        store.upsert_postings(&[posting("b", "company9", "Technology")])?;

        let all = store.all_postings()?;
        assert_eq!(
            all.iter().map(|p| p.job_id.as_str()).collect::<Vec<_>>(),
            vec!["b", "a"]
        );
        assert_eq!(all[0].company_name, "company9");

        let fetched = store.get_posting("a")?;
        assert_eq!(fetched.map(|p| p.industries), Some("Medicine".to_string()));
        assert!(store.get_posting("missing")?.is_none());
        Ok(())
    }

    #[test]
    fn test_keyword_listing_uses_shared_filter() -> Result<()> {
        let store = SqliteStore::open_in_memory()?;
        store.upsert_postings(&[
            posting("1", "company1", "Technology, Software"),
            posting("2", "company2", "Medicine, Software"),
        ])?;

        let criteria = KeywordCriteria {
            industries: Some(vec!["Technology".to_string()]),
            ..Default::default()
        };
        let found = store.list_postings(Some(&criteria))?;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].job_id, "1");
        Ok(())
    }

    #[test]
    fn test_embedding_queries() -> Result<()> {
        let store = SqliteStore::open_in_memory()?;
        store.upsert_embeddings(&[
            Embedding { id: 1, job_id: "1".into(), model_id: 1, vector: vec![1.0, 2.0, 3.0] },
            Embedding { id: 2, job_id: "2".into(), model_id: 1, vector: vec![0.5, 0.5, 0.5] },
            Embedding { id: 3, job_id: "1".into(), model_id: 2, vector: vec![1.0, 0.0] },
        ])?;

        assert_eq!(store.list_embeddings(None, None)?.len(), 3);

        let ids: HashSet<String> = ["1".to_string()].into_iter().collect();
        let found = store.list_embeddings(Some(&EmbeddingFilter { model_id: 1 }), Some(&ids))?;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].vector, vec![1.0, 2.0, 3.0]);

        assert_eq!(store.max_embedding_id()?, 3);

        assert_eq!(store.delete_model_embeddings(1)?, 2);
        assert_eq!(store.list_embeddings(None, None)?.len(), 1);
        Ok(())
    }

    #[test]
    fn test_models_and_stats() -> Result<()> {
        let store = SqliteStore::open_in_memory()?;
        store.upsert_model(&ModelInfo { id: 1, name: "htp-384".into(), dimension: 384 })?;
        store.upsert_postings(&[posting("1", "company1", "Technology")])?;
        store.upsert_embeddings(&[Embedding {
            id: 1,
            job_id: "1".into(),
            model_id: 1,
            vector: vec![0.1; 4],
        }])?;
        store.set_meta("last_import", "1704067200")?;

        assert_eq!(store.model_name(1)?.as_deref(), Some("htp-384"));
        assert_eq!(store.model_name(5)?, None);
        assert_eq!(store.list_models()?.len(), 1);
        assert_eq!(store.get_meta("last_import")?.as_deref(), Some("1704067200"));

        let stats = store.get_stats()?;
        assert_eq!(stats.posting_count, 1);
        assert_eq!(stats.embedding_count, 1);
        assert_eq!(stats.model_count, 1);
        assert_eq!(stats.embeddings_per_model, vec![(1, 1)]);
        assert_eq!(stats.last_imported, Some(1704067200));
        Ok(())
    }
}
