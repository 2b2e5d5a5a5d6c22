//! Text embedders and vector similarity
//!
//! [`Embedder`] is the seam to whatever model produces query vectors.
//! [`HtpEmbedder`] is a deterministic, training-free implementation based on
//! Harmonic Token Projection (https://arxiv.org/html/2511.20665), good enough
//! to index and query a dataset without downloading a model:
//! - Deterministic (same input → same output)
//! - Unicode-based (multilingual support)
//! - No model file

use std::f64::consts::PI;

use crate::core::error::{Result, SearchError};

/// Largest supported HTP dimension (2 * number of coprime moduli)
pub const MAX_HTP_DIM: usize = 384;

/// Maximum token length (Unicode code points)
const MAX_TOKEN_LENGTH: usize = 64;

/// Coprime moduli for modular decomposition (first 192 primes)
static COPRIME_MODULI: &[u64] = &[
    2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53, 59, 61, 67, 71,
    73, 79, 83, 89, 97, 101, 103, 107, 109, 113, 127, 131, 137, 139, 149, 151,
    157, 163, 167, 173, 179, 181, 191, 193, 197, 199, 211, 223, 227, 229, 233,
    239, 241, 251, 257, 263, 269, 271, 277, 281, 283, 293, 307, 311, 313, 317,
    331, 337, 347, 349, 353, 359, 367, 373, 379, 383, 389, 397, 401, 409, 419,
    421, 431, 433, 439, 443, 449, 457, 461, 463, 467, 479, 487, 491, 499, 503,
    509, 521, 523, 541, 547, 557, 563, 569, 571, 577, 587, 593, 599, 601, 607,
    613, 617, 619, 631, 641, 643, 647, 653, 659, 661, 673, 677, 683, 691, 701,
    709, 719, 727, 733, 739, 743, 751, 757, 761, 769, 773, 787, 797, 809, 811,
    821, 823, 827, 829, 839, 853, 857, 859, 863, 877, 881, 883, 887, 907, 911,
    919, 929, 937, 941, 947, 953, 967, 971, 977, 983, 991, 997, 1009, 1013,
    1019, 1021, 1031, 1033, 1039, 1049, 1051, 1061, 1063, 1069, 1087, 1091,
    1093, 1097, 1103, 1109, 1117, 1123, 1129, 1151, 1153, 1163, 1171, 1181,
];

/// Turns texts into vectors. One output vector per input text, all of the
/// same dimension.
pub trait Embedder: Send + Sync {
    fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>>;

    /// Dimension of the vectors this embedder produces.
    fn dimension(&self) -> usize;

    /// Embed a single text.
    fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed(&[text])?;
        if vectors.len() != 1 {
            return Err(SearchError::Embedder(format!(
                "expected 1 vector for 1 text, got {}",
                vectors.len()
            )));
        }
        Ok(vectors.remove(0))
    }
}

/// HTP embedder with a configurable even dimension
#[derive(Debug, Clone)]
pub struct HtpEmbedder {
    moduli: Vec<u64>,
}

impl HtpEmbedder {
    pub fn new(dimension: usize) -> Result<Self> {
        if dimension == 0 || dimension % 2 != 0 || dimension > MAX_HTP_DIM {
            return Err(SearchError::Embedder(format!(
                "HTP dimension must be even and between 2 and {}, got {}",
                MAX_HTP_DIM, dimension
            )));
        }
        Ok(Self {
            moduli: COPRIME_MODULI[..dimension / 2].to_vec(),
        })
    }

    /// Generate embedding for a single text
    ///
    /// Algorithm:
    /// 1. Tokenize text into words
    /// 2. Embed each token using harmonic projection
    /// 3. Average token embeddings (mean pooling)
    /// 4. L2 normalize result
    fn embed_text(&self, text: &str) -> Vec<f32> {
        let dim = self.dimension();
        let tokens = tokenize(text);

        if tokens.is_empty() {
            return vec![0.0; dim];
        }

        let mut sum = vec![0.0f64; dim];
        for token in &tokens {
            for (i, val) in self.embed_token(token).into_iter().enumerate() {
                sum[i] += val;
            }
        }

        let count = tokens.len() as f64;
        for val in &mut sum {
            *val /= count;
        }

        let norm: f64 = sum.iter().map(|x| x * x).sum::<f64>().sqrt();
        if norm > 0.0 {
            sum.iter().map(|x| (*x / norm) as f32).collect()
        } else {
            sum.iter().map(|x| *x as f32).collect()
        }
    }

    /// Project one token onto the unit circle of every modulus:
    /// E_i = [sin(2πr_i/m_i), cos(2πr_i/m_i)] with r_i = N mod m_i
    fn embed_token(&self, token: &str) -> Vec<f64> {
        let n = token_to_integer(token);

        let mut embedding = Vec::with_capacity(self.moduli.len() * 2);
        for &m in &self.moduli {
            let r = n % m;
            let theta = 2.0 * PI * (r as f64) / (m as f64);
            embedding.push(theta.sin());
            embedding.push(theta.cos());
        }
        embedding
    }
}

impl Embedder for HtpEmbedder {
    fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }

    fn dimension(&self) -> usize {
        self.moduli.len() * 2
    }
}

/// N = Σ u_j * B^(L-j) with B = 2^16, wrapping on overflow
fn token_to_integer(token: &str) -> u64 {
    token
        .chars()
        .take(MAX_TOKEN_LENGTH)
        .fold(0u64, |n, c| n.wrapping_mul(65536).wrapping_add(c as u64))
}

/// Splits text into lowercase words
fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| c.is_whitespace() || c.is_ascii_punctuation())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_lowercase())
        .collect()
}

/// Cosine similarity between two vectors.
///
/// Zero-magnitude vectors score 0.0. Vectors of different length are an error.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.len() != b.len() {
        return Err(SearchError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }

    let (mut dot, mut norm_a, mut norm_b) = (0.0f64, 0.0f64, 0.0f64);
    for (x, y) in a.iter().zip(b.iter()) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }

    Ok(((dot / (norm_a.sqrt() * norm_b.sqrt())) as f32).clamp(-1.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_htp_basic() -> Result<()> {
        let model = HtpEmbedder::new(MAX_HTP_DIM)?;

        let emb1 = model.embed_one("senior rust engineer")?;
        let emb2 = model.embed_one("senior rust engineer")?;
        let emb3 = model.embed_one("pastry chef")?;

        assert_eq!(emb1, emb2);
        assert_ne!(emb1, emb3);
        assert_eq!(emb1.len(), MAX_HTP_DIM);
        Ok(())
    }

    #[test]
    fn test_htp_dimension_bounds() {
        assert!(HtpEmbedder::new(0).is_err());
        assert!(HtpEmbedder::new(7).is_err());
        assert!(HtpEmbedder::new(MAX_HTP_DIM + 2).is_err());
        assert_eq!(HtpEmbedder::new(16).map(|m| m.dimension()).ok(), Some(16));
    }

    #[test]
    fn test_htp_normalized_and_multilingual() -> Result<()> {
        let model = HtpEmbedder::new(64)?;
        for text in ["데이터 엔지니어", "Data Engineer"] {
            let emb = model.embed_one(text)?;
            let norm: f32 = emb.iter().map(|x| x * x).sum::<f32>().sqrt();
            assert!((norm - 1.0).abs() < 0.01);
        }
        Ok(())
    }

    #[test]
    fn test_htp_empty_text_is_zero_vector() -> Result<()> {
        let model = HtpEmbedder::new(8)?;
        assert_eq!(model.embed_one("  ,, ")?, vec![0.0; 8]);
        Ok(())
    }

    #[test]
    fn test_batch_matches_single() -> Result<()> {
        let model = HtpEmbedder::new(32)?;
        let batch = model.embed(&["python developer", "nurse"])?;
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[1], model.embed_one("nurse")?);
        Ok(())
    }

    #[test]
    fn test_cosine_similarity() -> Result<()> {
        let a = [1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &[1.0, 0.0, 0.0])? - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&a, &[0.0, 1.0, 0.0])?.abs() < 1e-6);
        assert!((cosine_similarity(&a, &[-1.0, 0.0, 0.0])? + 1.0).abs() < 1e-6);
        Ok(())
    }

    #[test]
    fn test_cosine_identical_vectors_reach_one() -> Result<()> {
        let v = [0.3, 0.7, 0.11, 2.5];
        assert_eq!(cosine_similarity(&v, &v)?, 1.0);
        Ok(())
    }

    #[test]
    fn test_cosine_edge_cases() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]).ok(), Some(0.0));
        assert!(matches!(
            cosine_similarity(&[1.0, 0.0, 0.0], &[1.0, 0.0]),
            Err(SearchError::DimensionMismatch { expected: 3, actual: 2 })
        ));
    }
}
