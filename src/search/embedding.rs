//! Query embedding
//!
//! The engine only sees the [`Embedder`] trait. The built-in provider is a
//! Harmonic Token Projection (HTP) model: deterministic, training-free and
//! loaded without any model file.
//! https://arxiv.org/html/2511.20665

use std::f64::consts::PI;

use super::error::{LoadError, Result};

/// Identifier of the built-in HTP model
pub const HTP_MODEL_ID: &str = "htp-384";

/// Embedding dimension (2 * number of coprime moduli)
pub const EMBEDDING_DIM: usize = 384;

const NUM_MODULI: usize = EMBEDDING_DIM / 2;

/// Maximum token length (Unicode code points)
const MAX_TOKEN_LENGTH: usize = 64;

/// First NUM_MODULI primes, so the moduli are pairwise coprime
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

/// Turns text into a fixed-length vector.
///
/// Implementations must be deterministic for identical input within a
/// process and safe for concurrent read-only use.
pub trait Embedder: Send + Sync {
    /// Identifier recorded alongside an index built with this model
    fn model_id(&self) -> &str;

    /// Length of every vector returned by [`Embedder::encode`]
    fn dimension(&self) -> usize;

    fn encode(&self, text: &str) -> Result<Vec<f32>>;
}

/// Scale `vector` to unit length in place.
///
/// A zero vector is left untouched, so inner product against it is 0.
pub fn normalize_l2(vector: &mut [f32]) {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in vector.iter_mut() {
            *x /= norm;
        }
    }
}

/// HTP embedding model
pub struct EmbeddingModel {
    moduli: Vec<u64>,
}

impl EmbeddingModel {
    /// Resolve a model by identifier.
    ///
    /// Loading is eager: the returned model is ready to encode.
    pub fn load(model_id: &str) -> std::result::Result<Self, LoadError> {
        match model_id {
            HTP_MODEL_ID => Ok(Self::new()),
            other => Err(LoadError::UnknownModel(other.to_string())),
        }
    }

    pub fn new() -> Self {
        Self {
            moduli: COPRIME_MODULI[..NUM_MODULI].to_vec(),
        }
    }

    /// Mean of the token projections, L2 normalized.
    ///
    /// Text without any token embeds to the zero vector.
    fn embed(&self, text: &str) -> Vec<f32> {
        let tokens = tokenize(text);
        if tokens.is_empty() {
            return vec![0.0; EMBEDDING_DIM];
        }

        let mut sum = vec![0.0f64; EMBEDDING_DIM];
        for token in &tokens {
            for (acc, val) in sum.iter_mut().zip(self.embed_token(token)) {
                *acc += val;
            }
        }

        let count = tokens.len() as f64;
        let mut embedding: Vec<f32> = sum.iter().map(|x| (x / count) as f32).collect();
        normalize_l2(&mut embedding);
        embedding
    }

    /// Project one token onto the unit circle of every modulus:
    /// `[sin(2πr/m), cos(2πr/m)]` with `r = N mod m`
    fn embed_token(&self, token: &str) -> Vec<f64> {
        let n = token_to_integer(token);

        let mut embedding = Vec::with_capacity(EMBEDDING_DIM);
        for &m in &self.moduli {
            let theta = 2.0 * PI * ((n % m) as f64) / (m as f64);
            embedding.push(theta.sin());
            embedding.push(theta.cos());
        }
        embedding
    }
}

impl Default for EmbeddingModel {
    fn default() -> Self {
        Self::new()
    }
}

impl Embedder for EmbeddingModel {
    fn model_id(&self) -> &str {
        HTP_MODEL_ID
    }

    fn dimension(&self) -> usize {
        EMBEDDING_DIM
    }

    fn encode(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.embed(text))
    }
}

/// Base-2^16 integer of the token's code points (wrapping)
fn token_to_integer(token: &str) -> u64 {
    token
        .chars()
        .take(MAX_TOKEN_LENGTH)
        .fold(0u64, |n, c| n.wrapping_mul(65536).wrapping_add(c as u64))
}

/// Lowercased words split on whitespace and ASCII punctuation
fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| c.is_whitespace() || c.is_ascii_punctuation())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dot(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| x * y).sum()
    }

    #[test]
    fn test_htp_deterministic() {
        let model1 = EmbeddingModel::new();
        let model2 = EmbeddingModel::new();

        let emb1 = model1.encode("a hook that lets you climb walls").unwrap();
        let emb2 = model2.encode("a hook that lets you climb walls").unwrap();
        let emb3 = model1.encode("fly in the sky").unwrap();

        assert_eq!(emb1, emb2);
        assert_ne!(emb1, emb3);
        assert_eq!(emb1.len(), EMBEDDING_DIM);
    }

    #[test]
    fn test_shared_tokens_raise_similarity() {
        let model = EmbeddingModel::new();

        let query = model.encode("flying device").unwrap();
        let close = model.encode("a flying device for travel").unwrap();
        let far = model.encode("underwater breathing mask").unwrap();

        assert!(dot(&query, &close) > dot(&query, &far));
    }

    #[test]
    fn test_embeddings_are_unit_length() {
        let model = EmbeddingModel::new();
        for text in ["Jet pack", "どこでもドア", "time machine!"] {
            let emb = model.encode(text).unwrap();
            let norm = dot(&emb, &emb).sqrt();
            assert!((norm - 1.0).abs() < 0.01, "{text}: {norm}");
        }
    }

    #[test]
    fn test_punctuation_only_is_zero_vector() {
        let model = EmbeddingModel::new();
        let emb = model.encode("?!...").unwrap();
        assert!(emb.iter().all(|x| *x == 0.0));
    }

    #[test]
    fn test_normalize_l2() {
        let mut v = vec![3.0, 4.0];
        normalize_l2(&mut v);
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);

        let mut zero = vec![0.0, 0.0];
        normalize_l2(&mut zero);
        assert_eq!(zero, vec![0.0, 0.0]);
    }

    #[test]
    fn test_load_by_id() {
        assert!(EmbeddingModel::load(HTP_MODEL_ID).is_ok());
        assert!(matches!(
            EmbeddingModel::load("all-MiniLM-L6-v2"),
            Err(LoadError::UnknownModel(id)) if id == "all-MiniLM-L6-v2"
        ));
    }
}
