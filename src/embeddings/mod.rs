pub mod openai;

pub use openai::OpenAIEmbedder;

use crate::error::LlmError;
use async_trait::async_trait;

/// Text-to-vector capability used by embedding-based metrics.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// One embedding per input text, in input order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, LlmError>;
}

/// Cosine similarity of two equal-length vectors; 0.0 when lengths differ or either is zero.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let mag_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if mag_a == 0.0 || mag_b == 0.0 {
        return 0.0;
    }

    dot / (mag_a * mag_b)
}
