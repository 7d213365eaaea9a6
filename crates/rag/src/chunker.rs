//! Semantic text chunking
//!
//! Fragments are split at embedding-similarity discontinuities rather than
//! fixed sizes: adjacent sentences are embedded, the cosine distance between
//! each consecutive pair is computed, and a break is placed wherever the
//! distance exceeds a percentile threshold over all gaps. Sentences that
//! stay on the same topic end up in the same fragment.

use unicode_segmentation::UnicodeSegmentation;

use crate::embeddings::Embedder;
use crate::RagError;

/// Configuration for semantic chunking
#[derive(Debug, Clone)]
pub struct ChunkConfig {
    /// Percentile of gap distances above which a breakpoint is placed
    pub breakpoint_percentile: f32,
    /// Chunks shorter than this are merged into their predecessor
    pub min_chunk_chars: usize,
    /// Hard upper bound on chunk size regardless of similarity
    pub max_chunk_chars: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            breakpoint_percentile: 95.0,
            min_chunk_chars: 64,
            max_chunk_chars: 2048,
        }
    }
}

/// Semantic chunker
pub struct SemanticChunker {
    config: ChunkConfig,
}

impl SemanticChunker {
    pub fn new(config: ChunkConfig) -> Self {
        Self { config }
    }

    /// Split text into semantically coherent fragments
    pub async fn chunk(
        &self,
        text: &str,
        embedder: &dyn Embedder,
    ) -> Result<Vec<String>, RagError> {
        let sentences: Vec<String> = text
            .unicode_sentences()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        if sentences.is_empty() {
            return Ok(Vec::new());
        }
        if sentences.len() <= 2 {
            return Ok(vec![sentences.join(" ")]);
        }

        let embeddings = embedder.embed_batch(&sentences).await?;

        // Distance between each consecutive sentence pair
        let distances: Vec<f32> = embeddings
            .windows(2)
            .map(|pair| 1.0 - cosine_similarity(&pair[0], &pair[1]))
            .collect();

        let threshold = percentile(&distances, self.config.breakpoint_percentile);

        let mut chunks = Vec::new();
        let mut current = String::new();

        for (i, sentence) in sentences.iter().enumerate() {
            let would_overflow =
                !current.is_empty() && current.len() + sentence.len() + 1 > self.config.max_chunk_chars;
            if would_overflow {
                chunks.push(std::mem::take(&mut current));
            }

            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(sentence);

            let semantic_break = i < distances.len() && distances[i] > threshold;
            if semantic_break {
                chunks.push(std::mem::take(&mut current));
            }
        }
        if !current.is_empty() {
            chunks.push(current);
        }

        // Fold undersized chunks into their predecessor
        let mut merged: Vec<String> = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            match merged.last_mut() {
                Some(prev) if chunk.len() < self.config.min_chunk_chars => {
                    prev.push(' ');
                    prev.push_str(&chunk);
                },
                _ => merged.push(chunk),
            }
        }

        Ok(merged)
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Nearest-rank percentile over an unsorted slice
fn percentile(values: &[f32], p: f32) -> f32 {
    if values.is_empty() {
        return f32::MAX;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let rank = ((p / 100.0) * sorted.len() as f32).ceil() as usize;
    sorted[rank.clamp(1, sorted.len()) - 1]
}
