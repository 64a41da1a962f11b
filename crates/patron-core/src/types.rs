use serde::{Deserialize, Serialize};

/// Bounding box for a detected face, in full-frame pixel coordinates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub confidence: f32,
}

impl BoundingBox {
    /// Pixel area of the box. Used to pick the dominant face in a frame.
    pub fn area(&self) -> f32 {
        self.width * self.height
    }
}

/// Face embedding vector (dimensionality fixed by the external model,
/// 128 for the dlib-style extractor the kiosk ships with).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Embedding {
    pub values: Vec<f32>,
}

impl Embedding {
    pub fn new(values: Vec<f32>) -> Self {
        Self { values }
    }

    pub fn dim(&self) -> usize {
        self.values.len()
    }

    /// L2 norm of the vector.
    pub fn norm(&self) -> f32 {
        self.values.iter().map(|x| x * x).sum::<f32>().sqrt()
    }

    /// Cosine similarity between two embeddings.
    ///
    /// Returns a value in [-1, 1]; 0.0 when either vector has zero norm.
    pub fn similarity(&self, other: &Embedding) -> f32 {
        let mut dot = 0.0f32;
        let mut norm_a = 0.0f32;
        let mut norm_b = 0.0f32;

        for (a, b) in self.values.iter().zip(other.values.iter()) {
            dot += a * b;
            norm_a += a * a;
            norm_b += b * b;
        }

        let denom = norm_a.sqrt() * norm_b.sqrt();
        if denom > 0.0 { dot / denom } else { 0.0 }
    }

    /// Cosine similarity over every second coordinate of both vectors.
    ///
    /// A cheap proxy that captures coarse vector structure at half the
    /// dimensionality; one of the three sub-metrics of the weighted matcher.
    pub fn reduced_similarity(&self, other: &Embedding) -> f32 {
        let mut dot = 0.0f32;
        let mut norm_a = 0.0f32;
        let mut norm_b = 0.0f32;

        for (a, b) in self
            .values
            .iter()
            .step_by(2)
            .zip(other.values.iter().step_by(2))
        {
            dot += a * b;
            norm_a += a * a;
            norm_b += b * b;
        }

        let denom = norm_a.sqrt() * norm_b.sqrt();
        if denom > 0.0 { dot / denom } else { 0.0 }
    }

    /// Euclidean distance between two embeddings.
    pub fn euclidean_distance(&self, other: &Embedding) -> f32 {
        self.values
            .iter()
            .zip(other.values.iter())
            .map(|(a, b)| (a - b).powi(2))
            .sum::<f32>()
            .sqrt()
    }

    /// Arithmetic mean of a non-empty set of embeddings.
    ///
    /// Returns `None` for an empty slice. Vectors shorter than the first
    /// contribute zeros for their missing coordinates; callers feed
    /// same-dimension buffers in practice.
    pub fn mean(embeddings: &[Embedding]) -> Option<Embedding> {
        let first = embeddings.first()?;
        let dim = first.dim();
        let mut acc = vec![0.0f32; dim];

        for e in embeddings {
            for (slot, v) in acc.iter_mut().zip(e.values.iter()) {
                *slot += v;
            }
        }

        let n = embeddings.len() as f32;
        for slot in acc.iter_mut() {
            *slot /= n;
        }
        Some(Embedding::new(acc))
    }
}

/// A persisted enrolled identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    pub name: String,
    pub prototype: Embedding,
    /// RFC 3339 UTC timestamp of enrollment.
    pub created_at: String,
}

/// Outcome of matching a probe embedding against the identity gallery.
#[derive(Debug, Clone)]
pub struct MatchOutcome {
    /// Best identity at or above the match threshold, if any.
    pub hit: Option<MatchHit>,
    /// Best weighted score found across the whole gallery, matched or not.
    /// Callers use this on a miss to decide whether to offer enrollment.
    pub best_score: f32,
}

impl MatchOutcome {
    pub fn no_match() -> Self {
        Self { hit: None, best_score: 0.0 }
    }

    pub fn matched(&self) -> bool {
        self.hit.is_some()
    }
}

/// A positive gallery match.
#[derive(Debug, Clone)]
pub struct MatchHit {
    pub identity_id: String,
    pub name: String,
    pub score: f32,
}
