//! Enrollment — outlier-trimmed mean prototype construction.
//!
//! The stability buffer inevitably contains a few noisy frames (motion
//! blur, partial occlusion, a lighting flicker the gate let through).
//! Enrollment discards the ~20% of embeddings farthest from the buffer
//! mean before averaging, so one bad frame cannot drag the prototype.

use crate::store::{IdentityStore, StoreError};
use crate::types::{Embedding, Identity};
use thiserror::Error;

/// Percentile of the distance distribution used as the trim cutoff.
const TRIM_PERCENTILE: f32 = 80.0;

#[derive(Debug, Error)]
pub enum EnrollmentError {
    #[error("cannot enroll from an empty embedding buffer")]
    EmptyBuffer,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Builds prototypes from frame buffers and commits them to the store.
pub struct EnrollmentManager;

impl EnrollmentManager {
    /// Compute the trimmed-mean prototype of a non-empty embedding buffer.
    ///
    /// Deterministic for a given input sequence. When every distance is
    /// identical the strict cutoff would discard everything; the untrimmed
    /// mean is used instead.
    pub fn prototype(embeddings: &[Embedding]) -> Result<Embedding, EnrollmentError> {
        let mean = Embedding::mean(embeddings).ok_or(EnrollmentError::EmptyBuffer)?;

        let distances: Vec<f32> = embeddings
            .iter()
            .map(|e| e.euclidean_distance(&mean))
            .collect();
        let cutoff = percentile(&distances, TRIM_PERCENTILE);

        let retained: Vec<Embedding> = embeddings
            .iter()
            .zip(distances.iter())
            .filter(|(_, &d)| d < cutoff)
            .map(|(e, _)| e.clone())
            .collect();

        // All distances equal (e.g. identical frames): keep everything.
        match Embedding::mean(&retained) {
            Some(trimmed) => Ok(trimmed),
            None => Ok(mean),
        }
    }

    /// Build the prototype and persist a new identity record.
    pub fn enroll<S: IdentityStore>(
        store: &S,
        name: &str,
        embeddings: &[Embedding],
    ) -> Result<Identity, EnrollmentError> {
        let prototype = Self::prototype(embeddings)?;
        let identity = store.append(name, &prototype)?;
        tracing::info!(
            id = %identity.id,
            name = %identity.name,
            frames = embeddings.len(),
            "identity enrolled"
        );
        Ok(identity)
    }
}

/// Linear-interpolation percentile over an unsorted sample, matching the
/// numpy default. `p` in [0, 100].
fn percentile(values: &[f32], p: f32) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let rank = p / 100.0 * (sorted.len() - 1) as f32;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        return sorted[lo];
    }
    let frac = rank - lo as f32;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}
