//! Weighted multi-metric gallery matcher.
//!
//! Combines three similarity measures per stored prototype:
//! full-dimensional cosine (0.4), Euclidean-distance-derived similarity
//! (0.3), and a reduced-dimension cosine over every second coordinate
//! (0.3). The 0.4/0.3/0.3 weighting is the canonical scheme.

use crate::types::{Embedding, Identity, MatchHit, MatchOutcome};

const WEIGHT_COSINE: f32 = 0.4;
const WEIGHT_EUCLIDEAN: f32 = 0.3;
const WEIGHT_REDUCED: f32 = 0.3;

/// Euclidean distance at which the distance-derived similarity bottoms out
/// at zero. Scaled for unit-norm embeddings, whose pairwise distance is
/// bounded by 2.
const EUCLID_MAX: f32 = 2.0;

/// Strategy seam for comparing a probe against the enrolled gallery.
pub trait Matcher {
    fn find_best_match(&self, probe: &Embedding, gallery: &[Identity], threshold: f32)
        -> MatchOutcome;
}

/// The canonical weighted matcher.
#[derive(Debug, Default, Clone, Copy)]
pub struct WeightedMatcher;

impl WeightedMatcher {
    /// Weighted score of one probe/prototype pair, in [0, 1] for
    /// non-degenerate inputs.
    pub fn score(probe: &Embedding, prototype: &Embedding) -> f32 {
        let cosine = probe.similarity(prototype);
        let euclid = (1.0 - probe.euclidean_distance(prototype) / EUCLID_MAX).max(0.0);
        let reduced = probe.reduced_similarity(prototype);

        WEIGHT_COSINE * cosine + WEIGHT_EUCLIDEAN * euclid + WEIGHT_REDUCED * reduced
    }
}

impl Matcher for WeightedMatcher {
    fn find_best_match(
        &self,
        probe: &Embedding,
        gallery: &[Identity],
        threshold: f32,
    ) -> MatchOutcome {
        if gallery.is_empty() {
            return MatchOutcome::no_match();
        }

        let mut best_score = 0.0f32;
        let mut best: Option<&Identity> = None;

        for identity in gallery {
            // Degenerate prototypes never match and never divide by zero.
            if identity.prototype.norm() == 0.0 {
                tracing::warn!(id = %identity.id, "skipping zero-norm prototype");
                continue;
            }
            if identity.prototype.dim() != probe.dim() {
                tracing::warn!(
                    id = %identity.id,
                    expected = probe.dim(),
                    actual = identity.prototype.dim(),
                    "skipping prototype with mismatched dimension"
                );
                continue;
            }

            let score = Self::score(probe, &identity.prototype);
            if score > best_score {
                best_score = score;
                best = Some(identity);
            }
        }

        match best {
            Some(identity) if best_score >= threshold => MatchOutcome {
                hit: Some(MatchHit {
                    identity_id: identity.id.clone(),
                    name: identity.name.clone(),
                    score: best_score,
                }),
                best_score,
            },
            _ => MatchOutcome { hit: None, best_score },
        }
    }
}
