//! Embedding extractor seam.
//!
//! The kiosk treats the face-embedding neural network as an opaque external
//! dependency: anything that can find faces in a grayscale frame and produce
//! a fixed-length vector per face plugs in here.

use crate::frame::{FaceCrop, Frame};
use crate::types::{BoundingBox, Embedding};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractorError {
    #[error("frame is empty or unreadable")]
    UnreadableFrame,
    #[error("inference failed: {0}")]
    Inference(String),
}

/// One face found in a frame: where it is, its pixels, and its embedding.
#[derive(Clone)]
pub struct DetectedFace {
    pub bbox: BoundingBox,
    pub crop: FaceCrop,
    pub embedding: Embedding,
}

/// External face detection + embedding model.
///
/// Bounding boxes are relative to the frame passed in; the engine offsets
/// them when it hands the extractor a cropped region. An empty result is
/// the normal "nobody there" signal; errors are reserved for the model
/// itself misbehaving.
pub trait EmbeddingExtractor {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<DetectedFace>, ExtractorError>;
}
