//! patron-core — identity recognition and presence tracking for the
//! self-service ordering kiosk.
//!
//! Turns a raw camera frame stream into a recognized or newly enrolled
//! identity, then keeps verifying that the same person is still standing
//! in front of the kiosk for the rest of the ordering session.

pub mod acquisition;
pub mod config;
pub mod engine;
pub mod enroll;
pub mod extractor;
pub mod frame;
pub mod matcher;
pub mod presence;
pub mod quality;
pub mod store;
pub mod types;

pub use acquisition::AcquisitionSession;
pub use config::{EngineConfig, QualityConfig};
pub use engine::{AcquisitionSignal, Engine, EngineError, FrameReport};
pub use enroll::{EnrollmentError, EnrollmentManager};
pub use extractor::{DetectedFace, EmbeddingExtractor, ExtractorError};
pub use frame::{FaceCrop, Frame, Roi};
pub use matcher::{Matcher, WeightedMatcher};
pub use presence::{Presence, PresenceTracker};
pub use quality::{QualityGate, QualityReport};
pub use store::{IdentityStore, MemoryStore, StoreError};
pub use types::{BoundingBox, Embedding, Identity, MatchHit, MatchOutcome};
