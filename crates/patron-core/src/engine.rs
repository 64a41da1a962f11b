//! Engine facade — the four operations the kiosk session layer calls.
//!
//! Owns the per-stream state and enforces the mode invariant: a camera
//! stream is either acquiring an identity or tracking one, never both.

use crate::acquisition::AcquisitionSession;
use crate::config::EngineConfig;
use crate::enroll::{EnrollmentError, EnrollmentManager};
use crate::extractor::EmbeddingExtractor;
use crate::frame::Frame;
use crate::matcher::{Matcher, WeightedMatcher};
use crate::presence::{Presence, PresenceTracker};
use crate::quality::QualityGate;
use crate::store::{IdentityStore, StoreError};
use crate::types::{BoundingBox, Embedding, Identity, MatchOutcome};
use std::time::Instant;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("operation requires acquisition mode, but a tracking session is active")]
    TrackingActive,
    #[error("operation requires tracking mode, but the stream is acquiring")]
    NotTracking,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// What a single acquisition frame produced.
pub struct FrameReport {
    /// The qualifying embedding extracted this frame, if any.
    pub embedding: Option<Embedding>,
    /// Where the chosen face sat, in full-frame coordinates.
    pub bbox: Option<BoundingBox>,
    /// Acquisition progress in [0, 100].
    pub progress: u8,
    /// Decision signal, present only when something actionable happened.
    pub signal: Option<AcquisitionSignal>,
}

impl FrameReport {
    fn empty() -> Self {
        Self { embedding: None, bbox: None, progress: 0, signal: None }
    }
}

/// Actionable outcomes of the acquisition pipeline.
pub enum AcquisitionSignal {
    /// A single frame matched an enrolled identity at high confidence — the
    /// fast path, no need to wait out the stability window.
    ImmediateMatch(crate::types::MatchHit),
    /// The stabilized (trimmed-mean) probe matched an enrolled identity.
    StabilizedMatch(crate::types::MatchHit),
    /// The stability window completed with no gallery hit: offer enrollment.
    /// `embeddings` is the collected buffer to pass to [`Engine::enroll`];
    /// `probe` is its trimmed mean, suitable as a tracking target.
    EnrollmentReady {
        embeddings: Vec<Embedding>,
        probe: Embedding,
    },
}

enum Mode {
    Acquiring(AcquisitionSession),
    Tracking(PresenceTracker),
}

/// Identity engine for one kiosk camera stream.
pub struct Engine<X: EmbeddingExtractor, S: IdentityStore> {
    extractor: X,
    store: S,
    matcher: WeightedMatcher,
    gate: QualityGate,
    cfg: EngineConfig,
    mode: Mode,
}

impl<X: EmbeddingExtractor, S: IdentityStore> Engine<X, S> {
    pub fn new(extractor: X, store: S, cfg: EngineConfig) -> Self {
        let session = AcquisitionSession::new(cfg.required_frames);
        let gate = QualityGate::new(cfg.quality.clone());
        Self {
            extractor,
            store,
            matcher: WeightedMatcher,
            gate,
            cfg,
            mode: Mode::Acquiring(session),
        }
    }

    pub fn is_tracking(&self) -> bool {
        matches!(self.mode, Mode::Tracking(_))
    }

    /// Run one acquisition frame: ROI crop, detection, quality gating,
    /// stability voting, and (fast-path or stabilized) gallery lookup.
    ///
    /// Bad frames and extractor failures are the "no face" signal, never an
    /// error: they hard-reset the session and return an empty report.
    pub fn process_frame(&mut self, frame: &Frame) -> Result<FrameReport, EngineError> {
        let session = match &mut self.mode {
            Mode::Acquiring(session) => session,
            Mode::Tracking(_) => return Err(EngineError::TrackingActive),
        };

        if frame.is_empty() {
            session.reset();
            return Ok(FrameReport::empty());
        }

        let roi = frame.center_roi();
        let region = frame.crop(roi);
        let region_frame = Frame::new(region.data, region.width, region.height);

        let faces = match self.extractor.detect(&region_frame) {
            Ok(faces) => faces,
            Err(e) => {
                tracing::warn!(error = %e, "extractor failed; treating frame as faceless");
                session.reset();
                return Ok(FrameReport::empty());
            }
        };

        // Largest face that survives the quality gate wins the frame.
        let best = faces
            .iter()
            .filter(|f| self.gate.accepts(&f.crop))
            .max_by(|a, b| {
                a.bbox
                    .area()
                    .partial_cmp(&b.bbox.area())
                    .unwrap_or(std::cmp::Ordering::Equal)
            });

        let Some(face) = best else {
            session.observe(None);
            return Ok(FrameReport::empty());
        };

        let embedding = face.embedding.clone();
        let bbox = offset_bbox(&face.bbox, roi.x as f32, roi.y as f32);
        let mut progress = session.observe(Some(embedding.clone()));

        let gallery = self.store.load_all()?;

        // Fast path: a confident single-frame hit recognizes immediately.
        let outcome = self
            .matcher
            .find_best_match(&embedding, &gallery, self.cfg.match_threshold);
        if let Some(hit) = outcome.hit {
            session.take_buffer();
            return Ok(FrameReport {
                embedding: Some(embedding),
                bbox: Some(bbox),
                progress: 100,
                signal: Some(AcquisitionSignal::ImmediateMatch(hit)),
            });
        }

        // Slow path: the stability window just completed. Probe with the
        // trimmed mean of the buffer, then clear it regardless of outcome.
        let mut signal = None;
        if session.is_stable() {
            let buffer = session.take_buffer();
            progress = 100;
            // Non-empty by construction: stability requires observed frames.
            if let Ok(probe) = EnrollmentManager::prototype(&buffer) {
                let stabilized =
                    self.matcher
                        .find_best_match(&probe, &gallery, self.cfg.match_threshold);
                signal = Some(match stabilized.hit {
                    Some(hit) => AcquisitionSignal::StabilizedMatch(hit),
                    None => AcquisitionSignal::EnrollmentReady { embeddings: buffer, probe },
                });
            }
        }

        Ok(FrameReport {
            embedding: Some(embedding),
            bbox: Some(bbox),
            progress,
            signal,
        })
    }

    /// Direct gallery lookup for an already-stabilized probe.
    pub fn lookup(&self, probe: &Embedding) -> Result<MatchOutcome, EngineError> {
        let gallery = self.store.load_all()?;
        Ok(self
            .matcher
            .find_best_match(probe, &gallery, self.cfg.match_threshold))
    }

    /// Commit a new identity from a collected embedding buffer.
    pub fn enroll(&self, name: &str, embeddings: &[Embedding]) -> Result<Identity, EnrollmentError> {
        EnrollmentManager::enroll(&self.store, name, embeddings)
    }

    /// Switch the stream to presence tracking of `target`. Any in-flight
    /// acquisition evidence is discarded.
    pub fn start_tracking(&mut self, target: Embedding) {
        self.mode = Mode::Tracking(PresenceTracker::new(
            target,
            self.cfg.presence_threshold,
            self.cfg.max_lost_checks,
            self.cfg.check_interval,
        ));
    }

    /// One presence check against the full frame, throttled by the
    /// configured interval. `Ok(None)` means the check was skipped.
    pub fn track(&mut self, frame: &Frame) -> Result<Option<Presence>, EngineError> {
        self.track_at(Instant::now(), frame)
    }

    /// [`track`](Self::track) with an injectable clock.
    pub fn track_at(&mut self, now: Instant, frame: &Frame) -> Result<Option<Presence>, EngineError> {
        let tracker = match &mut self.mode {
            Mode::Tracking(tracker) => tracker,
            Mode::Acquiring(_) => return Err(EngineError::NotTracking),
        };

        // Skip detection entirely on throttled frames to bound CPU.
        if !tracker.is_ready(now) {
            return Ok(None);
        }

        let embeddings: Vec<Embedding> = if frame.is_empty() {
            Vec::new()
        } else {
            match self.extractor.detect(frame) {
                Ok(faces) => faces.into_iter().map(|f| f.embedding).collect(),
                Err(e) => {
                    tracing::warn!(error = %e, "extractor failed during presence check");
                    Vec::new()
                }
            }
        };

        Ok(tracker.check_at(now, &embeddings))
    }

    /// End the current session (payment complete, timeout, abandonment) and
    /// return to a fresh acquisition state. No persisted side effects.
    pub fn end_session(&mut self) {
        self.mode = Mode::Acquiring(AcquisitionSession::new(self.cfg.required_frames));
    }
}

fn offset_bbox(bbox: &BoundingBox, dx: f32, dy: f32) -> BoundingBox {
    BoundingBox {
        x: bbox.x + dx,
        y: bbox.y + dy,
        width: bbox.width,
        height: bbox.height,
        confidence: bbox.confidence,
    }
}
