//! End-to-end kiosk session flow: acquire → enroll → recognize → track → lose.

use patron_core::{
    AcquisitionSignal, BoundingBox, DetectedFace, EmbeddingExtractor, Engine, EngineConfig,
    Embedding, ExtractorError, FaceCrop, Frame, MemoryStore, Presence,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::{Duration, Instant};

/// Extractor that always reports one face with a fixed embedding, plus
/// optional per-frame jitter to imitate real capture noise.
struct FixedFaceExtractor {
    embedding: Vec<f32>,
    jitter: f32,
    rng: StdRng,
    /// When false, reports an empty frame.
    visible: bool,
}

impl FixedFaceExtractor {
    fn new(embedding: Vec<f32>, jitter: f32) -> Self {
        Self {
            embedding,
            jitter,
            rng: StdRng::seed_from_u64(7),
            visible: true,
        }
    }
}

impl EmbeddingExtractor for FixedFaceExtractor {
    fn detect(&mut self, _frame: &Frame) -> Result<Vec<DetectedFace>, ExtractorError> {
        if !self.visible {
            return Ok(Vec::new());
        }
        let values: Vec<f32> = self
            .embedding
            .iter()
            .map(|v| v + self.rng.gen_range(-self.jitter..=self.jitter))
            .collect();
        Ok(vec![DetectedFace {
            bbox: BoundingBox { x: 5.0, y: 5.0, width: 60.0, height: 60.0, confidence: 0.97 },
            crop: sharp_crop(),
            embedding: Embedding::new(values),
        }])
    }
}

fn sharp_crop() -> FaceCrop {
    let data: Vec<u8> = (0..400)
        .map(|i| if (i / 20 + i % 20) % 2 == 0 { 60 } else { 200 })
        .collect();
    FaceCrop { data, width: 20, height: 20 }
}

fn camera_frame() -> Frame {
    Frame::new(vec![128; 320 * 240], 320, 240)
}

fn kim_vector() -> Vec<f32> {
    // A unit-norm-ish 8-dim stand-in for the 128-dim production embedding.
    vec![0.5, 0.1, -0.3, 0.4, 0.2, -0.1, 0.6, 0.05]
}

#[test]
fn first_visit_enrolls_second_visit_recognizes() {
    let cfg = EngineConfig { required_frames: 7, ..EngineConfig::default() };
    let extractor = FixedFaceExtractor::new(kim_vector(), 0.005);
    let mut engine = Engine::new(extractor, MemoryStore::new(), cfg);

    // --- First visit: nobody enrolled, stability window must complete.
    let mut enrollment = None;
    for _ in 0..7 {
        let report = engine.process_frame(&camera_frame()).unwrap();
        if let Some(AcquisitionSignal::EnrollmentReady { embeddings, probe }) = report.signal {
            enrollment = Some((embeddings, probe));
        }
    }
    let (embeddings, probe) = enrollment.expect("stability window should offer enrollment");
    assert_eq!(embeddings.len(), 7);

    let identity = engine.enroll("Kim", &embeddings).unwrap();
    assert_eq!(identity.name, "Kim");

    // The stored prototype matches its own probe comfortably.
    let outcome = engine.lookup(&probe).unwrap();
    let hit = outcome.hit.expect("prototype should match its probe");
    assert_eq!(hit.name, "Kim");
    assert!(hit.score >= 0.8);

    // --- Track through the visit.
    engine.start_tracking(probe);
    let p = engine.track_at(Instant::now(), &camera_frame()).unwrap();
    assert_eq!(p, Some(Presence::Confirmed));

    engine.end_session();

    // --- Second visit: recognized on the very first frame.
    let report = engine.process_frame(&camera_frame()).unwrap();
    assert_eq!(report.progress, 100);
    match report.signal {
        Some(AcquisitionSignal::ImmediateMatch(hit)) => {
            assert_eq!(hit.name, "Kim");
            assert!(hit.score >= 0.8);
        }
        _ => panic!("returning customer should be recognized immediately"),
    }
}

#[test]
fn walking_away_loses_the_session_once() {
    let cfg = EngineConfig {
        required_frames: 5,
        max_lost_checks: 2,
        ..EngineConfig::default()
    };
    let interval = cfg.check_interval;
    let mut extractor = FixedFaceExtractor::new(kim_vector(), 0.0);
    extractor.visible = false;

    let mut engine = Engine::new(extractor, MemoryStore::new(), cfg);
    engine.start_tracking(Embedding::new(kim_vector()));

    let start = Instant::now();
    let mut lost_signals = 0;
    let mut last = None;
    for i in 0..6u32 {
        let now = start + interval * i + Duration::from_millis(1);
        if let Some(p) = engine.track_at(now, &camera_frame()).unwrap() {
            if p == Presence::SessionLost {
                lost_signals += 1;
            }
            last = Some(p);
        }
    }

    assert_eq!(lost_signals, 1, "session-lost must be signalled exactly once");
    assert!(!last.unwrap().is_present());
}
