//! Acquisition session — temporal voting over consecutive qualifying frames.
//!
//! One session exists per kiosk camera stream while no identity is fixed.
//! A single disqualified frame throws away all accumulated evidence: the
//! counter is frame-count based (not timer based) so it stays correct under
//! variable camera frame rates.

use crate::types::Embedding;

/// Per-stream temporal voting buffer.
///
/// Counts consecutive frames that produced a quality-passing face and
/// collects their embeddings for the eventual enrollment prototype.
#[derive(Debug)]
pub struct AcquisitionSession {
    required_frames: u32,
    stable_count: u32,
    buffer: Vec<Embedding>,
}

impl AcquisitionSession {
    pub fn new(required_frames: u32) -> Self {
        Self {
            required_frames: required_frames.max(1),
            stable_count: 0,
            buffer: Vec::new(),
        }
    }

    /// Feed one frame's qualifying embedding (or `None` when no face passed
    /// the gate). Returns acquisition progress in [0, 100].
    pub fn observe(&mut self, embedding: Option<Embedding>) -> u8 {
        match embedding {
            Some(e) => {
                self.stable_count = (self.stable_count + 1).min(self.required_frames);
                self.buffer.push(e);
                self.progress()
            }
            None => {
                // Hard reset, not decay: one bad frame discards everything.
                self.reset();
                0
            }
        }
    }

    /// Current progress in [0, 100].
    pub fn progress(&self) -> u8 {
        (self.stable_count as f32 / self.required_frames as f32 * 100.0).round() as u8
    }

    /// True once `required_frames` consecutive qualifying frames have been seen.
    pub fn is_stable(&self) -> bool {
        self.stable_count >= self.required_frames
    }

    /// Embeddings collected during the current unbroken run.
    pub fn buffer(&self) -> &[Embedding] {
        &self.buffer
    }

    /// Hand over the accumulated buffer and reset. Called once the buffer has
    /// been given to the matcher/enrollment, regardless of the outcome there.
    pub fn take_buffer(&mut self) -> Vec<Embedding> {
        self.stable_count = 0;
        std::mem::take(&mut self.buffer)
    }

    /// Clear all accumulated evidence.
    pub fn reset(&mut self) {
        self.stable_count = 0;
        self.buffer.clear();
    }
}
