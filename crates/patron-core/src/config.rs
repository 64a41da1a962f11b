//! Engine configuration, loaded from `PATRON_*` environment variables
//! with built-in defaults.

use std::time::Duration;

/// Quality gate floors and bands.
#[derive(Debug, Clone)]
pub struct QualityConfig {
    /// Laplacian variance floor; crops below this are considered blurred.
    pub min_sharpness: f32,
    /// Acceptable mean brightness band (0–255).
    pub min_brightness: f32,
    pub max_brightness: f32,
    /// Brightness std-dev floor; crops below this are flat/washed-out.
    pub min_contrast: f32,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            min_sharpness: 100.0,
            min_brightness: 40.0,
            max_brightness: 250.0,
            min_contrast: 20.0,
        }
    }
}

/// Tunables for the whole identity engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Consecutive qualifying frames required before a stabilized
    /// match/enrollment decision is made.
    pub required_frames: u32,
    /// Weighted-score floor for a positive gallery match.
    pub match_threshold: f32,
    /// Looser cosine floor used by the presence continuity check.
    pub presence_threshold: f32,
    /// Failed presence checks tolerated before the session is lost.
    pub max_lost_checks: u32,
    /// Minimum wall-clock spacing between presence checks.
    pub check_interval: Duration,
    pub quality: QualityConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            required_frames: 30,
            match_threshold: 0.8,
            presence_threshold: 0.45,
            max_lost_checks: 3,
            check_interval: Duration::from_secs(3),
            quality: QualityConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from `PATRON_*` environment variables, falling
    /// back to defaults for anything unset or unparseable.
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            required_frames: env_u32("PATRON_REQUIRED_FRAMES", d.required_frames),
            match_threshold: env_f32("PATRON_MATCH_THRESHOLD", d.match_threshold),
            presence_threshold: env_f32("PATRON_PRESENCE_THRESHOLD", d.presence_threshold),
            max_lost_checks: env_u32("PATRON_MAX_LOST_CHECKS", d.max_lost_checks),
            check_interval: Duration::from_secs_f32(env_f32(
                "PATRON_CHECK_INTERVAL_SECS",
                d.check_interval.as_secs_f32(),
            )),
            quality: QualityConfig {
                min_sharpness: env_f32("PATRON_MIN_SHARPNESS", d.quality.min_sharpness),
                min_brightness: env_f32("PATRON_MIN_BRIGHTNESS", d.quality.min_brightness),
                max_brightness: env_f32("PATRON_MAX_BRIGHTNESS", d.quality.max_brightness),
                min_contrast: env_f32("PATRON_MIN_CONTRAST", d.quality.min_contrast),
            },
        }
    }
}

fn env_f32(key: &str, default: f32) -> f32 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_u32(key: &str, default: u32) -> u32 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.required_frames, 30);
        assert!((cfg.match_threshold - 0.8).abs() < 1e-6);
        assert!((cfg.presence_threshold - 0.45).abs() < 1e-6);
        assert_eq!(cfg.max_lost_checks, 3);
        assert_eq!(cfg.check_interval, Duration::from_secs(3));
    }

    #[test]
    fn test_env_override() {
        // Unlikely-to-collide variable name; set/unset within the test.
        std::env::set_var("PATRON_REQUIRED_FRAMES", "12");
        let cfg = EngineConfig::from_env();
        assert_eq!(cfg.required_frames, 12);
        std::env::remove_var("PATRON_REQUIRED_FRAMES");
    }

    #[test]
    fn test_env_garbage_falls_back() {
        std::env::set_var("PATRON_MATCH_THRESHOLD", "not-a-number");
        let cfg = EngineConfig::from_env();
        assert!((cfg.match_threshold - 0.8).abs() < 1e-6);
        std::env::remove_var("PATRON_MATCH_THRESHOLD");
    }
}
