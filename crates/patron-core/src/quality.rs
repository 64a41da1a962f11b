//! Quality gate — blur/brightness/contrast screening for face crops.
//!
//! A crop must pass all three checks before it may contribute to the
//! stability buffer or an enrollment prototype. The gate is a pure
//! predicate; rejections are normal negative signals, not errors.

use crate::config::QualityConfig;
use crate::frame::FaceCrop;

/// Raw scores behind a gate decision, surfaced for diagnostics.
#[derive(Debug, Clone, Copy)]
pub struct QualityReport {
    /// Variance of the Laplacian — higher is sharper.
    pub sharpness: f32,
    /// Mean pixel brightness (0–255).
    pub brightness: f32,
    /// Brightness standard deviation — higher is more contrast.
    pub contrast: f32,
}

/// Blur/brightness/contrast gate with fixed floors and bands.
#[derive(Debug, Clone)]
pub struct QualityGate {
    cfg: QualityConfig,
}

impl QualityGate {
    pub fn new(cfg: QualityConfig) -> Self {
        Self { cfg }
    }

    /// Score a crop without deciding.
    pub fn report(&self, crop: &FaceCrop) -> QualityReport {
        QualityReport {
            sharpness: crop.laplacian_variance(),
            brightness: crop.mean_brightness(),
            contrast: crop.brightness_stddev(),
        }
    }

    /// True when the crop is sharp, reasonably lit and has contrast.
    pub fn accepts(&self, crop: &FaceCrop) -> bool {
        if crop.is_empty() {
            return false;
        }
        let r = self.report(crop);
        self.passes(&r)
    }

    /// Decide from an already-computed report.
    pub fn passes(&self, report: &QualityReport) -> bool {
        if report.sharpness < self.cfg.min_sharpness {
            return false;
        }
        if report.brightness < self.cfg.min_brightness || report.brightness > self.cfg.max_brightness
        {
            return false;
        }
        if report.contrast < self.cfg.min_contrast {
            return false;
        }
        true
    }
}

impl Default for QualityGate {
    fn default() -> Self {
        Self::new(QualityConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate() -> QualityGate {
        QualityGate::default()
    }

    /// A sharp, mid-brightness checkerboard-ish crop that passes everything.
    fn good_crop() -> FaceCrop {
        let data: Vec<u8> = (0..400)
            .map(|i| if (i / 20 + i % 20) % 2 == 0 { 60 } else { 200 })
            .collect();
        FaceCrop { data, width: 20, height: 20 }
    }

    #[test]
    fn test_good_crop_accepted() {
        assert!(gate().accepts(&good_crop()));
    }

    #[test]
    fn test_flat_crop_rejected() {
        // Uniform gray: zero sharpness, zero contrast.
        let crop = FaceCrop { data: vec![128; 400], width: 20, height: 20 };
        assert!(!gate().accepts(&crop));
    }

    #[test]
    fn test_dark_crop_rejected() {
        // Alternating 0/30: sharp enough, but mean brightness 15 < 40.
        let data: Vec<u8> = (0..400)
            .map(|i| if (i / 20 + i % 20) % 2 == 0 { 0 } else { 30 })
            .collect();
        let crop = FaceCrop { data, width: 20, height: 20 };
        let r = gate().report(&crop);
        assert!(r.brightness < 40.0);
        assert!(!gate().accepts(&crop));
    }

    #[test]
    fn test_overexposed_crop_rejected() {
        let mut report = gate().report(&good_crop());
        report.brightness = 252.0;
        assert!(!gate().passes(&report));
    }

    #[test]
    fn test_low_contrast_rejected() {
        let mut report = gate().report(&good_crop());
        report.contrast = 10.0;
        assert!(!gate().passes(&report));
    }

    #[test]
    fn test_blurry_rejected() {
        let mut report = gate().report(&good_crop());
        report.sharpness = 50.0;
        assert!(!gate().passes(&report));
    }

    #[test]
    fn test_empty_crop_rejected() {
        let crop = FaceCrop { data: vec![], width: 0, height: 0 };
        assert!(!gate().accepts(&crop));
    }

    #[test]
    fn test_boundary_values_pass() {
        let report = QualityReport { sharpness: 100.0, brightness: 40.0, contrast: 20.0 };
        assert!(gate().passes(&report));
        let report = QualityReport { sharpness: 100.0, brightness: 250.0, contrast: 20.0 };
        assert!(gate().passes(&report));
    }
}
