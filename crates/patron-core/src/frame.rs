//! Frame and face-crop types — RGB→luma conversion and ROI cropping.

use image::{GrayImage, RgbImage};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("invalid RGB buffer: expected {expected} bytes for {width}x{height}, got {actual}")]
    InvalidLength {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
}

/// A grayscale camera frame.
///
/// The caller normalizes color order before handing frames in; internally
/// everything operates on luma.
#[derive(Clone)]
pub struct Frame {
    /// Grayscale pixel data (width * height bytes).
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// The fixed center region scanned during acquisition. The person ordering
/// stands directly in front of the kiosk, so acquisition ignores bystanders
/// at the frame edges: x in [w/3, 2w/3), y in [h/4, 3h/4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Roi {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Self {
        Self { data, width, height }
    }

    /// Build a frame from a packed RGB8 buffer (3 bytes per pixel).
    pub fn from_rgb8(rgb: &[u8], width: u32, height: u32) -> Result<Self, FrameError> {
        let expected = (width * height * 3) as usize;
        if rgb.len() != expected {
            return Err(FrameError::InvalidLength {
                width,
                height,
                expected,
                actual: rgb.len(),
            });
        }

        let img = RgbImage::from_raw(width, height, rgb.to_vec()).ok_or(
            FrameError::InvalidLength {
                width,
                height,
                expected,
                actual: rgb.len(),
            },
        )?;
        let gray: GrayImage = image::DynamicImage::ImageRgb8(img).into_luma8();

        Ok(Self {
            data: gray.into_raw(),
            width,
            height,
        })
    }

    /// True when the frame carries no usable pixel data.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.data.len() < (self.width * self.height) as usize
    }

    /// The center acquisition region for this frame.
    pub fn center_roi(&self) -> Roi {
        let x = self.width / 3;
        let y = self.height / 4;
        Roi {
            x,
            y,
            width: 2 * self.width / 3 - x,
            height: 3 * self.height / 4 - y,
        }
    }

    /// Crop a sub-region out of the frame. Out-of-bounds regions are clamped;
    /// a degenerate region yields an empty crop.
    pub fn crop(&self, roi: Roi) -> FaceCrop {
        let x0 = roi.x.min(self.width);
        let y0 = roi.y.min(self.height);
        let x1 = (roi.x + roi.width).min(self.width);
        let y1 = (roi.y + roi.height).min(self.height);

        let w = x1.saturating_sub(x0);
        let h = y1.saturating_sub(y0);
        let mut data = Vec::with_capacity((w * h) as usize);

        for y in y0..y1 {
            let row = (y * self.width + x0) as usize;
            data.extend_from_slice(&self.data[row..row + w as usize]);
        }

        FaceCrop { data, width: w, height: h }
    }
}

/// A grayscale face crop, ephemeral — discarded once quality screening and
/// feature extraction are done.
#[derive(Clone)]
pub struct FaceCrop {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl FaceCrop {
    pub fn is_empty(&self) -> bool {
        self.data.is_empty() || self.width == 0 || self.height == 0
    }

    /// Average pixel brightness (0.0–255.0).
    pub fn mean_brightness(&self) -> f32 {
        if self.data.is_empty() {
            return 0.0;
        }
        self.data.iter().map(|&b| b as f32).sum::<f32>() / self.data.len() as f32
    }

    /// Standard deviation of pixel brightness. Low values mean a flat,
    /// washed-out crop.
    pub fn brightness_stddev(&self) -> f32 {
        if self.data.is_empty() {
            return 0.0;
        }
        let mean = self.mean_brightness();
        let var = self
            .data
            .iter()
            .map(|&b| (b as f32 - mean).powi(2))
            .sum::<f32>()
            / self.data.len() as f32;
        var.sqrt()
    }

    /// Variance of the 4-neighbor Laplacian over interior pixels.
    ///
    /// High variance means crisp edges; low variance means blur or motion
    /// smearing. Crops smaller than 3x3 have no interior and score 0.0.
    pub fn laplacian_variance(&self) -> f32 {
        let w = self.width as usize;
        let h = self.height as usize;
        if w < 3 || h < 3 || self.data.len() < w * h {
            return 0.0;
        }

        let mut responses = Vec::with_capacity((w - 2) * (h - 2));
        for y in 1..h - 1 {
            for x in 1..w - 1 {
                let c = self.data[y * w + x] as f32;
                let up = self.data[(y - 1) * w + x] as f32;
                let down = self.data[(y + 1) * w + x] as f32;
                let left = self.data[y * w + x - 1] as f32;
                let right = self.data[y * w + x + 1] as f32;
                responses.push(up + down + left + right - 4.0 * c);
            }
        }

        let n = responses.len() as f32;
        let mean = responses.iter().sum::<f32>() / n;
        responses.iter().map(|r| (r - mean).powi(2)).sum::<f32>() / n
    }
}
