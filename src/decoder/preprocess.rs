//! Grayscale pixel buffer and the preprocessing transforms the decode
//! cascade applies to it. All transforms return a fresh buffer; the base
//! image is never mutated.

/// Flat row-major grayscale image, 0 = black, 255 = white.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrayBuffer {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl GrayBuffer {
    /// Returns `None` when the buffer length does not match the dimensions
    /// or the pixel count overflows.
    pub fn new(width: usize, height: usize, data: Vec<u8>) -> Option<Self> {
        let expected = width.checked_mul(height)?;
        if data.len() != expected {
            return None;
        }
        Some(Self {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixel(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.width + x]
    }

    pub fn row(&self, y: usize) -> &[u8] {
        &self.data[y * self.width..(y + 1) * self.width]
    }

    /// Separable 5x5 Gaussian smoothing with the 1-4-6-4-1 kernel, edge
    /// pixels clamped. One pass approximates sigma auto-derived from the
    /// kernel size.
    pub fn gaussian_blur(&self) -> Self {
        let (w, h) = (self.width, self.height);
        let mut horizontal = vec![0u8; w * h];
        let mut out = vec![0u8; w * h];

        for y in 0..h {
            for x in 0..w {
                let idx = y * w + x;
                let center = self.data[idx];
                let l1 = if x >= 1 { self.data[idx - 1] } else { center };
                let l2 = if x >= 2 { self.data[idx - 2] } else { center };
                let r1 = if x + 1 < w { self.data[idx + 1] } else { center };
                let r2 = if x + 2 < w { self.data[idx + 2] } else { center };
                let sum = 6 * u32::from(center)
                    + 4 * (u32::from(l1) + u32::from(r1))
                    + u32::from(l2)
                    + u32::from(r2);
                horizontal[idx] = (sum >> 4) as u8;
            }
        }

        for y in 0..h {
            for x in 0..w {
                let idx = y * w + x;
                let center = horizontal[idx];
                let u1 = if y >= 1 { horizontal[idx - w] } else { center };
                let u2 = if y >= 2 {
                    horizontal[idx - 2 * w]
                } else {
                    center
                };
                let d1 = if y + 1 < h { horizontal[idx + w] } else { center };
                let d2 = if y + 2 < h {
                    horizontal[idx + 2 * w]
                } else {
                    center
                };
                let sum = 6 * u32::from(center)
                    + 4 * (u32::from(u1) + u32::from(d1))
                    + u32::from(u2)
                    + u32::from(d2);
                out[idx] = (sum >> 4) as u8;
            }
        }

        Self {
            width: w,
            height: h,
            data: out,
        }
    }

    /// Global bimodal binarization at the Otsu threshold: at-or-below -> 0,
    /// above -> 255.
    pub fn otsu_binarize(&self) -> Self {
        let threshold = otsu_threshold(&self.data);
        let data = self
            .data
            .iter()
            .map(|&p| if p <= threshold { 0 } else { 255 })
            .collect();
        Self {
            width: self.width,
            height: self.height,
            data,
        }
    }

    /// Morphological closing (dilation then erosion) with a 3x3 square
    /// structuring element. Fills pinhole gaps in bars and modules.
    pub fn close(&self) -> Self {
        self.morph(1, true).morph(1, false)
    }

    /// Grayscale dilation (`max` over the window) or erosion (`min`).
    fn morph(&self, radius: usize, dilate: bool) -> Self {
        let (w, h) = (self.width, self.height);
        let mut out = vec![0u8; w * h];
        for y in 0..h {
            for x in 0..w {
                let mut value = if dilate { 0u8 } else { 255u8 };
                for ny in y.saturating_sub(radius)..=(y + radius).min(h - 1) {
                    for nx in x.saturating_sub(radius)..=(x + radius).min(w - 1) {
                        let p = self.data[ny * w + nx];
                        value = if dilate { value.max(p) } else { value.min(p) };
                    }
                }
                out[y * w + x] = value;
            }
        }
        Self {
            width: w,
            height: h,
            data: out,
        }
    }
}

/// Otsu's threshold: the global split that maximizes between-class variance
/// of the histogram. Well suited to bimodal label photos.
fn otsu_threshold(pixels: &[u8]) -> u8 {
    let mut histogram = [0u32; 256];
    for &p in pixels {
        histogram[p as usize] += 1;
    }

    let total = pixels.len() as f64;
    let mut weighted_sum = 0.0f64;
    for (level, &count) in histogram.iter().enumerate() {
        weighted_sum += level as f64 * f64::from(count);
    }

    let mut best_threshold = 0u8;
    let mut best_variance = 0.0f64;
    let mut background_weight = 0.0f64;
    let mut background_sum = 0.0f64;

    for level in 0..256 {
        background_weight += f64::from(histogram[level]);
        if background_weight == 0.0 {
            continue;
        }
        let foreground_weight = total - background_weight;
        if foreground_weight == 0.0 {
            break;
        }

        background_sum += level as f64 * f64::from(histogram[level]);
        let background_mean = background_sum / background_weight;
        let foreground_mean = (weighted_sum - background_sum) / foreground_weight;
        let separation = background_weight
            * foreground_weight
            * (background_mean - foreground_mean)
            * (background_mean - foreground_mean);
        if separation > best_variance {
            best_variance = separation;
            best_threshold = level as u8;
        }
    }

    best_threshold
}
