//! Intensity histograms of lamp regions.
//!
//! Each region is smoothed with a Gaussian kernel, reduced to luma and binned
//! over `[0, 255)`. The references were produced the same way, so every step
//! here has to match them: changing the blur or the luma weights shifts every
//! score.
use image::{GrayImage, Luma, Rgb, RgbImage};

use crate::config::BlurConfig;
use crate::error::ReferenceError;

/// Ordered bin counts. Counts are not normalised by region size.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    bins: Vec<f64>,
}

impl Histogram {
    pub fn zeros(nbins: usize) -> Self {
        Self {
            bins: vec![0.0; nbins],
        }
    }

    /// Wrap externally produced counts, rejecting negative or non-finite bins.
    pub fn from_bins(bins: Vec<f64>) -> Result<Self, ReferenceError> {
        if let Some((index, value)) = bins
            .iter()
            .enumerate()
            .find(|(_, v)| !v.is_finite() || **v < 0.0)
        {
            return Err(ReferenceError::InvalidBin {
                index,
                value: *value,
            });
        }
        Ok(Self { bins })
    }

    pub fn bins(&self) -> &[f64] {
        &self.bins
    }

    pub fn len(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    pub fn total(&self) -> f64 {
        self.bins.iter().sum()
    }
}

/// Builds histograms with a fixed blur and bin count.
#[derive(Debug, Clone)]
pub struct HistogramEngine {
    nbins: usize,
    kernel: Vec<f64>,
}

impl HistogramEngine {
    pub fn new(nbins: usize, blur: BlurConfig) -> Self {
        Self {
            nbins,
            kernel: gaussian_kernel(blur.kernel_size as usize, blur.effective_sigma()),
        }
    }

    pub fn nbins(&self) -> usize {
        self.nbins
    }

    /// Blur, convert to luma and bin one region.
    pub fn compute(&self, region: &RgbImage) -> Histogram {
        let smoothed = gaussian_blur(region, &self.kernel);
        let gray = to_luma(&smoothed);
        intensity_histogram(&gray, self.nbins)
    }
}

/// Normalised 1D Gaussian weights, centre at `size / 2`.
pub fn gaussian_kernel(size: usize, sigma: f64) -> Vec<f64> {
    let size = size.max(1);
    let center = (size / 2) as f64;
    let scale = -0.5 / (sigma * sigma);
    let mut kernel: Vec<f64> = (0..size)
        .map(|i| {
            let d = i as f64 - center;
            (scale * d * d).exp()
        })
        .collect();
    let sum: f64 = kernel.iter().sum();
    for w in &mut kernel {
        *w /= sum;
    }
    kernel
}

/// Mirror an out-of-range index back into `0..len` without repeating the
/// edge pixel (`gfedcb|abcdefgh|gfedcba`).
fn reflect_101(index: i64, len: i64) -> usize {
    if len == 1 {
        return 0;
    }
    let mut i = index;
    loop {
        if i < 0 {
            i = -i;
        } else if i >= len {
            i = 2 * len - 2 - i;
        } else {
            return i as usize;
        }
    }
}

/// Separable Gaussian blur of an RGB region. Borders mirror inside the region
/// itself, never the surrounding frame.
pub fn gaussian_blur(image: &RgbImage, kernel: &[f64]) -> RgbImage {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return image.clone();
    }
    let radius = (kernel.len() / 2) as i64;
    let (w, h) = (width as i64, height as i64);

    // horizontal pass keeps full precision
    let mut rows = vec![[0f64; 3]; (width * height) as usize];
    for y in 0..height {
        for x in 0..w {
            let mut acc = [0f64; 3];
            for (k, weight) in kernel.iter().enumerate() {
                let sx = reflect_101(x + k as i64 - radius, w);
                let p = image.get_pixel(sx as u32, y);
                for c in 0..3 {
                    acc[c] += weight * p[c] as f64;
                }
            }
            rows[(y as usize) * width as usize + x as usize] = acc;
        }
    }

    let mut out = RgbImage::new(width, height);
    for y in 0..h {
        for x in 0..width {
            let mut acc = [0f64; 3];
            for (k, weight) in kernel.iter().enumerate() {
                let sy = reflect_101(y + k as i64 - radius, h);
                let p = rows[sy * width as usize + x as usize];
                for c in 0..3 {
                    acc[c] += weight * p[c];
                }
            }
            out.put_pixel(x, y as u32, Rgb(acc.map(saturate_u8)));
        }
    }
    out
}

fn saturate_u8(v: f64) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

/// BT.601 luma in 14-bit fixed point with rounding.
pub fn luma(r: u8, g: u8, b: u8) -> u8 {
    const R: u32 = 4899; // 0.299 * 2^14
    const G: u32 = 9617; // 0.587 * 2^14
    const B: u32 = 1868; // 0.114 * 2^14
    ((r as u32 * R + g as u32 * G + b as u32 * B + (1 << 13)) >> 14) as u8
}

pub fn to_luma(image: &RgbImage) -> GrayImage {
    let (width, height) = image.dimensions();
    GrayImage::from_fn(width, height, |x, y| {
        let [r, g, b] = image.get_pixel(x, y).0;
        Luma([luma(r, g, b)])
    })
}

/// Uniform bins over `[0, 255)`. A value of 255 maps to bin `nbins`, which is
/// outside the range and therefore not counted.
pub fn intensity_histogram(gray: &GrayImage, nbins: usize) -> Histogram {
    let mut histogram = Histogram::zeros(nbins);
    let scale = nbins as f64 / 255.0;
    let mut lut = [None; 256];
    for (value, slot) in lut.iter_mut().enumerate() {
        let bin = (value as f64 * scale).floor() as usize;
        if bin < nbins {
            *slot = Some(bin);
        }
    }

    for pixel in gray.pixels() {
        if let Some(bin) = lut[pixel[0] as usize] {
            histogram.bins[bin] += 1.0;
        }
    }
    histogram
}
