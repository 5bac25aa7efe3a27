//! Content band detection module
//!
//! Locates the vertical pixel range holding the data table of a scanned
//! report page. Lab report pages from the supported template carry a fixed
//! header and footer chrome; between them the data block is framed by solid
//! horizontal separator lines that are mostly ink.
//!
//! # Algorithm
//!
//! 1. Trim the fixed template chrome (top 16%, bottom 5% of the page height
//!    by default).
//! 2. Scan rows top-down; the first row whose dark-pixel fraction exceeds
//!    the row threshold is the upper separator.
//! 3. Scan rows bottom-up with the same threshold to find the lower
//!    separator, then continue upward from a few rows above it to the first
//!    row that is not pure white, recovering the true lower content edge.
//! 4. Cropping pulls each detected bound inward by a small safety inset to
//!    avoid anti-aliasing fringes on the separator edges.
//!
//! Detection never fails: a side without a qualifying row keeps the image
//! edge as its bound and receives no inset, so the worst case is "no crop".

use image::{DynamicImage, GenericImageView, GrayImage};

// ============================================================
// Constants
// ============================================================

/// Default darkness threshold (153/255, pixels below count as ink)
const DEFAULT_DARKNESS_THRESHOLD: u8 = 153;

/// Default fraction of dark pixels a row needs to count as a separator
const DEFAULT_ROW_DARK_FRACTION: f32 = 0.6;

/// Default template trim from the top of the page
const DEFAULT_TOP_TRIM_PERCENT: f32 = 0.16;

/// Default template trim from the bottom of the page
const DEFAULT_BOTTOM_TRIM_PERCENT: f32 = 0.05;

/// Rows skipped above the lower separator before the non-white scan
const DEFAULT_BORDER_SKIP: u32 = 3;

/// Safety inset applied to each detected bound when cropping
const DEFAULT_SAFETY_INSET: u32 = 2;

/// Maximum pixel intensity (pure white)
const WHITE: u8 = u8::MAX;

// ============================================================
// Options
// ============================================================

/// Content band detection options
#[derive(Debug, Clone)]
pub struct BoundaryOptions {
    /// Pixel intensity below which a pixel counts as dark (0-255)
    pub darkness_threshold: u8,
    /// Fraction of dark pixels a row needs to qualify as a separator
    pub row_dark_fraction: f32,
    /// Fraction of the page height trimmed from the top before detection
    pub top_trim_percent: f32,
    /// Fraction of the page height trimmed from the bottom before detection
    pub bottom_trim_percent: f32,
    /// Rows skipped above the lower separator before the non-white scan
    pub border_skip: u32,
    /// Safety inset in pixels applied per detected bound when cropping
    pub safety_inset: u32,
}

impl Default for BoundaryOptions {
    fn default() -> Self {
        Self {
            darkness_threshold: DEFAULT_DARKNESS_THRESHOLD,
            row_dark_fraction: DEFAULT_ROW_DARK_FRACTION,
            top_trim_percent: DEFAULT_TOP_TRIM_PERCENT,
            bottom_trim_percent: DEFAULT_BOTTOM_TRIM_PERCENT,
            border_skip: DEFAULT_BORDER_SKIP,
            safety_inset: DEFAULT_SAFETY_INSET,
        }
    }
}

impl BoundaryOptions {
    /// Create a new options builder
    pub fn builder() -> BoundaryOptionsBuilder {
        BoundaryOptionsBuilder::default()
    }

    /// Create options without the fixed template trim
    ///
    /// Useful when the caller already isolated the region of interest.
    pub fn untrimmed() -> Self {
        Self {
            top_trim_percent: 0.0,
            bottom_trim_percent: 0.0,
            ..Default::default()
        }
    }
}

/// Builder for BoundaryOptions
#[derive(Debug, Default)]
pub struct BoundaryOptionsBuilder {
    options: BoundaryOptions,
}

impl BoundaryOptionsBuilder {
    /// Set darkness threshold (0-255)
    #[must_use]
    pub fn darkness_threshold(mut self, threshold: u8) -> Self {
        self.options.darkness_threshold = threshold;
        self
    }

    /// Set the separator row dark fraction (clamped to 0.0-1.0)
    #[must_use]
    pub fn row_dark_fraction(mut self, fraction: f32) -> Self {
        self.options.row_dark_fraction = fraction.clamp(0.0, 1.0);
        self
    }

    /// Set the top template trim (clamped to 0.0-1.0)
    #[must_use]
    pub fn top_trim_percent(mut self, percent: f32) -> Self {
        self.options.top_trim_percent = percent.clamp(0.0, 1.0);
        self
    }

    /// Set the bottom template trim (clamped to 0.0-1.0)
    #[must_use]
    pub fn bottom_trim_percent(mut self, percent: f32) -> Self {
        self.options.bottom_trim_percent = percent.clamp(0.0, 1.0);
        self
    }

    /// Set the border skip distance in rows
    #[must_use]
    pub fn border_skip(mut self, rows: u32) -> Self {
        self.options.border_skip = rows;
        self
    }

    /// Set the safety inset in pixels
    #[must_use]
    pub fn safety_inset(mut self, pixels: u32) -> Self {
        self.options.safety_inset = pixels;
        self
    }

    /// Build the options
    #[must_use]
    pub fn build(self) -> BoundaryOptions {
        self.options
    }
}

// ============================================================
// Result types
// ============================================================

/// Detected vertical bounds of the content band
///
/// Both bounds are row indices into the template-trimmed image. `top` is the
/// first separator row; `bottom` is the exclusive end of the content band.
/// A side that produced no qualifying row keeps the image edge as its bound
/// and is marked undetected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BandBounds {
    /// First row of the upper separator (0 when undetected)
    pub top: u32,
    /// Exclusive lower edge of the content band (image height when undetected)
    pub bottom: u32,
    /// Height of the scanned image
    pub height: u32,
    /// Whether the upper separator was found
    pub top_detected: bool,
    /// Whether the lower content edge was found
    pub bottom_detected: bool,
}

impl BandBounds {
    /// Bounds spanning the whole image (no crop)
    pub fn no_crop(height: u32) -> Self {
        Self {
            top: 0,
            bottom: height,
            height,
            top_detected: false,
            bottom_detected: false,
        }
    }

    /// Whether detection left the image untouched on both sides
    pub fn is_no_crop(&self) -> bool {
        !self.top_detected && !self.bottom_detected
    }

    /// Height of the detected band in rows
    pub fn band_height(&self) -> u32 {
        self.bottom.saturating_sub(self.top)
    }

    /// Crop range (top inclusive, bottom exclusive) with the safety inset
    /// applied on each detected side
    ///
    /// Falls back to the full image when the inset range would be empty or
    /// inverted, keeping `top < bottom` in every outcome.
    pub fn crop_range(&self, safety_inset: u32) -> (u32, u32) {
        let top = if self.top_detected {
            self.top.saturating_add(safety_inset)
        } else {
            0
        };
        let bottom = if self.bottom_detected {
            self.bottom.saturating_sub(safety_inset)
        } else {
            self.bottom
        };

        if top >= bottom {
            (0, self.height)
        } else {
            (top, bottom)
        }
    }
}

// ============================================================
// Detector
// ============================================================

/// Row-scan content band detector
pub struct ContentBandDetector;

impl ContentBandDetector {
    /// Vertical range kept by the fixed template trim, as (start, end) rows
    pub fn template_trim_range(height: u32, options: &BoundaryOptions) -> (u32, u32) {
        let start = (height as f32 * options.top_trim_percent) as u32;
        let end = (height as f32 * (1.0 - options.bottom_trim_percent)) as u32;
        (start.min(height), end.min(height))
    }

    /// Detect the content band in an already template-trimmed grayscale image
    ///
    /// Streams over the raw pixel buffer row by row; the source image is only
    /// read. Never fails: missing separators degrade to the image edges.
    pub fn detect(gray: &GrayImage, options: &BoundaryOptions) -> BandBounds {
        let (width, height) = gray.dimensions();
        if width == 0 || height == 0 {
            return BandBounds::no_crop(height);
        }

        let raw = gray.as_raw();
        let stride = width as usize;
        let row = |y: u32| &raw[y as usize * stride..(y as usize + 1) * stride];

        let mut bounds = BandBounds::no_crop(height);

        for y in 0..height {
            if Self::dark_fraction(row(y), options.darkness_threshold) > options.row_dark_fraction
            {
                bounds.top = y;
                bounds.top_detected = true;
                break;
            }
        }

        for y in (0..height).rev() {
            if Self::dark_fraction(row(y), options.darkness_threshold) > options.row_dark_fraction
            {
                // Recover the true content edge above the separator itself.
                let mut edge = y.saturating_sub(options.border_skip);
                for candidate in (0..=edge).rev() {
                    if row(candidate).iter().any(|&p| p < WHITE) {
                        edge = candidate;
                        break;
                    }
                }
                bounds.bottom = edge;
                bounds.bottom_detected = true;
                break;
            }
        }

        bounds
    }

    /// Crop the content band out of a full page image
    ///
    /// Applies the fixed template trim, detects the band on a grayscale
    /// derivative, and returns a full-width sub-image with the safety inset
    /// applied. Degenerate inputs come back as the template-trimmed image
    /// (or the page itself when even the trim is empty).
    pub fn crop_page(page: &DynamicImage, options: &BoundaryOptions) -> DynamicImage {
        let (width, height) = page.dimensions();
        let (trim_start, trim_end) = Self::template_trim_range(height, options);
        if width == 0 || trim_end <= trim_start {
            return page.clone();
        }

        let trimmed = page.crop_imm(0, trim_start, width, trim_end - trim_start);
        let gray = trimmed.to_luma8();
        let bounds = Self::detect(&gray, options);
        let (crop_top, crop_bottom) = bounds.crop_range(options.safety_inset);
        if crop_bottom <= crop_top {
            return trimmed;
        }

        trimmed.crop_imm(0, crop_top, width, crop_bottom - crop_top)
    }

    /// Fraction of dark pixels in one row, against the fixed row width
    #[inline]
    fn dark_fraction(row: &[u8], threshold: u8) -> f32 {
        if row.is_empty() {
            return 0.0;
        }
        let dark = row.iter().filter(|&&p| p < threshold).count();
        dark as f32 / row.len() as f32
    }
}

// ============================================================
// Tests
// ============================================================
