//! Slide layout module
//!
//! Computes where a cropped page image lands on the slide canvas. The
//! canvas is the fixed usable region below a reserved title band; the image
//! is scaled to fit it with its aspect ratio preserved and centered on both
//! axes. All lengths are in EMU (914400 per inch), the native unit of the
//! deck writer.

// ============================================================
// Constants
// ============================================================

/// English Metric Units per inch
pub const EMU_PER_INCH: f64 = 914_400.0;

/// Default usable canvas width (10 in)
const DEFAULT_CANVAS_WIDTH: f64 = 10.0 * EMU_PER_INCH;

/// Default usable canvas height (6 in, below the title band)
const DEFAULT_CANVAS_HEIGHT: f64 = 6.0 * EMU_PER_INCH;

/// Default title band reserved at the top of the slide (1 in)
const DEFAULT_TITLE_BAND: f64 = 1.0 * EMU_PER_INCH;

// ============================================================
// Types
// ============================================================

/// Fixed-size slide canvas with a reserved title band
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlideCanvas {
    /// Usable width in EMU
    pub width: f64,
    /// Usable height in EMU, excluding the title band
    pub height: f64,
    /// Title band height in EMU, reserved above the canvas
    pub title_band: f64,
}

impl Default for SlideCanvas {
    fn default() -> Self {
        Self {
            width: DEFAULT_CANVAS_WIDTH,
            height: DEFAULT_CANVAS_HEIGHT,
            title_band: DEFAULT_TITLE_BAND,
        }
    }
}

impl SlideCanvas {
    /// Canvas from inch measurements
    pub fn from_inches(width: f64, height: f64, title_band: f64) -> Self {
        Self {
            width: width * EMU_PER_INCH,
            height: height * EMU_PER_INCH,
            title_band: title_band * EMU_PER_INCH,
        }
    }

    /// Canvas aspect ratio (width / height)
    pub fn ratio(&self) -> f64 {
        self.width / self.height
    }
}

/// Placement of a source image on the slide, in EMU
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlideGeometry {
    /// Scale factor from source pixels to EMU
    pub scale: f64,
    /// Left edge of the rendered image
    pub offset_x: f64,
    /// Top edge of the rendered image, including the title band shift
    pub offset_y: f64,
    /// Rendered width
    pub width: f64,
    /// Rendered height
    pub height: f64,
}

// ============================================================
// Compositor
// ============================================================

/// Aspect-ratio-preserving layout compositor
pub struct LayoutCompositor;

impl LayoutCompositor {
    /// Place a source image of the given pixel dimensions on the canvas
    ///
    /// Wide images fit to the canvas width, tall images to its height; the
    /// result is centered with the vertical center shifted below the title
    /// band. Deterministic; zero-sized sources place as a zero-sized
    /// rectangle instead of dividing by zero.
    pub fn place(source_width: u32, source_height: u32, canvas: &SlideCanvas) -> SlideGeometry {
        if source_width == 0 || source_height == 0 {
            return SlideGeometry {
                scale: 1.0,
                offset_x: canvas.width / 2.0,
                offset_y: canvas.height / 2.0 + canvas.title_band,
                width: 0.0,
                height: 0.0,
            };
        }

        let image_ratio = source_width as f64 / source_height as f64;

        let (width, height) = if image_ratio > canvas.ratio() {
            (canvas.width, canvas.width / image_ratio)
        } else {
            (canvas.height * image_ratio, canvas.height)
        };

        SlideGeometry {
            scale: width / source_width as f64,
            offset_x: (canvas.width - width) / 2.0,
            offset_y: (canvas.height - height) / 2.0 + canvas.title_band,
            width,
            height,
        }
    }
}

// ============================================================
// Tests
// ============================================================
