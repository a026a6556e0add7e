//! Reference-above-current composite sent to the vision model.

use badbits_core::error::{BadbitsError, Result};
use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};

use crate::label::{draw_text, text_width, GLYPH_HEIGHT};

pub const BORDER_WIDTH: u32 = 2;
pub const GAP_HEIGHT: u32 = 50;

const LABEL_X: u32 = 10;

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const BLACK: Rgb<u8> = Rgb([0, 0, 0]);

pub const REFERENCE_LABEL: &str = "REFERENCE";
pub const CURRENT_LABEL: &str = "CURRENT";

// ── ComparisonImageBuilder ────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ComparisonImageBuilder {
    border: u32,
    gap: u32,
    label_scale: u32,
}

impl Default for ComparisonImageBuilder {
    fn default() -> Self {
        Self {
            border: BORDER_WIDTH,
            gap: GAP_HEIGHT,
            label_scale: 2,
        }
    }
}

impl ComparisonImageBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Size of the composite for frames normalised to `width` × `height`.
    pub fn output_size(&self, width: u32, height: u32) -> (u32, u32) {
        let panel_w = width + 2 * self.border;
        let panel_h = height + 2 * self.border;
        (panel_w, 2 * panel_h + self.gap)
    }

    /// Largest scale up to the configured one at which the longer label
    /// fits across `canvas_w`. Never below 1.
    pub fn label_scale_for(&self, canvas_w: u32) -> u32 {
        (1..=self.label_scale)
            .rev()
            .find(|&s| LABEL_X + text_width(REFERENCE_LABEL, s) <= canvas_w)
            .unwrap_or(1)
    }

    /// Stack `reference` above `current`.
    ///
    /// Both frames are resized to the larger of the two widths and heights,
    /// framed with a black border, and separated by a white labelled gap.
    pub fn build(&self, reference: &RgbImage, current: &RgbImage) -> Result<RgbImage> {
        for (name, img) in [("reference", reference), ("current", current)] {
            if img.width() == 0 || img.height() == 0 {
                return Err(BadbitsError::Image(format!("{name} frame is empty")));
            }
        }

        let width = reference.width().max(current.width());
        let height = reference.height().max(current.height());
        let (canvas_w, canvas_h) = self.output_size(width, height);
        let mut canvas = RgbImage::from_pixel(canvas_w, canvas_h, WHITE);

        let panel_h = height + 2 * self.border;
        self.paste_framed(&mut canvas, &fit(reference, width, height), 0);
        self.paste_framed(&mut canvas, &fit(current, width, height), panel_h + self.gap);

        let scale = self.label_scale_for(canvas_w);
        let label_h = GLYPH_HEIGHT * scale;
        let margin = self.gap.saturating_sub(2 * label_h) / 3;
        draw_text(
            &mut canvas,
            REFERENCE_LABEL,
            LABEL_X,
            panel_h + margin,
            scale,
            BLACK,
        );
        draw_text(
            &mut canvas,
            CURRENT_LABEL,
            LABEL_X,
            panel_h + self.gap - margin - label_h,
            scale,
            BLACK,
        );

        Ok(canvas)
    }

    fn paste_framed(&self, canvas: &mut RgbImage, frame: &RgbImage, top: u32) {
        let panel_w = frame.width() + 2 * self.border;
        let panel_h = frame.height() + 2 * self.border;
        let panel = RgbImage::from_pixel(panel_w, panel_h, BLACK);
        imageops::replace(canvas, &panel, 0, top as i64);
        imageops::replace(
            canvas,
            frame,
            self.border as i64,
            (top + self.border) as i64,
        );
    }
}

fn fit(img: &RgbImage, width: u32, height: u32) -> RgbImage {
    if img.dimensions() == (width, height) {
        img.clone()
    } else {
        imageops::resize(img, width, height, FilterType::Triangle)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
