//! Synthesized placeholder raster for image slots without a usable source.

use crate::template::PlaceholderKind;
use image::{Rgba, RgbaImage};

const BACKGROUND: Rgba<u8> = Rgba([243, 244, 246, 255]);
const FRAME: Rgba<u8> = Rgba([209, 213, 219, 255]);
const ICON: Rgba<u8> = Rgba([156, 163, 175, 255]);

/// Draw a light frame with a mountain-and-sun icon and a label bar whose
/// length depends on the slot kind.
pub fn placeholder_art(width: u32, height: u32, kind: PlaceholderKind) -> RgbaImage {
    let width = width.max(1);
    let height = height.max(1);
    let (w, h) = (width as f64, height as f64);
    let frame = (w.min(h) * 0.02).max(1.0);

    // Icon box occupies the middle of the art, above the label.
    let icon = w.min(h) * 0.4;
    let icon_x = (w - icon) / 2.0;
    let icon_y = (h - icon) / 2.0 - h * 0.08;

    let sun_center = (icon_x + icon * 0.72, icon_y + icon * 0.28);
    let sun_radius = icon * 0.12;

    let label_chars = kind.label().len() as f64 + 10.0;
    let label_w = (label_chars * icon * 0.06).min(w * 0.8);
    let label_h = (icon * 0.08).max(1.0);
    let label_x = (w - label_w) / 2.0;
    let label_y = icon_y + icon + h * 0.06;

    RgbaImage::from_fn(width, height, |px, py| {
        let (x, y) = (px as f64 + 0.5, py as f64 + 0.5);

        if x < frame || y < frame || x > w - frame || y > h - frame {
            return FRAME;
        }

        let (dx, dy) = (x - sun_center.0, y - sun_center.1);
        if dx * dx + dy * dy <= sun_radius * sun_radius {
            return ICON;
        }

        // Mountain: a triangle rising from the bottom of the icon box.
        let local_x = (x - icon_x) / icon;
        let local_y = (y - icon_y) / icon;
        if (0.0..=1.0).contains(&local_x) && (0.45..=1.0).contains(&local_y) {
            let peak = 0.45 + (local_x - 0.4).abs() * 1.1;
            if local_y >= peak {
                return ICON;
            }
        }

        if x >= label_x && x <= label_x + label_w && y >= label_y && y <= label_y + label_h {
            return ICON;
        }

        BACKGROUND
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_art_dimensions_and_frame() {
        let art = placeholder_art(120, 80, PlaceholderKind::Image);
        assert_eq!(art.dimensions(), (120, 80));
        assert_eq!(*art.get_pixel(0, 0), FRAME);
        assert_eq!(*art.get_pixel(60, 2), BACKGROUND);
    }

    #[test]
    fn test_art_draws_icon() {
        let art = placeholder_art(200, 200, PlaceholderKind::Logo);
        assert!(art.pixels().any(|p| *p == ICON));
    }

    #[test]
    fn test_zero_size_is_clamped() {
        let art = placeholder_art(0, 0, PlaceholderKind::Icon);
        assert_eq!(art.dimensions(), (1, 1));
    }
}
