use palette::{Hsl, IntoColor, Srgb};
use plotters::style::RGBColor;

// ---------------------------------------------------------------------------
// Fixed chart colours
// ---------------------------------------------------------------------------

pub const WHITE: RGBColor = RGBColor(255, 255, 255);
pub const BLACK: RGBColor = RGBColor(0, 0, 0);
pub const AXIS: RGBColor = RGBColor(60, 60, 60);
pub const GRID: RGBColor = RGBColor(225, 225, 225);
pub const SKY_BLUE: RGBColor = RGBColor(135, 206, 235);
pub const BAR_EDGE: RGBColor = RGBColor(70, 130, 180);
pub const DENSITY_LINE: RGBColor = RGBColor(31, 119, 180);
pub const UNDEFINED_CELL: RGBColor = RGBColor(200, 200, 200);

fn hsl_to_rgb(hue: f32, saturation: f32, lightness: f32) -> RGBColor {
    let rgb: Srgb = Hsl::new(hue, saturation, lightness).into_color();
    RGBColor(
        (rgb.red.clamp(0.0, 1.0) * 255.0).round() as u8,
        (rgb.green.clamp(0.0, 1.0) * 255.0).round() as u8,
        (rgb.blue.clamp(0.0, 1.0) * 255.0).round() as u8,
    )
}

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<RGBColor> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| hsl_to_rgb((i as f32 / n as f32) * 360.0, 0.65, 0.55))
        .collect()
}

// ---------------------------------------------------------------------------
// Diverging scale: value in [-1, 1] → blue · white · red
// ---------------------------------------------------------------------------

const COOL_HUE: f32 = 225.0;
const WARM_HUE: f32 = 5.0;

/// Diverging colour centred at zero. Values are clamped to `[-1, 1]`;
/// NaN maps to a neutral grey.
pub fn diverging(value: f64) -> RGBColor {
    if value.is_nan() {
        return UNDEFINED_CELL;
    }
    let t = value.clamp(-1.0, 1.0) as f32;
    let hue = if t < 0.0 { COOL_HUE } else { WARM_HUE };
    let strength = t.abs();
    hsl_to_rgb(hue, 0.15 + 0.55 * strength, 0.93 - 0.45 * strength)
}

/// Black or white, whichever reads better on `background`.
pub fn text_on(background: RGBColor) -> RGBColor {
    let RGBColor(r, g, b) = background;
    let luma = 0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32;
    if luma > 140.0 {
        BLACK
    } else {
        WHITE
    }
}
