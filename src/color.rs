use eframe::egui::Color32;
use palette::{LinSrgb, Mix, Srgb};

// ---------------------------------------------------------------------------
// Sequential colormap ("magma")
// ---------------------------------------------------------------------------

/// Magma control points as (position, sRGB). Positions are the evenly
/// spaced samples of 6, 7, 9 and 10-colour magma palettes merged together,
/// which puts a stop at least every 1/9 of the range.
const MAGMA_STOPS: [(f32, [u8; 3]); 22] = [
    (0.0, [0x00, 0x00, 0x04]),
    (1.0 / 9.0, [0x18, 0x0f, 0x3e]),
    (1.0 / 8.0, [0x1d, 0x11, 0x47]),
    (1.0 / 6.0, [0x2d, 0x11, 0x60]),
    (1.0 / 5.0, [0x3b, 0x0f, 0x70]),
    (2.0 / 9.0, [0x45, 0x10, 0x77]),
    (2.0 / 8.0, [0x51, 0x12, 0x7c]),
    (2.0 / 6.0, [0x72, 0x1f, 0x81]),
    (3.0 / 8.0, [0x82, 0x26, 0x81]),
    (2.0 / 5.0, [0x8c, 0x29, 0x81]),
    (4.0 / 9.0, [0x9f, 0x2f, 0x7f]),
    (3.0 / 6.0, [0xb6, 0x36, 0x79]),
    (5.0 / 9.0, [0xcd, 0x40, 0x71]),
    (3.0 / 5.0, [0xde, 0x49, 0x68]),
    (5.0 / 8.0, [0xe6, 0x51, 0x64]),
    (4.0 / 6.0, [0xf1, 0x60, 0x5d]),
    (6.0 / 8.0, [0xfb, 0x88, 0x61]),
    (7.0 / 9.0, [0xfd, 0x95, 0x67]),
    (4.0 / 5.0, [0xfe, 0x9f, 0x6d]),
    (5.0 / 6.0, [0xfe, 0xaf, 0x77]),
    (7.0 / 8.0, [0xfe, 0xc2, 0x87]),
    (8.0 / 9.0, [0xfe, 0xc9, 0x8d]),
];
const MAGMA_END: [u8; 3] = [0xfc, 0xfd, 0xbf];

/// Entries in the reference magma lookup table.
const LUT_SIZE: f32 = 256.0;

fn linear(rgb: [u8; 3]) -> LinSrgb {
    Srgb::new(rgb[0], rgb[1], rgb[2]).into_format::<f32>().into_linear()
}

/// Sample the colormap at `t ∈ [0, 1]` (clamped).
///
/// `t` is first snapped to one of 256 entries the way a lookup table is
/// indexed, then interpolated between the surrounding stops in linear sRGB.
pub fn magma(t: f32) -> Color32 {
    let t = (t.clamp(0.0, 1.0) * LUT_SIZE).floor().min(LUT_SIZE - 1.0) / (LUT_SIZE - 1.0);

    let upper = MAGMA_STOPS
        .iter()
        .position(|&(pos, _)| pos > t)
        .unwrap_or(MAGMA_STOPS.len());
    let (lo_pos, lo) = MAGMA_STOPS[upper - 1];
    let (hi_pos, hi) = MAGMA_STOPS.get(upper).copied().unwrap_or((1.0, MAGMA_END));
    let frac = ((t - lo_pos) / (hi_pos - lo_pos)).clamp(0.0, 1.0);

    let mixed = linear(lo).mix(linear(hi), frac);
    let rgb: Srgb = Srgb::from_linear(mixed);
    let rgb: Srgb<u8> = rgb.into_format();
    Color32::from_rgb(rgb.red, rgb.green, rgb.blue)
}

/// `n` colours sampled at evenly spaced positions across `[0, 1]`,
/// both ends included. Trace `i` always gets colour `i`.
pub fn gradient(n: usize) -> Vec<Color32> {
    match n {
        0 => Vec::new(),
        1 => vec![magma(0.0)],
        _ => (0..n)
            .map(|i| magma(i as f32 / (n - 1) as f32))
            .collect(),
    }
}
