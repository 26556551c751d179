use image::{
    Rgba,
    RgbaImage,
    RgbImage,
};

/// Distance from the bottom-right corner.
pub const WATERMARK_MARGIN: u32 = 10;
pub const WATERMARK_OPACITY: f32 = 0.85;

const GLYPH_WIDTH: u32 = 5;
const GLYPH_HEIGHT: u32 = 7;
const GLYPH_SPACING: u32 = 1;
const TEXT_SCALE: u32 = 2;

/// Overlay put on the prepared image, usually a callsign.
#[derive(Clone, Debug, PartialEq)]
pub enum Watermark {
    Text(String),
    Mask(RgbaImage),
}

impl Watermark {
    /// Renders the overlay. Returns `None` if there is nothing to draw.
    pub fn render(&self) -> Option<RgbaImage> {
        match self {
            Self::Text(text) => render_text(text),
            Self::Mask(mask) if mask.width() > 0 && mask.height() > 0 => Some(mask.clone()),
            Self::Mask(_) => None,
        }
    }
}

/// Composites the watermark onto the bottom-right corner, clipped to the
/// image.
pub fn apply_watermark(image: &mut RgbImage, watermark: &Watermark) {
    let Some(overlay) = watermark.render()
    else {
        return;
    };

    let left = image.width() as i64 - overlay.width() as i64 - WATERMARK_MARGIN as i64;
    let top = image.height() as i64 - overlay.height() as i64 - WATERMARK_MARGIN as i64;

    for (x, y, Rgba([r, g, b, a])) in overlay.enumerate_pixels() {
        let (tx, ty) = (left + x as i64, top + y as i64);
        if tx < 0 || ty < 0 || tx >= image.width() as i64 || ty >= image.height() as i64 {
            continue;
        }

        let alpha = *a as f32 / 255.0 * WATERMARK_OPACITY;
        if alpha <= 0.0 {
            continue;
        }

        let pixel = image.get_pixel_mut(tx as u32, ty as u32);
        for (dst, src) in pixel.0.iter_mut().zip([r, g, b]) {
            let blended = *dst as f32 * (1.0 - alpha) + *src as f32 * alpha;
            *dst = blended.round().clamp(0.0, 255.0) as u8;
        }
    }
}

fn render_text(text: &str) -> Option<RgbaImage> {
    let text = text.trim();
    let num_glyphs = text.chars().count() as u32;
    if num_glyphs == 0 {
        return None;
    }

    // one pixel of outline on each side
    let width = (num_glyphs * (GLYPH_WIDTH + GLYPH_SPACING) - GLYPH_SPACING) * TEXT_SCALE + 2;
    let height = GLYPH_HEIGHT * TEXT_SCALE + 2;

    let mut covered = vec![false; (width * height) as usize];
    for (i, c) in text.chars().enumerate() {
        let origin = 1 + i as u32 * (GLYPH_WIDTH + GLYPH_SPACING) * TEXT_SCALE;
        for (row, bits) in glyph(c).iter().enumerate() {
            for column in 0..GLYPH_WIDTH {
                if bits & (1 << (GLYPH_WIDTH - 1 - column)) == 0 {
                    continue;
                }
                for dy in 0..TEXT_SCALE {
                    for dx in 0..TEXT_SCALE {
                        let x = origin + column * TEXT_SCALE + dx;
                        let y = 1 + row as u32 * TEXT_SCALE + dy;
                        covered[(y * width + x) as usize] = true;
                    }
                }
            }
        }
    }

    let is_covered = |x: i64, y: i64| {
        x >= 0
            && y >= 0
            && x < width as i64
            && y < height as i64
            && covered[(y as u32 * width + x as u32) as usize]
    };

    Some(RgbaImage::from_fn(width, height, |x, y| {
        let (x, y) = (x as i64, y as i64);
        if is_covered(x, y) {
            Rgba([255, 255, 255, 255])
        }
        else if [(-1, -1), (1, -1), (-1, 1), (1, 1)]
            .into_iter()
            .any(|(dx, dy)| is_covered(x + dx, y + dy))
        {
            Rgba([0, 0, 0, 255])
        }
        else {
            Rgba([0, 0, 0, 0])
        }
    }))
}

/// 5x7 glyph rows, most significant of the low 5 bits is the leftmost
/// column.
fn glyph(c: char) -> &'static [u8; 7] {
    match c.to_ascii_uppercase() {
        'A' => &[0x0e, 0x11, 0x11, 0x1f, 0x11, 0x11, 0x11],
        'B' => &[0x1e, 0x11, 0x11, 0x1e, 0x11, 0x11, 0x1e],
        'C' => &[0x0e, 0x11, 0x10, 0x10, 0x10, 0x11, 0x0e],
        'D' => &[0x1e, 0x11, 0x11, 0x11, 0x11, 0x11, 0x1e],
        'E' => &[0x1f, 0x10, 0x10, 0x1e, 0x10, 0x10, 0x1f],
        'F' => &[0x1f, 0x10, 0x10, 0x1e, 0x10, 0x10, 0x10],
        'G' => &[0x0e, 0x11, 0x10, 0x17, 0x11, 0x11, 0x0f],
        'H' => &[0x11, 0x11, 0x11, 0x1f, 0x11, 0x11, 0x11],
        'I' => &[0x0e, 0x04, 0x04, 0x04, 0x04, 0x04, 0x0e],
        'J' => &[0x07, 0x02, 0x02, 0x02, 0x02, 0x12, 0x0c],
        'K' => &[0x11, 0x12, 0x14, 0x18, 0x14, 0x12, 0x11],
        'L' => &[0x10, 0x10, 0x10, 0x10, 0x10, 0x10, 0x1f],
        'M' => &[0x11, 0x1b, 0x15, 0x15, 0x11, 0x11, 0x11],
        'N' => &[0x11, 0x11, 0x19, 0x15, 0x13, 0x11, 0x11],
        'O' => &[0x0e, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0e],
        'P' => &[0x1e, 0x11, 0x11, 0x1e, 0x10, 0x10, 0x10],
        'Q' => &[0x0e, 0x11, 0x11, 0x11, 0x15, 0x12, 0x0d],
        'R' => &[0x1e, 0x11, 0x11, 0x1e, 0x14, 0x12, 0x11],
        'S' => &[0x0f, 0x10, 0x10, 0x0e, 0x01, 0x01, 0x1e],
        'T' => &[0x1f, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04],
        'U' => &[0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0e],
        'V' => &[0x11, 0x11, 0x11, 0x11, 0x11, 0x0a, 0x04],
        'W' => &[0x11, 0x11, 0x11, 0x15, 0x15, 0x15, 0x0a],
        'X' => &[0x11, 0x11, 0x0a, 0x04, 0x0a, 0x11, 0x11],
        'Y' => &[0x11, 0x11, 0x11, 0x0a, 0x04, 0x04, 0x04],
        'Z' => &[0x1f, 0x01, 0x02, 0x04, 0x08, 0x10, 0x1f],
        '0' => &[0x0e, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0e],
        '1' => &[0x04, 0x0c, 0x04, 0x04, 0x04, 0x04, 0x0e],
        '2' => &[0x0e, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1f],
        '3' => &[0x1f, 0x02, 0x04, 0x02, 0x01, 0x11, 0x0e],
        '4' => &[0x02, 0x06, 0x0a, 0x12, 0x1f, 0x02, 0x02],
        '5' => &[0x1f, 0x10, 0x1e, 0x01, 0x01, 0x11, 0x0e],
        '6' => &[0x06, 0x08, 0x10, 0x1e, 0x11, 0x11, 0x0e],
        '7' => &[0x1f, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08],
        '8' => &[0x0e, 0x11, 0x11, 0x0e, 0x11, 0x11, 0x0e],
        '9' => &[0x0e, 0x11, 0x11, 0x0f, 0x01, 0x02, 0x0c],
        '/' => &[0x01, 0x01, 0x02, 0x04, 0x08, 0x10, 0x10],
        '-' => &[0x00, 0x00, 0x00, 0x1f, 0x00, 0x00, 0x00],
        '.' => &[0x00, 0x00, 0x00, 0x00, 0x00, 0x0c, 0x0c],
        ' ' => &[0x00; 7],
        _ => &[0x0e, 0x11, 0x01, 0x02, 0x04, 0x00, 0x04],
    }
}
