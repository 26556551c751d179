use std::{
    io::{
        BufRead,
        Cursor,
        Seek,
    },
    path::Path,
};

use image::{
    DynamicImage,
    ImageDecoder,
    ImageReader,
    Rgb,
    Rgb32FImage,
    RgbImage,
    imageops::FilterType,
};

pub use crate::modem::sstv::watermark::{
    WATERMARK_MARGIN,
    WATERMARK_OPACITY,
    Watermark,
};
use crate::modem::sstv::{
    image::{
        Channel,
        rgb_channel,
    },
    modes::ModeSpecification,
    watermark::apply_watermark,
};

#[derive(Debug, thiserror::Error)]
#[error("image preparation error")]
pub enum PrepareError {
    #[error("unreadable image")]
    UnreadableImage(#[source] image::ImageError),
    #[error("image is empty")]
    EmptyImage,
    Io(#[from] std::io::Error),
}

/// Factors of the optional enhancement pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnhanceOptions {
    /// Scales the distance of every channel from the mean luma.
    pub contrast: f32,
    /// Scales the distance of every channel from the pixel's luma.
    pub saturation: f32,
    pub sharpen_sigma: f32,
    pub sharpen_amount: f32,
    /// Minimum difference from the blurred image that gets sharpened.
    pub sharpen_threshold: f32,
}

impl Default for EnhanceOptions {
    fn default() -> Self {
        Self {
            contrast: 1.5,
            saturation: 1.3,
            sharpen_sigma: 1.0,
            sharpen_amount: 2.0,
            sharpen_threshold: 1.0,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PrepareOptions {
    pub enhance: Option<EnhanceOptions>,
    pub watermark: Option<Watermark>,
}

/// Loads an image, guessing the format from its content and applying the
/// EXIF orientation.
pub fn load_image(path: impl AsRef<Path>) -> Result<DynamicImage, PrepareError> {
    let path = path.as_ref();
    let image = decode(ImageReader::open(path)?.with_guessed_format()?)?;
    tracing::debug!(
        path = %path.display(),
        width = image.width(),
        height = image.height(),
        "Loaded image"
    );
    Ok(image)
}

pub fn load_image_from_bytes(bytes: &[u8]) -> Result<DynamicImage, PrepareError> {
    decode(ImageReader::new(Cursor::new(bytes)).with_guessed_format()?)
}

fn decode<R>(reader: ImageReader<R>) -> Result<DynamicImage, PrepareError>
where
    R: BufRead + Seek,
{
    let mut decoder = reader
        .into_decoder()
        .map_err(PrepareError::UnreadableImage)?;
    let orientation = decoder
        .orientation()
        .map_err(PrepareError::UnreadableImage)?;
    let mut image = DynamicImage::from_decoder(decoder).map_err(PrepareError::UnreadableImage)?;
    image.apply_orientation(orientation);
    Ok(image)
}

/// Produces the pixel grid for `mode`: resized to the mode's dimensions
/// (stretched, not letterboxed), optionally enhanced and watermarked.
pub fn prepare(
    image: &DynamicImage,
    mode: &ModeSpecification,
    options: &PrepareOptions,
) -> Result<RgbImage, PrepareError> {
    if image.width() == 0 || image.height() == 0 {
        return Err(PrepareError::EmptyImage);
    }

    let width = mode.pixels_per_line as u32;
    let height = mode.num_lines as u32;

    let rgb = image.to_rgb8();
    let mut grid = if rgb.dimensions() == (width, height) {
        rgb
    }
    else {
        image::imageops::resize(&rgb, width, height, FilterType::Lanczos3)
    };

    if let Some(enhance_options) = &options.enhance {
        enhance(&mut grid, enhance_options);
    }

    if let Some(watermark) = &options.watermark {
        apply_watermark(&mut grid, watermark);
    }

    tracing::debug!(
        mode = mode.name,
        source_width = image.width(),
        source_height = image.height(),
        enhanced = options.enhance.is_some(),
        watermarked = options.watermark.is_some(),
        "Prepared image"
    );

    Ok(grid)
}

#[inline]
fn to_u8(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

#[inline]
fn luma(pixel: [u8; 3]) -> f32 {
    rgb_channel(pixel.map(f32::from), Channel::Luma)
}

/// Contrast, then saturation, then unsharp mask.
pub fn enhance(image: &mut RgbImage, options: &EnhanceOptions) {
    adjust_contrast(image, options.contrast);
    adjust_saturation(image, options.saturation);
    unsharp_mask(
        image,
        options.sharpen_sigma,
        options.sharpen_amount,
        options.sharpen_threshold,
    );
}

fn adjust_contrast(image: &mut RgbImage, factor: f32) {
    let num_pixels = image.width() as f64 * image.height() as f64;
    if num_pixels == 0.0 {
        return;
    }

    let sum: f64 = image.pixels().map(|pixel| luma(pixel.0) as f64).sum();
    let mean = (sum / num_pixels).round() as f32;

    for pixel in image.pixels_mut() {
        for value in &mut pixel.0 {
            *value = to_u8(mean + factor * (*value as f32 - mean));
        }
    }
}

fn adjust_saturation(image: &mut RgbImage, factor: f32) {
    for pixel in image.pixels_mut() {
        let gray = luma(pixel.0);
        for value in &mut pixel.0 {
            *value = to_u8(gray + factor * (*value as f32 - gray));
        }
    }
}

fn unsharp_mask(image: &mut RgbImage, sigma: f32, amount: f32, threshold: f32) {
    if sigma <= 0.0 {
        return;
    }

    // blur in float, so flat areas don't pick up quantization noise
    let normalized = Rgb32FImage::from_fn(image.width(), image.height(), |x, y| {
        Rgb(image.get_pixel(x, y).0.map(|value| value as f32 / 255.0))
    });
    let blurred = image::imageops::blur(&normalized, sigma);

    for (pixel, blurred) in image.pixels_mut().zip(blurred.pixels()) {
        for (value, blurred) in pixel.0.iter_mut().zip(blurred.0) {
            let difference = *value as f32 - blurred * 255.0;
            if difference.abs() >= threshold {
                *value = to_u8(*value as f32 + amount * difference);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use image::{
        DynamicImage,
        ImageFormat,
        Rgb,
        RgbImage,
    };

    use crate::modem::sstv::{
        modes::ModeSpecification,
        prepare::{
            EnhanceOptions,
            PrepareError,
            PrepareOptions,
            Watermark,
            enhance,
            load_image,
            load_image_from_bytes,
            prepare,
        },
    };

    fn checkerboard(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            if (x / 8 + y / 8) % 2 == 0 {
                Rgb([200, 60, 60])
            }
            else {
                Rgb([60, 60, 200])
            }
        })
    }

    #[test]
    fn resizes_to_mode_dimensions() {
        let image = DynamicImage::ImageRgb8(checkerboard(640, 480));
        for mode in [ModeSpecification::R36, ModeSpecification::S1] {
            let grid = prepare(&image, &mode, &PrepareOptions::default()).unwrap();
            assert_eq!(grid.width() as usize, mode.pixels_per_line);
            assert_eq!(grid.height() as usize, mode.num_lines);
        }
    }

    #[test]
    fn stretches_instead_of_cropping() {
        // left half red, right half blue
        let wide = RgbImage::from_fn(1000, 100, |x, _| {
            if x < 500 { Rgb([255, 0, 0]) } else { Rgb([0, 0, 255]) }
        });
        let grid = prepare(
            &DynamicImage::ImageRgb8(wide),
            &ModeSpecification::M2,
            &PrepareOptions::default(),
        )
        .unwrap();
        assert_eq!(grid.get_pixel(10, 128).0, [255, 0, 0]);
        assert_eq!(grid.get_pixel(310, 128).0, [0, 0, 255]);
    }

    #[test]
    fn exact_size_is_untouched_without_options() {
        let image = checkerboard(320, 256);
        let grid = prepare(
            &DynamicImage::ImageRgb8(image.clone()),
            &ModeSpecification::M1,
            &PrepareOptions::default(),
        )
        .unwrap();
        assert_eq!(grid, image);
    }

    #[test]
    fn rejects_empty_image() {
        let image = DynamicImage::ImageRgb8(RgbImage::new(0, 0));
        assert!(matches!(
            prepare(&image, &ModeSpecification::R36, &PrepareOptions::default()),
            Err(PrepareError::EmptyImage)
        ));
    }

    #[test]
    fn enhancing_flat_gray_is_a_no_op() {
        let original = RgbImage::from_pixel(64, 64, Rgb([100, 100, 100]));
        let mut image = original.clone();
        enhance(&mut image, &EnhanceOptions::default());
        assert_eq!(image, original);
    }

    #[test]
    fn contrast_spreads_values_around_mean() {
        let mut image = RgbImage::from_fn(2, 1, |x, _| {
            if x == 0 { Rgb([100, 100, 100]) } else { Rgb([140, 140, 140]) }
        });
        let options = EnhanceOptions {
            saturation: 1.0,
            sharpen_sigma: 0.0,
            ..Default::default()
        };
        enhance(&mut image, &options);
        // mean 120
        assert_eq!(image.get_pixel(0, 0).0, [90, 90, 90]);
        assert_eq!(image.get_pixel(1, 0).0, [150, 150, 150]);
    }

    #[test]
    fn saturation_keeps_gray_and_boosts_color() {
        let mut image = RgbImage::from_fn(2, 1, |x, _| {
            if x == 0 { Rgb([80, 80, 80]) } else { Rgb([150, 100, 100]) }
        });
        let options = EnhanceOptions {
            contrast: 1.0,
            sharpen_sigma: 0.0,
            ..Default::default()
        };
        enhance(&mut image, &options);
        assert_eq!(image.get_pixel(0, 0).0, [80, 80, 80]);
        let [r, g, b] = image.get_pixel(1, 0).0;
        assert!(r > 150);
        assert!(g < 100);
        assert_eq!(g, b);
    }

    #[test]
    fn watermark_is_applied() {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(320, 256, Rgb([0, 0, 0])));
        let plain = prepare(&image, &ModeSpecification::S1, &PrepareOptions::default()).unwrap();
        let marked = prepare(
            &image,
            &ModeSpecification::S1,
            &PrepareOptions {
                watermark: Some(Watermark::Text("N0CALL".to_owned())),
                ..Default::default()
            },
        )
        .unwrap();
        assert_ne!(plain, marked);
        assert_eq!(plain.get_pixel(0, 0), marked.get_pixel(0, 0));
    }

    #[test]
    fn loads_png_from_bytes() {
        let image = checkerboard(24, 16);
        let mut bytes = Cursor::new(Vec::new());
        image.write_to(&mut bytes, ImageFormat::Png).unwrap();

        let loaded = load_image_from_bytes(bytes.get_ref()).unwrap();
        assert_eq!(loaded.to_rgb8(), image);
    }

    #[test]
    fn corrupt_data_is_unreadable() {
        assert!(matches!(
            load_image_from_bytes(b"definitely not an image"),
            Err(PrepareError::UnreadableImage(_))
        ));

        // valid signature, truncated body
        let mut bytes = Cursor::new(Vec::new());
        checkerboard(24, 16)
            .write_to(&mut bytes, ImageFormat::Png)
            .unwrap();
        let truncated = &bytes.get_ref()[..40];
        assert!(matches!(
            load_image_from_bytes(truncated),
            Err(PrepareError::UnreadableImage(_))
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load_image(dir.path().join("missing.png")),
            Err(PrepareError::Io(_))
        ));
    }
}
