use image::RgbImage;

/// Pixel grid handed to the encoder. Dimensions must match the mode.
pub type PixelGrid = RgbImage;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Channel {
    Green,
    Blue,
    Red,
    Luma,
    /// Cr (R-Y)
    ChromaRed,
    /// Cb (B-Y)
    ChromaBlue,
}

/// Source of channel intensities for the encoder.
///
/// Intensities are nominally in `0.0..=255.0`. Implementations may return
/// values outside that range; the encoder clamps them.
pub trait FrameBuffer {
    fn width(&self) -> usize;
    fn height(&self) -> usize;
    fn channel(&self, x: usize, y: usize, channel: Channel) -> f32;
}

impl<F> FrameBuffer for &F
where
    F: FrameBuffer,
{
    #[inline]
    fn width(&self) -> usize {
        (&**self).width()
    }

    #[inline]
    fn height(&self) -> usize {
        (&**self).height()
    }

    #[inline]
    fn channel(&self, x: usize, y: usize, channel: Channel) -> f32 {
        (&**self).channel(x, y, channel)
    }
}

impl FrameBuffer for RgbImage {
    #[inline]
    fn width(&self) -> usize {
        RgbImage::width(self) as usize
    }

    #[inline]
    fn height(&self) -> usize {
        RgbImage::height(self) as usize
    }

    #[inline]
    fn channel(&self, x: usize, y: usize, channel: Channel) -> f32 {
        let [r, g, b] = self.get_pixel(x as u32, y as u32).0;
        rgb_channel([r, g, b].map(f32::from), channel)
    }
}

/// Full-range (JPEG) YCbCr.
pub fn rgb_channel([r, g, b]: [f32; 3], channel: Channel) -> f32 {
    match channel {
        Channel::Red => r,
        Channel::Green => g,
        Channel::Blue => b,
        Channel::Luma => 0.299 * r + 0.587 * g + 0.114 * b,
        Channel::ChromaRed => 128.0 + 0.5 * r - 0.418688 * g - 0.081312 * b,
        Channel::ChromaBlue => 128.0 - 0.168736 * r - 0.331264 * g + 0.5 * b,
    }
}
