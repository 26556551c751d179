use std::{
    path::Path,
    time::{
        Duration,
        Instant,
    },
};

use image::{
    DynamicImage,
    RgbImage,
};

use crate::{
    Error,
    buf::PcmBuffer,
    modem::sstv::{
        ModeSpecification,
        PrepareOptions,
        SstvEncoder,
        load_image,
        prepare,
    },
    source::{
        check_sample_rate,
        render,
    },
};

pub const DEFAULT_SAMPLE_RATE: f32 = 44100.0;

/// Everything needed to turn an image into audio.
#[derive(Clone, Debug)]
pub struct EncodeJob {
    pub mode: &'static ModeSpecification,
    pub sample_rate: f32,
    pub prepare: PrepareOptions,
}

impl EncodeJob {
    pub fn new(mode: &'static ModeSpecification) -> Self {
        Self {
            mode,
            sample_rate: DEFAULT_SAMPLE_RATE,
            prepare: PrepareOptions::default(),
        }
    }

    pub fn with_sample_rate(mut self, sample_rate: f32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn with_prepare_options(mut self, options: PrepareOptions) -> Self {
        self.prepare = options;
        self
    }

    pub fn run_path(&self, path: impl AsRef<Path>) -> Result<EncodeOutput, Error> {
        let image = load_image(path)?;
        self.run(&image)
    }

    pub fn run(&self, image: &DynamicImage) -> Result<EncodeOutput, Error> {
        let start = Instant::now();

        // fail before doing any work
        check_sample_rate(self.sample_rate)?;

        let grid = prepare(image, self.mode, &self.prepare)?;

        let mut num_tones = 0;
        let encoder = SstvEncoder::new(&grid, *self.mode)?;
        let pcm = render(encoder.inspect(|_| num_tones += 1), self.sample_rate)?;

        let stats = EncodeStats {
            source_width: image.width(),
            source_height: image.height(),
            width: grid.width(),
            height: grid.height(),
            num_tones,
            num_samples: pcm.len(),
            audio_duration: pcm.duration(),
            elapsed: start.elapsed(),
        };

        tracing::info!(
            mode = self.mode.name,
            sample_rate = self.sample_rate,
            num_tones,
            duration = stats.audio_duration,
            elapsed = ?stats.elapsed,
            "Encoded image"
        );

        Ok(EncodeOutput { pcm, grid, stats })
    }
}

#[derive(Clone, Debug)]
pub struct EncodeOutput {
    pub pcm: PcmBuffer,
    /// The image as it was transmitted.
    pub grid: RgbImage,
    pub stats: EncodeStats,
}

#[derive(Clone, Copy, Debug)]
pub struct EncodeStats {
    pub source_width: u32,
    pub source_height: u32,
    pub width: u32,
    pub height: u32,
    pub num_tones: usize,
    pub num_samples: usize,
    /// Seconds
    pub audio_duration: f64,
    pub elapsed: Duration,
}
