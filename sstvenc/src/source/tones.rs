use crate::{
    GetSampleRate,
    buf::PcmBuffer,
    modem::sstv::Tone,
    source::{
        SignalGenerator,
        SineWave,
    },
};

/// Peak amplitude relative to full scale.
pub const AMPLITUDE: f32 = 0.95;

#[derive(Clone, Copy, Debug, thiserror::Error)]
pub enum RenderError {
    #[error("invalid sample rate: {sample_rate}")]
    InvalidSampleRate { sample_rate: f32 },
}

pub fn check_sample_rate(sample_rate: f32) -> Result<(), RenderError> {
    if sample_rate.is_finite() && sample_rate > 0.0 {
        Ok(())
    }
    else {
        Err(RenderError::InvalidSampleRate { sample_rate })
    }
}

/// Turns a sequence of tones into samples of a continuous-phase sine.
///
/// A tone ending at time `t` ends at sample `round(t * sample_rate)`, so
/// rounding never accumulates over long sequences.
#[derive(Clone, Debug)]
pub struct ToneSource<I> {
    tones: I,
    oscillator: SineWave,
    elapsed: f64,
    num_samples: u64,
    tone_end: u64,
}

impl<I> ToneSource<I>
where
    I: Iterator<Item = Tone>,
{
    pub fn new(tones: I, sample_rate: f32) -> Result<Self, RenderError> {
        check_sample_rate(sample_rate)?;
        Ok(Self {
            tones,
            oscillator: SineWave::new(0.0, sample_rate),
            elapsed: 0.0,
            num_samples: 0,
            tone_end: 0,
        })
    }

    /// Total duration of the tones consumed so far.
    #[inline]
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }
}

impl<I> Iterator for ToneSource<I>
where
    I: Iterator<Item = Tone>,
{
    type Item = f32;

    fn next(&mut self) -> Option<Self::Item> {
        while self.num_samples == self.tone_end {
            let tone = self.tones.next()?;
            self.elapsed += tone.duration;
            let end = (self.elapsed * self.oscillator.sample_rate() as f64).round() as u64;
            self.tone_end = end.max(self.num_samples);
            self.oscillator.set_frequency(tone.frequency);
        }

        self.num_samples += 1;
        Some(self.oscillator.next())
    }
}

impl<I> GetSampleRate for ToneSource<I> {
    #[inline]
    fn sample_rate(&self) -> f32 {
        self.oscillator.sample_rate()
    }
}

#[inline]
fn quantize(sample: f32) -> i16 {
    (sample * AMPLITUDE * i16::MAX as f32).round() as i16
}

/// Renders tones into 16 bit PCM.
pub fn render<I>(tones: I, sample_rate: f32) -> Result<PcmBuffer, RenderError>
where
    I: IntoIterator<Item = Tone>,
{
    let source = ToneSource::new(tones.into_iter(), sample_rate)?;
    let samples = source.map(quantize).collect::<Vec<_>>();
    let buffer = PcmBuffer::new(samples, sample_rate);
    tracing::debug!(
        num_samples = buffer.len(),
        duration = buffer.duration(),
        sample_rate,
        "Rendered tones"
    );
    Ok(buffer)
}
