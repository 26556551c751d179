use crate::GetSampleRate;

/// Mono 16 bit PCM with its sample rate.
#[derive(Clone, Debug, PartialEq)]
pub struct PcmBuffer {
    samples: Vec<i16>,
    sample_rate: f32,
}

impl PcmBuffer {
    #[inline]
    pub fn new(samples: Vec<i16>, sample_rate: f32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    #[inline]
    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    #[inline]
    pub fn into_samples(self) -> Vec<i16> {
        self.samples
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Seconds
    #[inline]
    pub fn duration(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// Samples scaled to `-1.0..=1.0`.
    pub fn to_f32(&self) -> Vec<f32> {
        self.samples
            .iter()
            .map(|sample| *sample as f32 / i16::MAX as f32)
            .collect()
    }
}

impl GetSampleRate for PcmBuffer {
    #[inline]
    fn sample_rate(&self) -> f32 {
        self.sample_rate
    }
}

impl AsRef<[i16]> for PcmBuffer {
    #[inline]
    fn as_ref(&self) -> &[i16] {
        &self.samples
    }
}
