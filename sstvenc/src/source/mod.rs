mod sine;
mod tones;

pub use sine::{
    SineWave,
    sine,
};
pub use tones::{
    AMPLITUDE,
    RenderError,
    ToneSource,
    check_sample_rate,
    render,
};

pub trait SignalGenerator {
    type Sample;

    fn set_sample_rate(&mut self, sample_rate: f32);

    fn next(&mut self) -> Self::Sample;
}
