//! Encodes still images as SSTV audio.
//!
//! ```no_run
//! use sstvenc::{
//!     EncodeJob,
//!     modem::sstv::describe,
//!     sink::{
//!         AudioFormat,
//!         Transcoder,
//!         export,
//!     },
//! };
//!
//! # fn main() -> Result<(), sstvenc::Error> {
//! let job = EncodeJob::new(describe("Scottie 1")?);
//! let output = job.run_path("cat.png")?;
//! export(&output.pcm, AudioFormat::Wav, "cat.wav", &Transcoder::default())?;
//! # Ok(())
//! # }
//! ```

#[cfg(feature = "audio")]
pub mod audio;
pub mod buf;
pub mod job;
pub mod modem;
pub mod playback;
pub mod sink;
pub mod source;
pub mod util;

pub use crate::{
    buf::PcmBuffer,
    job::{
        EncodeJob,
        EncodeOutput,
        EncodeStats,
    },
};

pub trait GetSampleRate {
    fn sample_rate(&self) -> f32;
}

impl<T: GetSampleRate> GetSampleRate for &T {
    #[inline]
    fn sample_rate(&self) -> f32 {
        (&**self).sample_rate()
    }
}

impl<T: GetSampleRate> GetSampleRate for &mut T {
    #[inline]
    fn sample_rate(&self) -> f32 {
        (&**self).sample_rate()
    }
}

#[derive(Debug, thiserror::Error)]
#[error("sstvenc error")]
pub enum Error {
    UnknownMode(#[from] modem::sstv::UnknownMode),
    Prepare(#[from] modem::sstv::PrepareError),
    Encode(#[from] modem::sstv::EncodeError),
    Render(#[from] source::RenderError),
    Export(#[from] sink::ExportError),
}
