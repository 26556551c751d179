//! Player side of [`playback`](crate::playback).

use std::{
    path::Path,
    time::Duration,
};

use parking_lot::Mutex;

use crate::{
    GetSampleRate,
    buf::PcmBuffer,
    playback::PlayerMessage,
    sink::read_wav,
};

#[derive(Debug, thiserror::Error)]
#[error("audio error")]
pub enum Error {
    Stream(#[from] rodio::StreamError),
    Wav(#[from] hound::Error),
    #[error("invalid sample rate: {sample_rate}")]
    InvalidSampleRate { sample_rate: f32 },
}

/// Plays a WAV file on the default output device, reporting the position
/// every `interval`. Blocks until playback has finished.
pub fn play_wav<F>(path: impl AsRef<Path>, interval: Duration, report: F) -> Result<(), Error>
where
    F: FnMut(PlayerMessage),
{
    let buffer = read_wav(path)?;
    play_buffer(&buffer, interval, report)
}

pub fn play_buffer<F>(buffer: &PcmBuffer, interval: Duration, mut report: F) -> Result<(), Error>
where
    F: FnMut(PlayerMessage),
{
    let sample_rate = buffer.sample_rate();
    if !sample_rate.is_finite() || sample_rate < 1.0 {
        return Err(Error::InvalidSampleRate { sample_rate });
    }

    let total = buffer.duration();
    let sink = rodio::Sink::connect_new(global_output_stream()?.mixer());
    sink.append(rodio::buffer::SamplesBuffer::new(
        1,
        sample_rate.round() as u32,
        buffer.to_f32(),
    ));
    tracing::debug!(total, sample_rate, "Playing audio");

    while !sink.empty() {
        let position = sink.get_pos().as_secs_f64().min(total);
        report(PlayerMessage::Progress { position, total });
        std::thread::sleep(interval);
    }

    report(PlayerMessage::Progress {
        position: total,
        total,
    });
    report(PlayerMessage::Done);
    Ok(())
}

fn global_output_stream() -> Result<&'static rodio::OutputStream, Error> {
    static OUTPUT_STREAM: Mutex<Option<&'static rodio::OutputStream>> = Mutex::new(None);

    let mut output_stream = OUTPUT_STREAM.lock();

    match *output_stream {
        Some(stream) => Ok(stream),
        None => {
            let stream: &'static rodio::OutputStream =
                Box::leak(Box::new(rodio::OutputStreamBuilder::open_default_stream()?));
            *output_stream = Some(stream);
            Ok(stream)
        }
    }
}
