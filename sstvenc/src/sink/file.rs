use std::{
    fs::File,
    io::{
        BufReader,
        BufWriter,
        Seek,
        Write,
    },
    path::Path,
};

use crate::{
    GetSampleRate,
    buf::PcmBuffer,
    sink::ExportError,
};

fn wav_spec(sample_rate: f32) -> Result<hound::WavSpec, ExportError> {
    let rounded = sample_rate.round();
    if !rounded.is_finite() || rounded < 1.0 || rounded > u32::MAX as f32 {
        return Err(ExportError::InvalidSampleRate { sample_rate });
    }
    if rounded != sample_rate {
        tracing::warn!(
            sample_rate,
            header_sample_rate = rounded,
            "WAV header needs an integer sample rate, playback speed will be slightly off"
        );
    }

    Ok(hound::WavSpec {
        channels: 1,
        sample_rate: rounded as u32,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    })
}

/// Writes a mono 16 bit WAV.
pub fn write_wav_to<W>(buffer: &PcmBuffer, writer: W) -> Result<(), ExportError>
where
    W: Write + Seek,
{
    let mut writer = hound::WavWriter::new(writer, wav_spec(buffer.sample_rate())?)?;
    for sample in buffer.samples() {
        writer.write_sample(*sample)?;
    }
    writer.finalize()?;
    Ok(())
}

/// Writes a mono 16 bit WAV to `path`.
///
/// The data goes to a temporary file next to `path` first, which is then
/// renamed into place.
pub fn write_wav(buffer: &PcmBuffer, path: impl AsRef<Path>) -> Result<(), ExportError> {
    let path = path.as_ref();
    let dir = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or(Path::new("."));

    let file = tempfile::Builder::new()
        .prefix(".sstvenc-")
        .suffix(".wav")
        .tempfile_in(dir)?;
    write_wav_to(buffer, BufWriter::new(file.as_file()))?;
    file.persist(path)?;

    tracing::debug!(path = %path.display(), num_samples = buffer.len(), "Wrote WAV");
    Ok(())
}

/// Reads the first channel of a WAV file.
pub fn read_wav(path: impl AsRef<Path>) -> Result<PcmBuffer, hound::Error> {
    let reader = hound::WavReader::new(BufReader::new(File::open(path)?))?;
    let spec = reader.spec();

    let samples = match spec.sample_format {
        hound::SampleFormat::Int => {
            let shift = spec.bits_per_sample.saturating_sub(16);
            reader
                .into_samples::<i32>()
                .step_by(spec.channels.max(1).into())
                .map(|sample| {
                    sample.map(|sample| {
                        if spec.bits_per_sample < 16 {
                            (sample << (16 - spec.bits_per_sample)) as i16
                        }
                        else {
                            (sample >> shift) as i16
                        }
                    })
                })
                .collect::<Result<Vec<_>, _>>()?
        }
        hound::SampleFormat::Float => {
            reader
                .into_samples::<f32>()
                .step_by(spec.channels.max(1).into())
                .map(|sample| {
                    sample.map(|sample| (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)
                })
                .collect::<Result<Vec<_>, _>>()?
        }
    };

    Ok(PcmBuffer::new(samples, spec.sample_rate as f32))
}
