mod file;
mod transcode;

use std::{
    fmt::Display,
    path::{
        Path,
        PathBuf,
    },
    process::ExitStatus,
    str::FromStr,
};

pub use self::{
    file::{
        read_wav,
        write_wav,
        write_wav_to,
    },
    transcode::Transcoder,
};
use crate::buf::PcmBuffer;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AudioFormat {
    Wav,
    Mp3,
    Ogg,
}

impl AudioFormat {
    pub const ALL: [AudioFormat; 3] = [Self::Wav, Self::Mp3, Self::Ogg];

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Wav => "wav",
            Self::Mp3 => "mp3",
            Self::Ogg => "ogg",
        }
    }

    /// Codec passed to the transcoder. WAV is written directly.
    pub fn codec(&self) -> Option<&'static str> {
        match self {
            Self::Wav => None,
            Self::Mp3 => Some("libmp3lame"),
            Self::Ogg => Some("libvorbis"),
        }
    }
}

impl Display for AudioFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.extension())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown audio format: {name:?}")]
pub struct UnknownFormat {
    pub name: String,
}

impl FromStr for AudioFormat {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().trim_start_matches('.');
        Self::ALL
            .into_iter()
            .find(|format| format.extension().eq_ignore_ascii_case(name))
            .ok_or_else(|| UnknownFormat { name: s.to_owned() })
    }
}

/// Path for `format` next to `base`, replacing any extension `base` has.
pub fn output_path(base: impl AsRef<Path>, format: AudioFormat) -> PathBuf {
    base.as_ref().with_extension(format.extension())
}

#[derive(Debug, thiserror::Error)]
#[error("audio export error")]
pub enum ExportError {
    #[error("transcoder not available: {program}")]
    TranscoderUnavailable { program: String },
    #[error("transcoder failed ({status}): {stderr}")]
    TranscodeFailed { status: ExitStatus, stderr: String },
    #[error("invalid sample rate for export: {sample_rate}")]
    InvalidSampleRate { sample_rate: f32 },
    Hound(#[from] hound::Error),
    Io(#[from] std::io::Error),
    Persist(#[from] tempfile::PersistError),
}

/// Writes `buffer` to `path` in the given format.
///
/// Nothing is left at `path` if this fails.
pub fn export(
    buffer: &PcmBuffer,
    format: AudioFormat,
    path: impl AsRef<Path>,
    transcoder: &Transcoder,
) -> Result<PathBuf, ExportError> {
    let path = path.as_ref();

    match format {
        AudioFormat::Wav => write_wav(buffer, path)?,
        AudioFormat::Mp3 | AudioFormat::Ogg => transcoder.transcode(buffer, format, path)?,
    }

    tracing::info!(path = %path.display(), %format, "Exported audio");
    Ok(path.to_owned())
}
