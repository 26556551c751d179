use std::{
    path::Path,
    process::{
        Command,
        Stdio,
    },
};

use crate::{
    buf::PcmBuffer,
    sink::{
        AudioFormat,
        ExportError,
        file::write_wav,
    },
};

/// External program used to produce compressed formats. Must accept
/// ffmpeg's command line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transcoder {
    pub program: String,
    pub bitrate: String,
}

impl Default for Transcoder {
    fn default() -> Self {
        Self {
            program: "ffmpeg".to_owned(),
            bitrate: "128k".to_owned(),
        }
    }
}

impl Transcoder {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            ..Default::default()
        }
    }

    pub fn with_bitrate(mut self, bitrate: impl Into<String>) -> Self {
        self.bitrate = bitrate.into();
        self
    }

    /// Checks that the program can be run at all.
    pub fn is_available(&self) -> bool {
        Command::new(&self.program)
            .arg("-version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|status| status.success())
            .unwrap_or(false)
    }

    pub fn transcode(
        &self,
        buffer: &PcmBuffer,
        format: AudioFormat,
        output: &Path,
    ) -> Result<(), ExportError> {
        let Some(codec) = format.codec()
        else {
            return write_wav(buffer, output);
        };

        if !self.is_available() {
            return Err(ExportError::TranscoderUnavailable {
                program: self.program.clone(),
            });
        }

        let scratch = tempfile::tempdir()?;
        let input = scratch.path().join("input.wav");
        write_wav(buffer, &input)?;

        // `output` is only replaced after a successful run. The suffix selects
        // the container.
        let dir = output
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        let encoded = tempfile::Builder::new()
            .prefix(".sstvenc-")
            .suffix(&format!(".{}", format.extension()))
            .tempfile_in(dir)?;

        tracing::debug!(
            program = %self.program,
            codec,
            bitrate = %self.bitrate,
            output = %output.display(),
            "Running transcoder"
        );

        let result = Command::new(&self.program)
            .args(["-y", "-loglevel", "error", "-i"])
            .arg(&input)
            .args(["-acodec", codec, "-ab", &self.bitrate])
            .arg(encoded.path())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()?;

        if !result.status.success() {
            return Err(ExportError::TranscodeFailed {
                status: result.status,
                stderr: String::from_utf8_lossy(&result.stderr).trim().to_owned(),
            });
        }

        encoded.persist(output)?;
        Ok(())
    }
}
