//! Encodes an image in every builtin mode.
//!
//! ```sh
//! cargo run --example sstv -- cat.png
//! ```

use std::path::PathBuf;

use sstvenc::{
    EncodeJob,
    Error,
    modem::sstv::{
        load_image,
        modes::BUILTIN_MODES,
    },
    sink::{
        AudioFormat,
        Transcoder,
        export,
        output_path,
    },
    util::format_minutes_seconds,
};

fn main() -> Result<(), Error> {
    let Some(input) = std::env::args_os().nth(1).map(PathBuf::from)
    else {
        eprintln!("usage: sstv <image>");
        return Ok(());
    };

    let image = load_image(&input)?;

    for mode in BUILTIN_MODES {
        let output = EncodeJob::new(mode).with_sample_rate(22050.0).run(&image)?;
        let base = input.with_file_name(format!(
            "{}_{}",
            input
                .file_stem()
                .map(|stem| stem.to_string_lossy())
                .unwrap_or_default(),
            mode.short_name.to_lowercase()
        ));
        let path = export(
            &output.pcm,
            AudioFormat::Wav,
            output_path(base, AudioFormat::Wav),
            &Transcoder::default(),
        )?;
        println!(
            "{}: {} ({})",
            mode.name,
            path.display(),
            format_minutes_seconds(output.stats.audio_duration)
        );
    }

    Ok(())
}
