use std::path::{
    Path,
    PathBuf,
};

use color_eyre::eyre::bail;
use sstvenc::{
    EncodeJob,
    EncodeOutput,
    modem::sstv::{
        EnhanceOptions,
        ModeSpecification,
        PrepareOptions,
        Watermark,
        describe,
        load_image,
    },
    playback::{
        PlaybackEvent,
        PlaybackLauncher,
        PlaybackStatus,
    },
    sink::{
        AudioFormat,
        Transcoder,
        export,
        output_path,
        write_wav,
    },
    util::format_minutes_seconds,
};

use crate::{
    Error,
    args::EncodeArgs,
    config::Config,
};

pub const DEFAULT_MODE: &str = "Robot36";
pub const DEFAULT_SAMPLE_RATE: f32 = 44100.0;

/// Config file values merged with command line flags.
#[derive(Debug)]
pub struct Settings {
    pub mode: &'static ModeSpecification,
    pub sample_rate: f32,
    pub prepare: PrepareOptions,
    pub formats: Vec<AudioFormat>,
    pub transcoder: Transcoder,
}

impl Settings {
    pub fn resolve(args: &EncodeArgs, config: &Config) -> Result<Self, Error> {
        let mode = describe(
            args.mode
                .as_deref()
                .or(config.mode.as_deref())
                .unwrap_or(DEFAULT_MODE),
        )?;

        let sample_rate = args
            .sample_rate
            .or(config.sample_rate)
            .unwrap_or(DEFAULT_SAMPLE_RATE);

        let enhance = if args.no_enhance {
            false
        }
        else if args.enhance {
            true
        }
        else {
            config.enhance.unwrap_or(true)
        };

        let watermark = match (&args.watermark_image, &args.watermark_text) {
            (Some(path), _) => Some(load_watermark_image(path)?),
            (None, Some(text)) => Some(Watermark::Text(text.clone())),
            (None, None) => {
                match (&config.watermark_image, &config.watermark_text) {
                    (Some(path), _) => Some(load_watermark_image(path)?),
                    (None, Some(text)) => Some(Watermark::Text(text.clone())),
                    (None, None) => None,
                }
            }
        };

        let mut formats = if args.format.is_empty() {
            config.formats()?.unwrap_or_else(|| vec![AudioFormat::Wav])
        }
        else {
            args.format.clone()
        };
        let mut seen = vec![];
        formats.retain(|format| {
            let new = !seen.contains(format);
            seen.push(*format);
            new
        });
        if formats.is_empty() {
            bail!("No export formats given");
        }

        let mut transcoder = Transcoder::default();
        if let Some(program) = args.transcoder.as_ref().or(config.transcoder.as_ref()) {
            transcoder.program = program.clone();
        }
        if let Some(bitrate) = &config.bitrate {
            transcoder.bitrate = bitrate.clone();
        }

        Ok(Self {
            mode,
            sample_rate,
            prepare: PrepareOptions {
                enhance: enhance.then(EnhanceOptions::default),
                watermark,
            },
            formats,
            transcoder,
        })
    }
}

fn load_watermark_image(path: &Path) -> Result<Watermark, Error> {
    Ok(Watermark::Mask(load_image(path)?.to_rgba8()))
}

pub fn run(args: EncodeArgs) -> Result<(), Error> {
    let config = Config::load(args.config.as_deref())?;
    let settings = Settings::resolve(&args, &config)?;
    tracing::debug!(?settings);

    let image = load_image(&args.image)?;
    let job = EncodeJob::new(settings.mode)
        .with_sample_rate(settings.sample_rate)
        .with_prepare_options(settings.prepare.clone());
    let output = job.run(&image)?;

    if let Some(path) = &args.preview {
        output.grid.save(path)?;
        tracing::info!(path = %path.display(), "Saved preview");
    }

    let base = args
        .output
        .clone()
        .unwrap_or_else(|| args.image.clone());

    let mut exported = vec![];
    let mut num_failed = 0;
    for format in &settings.formats {
        match export(
            &output.pcm,
            *format,
            output_path(&base, *format),
            &settings.transcoder,
        ) {
            Ok(path) => exported.push(path),
            Err(error) => {
                tracing::error!(%format, ?error, "Export failed");
                num_failed += 1;
            }
        }
    }

    print_summary(settings.mode, &output, &exported);

    if num_failed > 0 {
        bail!("{num_failed} export(s) failed");
    }

    if args.play {
        play(&output, &exported)?;
    }

    Ok(())
}

fn print_summary(mode: &ModeSpecification, output: &EncodeOutput, exported: &[PathBuf]) {
    let stats = &output.stats;
    println!("Mode:      {} (VIS {})", mode.name, mode.vis_code);
    println!(
        "Image:     {}x{} -> {}x{}",
        stats.source_width, stats.source_height, stats.width, stats.height
    );
    println!(
        "Duration:  {} ({:.2} s)",
        format_minutes_seconds(stats.audio_duration),
        stats.audio_duration
    );
    println!(
        "Encoded:   {:.2} s at {}",
        stats.elapsed.as_secs_f64(),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    for path in exported {
        println!("Exported:  {}", path.display());
    }
}

fn play(output: &EncodeOutput, exported: &[PathBuf]) -> Result<(), Error> {
    // the player needs a WAV
    let scratch = tempfile::tempdir()?;
    let path = match exported
        .iter()
        .find(|path| path.extension().is_some_and(|extension| extension == "wav"))
    {
        Some(path) => path.clone(),
        None => {
            let path = scratch.path().join("playback.wav");
            write_wav(&output.pcm, &path)?;
            path
        }
    };

    let handle = PlaybackLauncher::current_exe()?.play(&path);
    for event in handle.events() {
        match event {
            PlaybackEvent::Progress { position, total } => {
                eprint!(
                    "\rPlaying {} / {}",
                    format_minutes_seconds(position),
                    format_minutes_seconds(total)
                );
            }
            PlaybackEvent::Finished => eprintln!("\rPlayback finished        "),
            PlaybackEvent::Cancelled => eprintln!("\rPlayback cancelled       "),
            PlaybackEvent::Fault(fault) => tracing::warn!(?fault, "Playback fault"),
        }
    }

    if handle.wait() == PlaybackStatus::Faulted {
        bail!("Playback failed");
    }
    Ok(())
}
