use std::path::PathBuf;

use clap::{
    Parser,
    Subcommand,
};
use sstvenc::sink::AudioFormat;

#[derive(Debug, Parser)]
#[clap(version, about = "Encode images as SSTV audio")]
pub struct Args {
    /// Also append log output to this file.
    #[clap(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Encode an image and export the audio.
    Encode(EncodeArgs),

    /// Play a WAV file.
    Play(PlayArgs),

    /// List the supported modes.
    Modes,
}

#[derive(Debug, clap::Args)]
pub struct EncodeArgs {
    /// Image to encode (PNG, JPEG, BMP or TIFF).
    pub image: PathBuf,

    /// Output path. The extension is replaced for every exported format.
    /// Defaults to the image path.
    #[clap(short, long)]
    pub output: Option<PathBuf>,

    /// Configuration file. Defaults to config.toml in the platform's config
    /// directory.
    #[clap(short, long)]
    pub config: Option<PathBuf>,

    /// SSTV mode, e.g. "Robot36", "Scottie 1" or "m2".
    #[clap(short, long)]
    pub mode: Option<String>,

    /// Sample rate in Hz.
    #[clap(short, long = "samplerate")]
    pub sample_rate: Option<f32>,

    /// Enhance contrast, saturation and sharpness.
    #[clap(long, overrides_with = "no_enhance")]
    pub enhance: bool,

    #[clap(long, overrides_with = "enhance")]
    pub no_enhance: bool,

    /// Text put into the bottom-right corner, usually a callsign.
    #[clap(long, conflicts_with = "watermark_image")]
    pub watermark_text: Option<String>,

    /// Image put into the bottom-right corner. Transparency is honored.
    #[clap(long)]
    pub watermark_image: Option<PathBuf>,

    /// Formats to export, comma separated.
    #[clap(short, long, value_delimiter = ',')]
    pub format: Vec<AudioFormat>,

    /// Transcoder used for MP3 and OGG.
    #[clap(long)]
    pub transcoder: Option<String>,

    /// Write the image as it is transmitted.
    #[clap(long)]
    pub preview: Option<PathBuf>,

    /// Play the audio after exporting.
    #[clap(short, long)]
    pub play: bool,
}

#[derive(Debug, clap::Args)]
pub struct PlayArgs {
    pub path: PathBuf,

    /// Write progress messages to stdout.
    #[clap(long)]
    pub progress: bool,

    /// Milliseconds between progress messages.
    #[clap(long, default_value = "100")]
    pub progress_interval: u64,
}
