mod args;
mod config;
mod encode;
mod play;

use std::{
    fs::OpenOptions,
    path::Path,
    sync::Mutex,
};

use clap::Parser;
use color_eyre::eyre::Error;
use sstvenc::{
    modem::sstv::modes::BUILTIN_MODES,
    util::format_minutes_seconds,
};
use tracing_subscriber::{
    EnvFilter,
    fmt::writer::MakeWriterExt,
};

use crate::args::{
    Args,
    Command,
};

fn main() -> Result<(), Error> {
    let _ = dotenvy::dotenv();
    color_eyre::install()?;

    let args = Args::parse();
    init_logging(args.log_file.as_deref())?;
    tracing::debug!(?args);

    let result = match args.command {
        Command::Encode(args) => encode::run(args),
        Command::Play(args) => play::run(args),
        Command::Modes => {
            list_modes();
            Ok(())
        }
    };

    if let Err(error) = &result {
        tracing::error!(?error);
    }

    result
}

/// Logs go to stderr, so stdout stays free for the player protocol.
fn init_logging(log_file: Option<&Path>) -> Result<(), Error> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    if let Some(path) = log_file {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        builder
            .with_ansi(false)
            .with_writer(std::io::stderr.and(Mutex::new(file)))
            .init();
    }
    else {
        builder.with_writer(std::io::stderr).init();
    }

    Ok(())
}

fn list_modes() {
    println!(
        "{:<10} {:<6} {:<6} {:<9} {:>10} {:>8}",
        "Name", "Short", "VIS", "Size", "Line", "Frame"
    );
    for mode in BUILTIN_MODES {
        println!(
            "{:<10} {:<6} {:<6} {:<9} {:>8.3}ms {:>8}",
            mode.name,
            mode.short_name,
            mode.vis_code.to_string(),
            format!("{}x{}", mode.pixels_per_line, mode.num_lines),
            mode.line_time() * 1000.0,
            format_minutes_seconds(mode.frame_time()),
        );
    }
}
