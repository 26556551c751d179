use std::{
    io::Write,
    time::Duration,
};

use sstvenc::audio::play_wav;

use crate::{
    Error,
    args::PlayArgs,
};

pub fn run(args: PlayArgs) -> Result<(), Error> {
    let interval = Duration::from_millis(args.progress_interval.max(1));
    let mut stdout = std::io::stdout().lock();

    play_wav(&args.path, interval, |message| {
        if args.progress {
            // a closed pipe just means nobody is listening
            writeln!(stdout, "{message}").and_then(|()| stdout.flush()).ok();
        }
    })?;

    tracing::debug!(path = %args.path.display(), "Playback finished");
    Ok(())
}
