//! Plays exported audio in a separate process.
//!
//! The player writes one message per line to its stdout:
//!
//! ```text
//! progress <position_secs> <total_secs>
//! done
//! ```
//!
//! A reader thread parses these and forwards them as [`PlaybackEvent`]s.

use std::{
    ffi::OsString,
    fmt::Display,
    io::{
        BufRead,
        BufReader,
    },
    path::{
        Path,
        PathBuf,
    },
    process::{
        Child,
        ChildStdout,
        Command,
        ExitStatus,
        Stdio,
    },
    str::FromStr,
    sync::{
        Arc,
        mpsc,
    },
    thread::JoinHandle,
    time::Duration,
};

use parking_lot::Mutex;

pub const PROGRESS_INTERVAL: Duration = Duration::from_millis(100);

const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// A line of the player protocol.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PlayerMessage {
    Progress { position: f64, total: f64 },
    Done,
}

impl Display for PlayerMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Progress { position, total } => write!(f, "progress {position:.3} {total:.3}"),
            Self::Done => write!(f, "done"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("malformed player message: {line:?}")]
pub struct MalformedMessage {
    pub line: String,
}

impl FromStr for PlayerMessage {
    type Err = MalformedMessage;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let malformed = || {
            MalformedMessage {
                line: line.to_owned(),
            }
        };

        let mut parts = line.split_whitespace();
        let message = match parts.next() {
            Some("done") => Self::Done,
            Some("progress") => {
                let mut seconds = || {
                    parts
                        .next()
                        .and_then(|part| part.parse::<f64>().ok())
                        .filter(|value| value.is_finite() && *value >= 0.0)
                        .ok_or_else(malformed)
                };
                let position = seconds()?;
                let total = seconds()?;
                Self::Progress { position, total }
            }
            _ => return Err(malformed()),
        };

        if parts.next().is_some() {
            return Err(malformed());
        }

        Ok(message)
    }
}

#[derive(Debug, thiserror::Error)]
#[error("playback fault")]
pub enum PlaybackFault {
    #[error("could not start player {program:?}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("player exited with {status}")]
    Exited { status: ExitStatus },
    Io(#[from] std::io::Error),
    Protocol(#[from] MalformedMessage),
}

#[derive(Debug)]
pub enum PlaybackEvent {
    Progress { position: f64, total: f64 },
    Finished,
    Cancelled,
    Fault(PlaybackFault),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaybackStatus {
    Playing,
    Finished,
    Cancelled,
    Faulted,
}

/// How to start the player process. The audio file path is appended to
/// the arguments.
#[derive(Clone, Debug)]
pub struct PlaybackLauncher {
    pub program: PathBuf,
    pub args: Vec<OsString>,
}

impl PlaybackLauncher {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: vec![],
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Runs `play --progress` of the current executable.
    pub fn current_exe() -> Result<Self, std::io::Error> {
        Ok(Self::new(std::env::current_exe()?)
            .arg("play")
            .arg("--progress"))
    }

    /// Starts playing `path`. Failures are reported through the handle's
    /// events.
    pub fn play(&self, path: impl AsRef<Path>) -> PlaybackHandle {
        let path = path.as_ref();
        let (sender, events) = mpsc::channel();
        let shared = Arc::new(Mutex::new(Shared::default()));
        let child = Arc::new(Mutex::new(None));

        let spawned = Command::new(&self.program)
            .args(&self.args)
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn();

        let reader = match spawned {
            Ok(mut process) => {
                tracing::debug!(
                    program = %self.program.display(),
                    path = %path.display(),
                    pid = process.id(),
                    "Started player"
                );
                let stdout = process.stdout.take();
                *child.lock() = Some(process);

                let child = child.clone();
                let shared = shared.clone();
                Some(std::thread::spawn(move || {
                    read_player_output(stdout, &child, &shared, &sender);
                }))
            }
            Err(source) => {
                tracing::warn!(program = %self.program.display(), error = %source, "Could not start player");
                shared.lock().status = PlaybackStatus::Faulted;
                sender
                    .send(PlaybackEvent::Fault(PlaybackFault::Spawn {
                        program: self.program.clone(),
                        source,
                    }))
                    .ok();
                None
            }
        };

        PlaybackHandle {
            shared,
            child,
            events,
            reader,
        }
    }
}

#[derive(Debug)]
struct Shared {
    position: f64,
    total: f64,
    status: PlaybackStatus,
    cancel_requested: bool,
}

impl Default for Shared {
    fn default() -> Self {
        Self {
            position: 0.0,
            total: 0.0,
            status: PlaybackStatus::Playing,
            cancel_requested: false,
        }
    }
}

fn read_player_output(
    stdout: Option<ChildStdout>,
    child: &Mutex<Option<Child>>,
    shared: &Mutex<Shared>,
    events: &mpsc::Sender<PlaybackEvent>,
) {
    let send = |event| {
        events.send(event).ok();
    };

    if let Some(stdout) = stdout {
        for line in BufReader::new(stdout).lines() {
            let line = match line {
                Ok(line) => line,
                Err(error) => {
                    send(PlaybackEvent::Fault(error.into()));
                    break;
                }
            };

            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            match line.parse::<PlayerMessage>() {
                Ok(PlayerMessage::Progress { position, total }) => {
                    {
                        let mut shared = shared.lock();
                        shared.position = position;
                        shared.total = total;
                    }
                    send(PlaybackEvent::Progress { position, total });
                }
                Ok(PlayerMessage::Done) => {
                    let mut shared = shared.lock();
                    shared.position = shared.total;
                }
                Err(error) => {
                    tracing::warn!(%error, "Ignoring player output");
                    send(PlaybackEvent::Fault(error.into()));
                }
            }
        }
    }

    let exit = wait_for_exit(child);

    let event = {
        let mut shared = shared.lock();
        if shared.cancel_requested {
            shared.status = PlaybackStatus::Cancelled;
            PlaybackEvent::Cancelled
        }
        else {
            match exit {
                Ok(status) if status.success() => {
                    shared.status = PlaybackStatus::Finished;
                    PlaybackEvent::Finished
                }
                Ok(status) => {
                    shared.status = PlaybackStatus::Faulted;
                    PlaybackEvent::Fault(PlaybackFault::Exited { status })
                }
                Err(error) => {
                    shared.status = PlaybackStatus::Faulted;
                    PlaybackEvent::Fault(error.into())
                }
            }
        }
    };

    tracing::debug!(?event, "Player stopped");
    send(event);
}

/// Polls instead of blocking, so the child stays available for
/// [`PlaybackHandle::cancel`].
fn wait_for_exit(child: &Mutex<Option<Child>>) -> Result<ExitStatus, std::io::Error> {
    loop {
        match child.lock().as_mut() {
            Some(child) => {
                if let Some(status) = child.try_wait()? {
                    return Ok(status);
                }
            }
            None => return Err(std::io::Error::other("player process missing")),
        }
        std::thread::sleep(EXIT_POLL_INTERVAL);
    }
}

/// A running player. Dropping the handle stops the player.
#[derive(derive_more::Debug)]
pub struct PlaybackHandle {
    shared: Arc<Mutex<Shared>>,
    child: Arc<Mutex<Option<Child>>>,
    #[debug(skip)]
    events: mpsc::Receiver<PlaybackEvent>,
    reader: Option<JoinHandle<()>>,
}

impl PlaybackHandle {
    /// Seconds played, as last reported.
    pub fn position(&self) -> f64 {
        self.shared.lock().position
    }

    pub fn total(&self) -> f64 {
        self.shared.lock().total
    }

    pub fn status(&self) -> PlaybackStatus {
        self.shared.lock().status
    }

    pub fn try_recv_event(&self) -> Option<PlaybackEvent> {
        self.events.try_recv().ok()
    }

    pub fn recv_event_timeout(&self, timeout: Duration) -> Option<PlaybackEvent> {
        self.events.recv_timeout(timeout).ok()
    }

    /// Blocks for events until the player has stopped.
    pub fn events(&self) -> impl Iterator<Item = PlaybackEvent> + '_ {
        self.events.iter()
    }

    /// Kills the player. No-op if it already stopped.
    pub fn cancel(&self) {
        {
            let mut shared = self.shared.lock();
            if shared.status != PlaybackStatus::Playing {
                return;
            }
            shared.cancel_requested = true;
            shared.status = PlaybackStatus::Cancelled;
        }

        if let Some(child) = self.child.lock().as_mut() {
            if let Err(error) = child.kill() {
                tracing::debug!(%error, "Could not kill player");
            }
        }
    }

    /// Waits for the player to stop.
    pub fn wait(mut self) -> PlaybackStatus {
        if let Some(reader) = self.reader.take() {
            if reader.join().is_err() {
                tracing::warn!("Player output reader panicked");
            }
        }
        self.status()
    }
}

impl Drop for PlaybackHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}
