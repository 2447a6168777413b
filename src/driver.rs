//! Timer loop that ties the rotation engine to a display surface.
//!
//! Everything runs on the caller's task: a tick, its decode and its present
//! complete before the timer is re-armed.

use std::path::{Path, PathBuf};
use std::time::Duration;

use rand::Rng;
use rand::rngs::StdRng;
use tokio::select;
use tokio::sync::mpsc::Receiver;
use tokio::time::{Instant, sleep};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::Error;
use crate::events::{Command, Frame};
use crate::rotation::{RotationEngine, RotationState};
use crate::transform;

/// What the presentation layer must provide.
pub trait DisplaySurface {
    /// Current drawable size in pixels.
    fn viewport_size(&self) -> (u32, u32);

    fn present(&mut self, frame: Frame) -> anyhow::Result<()>;

    /// Tell the user which file is on screen.
    fn show_file_name(&mut self, path: &Path);

    /// The viewport was resized by the user.
    fn resize(&mut self, _width: u32, _height: u32) {}

    /// A menu action had no effect in `state` (the entry would be greyed out).
    fn command_ignored(&mut self, _command: &Command, _state: RotationState) {}
}

/// Whether the loop should keep going after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

pub struct Driver<S, R = StdRng> {
    engine: RotationEngine<R>,
    surface: S,
    delay: Duration,
    override_file: PathBuf,
}

impl<S: DisplaySurface, R: Rng> Driver<S, R> {
    pub fn new(
        engine: RotationEngine<R>,
        surface: S,
        delay: Duration,
        override_file: PathBuf,
    ) -> Self {
        Self {
            engine,
            surface,
            delay,
            override_file,
        }
    }

    pub fn engine(&self) -> &RotationEngine<R> {
        &self.engine
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Tick, render against the current viewport, present.
    ///
    /// # Errors
    /// Render errors (including [`Error::ImageLoad`]) are returned untouched;
    /// nothing is presented in that case.
    pub fn cycle(&mut self) -> Result<(), Error> {
        let path = self.engine.tick().to_path_buf();
        self.render(&path)
    }

    fn render(&mut self, path: &Path) -> Result<(), Error> {
        let (width, height) = self.surface.viewport_size();
        let frame = transform::render(path, width, height)?;
        self.surface.present(frame).map_err(Error::Present)
    }

    /// Like [`Self::cycle`], but a picture that fails to load only costs this tick.
    ///
    /// # Errors
    /// Only presentation failures and an empty viewport are returned.
    pub fn refresh(&mut self) -> Result<(), Error> {
        match self.cycle() {
            Err(Error::ImageLoad { path, source }) => {
                warn!(path = %path.display(), "skipping picture that failed to load: {source}");
                Ok(())
            }
            other => other,
        }
    }

    /// Apply a user command.
    ///
    /// # Errors
    /// Propagates presentation failures from the immediate render after `Boss`.
    pub fn handle(&mut self, command: Command) -> Result<Flow, Error> {
        let state = self.engine.state();
        debug!(?command, ?state, "command");
        let applied = match command {
            Command::Pause => self.engine.pause(),
            Command::Resume => self.engine.resume(),
            Command::Release => self.engine.clear_override(),
            _ => true,
        };
        if !applied {
            info!(?command, ?state, "command ignored");
            self.surface.command_ignored(&command, state);
            return Ok(Flow::Continue);
        }

        match command {
            Command::Pause | Command::Resume | Command::Release => {}
            Command::Boss => {
                self.engine.set_override(self.override_file.clone());
                self.refresh()?;
            }
            Command::ShowFileName => match self.engine.current_path() {
                Some(path) => {
                    let path = path.to_path_buf();
                    self.surface.show_file_name(&path);
                }
                None => debug!("nothing selected yet"),
            },
            Command::Resize { width, height } => self.surface.resize(width, height),
            Command::Quit => return Ok(Flow::Stop),
        }
        Ok(Flow::Continue)
    }

    /// Show the first picture right away, then one per `delay` until cancelled
    /// or told to quit.
    ///
    /// A closed command channel leaves the slideshow running; only `Quit` or
    /// cancellation end it.
    pub async fn run(
        mut self,
        mut commands: Receiver<Command>,
        cancel: CancellationToken,
    ) -> anyhow::Result<()> {
        info!(
            candidates = self.engine.pool().len(),
            delay_ms = self.delay.as_millis(),
            "slideshow starting"
        );
        self.refresh()?;

        let timer = sleep(self.delay);
        tokio::pin!(timer);
        let mut commands_open = true;

        loop {
            select! {
                _ = cancel.cancelled() => {
                    info!("cancel received; stopping slideshow");
                    break;
                }

                () = &mut timer => {
                    self.refresh()?;
                    timer.as_mut().reset(Instant::now() + self.delay);
                }

                maybe = commands.recv(), if commands_open => match maybe {
                    Some(command) => {
                        let rearm = command == Command::Boss;
                        if self.handle(command)? == Flow::Stop {
                            info!("quit requested");
                            break;
                        }
                        if rearm {
                            timer.as_mut().reset(Instant::now() + self.delay);
                        }
                    }
                    None => {
                        debug!("command channel closed");
                        commands_open = false;
                    }
                }
            }
        }
        Ok(())
    }
}
