//! Frames handed to the display surface and user commands sent to the driver.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// An RGBA8 bitmap sized for the viewport it was rendered against.
#[derive(Debug, Clone)]
pub struct Frame {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl Frame {
    #[must_use]
    pub fn into_rgba_image(self) -> Option<image::RgbaImage> {
        image::RgbaImage::from_raw(self.width, self.height, self.pixels)
    }
}

/// User actions delivered to the driver (menu entries of the slideshow).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Pause,
    Resume,
    /// Show the configured override picture.
    Boss,
    /// Leave the override picture up, but frozen until `Resume`.
    Release,
    ShowFileName,
    /// The viewport changed size (window resize).
    Resize { width: u32, height: u32 },
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCommand(pub String);

impl fmt::Display for UnknownCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown command {:?} (expected pause, resume, boss, release, file, size <w> <h>, quit)",
            self.0
        )
    }
}

impl std::error::Error for UnknownCommand {}

impl FromStr for Command {
    type Err = UnknownCommand;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut words = s.split_whitespace();
        let command = match (words.next(), words.next(), words.next(), words.next()) {
            (Some("pause"), None, None, None) => Self::Pause,
            (Some("resume"), None, None, None) => Self::Resume,
            (Some("boss"), None, None, None) => Self::Boss,
            (Some("release"), None, None, None) => Self::Release,
            (Some("file"), None, None, None) => Self::ShowFileName,
            (Some("quit"), None, None, None) => Self::Quit,
            (Some("size"), Some(w), Some(h), None) => {
                match (w.parse::<u32>(), h.parse::<u32>()) {
                    (Ok(width), Ok(height)) if width > 0 && height > 0 => {
                        Self::Resize { width, height }
                    }
                    _ => return Err(UnknownCommand(s.trim().to_owned())),
                }
            }
            _ => return Err(UnknownCommand(s.trim().to_owned())),
        };
        Ok(command)
    }
}
