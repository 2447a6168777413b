//! Headless display surface that keeps the latest frame as a PNG file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use image::ImageFormat;
use tracing::info;

use crate::config::DEFAULT_TITLE;
use crate::driver::DisplaySurface;
use crate::events::{Command, Frame};
use crate::rotation::RotationState;

#[derive(Debug)]
pub struct PngSurface {
    output: PathBuf,
    title: String,
    width: u32,
    height: u32,
    last: Option<PathBuf>,
}

impl PngSurface {
    #[must_use]
    pub fn new(output: PathBuf, width: u32, height: u32) -> Self {
        Self {
            output,
            title: DEFAULT_TITLE.to_owned(),
            width,
            height,
            last: None,
        }
    }

    /// Label used when talking to the user, like a window title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Source path of the most recently presented frame.
    #[must_use]
    pub fn last_presented(&self) -> Option<&Path> {
        self.last.as_deref()
    }
}

impl DisplaySurface for PngSurface {
    fn viewport_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn present(&mut self, frame: Frame) -> Result<()> {
        let source = frame.path.clone();
        let img = frame
            .into_rgba_image()
            .ok_or_else(|| anyhow!("frame buffer does not match its dimensions"))?;

        // Write next to the target and rename so readers never see a partial file.
        let mut tmp = self.output.clone().into_os_string();
        tmp.push(".partial");
        let tmp = PathBuf::from(tmp);
        img.save_with_format(&tmp, ImageFormat::Png)
            .with_context(|| format!("failed to write {}", tmp.display()))?;
        std::fs::rename(&tmp, &self.output)
            .with_context(|| format!("failed to replace {}", self.output.display()))?;

        info!(
            path = %source.display(),
            width = img.width(),
            height = img.height(),
            "presented"
        );
        self.last = Some(source);
        Ok(())
    }

    fn show_file_name(&mut self, path: &Path) {
        println!("[{}] Filename: {}", self.title, path.display());
    }

    fn command_ignored(&mut self, command: &Command, state: RotationState) {
        println!("[{}] {command:?} is not available while {state:?}", self.title);
    }

    fn resize(&mut self, width: u32, height: u32) {
        info!(width, height, "viewport resized");
        self.width = width;
        self.height = height;
    }
}
