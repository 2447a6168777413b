use std::path::PathBuf;

use thiserror::Error;

/// Library error type for picture-flipper operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The catalog walk completed but no file matched the configured extensions.
    #[error("no images found in configured directories")]
    EmptyCatalog,

    /// A selected file could not be opened or decoded as an image.
    #[error("failed to load image {}: {source}", path.display())]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// A render was requested for a viewport with a zero dimension.
    #[error("viewport must be non-empty, got {width}x{height}")]
    EmptyViewport { width: u32, height: u32 },

    #[error(transparent)]
    Resize(#[from] fast_image_resize::ResizeError),

    #[error(transparent)]
    ResizeBuffer(#[from] fast_image_resize::ImageBufferError),

    /// Presentation error from the display surface.
    #[error("present error: {0}")]
    Present(anyhow::Error),
}
