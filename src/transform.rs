//! Decoding, orientation correction and aspect-fit scaling of one picture.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use fast_image_resize as fir;
use image::{ImageError, ImageReader, RgbaImage, imageops};
use tracing::debug;

use crate::error::Error;
use crate::events::Frame;

/// EXIF orientation, named by the correction needed to show the picture upright.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Upright,
    FlipHorizontal,
    Rotate180,
    FlipVertical,
    Transpose,
    Rotate90,
    Transverse,
    Rotate270,
}

impl Orientation {
    /// Map the raw EXIF `Orientation` value. Out-of-range values yield `None`.
    #[must_use]
    pub fn from_exif(value: u32) -> Option<Self> {
        let orientation = match value {
            1 => Self::Upright,
            2 => Self::FlipHorizontal,
            3 => Self::Rotate180,
            4 => Self::FlipVertical,
            5 => Self::Transpose,
            6 => Self::Rotate90,
            7 => Self::Transverse,
            8 => Self::Rotate270,
            _ => return None,
        };
        Some(orientation)
    }

    /// Apply the correction. Quarter turns swap width and height.
    #[must_use]
    pub fn apply(self, img: RgbaImage) -> RgbaImage {
        match self {
            Self::Upright => img,
            Self::FlipHorizontal => imageops::flip_horizontal(&img),
            Self::Rotate180 => imageops::rotate180(&img),
            Self::FlipVertical => imageops::flip_vertical(&img),
            // rotate90 + flip_horizontal
            Self::Transpose => imageops::flip_horizontal(&imageops::rotate90(&img)),
            // clockwise
            Self::Rotate90 => imageops::rotate90(&img),
            // rotate270 + flip_horizontal
            Self::Transverse => imageops::flip_horizontal(&imageops::rotate270(&img)),
            Self::Rotate270 => imageops::rotate270(&img),
        }
    }
}

/// Best-effort read of the primary image's EXIF orientation.
///
/// Missing files, containers without EXIF and corrupt tags all yield `None`.
#[must_use]
pub fn read_orientation(path: &Path) -> Option<Orientation> {
    let file = File::open(path).ok()?;
    let mut buf = BufReader::new(file);
    let exif = exif::Reader::new().read_from_container(&mut buf).ok()?;
    let field = exif.get_field(exif::Tag::Orientation, exif::In::PRIMARY)?;
    let raw = field.value.get_uint(0)?;
    debug!(path = %path.display(), orientation = raw, "exif orientation");
    Orientation::from_exif(raw)
}

/// Output size that fills one viewport axis while keeping the source aspect.
///
/// Landscape sources (wider than tall) take the viewport width; square and
/// portrait sources take the viewport height. The other axis follows the same
/// scale factor and may overflow the viewport when the viewport's own aspect
/// differs from the source's.
#[must_use]
pub fn fit_size(src_w: u32, src_h: u32, viewport_w: u32, viewport_h: u32) -> (u32, u32) {
    let w = f64::from(src_w.max(1));
    let h = f64::from(src_h.max(1));
    if w / h > 1.0 {
        let scaled = (h * f64::from(viewport_w) / w).round().max(1.0);
        (viewport_w, scaled as u32)
    } else {
        let scaled = (w * f64::from(viewport_h) / h).round().max(1.0);
        (scaled as u32, viewport_h)
    }
}

/// Decode `path`, orient it upright and scale it to fit the viewport.
///
/// Every call goes back to disk.
///
/// # Errors
/// [`Error::EmptyViewport`] for a zero dimension, [`Error::ImageLoad`] when the
/// file cannot be opened or decoded. Orientation metadata problems are not errors.
pub fn render(path: &Path, viewport_width: u32, viewport_height: u32) -> Result<Frame, Error> {
    if viewport_width == 0 || viewport_height == 0 {
        return Err(Error::EmptyViewport {
            width: viewport_width,
            height: viewport_height,
        });
    }

    let img = decode_rgba8(path).map_err(|source| Error::ImageLoad {
        path: path.to_path_buf(),
        source,
    })?;
    let img = match read_orientation(path) {
        Some(orientation) => orientation.apply(img),
        None => img,
    };

    let (width, height) = fit_size(img.width(), img.height(), viewport_width, viewport_height);
    let scaled = resize_rgba(&img, width, height)?;
    debug!(
        path = %path.display(),
        source_w = img.width(),
        source_h = img.height(),
        width,
        height,
        "rendered"
    );
    Ok(Frame {
        path: path.to_path_buf(),
        width,
        height,
        pixels: scaled.into_raw(),
    })
}

fn decode_rgba8(path: &Path) -> Result<RgbaImage, ImageError> {
    let img = ImageReader::open(path)
        .map_err(ImageError::IoError)?
        .with_guessed_format() // sniff based on content/extension
        .map_err(ImageError::IoError)?
        .decode()?;
    Ok(img.to_rgba8())
}

fn resize_rgba(source: &RgbaImage, target_w: u32, target_h: u32) -> Result<RgbaImage, Error> {
    if source.width() == target_w && source.height() == target_h {
        return Ok(source.clone());
    }

    let src_view = fir::images::ImageRef::new(
        source.width(),
        source.height(),
        source.as_raw(),
        fir::PixelType::U8x4,
    )?;
    let mut dst_image = fir::images::Image::new(target_w, target_h, fir::PixelType::U8x4);
    let options =
        fir::ResizeOptions::new().resize_alg(fir::ResizeAlg::Convolution(fir::FilterType::Lanczos3));
    let mut resizer = fir::Resizer::new();
    resizer.resize(&src_view, &mut dst_image, Some(&options))?;
    RgbaImage::from_raw(target_w, target_h, dst_image.into_vec())
        .ok_or(Error::ResizeBuffer(fir::ImageBufferError::InvalidBufferSize))
}
