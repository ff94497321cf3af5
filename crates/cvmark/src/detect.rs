//! Recognition on `image` crate buffers.

use crate::core::{self, Bitmap};
use crate::recognize::RecognizeError;

pub use crate::recognize::{RecognizeOutput, Recognizer, RecognizerParams};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Errors produced by the facade helpers.
#[derive(thiserror::Error, Debug)]
pub enum DetectError {
    #[error("invalid RGBA image buffer length (expected {expected} bytes, got {got})")]
    InvalidRgbaBuffer { expected: usize, got: usize },

    #[error("invalid image dimensions (width={width}, height={height})")]
    InvalidDimensions { width: u32, height: u32 },

    #[error(transparent)]
    Recognize(#[from] RecognizeError),
}

/// Borrow an `image::RgbaImage` as a [`core::RgbaImageView`].
pub fn rgba_view(img: &::image::RgbaImage) -> core::RgbaImageView<'_> {
    core::RgbaImageView {
        width: img.width() as usize,
        height: img.height() as usize,
        data: img.as_raw(),
    }
}

/// Borrow an `image::GrayImage` as a [`core::GrayImageView`].
pub fn gray_view(img: &::image::GrayImage) -> core::GrayImageView<'_> {
    core::GrayImageView {
        width: img.width() as usize,
        height: img.height() as usize,
        data: img.as_raw(),
    }
}

/// Copy a [`core::RgbaImage`] into an `image::RgbaImage`.
pub fn to_image(img: &core::RgbaImage) -> Result<::image::RgbaImage, DetectError> {
    let (width, height) = dims(img.width, img.height)?;
    ::image::RgbaImage::from_raw(width, height, img.data.clone()).ok_or(
        DetectError::InvalidRgbaBuffer {
            expected: img.width * img.height * 4,
            got: img.data.len(),
        },
    )
}

fn dims(width: usize, height: usize) -> Result<(u32, u32), DetectError> {
    match (u32::try_from(width), u32::try_from(height)) {
        (Ok(w), Ok(h)) => Ok((w, h)),
        _ => Err(DetectError::InvalidDimensions {
            width: u32::try_from(width).unwrap_or(u32::MAX),
            height: u32::try_from(height).unwrap_or(u32::MAX),
        }),
    }
}

/// Run the recognizer on an `image::RgbaImage`.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip(img, params), fields(width = img.width(), height = img.height()))
)]
pub fn recognize_image(
    img: &::image::RgbaImage,
    params: RecognizerParams,
) -> Result<RecognizeOutput, DetectError> {
    let recognizer = Recognizer::new(params)?;
    Ok(recognizer.recognize(&rgba_view(img))?)
}

/// Run the recognizer on an 8-bit grayscale image.
pub fn recognize_gray(
    img: &::image::GrayImage,
    params: RecognizerParams,
) -> Result<RecognizeOutput, DetectError> {
    let recognizer = Recognizer::new(params)?;
    Ok(recognizer.recognize(&gray_view(img))?)
}

/// Run the recognizer on any decoded image, converting it to RGBA8 first.
pub fn recognize_dynamic(
    img: &::image::DynamicImage,
    params: RecognizerParams,
) -> Result<RecognizeOutput, DetectError> {
    recognize_image(&img.to_rgba8(), params)
}

/// Run the recognizer on a raw row-major RGBA8 buffer.
pub fn recognize_rgba(
    width: u32,
    height: u32,
    data: &[u8],
    params: RecognizerParams,
) -> Result<RecognizeOutput, DetectError> {
    let view = rgba_buffer_view(width, height, data)?;
    let recognizer = Recognizer::new(params)?;
    log::debug!("recognizing {}x{} buffer", view.width(), view.height());
    Ok(recognizer.recognize(&view)?)
}

fn rgba_buffer_view(width: u32, height: u32, data: &[u8]) -> Result<core::RgbaImageView<'_>, DetectError> {
    if width == 0 || height == 0 {
        return Err(DetectError::InvalidDimensions { width, height });
    }
    let expected = (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(4))
        .ok_or(DetectError::InvalidDimensions { width, height })?;
    if data.len() != expected {
        return Err(DetectError::InvalidRgbaBuffer {
            expected,
            got: data.len(),
        });
    }
    Ok(core::RgbaImageView {
        width: width as usize,
        height: height as usize,
        data,
    })
}
