//! Where images come from when running from the command line.

use std::fs;
use std::io::{self, Read};
use std::path::Path;

use image::ImageFormat;
use tracing::warn;

use crate::error::DetectionError;

/// Path that reads from standard input.
pub const STDIN: &str = "-";

/// Read a whole PNG or JPEG image into memory.
pub fn read_image(path: Option<&str>) -> Result<Vec<u8>, DetectionError> {
    let path = path.ok_or(DetectionError::NoImageSpecified)?;
    if path.trim().is_empty() {
        return Err(DetectionError::BadInput);
    }

    let bytes = if path == STDIN {
        let mut bytes = Vec::new();
        io::stdin().read_to_end(&mut bytes).map_err(|e| {
            warn!("cannot read stdin: {e}");
            DetectionError::CantReadImage
        })?;
        bytes
    } else {
        fs::read(Path::new(path)).map_err(|e| {
            warn!("cannot read {path}: {e}");
            DetectionError::CantReadImage
        })?
    };

    check_image(&bytes)?;
    Ok(bytes)
}

/// Reject anything that does not look like a PNG or a JPEG.
pub fn check_image(bytes: &[u8]) -> Result<(), DetectionError> {
    if bytes.is_empty() {
        return Err(DetectionError::NoImageSpecified);
    }

    match image::guess_format(bytes) {
        Ok(ImageFormat::Png) | Ok(ImageFormat::Jpeg) => Ok(()),
        _ => Err(DetectionError::ImageTypeNotSupported),
    }
}
