//! Raster decode/encode helpers

use image::{DynamicImage, ImageFormat};
use std::io::Cursor;

use crate::error::PredictError;
use crate::upload::{UploadSet, UploadSlot};

/// The three decoded frames, in slot order.
#[derive(Debug, Clone)]
pub struct Frames {
    frames: [DynamicImage; 3],
}

impl Frames {
    pub fn new(frames: [DynamicImage; 3]) -> Self {
        Self { frames }
    }

    pub fn get(&self, slot: UploadSlot) -> &DynamicImage {
        &self.frames[slot.index()]
    }

    /// Decode every upload, failing on the first slot that isn't an image.
    pub fn decode(uploads: &UploadSet) -> Result<Self, PredictError> {
        let [a, b, c] = UploadSlot::ALL.map(|slot| decode_frame(slot, &uploads.get(slot).data));
        Ok(Self::new([a?, b?, c?]))
    }
}

/// Sniff the format from the payload and decode it. The client's file name
/// and declared content type are ignored.
pub fn decode_frame(slot: UploadSlot, data: &[u8]) -> Result<DynamicImage, PredictError> {
    image::load_from_memory(data).map_err(|e| PredictError::UndecodableImage {
        slot,
        reason: e.to_string(),
    })
}

pub fn is_png(data: &[u8]) -> bool {
    matches!(image::guess_format(data), Ok(ImageFormat::Png))
}

/// Encode an image as PNG into memory.
pub fn encode_png(image: &DynamicImage) -> Result<Vec<u8>, PredictError> {
    let mut buf = Cursor::new(Vec::new());
    image.write_to(&mut buf, ImageFormat::Png)?;
    Ok(buf.into_inner())
}
