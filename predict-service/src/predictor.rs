//! Next-frame prediction
//!
//! No model exists yet. [`FramePredictor`] is the seam a real model plugs
//! into; the two implementations here are stand-ins that honour the
//! three-frames-in, one-image-out contract.

use image::{DynamicImage, Rgb, RgbImage};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::PredictError;
use crate::imaging::{self, Frames};
use crate::upload::{UploadSet, UploadSlot};

/// Placeholder output width and height in pixels.
pub const PLACEHOLDER_SIZE: u32 = 100;

/// Placeholder output colour.
pub const PLACEHOLDER_COLOR: [u8; 3] = [150, 150, 150];

/// The predicted frame.
#[derive(Debug, Clone)]
pub enum Prediction {
    /// A freshly produced image that still has to be encoded.
    Image(DynamicImage),
    /// Already PNG-encoded bytes, returned verbatim.
    Png(Vec<u8>),
}

impl Prediction {
    /// PNG bytes for the response body.
    pub fn into_png(self) -> Result<Vec<u8>, PredictError> {
        match self {
            Self::Image(image) => imaging::encode_png(&image),
            Self::Png(bytes) => Ok(bytes),
        }
    }
}

/// Produces one output frame from three input frames.
pub trait FramePredictor: Send + Sync {
    fn name(&self) -> &'static str;

    fn predict(&self, uploads: &UploadSet, frames: &Frames) -> Result<Prediction, PredictError>;
}

/// Solid gray 100x100 image regardless of input.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlaceholderPredictor;

impl FramePredictor for PlaceholderPredictor {
    fn name(&self) -> &'static str {
        "placeholder"
    }

    fn predict(&self, _uploads: &UploadSet, _frames: &Frames) -> Result<Prediction, PredictError> {
        let image = RgbImage::from_pixel(PLACEHOLDER_SIZE, PLACEHOLDER_SIZE, Rgb(PLACEHOLDER_COLOR));
        Ok(Prediction::Image(DynamicImage::ImageRgb8(image)))
    }
}

/// Returns the most recent (third) frame unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct PassThroughPredictor;

impl FramePredictor for PassThroughPredictor {
    fn name(&self) -> &'static str {
        "pass-through"
    }

    fn predict(&self, uploads: &UploadSet, frames: &Frames) -> Result<Prediction, PredictError> {
        let last = uploads.get(UploadSlot::File3);
        if imaging::is_png(&last.data) {
            Ok(Prediction::Png(last.data.to_vec()))
        } else {
            Ok(Prediction::Image(frames.get(UploadSlot::File3).clone()))
        }
    }
}

/// Which stand-in predictor the service runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PredictionMode {
    #[default]
    Placeholder,
    PassThrough,
}

impl PredictionMode {
    pub fn build(self) -> Arc<dyn FramePredictor> {
        match self {
            Self::Placeholder => Arc::new(PlaceholderPredictor),
            Self::PassThrough => Arc::new(PassThroughPredictor),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Placeholder => "placeholder",
            Self::PassThrough => "pass-through",
        }
    }
}

impl fmt::Display for PredictionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PredictionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "placeholder" | "gray" => Ok(Self::Placeholder),
            "pass-through" | "passthrough" | "last-frame" => Ok(Self::PassThrough),
            other => Err(format!(
                "unknown prediction mode '{other}', expected 'placeholder' or 'pass-through'"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upload::{Upload, UploadSetBuilder};
    use image::ImageFormat;
    use std::io::Cursor;

    fn encoded(color: [u8; 3], format: ImageFormat) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(10, 10, Rgb(color)));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, format).unwrap();
        buf.into_inner()
    }

    fn upload_set(third: Vec<u8>) -> (UploadSet, Frames) {
        let mut builder = UploadSetBuilder::default();
        builder
            .insert(Upload::new(UploadSlot::File1, encoded([255, 0, 0], ImageFormat::Png)))
            .unwrap();
        builder
            .insert(Upload::new(UploadSlot::File2, encoded([0, 255, 0], ImageFormat::Png)))
            .unwrap();
        builder.insert(Upload::new(UploadSlot::File3, third)).unwrap();
        let set = builder.finish().unwrap();
        let frames = Frames::decode(&set).unwrap();
        (set, frames)
    }

    #[test]
    fn test_placeholder_is_solid_gray() {
        let (set, frames) = upload_set(encoded([0, 0, 255], ImageFormat::Png));
        let png = PlaceholderPredictor.predict(&set, &frames).unwrap().into_png().unwrap();

        let out = image::load_from_memory(&png).unwrap().to_rgb8();
        assert_eq!(out.dimensions(), (PLACEHOLDER_SIZE, PLACEHOLDER_SIZE));
        assert!(out.pixels().all(|p| p.0 == PLACEHOLDER_COLOR));
    }

    #[test]
    fn test_pass_through_png_is_byte_identical() {
        let blue = encoded([0, 0, 255], ImageFormat::Png);
        let (set, frames) = upload_set(blue.clone());

        let png = PassThroughPredictor.predict(&set, &frames).unwrap().into_png().unwrap();
        assert_eq!(png, blue);
    }

    #[test]
    fn test_pass_through_reencodes_non_png() {
        let bmp = encoded([0, 0, 255], ImageFormat::Bmp);
        let (set, frames) = upload_set(bmp);

        let png = PassThroughPredictor.predict(&set, &frames).unwrap().into_png().unwrap();
        assert!(imaging::is_png(&png));
        let out = image::load_from_memory(&png).unwrap().to_rgb8();
        assert_eq!(out.get_pixel(0, 0), &Rgb([0, 0, 255]));
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("placeholder".parse::<PredictionMode>(), Ok(PredictionMode::Placeholder));
        assert_eq!("Pass-Through".parse::<PredictionMode>(), Ok(PredictionMode::PassThrough));
        assert!("cnn-lstm".parse::<PredictionMode>().is_err());
        assert_eq!(PredictionMode::default().build().name(), "placeholder");
        assert_eq!(PredictionMode::PassThrough.build().name(), "pass-through");
    }
}
