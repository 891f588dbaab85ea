//! A single decoded RGB frame.

use crate::error::{Result, SignstreamError};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use image::RgbImage;
use image::imageops::FilterType;

/// One decoded video frame, tightly packed RGB8.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Frame {
    /// Build a frame from raw RGB8 bytes.
    pub fn from_rgb(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * 3;
        if data.len() != expected {
            return Err(SignstreamError::FrameDecode {
                message: format!(
                    "rgb buffer is {} bytes, expected {} for {width}x{height}",
                    data.len(),
                    expected
                ),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Decode a base64 payload into a frame.
    ///
    /// Browser clients send data URLs (`data:image/jpeg;base64,...`); a bare
    /// base64 string is accepted too. The image format inside the payload is
    /// sniffed from its bytes.
    pub fn from_base64(encoded: &str) -> Result<Self> {
        let payload = match encoded.split_once(',') {
            Some((prefix, rest)) if prefix.starts_with("data:") => rest,
            _ => encoded,
        };

        let bytes = BASE64
            .decode(payload.trim())
            .map_err(|e| SignstreamError::FrameDecode {
                message: format!("invalid base64 payload: {e}"),
            })?;

        let image = image::load_from_memory(&bytes)
            .map_err(|e| SignstreamError::FrameDecode {
                message: format!("unrecognized image payload: {e}"),
            })?
            .to_rgb8();

        let (width, height) = image.dimensions();
        Ok(Self {
            width,
            height,
            data: image.into_raw(),
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Resize to the given dimensions, returning an owned image buffer.
    pub fn resized_rgb(&self, width: u32, height: u32) -> Result<RgbImage> {
        let image = RgbImage::from_raw(self.width, self.height, self.data.clone()).ok_or_else(
            || SignstreamError::FrameDecode {
                message: "frame buffer does not match its dimensions".to_string(),
            },
        )?;
        Ok(image::imageops::resize(
            &image,
            width,
            height,
            FilterType::Triangle,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Encode a tiny solid-color PNG as a base64 string.
    fn encoded_png(width: u32, height: u32) -> String {
        let image = RgbImage::from_pixel(width, height, image::Rgb([20, 40, 60]));
        let mut bytes = Vec::new();
        image
            .write_to(
                &mut std::io::Cursor::new(&mut bytes),
                image::ImageFormat::Png,
            )
            .unwrap();
        BASE64.encode(&bytes)
    }

    #[test]
    fn from_rgb_validates_buffer_length() {
        assert!(Frame::from_rgb(2, 2, vec![0u8; 12]).is_ok());
        assert!(Frame::from_rgb(2, 2, vec![0u8; 11]).is_err());
    }

    #[test]
    fn from_base64_decodes_bare_payload() {
        let frame = Frame::from_base64(&encoded_png(3, 2)).unwrap();
        assert_eq!(frame.width(), 3);
        assert_eq!(frame.height(), 2);
        assert_eq!(frame.data().len(), 3 * 2 * 3);
        assert_eq!(&frame.data()[..3], &[20, 40, 60]);
    }

    #[test]
    fn from_base64_strips_data_url_prefix() {
        let encoded = format!("data:image/png;base64,{}", encoded_png(2, 2));
        let frame = Frame::from_base64(&encoded).unwrap();
        assert_eq!(frame.width(), 2);
    }

    #[test]
    fn from_base64_rejects_invalid_payload() {
        assert!(Frame::from_base64("@@not-base64@@").is_err());
        // Valid base64 that is not an image
        assert!(Frame::from_base64(&BASE64.encode(b"hello")).is_err());
    }

    #[test]
    fn resized_rgb_produces_requested_dimensions() {
        let frame = Frame::from_rgb(4, 4, vec![128u8; 4 * 4 * 3]).unwrap();
        let resized = frame.resized_rgb(8, 8).unwrap();
        assert_eq!(resized.dimensions(), (8, 8));
    }
}
