use std::path::Path;

use tracing::info;

use crate::error::AppError;

/// Decoded source picture, RGBA8, row-major from the top-left corner.
#[derive(Debug, Clone)]
pub struct SourceImage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl SourceImage {
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let decoded = image::open(path).map_err(|source| AppError::ImageLoad {
            path: path.to_path_buf(),
            source,
        })?;
        let rgba = decoded.to_rgba8();
        let (width, height) = rgba.dimensions();
        info!(path = %path.display(), width, height, "loaded source image");

        Ok(Self {
            width,
            height,
            pixels: rgba.into_raw(),
        })
    }

    /// Panics if `pixels` is not exactly `width * height * 4` bytes.
    #[cfg(test)]
    pub(crate) fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        assert_eq!(pixels.len(), width as usize * height as usize * 4, "RGBA buffer size mismatch");
        Self { width, height, pixels }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = (y as usize * self.width as usize + x as usize) * 4;
        [self.pixels[i], self.pixels[i + 1], self.pixels[i + 2], self.pixels[i + 3]]
    }
}

/// Off-screen display surface the source image is drawn onto each frame.
/// Bytes are stored BGRA, the layout the frame texture is created with.
#[derive(Debug, Clone)]
pub struct FrameBuffer {
    width: u32,
    height: u32,
    bytes: Vec<u8>,
}

impl FrameBuffer {
    pub fn new(width: u32, height: u32) -> Self {
        let mut frame = Self {
            width,
            height,
            bytes: vec![0; width as usize * height as usize * 4],
        };
        frame.clear();
        frame
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Fill with opaque black
    pub fn clear(&mut self) {
        for px in self.bytes.chunks_exact_mut(4) {
            px.copy_from_slice(&[0, 0, 0, 255]);
        }
    }

    /// Clear, then draw `image` at the origin, clipped to the frame.
    /// Translucent source pixels are blended over the black background.
    pub fn composite(&mut self, image: &SourceImage) {
        self.clear();

        let w = self.width.min(image.width());
        let h = self.height.min(image.height());
        for y in 0..h {
            for x in 0..w {
                let [r, g, b, a] = image.pixel(x, y);
                let i = (y as usize * self.width as usize + x as usize) * 4;
                self.bytes[i..i + 4].copy_from_slice(&[
                    blend_over_black(b, a),
                    blend_over_black(g, a),
                    blend_over_black(r, a),
                    255,
                ]);
            }
        }
    }

    /// BGRA bytes of the pixel at (x, y)
    #[cfg(test)]
    pub(crate) fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = (y as usize * self.width as usize + x as usize) * 4;
        [self.bytes[i], self.bytes[i + 1], self.bytes[i + 2], self.bytes[i + 3]]
    }
}

fn blend_over_black(channel: u8, alpha: u8) -> u8 {
    ((u16::from(channel) * u16::from(alpha) + 127) / 255) as u8
}
