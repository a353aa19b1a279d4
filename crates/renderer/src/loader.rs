use std::path::{Path, PathBuf};

use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageDecoder, ImageError, ImageReader, Rgba, RgbaImage};

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to decode {path}")]
    Decode {
        path: PathBuf,
        #[source]
        source: ImageError,
    },
    #[error("unsupported image format at {path}")]
    Unsupported { path: PathBuf },
}

impl LoadError {
    fn from_image_error(path: &Path, source: ImageError) -> Self {
        match source {
            ImageError::Unsupported(_) => Self::Unsupported {
                path: path.to_path_buf(),
            },
            source => Self::Decode {
                path: path.to_path_buf(),
                source,
            },
        }
    }
}

/// A decoded photo letterboxed onto the canvas: tightly packed RGBA8,
/// exactly `width * height * 4` bytes, bottom row first to match the
/// shader's bottom-left UV origin.
#[derive(Debug, Clone)]
pub struct CanvasImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl CanvasImage {
    /// All-black canvas, used when a slot must be filled but no photo
    /// decoded (e.g. re-staging after a resize fails).
    pub fn black(width: u32, height: u32) -> Self {
        let canvas = RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 255]));
        Self {
            width,
            height,
            pixels: canvas.into_raw(),
        }
    }
}

/// Decodes photos and composes them onto a fixed-size canvas: EXIF
/// orientation applied, aspect-preserving Lanczos3 resize, centred on
/// black letterbox bars.
#[derive(Debug, Clone)]
pub struct ImageLoader {
    canvas_width: u32,
    canvas_height: u32,
}

impl ImageLoader {
    pub fn new(canvas_width: u32, canvas_height: u32) -> Self {
        Self {
            canvas_width: canvas_width.max(1),
            canvas_height: canvas_height.max(1),
        }
    }

    pub fn set_canvas(&mut self, width: u32, height: u32) {
        self.canvas_width = width.max(1);
        self.canvas_height = height.max(1);
    }

    pub fn load(&self, path: &Path) -> Result<CanvasImage, LoadError> {
        let reader = ImageReader::open(path)
            .and_then(|reader| reader.with_guessed_format())
            .map_err(|source| LoadError::Decode {
                path: path.to_path_buf(),
                source: ImageError::IoError(source),
            })?;
        let mut decoder = reader
            .into_decoder()
            .map_err(|source| LoadError::from_image_error(path, source))?;
        let orientation = decoder
            .orientation()
            .map_err(|source| LoadError::from_image_error(path, source))?;
        let mut photo = DynamicImage::from_decoder(decoder)
            .map_err(|source| LoadError::from_image_error(path, source))?;
        photo.apply_orientation(orientation);
        Ok(self.compose(photo))
    }

    fn compose(&self, photo: DynamicImage) -> CanvasImage {
        // `resize` fits inside the canvas preserving aspect, upscaling
        // small photos as well.
        let fitted = photo.resize(self.canvas_width, self.canvas_height, FilterType::Lanczos3);
        let mut canvas = RgbaImage::from_pixel(
            self.canvas_width,
            self.canvas_height,
            Rgba([0, 0, 0, 255]),
        );
        let offset_x = i64::from((self.canvas_width - fitted.width()) / 2);
        let offset_y = i64::from((self.canvas_height - fitted.height()) / 2);
        imageops::overlay(&mut canvas, &fitted.to_rgba8(), offset_x, offset_y);
        imageops::flip_vertical_in_place(&mut canvas);
        CanvasImage {
            width: self.canvas_width,
            height: self.canvas_height,
            pixels: canvas.into_raw(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(width: u32, height: u32, rgba: [u8; 4]) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, Rgba(rgba)))
    }

    fn pixel(image: &CanvasImage, x: u32, y: u32) -> [u8; 4] {
        let index = ((y * image.width + x) * 4) as usize;
        image.pixels[index..index + 4].try_into().unwrap()
    }

    #[test]
    fn portrait_photo_gets_side_letterbox_bars() {
        let loader = ImageLoader::new(100, 100);
        let composed = loader.compose(solid(10, 20, [255, 0, 0, 255]));
        assert_eq!(composed.width, 100);
        assert_eq!(composed.height, 100);
        assert_eq!(composed.pixels.len(), 100 * 100 * 4);

        // 10x20 fits 100x100 as 50x100: bars on the left and right.
        assert_eq!(pixel(&composed, 0, 50), [0, 0, 0, 255]);
        assert_eq!(pixel(&composed, 99, 50), [0, 0, 0, 255]);
        assert_eq!(pixel(&composed, 50, 50), [255, 0, 0, 255]);
    }

    #[test]
    fn landscape_photo_gets_top_and_bottom_bars() {
        let loader = ImageLoader::new(100, 100);
        let composed = loader.compose(solid(40, 10, [0, 255, 0, 255]));
        // 40x10 fits as 100x25: bars above and below.
        assert_eq!(pixel(&composed, 50, 0), [0, 0, 0, 255]);
        assert_eq!(pixel(&composed, 50, 99), [0, 0, 0, 255]);
        assert_eq!(pixel(&composed, 50, 50), [0, 255, 0, 255]);
    }

    #[test]
    fn output_rows_are_flipped_for_bottom_left_origin() {
        let mut source = RgbaImage::from_pixel(4, 4, Rgba([0, 0, 255, 255]));
        for x in 0..4 {
            source.put_pixel(x, 0, Rgba([255, 255, 255, 255]));
        }
        let loader = ImageLoader::new(4, 4);
        let composed = loader.compose(DynamicImage::ImageRgba8(source));
        // The source's top row ends up in the last stored row.
        assert_eq!(pixel(&composed, 0, 3), [255, 255, 255, 255]);
        assert_eq!(pixel(&composed, 0, 0), [0, 0, 255, 255]);
    }

    #[test]
    fn small_photo_is_upscaled_to_fill() {
        let loader = ImageLoader::new(64, 64);
        let composed = loader.compose(solid(2, 2, [10, 20, 30, 255]));
        assert_eq!(pixel(&composed, 32, 32), [10, 20, 30, 255]);
        assert_eq!(pixel(&composed, 0, 0), [10, 20, 30, 255]);
    }

    #[test]
    fn missing_file_is_a_decode_error() {
        let loader = ImageLoader::new(16, 16);
        let err = loader.load(Path::new("/nonexistent/photo.jpg")).unwrap_err();
        assert!(matches!(err, LoadError::Decode { .. }));
    }

    #[test]
    fn garbage_bytes_are_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("junk.png");
        std::fs::write(&path, b"this is not a png").unwrap();
        let loader = ImageLoader::new(16, 16);
        assert!(loader.load(&path).is_err());
    }

    #[test]
    fn valid_png_round_trips_through_the_loader() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("dot.png");
        RgbaImage::from_pixel(8, 8, Rgba([200, 100, 50, 255]))
            .save(&path)
            .expect("write test png");
        let loader = ImageLoader::new(8, 8);
        let composed = loader.load(&path).expect("decode");
        assert_eq!(composed.width, 8);
        assert_eq!(composed.height, 8);
        assert_eq!(pixel(&composed, 4, 4), [200, 100, 50, 255]);
    }
}
