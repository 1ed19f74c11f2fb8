use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
#[error("failed to load image {path}: {source}")]
pub struct ImageLoadError {
    pub path: PathBuf,
    #[source]
    pub source: image::ImageError,
}

/// Tightly packed 8-bit RGBA pixels, top row first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbaImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl RgbaImage {
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let pixels = rgba
            .iter()
            .copied()
            .cycle()
            .take((width * height * 4) as usize)
            .collect();
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Decode an image file (PNG) into RGBA.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ImageLoadError> {
        let path = path.as_ref();
        let decoded = image::open(path).map_err(|source| ImageLoadError {
            path: path.to_path_buf(),
            source,
        })?;
        let rgba = decoded.to_rgba8();
        let (width, height) = rgba.dimensions();
        tracing::debug!(path = %path.display(), width, height, "decoded image");
        Ok(Self {
            width,
            height,
            pixels: rgba.into_raw(),
        })
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = ((y * self.width + x) * 4) as usize;
        [
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ]
    }

    fn set(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        let i = ((y * self.width + x) * 4) as usize;
        self.pixels[i..i + 4].copy_from_slice(&rgba);
    }

    /// Fill every pixel for which `inside(u, v)` holds; `u`, `v` are the
    /// pixel center in `[-1, 1]`, `v` pointing up.
    fn paint(&mut self, rgba: [u8; 4], inside: impl Fn(f32, f32) -> bool) {
        for y in 0..self.height {
            for x in 0..self.width {
                let u = (x as f32 + 0.5) / self.width as f32 * 2.0 - 1.0;
                let v = 1.0 - (y as f32 + 0.5) / self.height as f32 * 2.0;
                if inside(u, v) {
                    self.set(x, y, rgba);
                }
            }
        }
    }

    /// Red apple with a green leaf on a transparent background.
    pub fn fruit_sprite(size: u32) -> Self {
        let mut img = Self::filled(size, size, [0, 0, 0, 0]);
        img.paint([220, 40, 40, 255], |u, v| u * u + (v + 0.1) * (v + 0.1) <= 0.75);
        img.paint([60, 180, 60, 255], |u, v| {
            let (du, dv) = (u - 0.25, v - 0.75);
            du * du * 4.0 + dv * dv * 16.0 <= 0.25
        });
        img
    }

    /// Rounded green head facing north (+v), with two eyes.
    pub fn head_sprite(size: u32) -> Self {
        let mut img = Self::filled(size, size, [0, 0, 0, 0]);
        img.paint([40, 200, 90, 255], |u, v| {
            let (du, dv) = ((u.abs() - 0.6).max(0.0), (v.abs() - 0.6).max(0.0));
            du * du + dv * dv <= 0.16
        });
        for cx in [-0.4f32, 0.4] {
            img.paint([255, 255, 255, 255], move |u, v| {
                (u - cx).powi(2) + (v - 0.45).powi(2) <= 0.04
            });
            img.paint([10, 10, 10, 255], move |u, v| {
                (u - cx).powi(2) + (v - 0.55).powi(2) <= 0.01
            });
        }
        img
    }

    /// Two-colour checkerboard with `cells` squares per side.
    pub fn checker(size: u32, cells: u32) -> Self {
        let mut img = Self::filled(size, size, [230, 230, 230, 255]);
        let cell = (size / cells.max(1)).max(1);
        for y in 0..size {
            for x in 0..size {
                if ((x / cell) + (y / cell)) % 2 == 1 {
                    img.set(x, y, [90, 90, 200, 255]);
                }
            }
        }
        img
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filled_has_expected_size() {
        let img = RgbaImage::filled(3, 2, [1, 2, 3, 4]);
        assert_eq!(img.pixels.len(), 24);
        assert_eq!(img.pixel(2, 1), [1, 2, 3, 4]);
    }

    #[test]
    fn fruit_is_opaque_center_transparent_corner() {
        let img = RgbaImage::fruit_sprite(32);
        assert_eq!(img.pixel(16, 18)[3], 255);
        assert_eq!(img.pixel(0, 0)[3], 0);
    }

    #[test]
    fn head_eyes_sit_in_upper_half() {
        let img = RgbaImage::head_sprite(64);
        // left eye pupil around u=-0.4, v=0.55
        let x = ((-0.4f32 + 1.0) / 2.0 * 64.0) as u32;
        let y = ((1.0 - 0.55f32) / 2.0 * 64.0) as u32;
        assert_eq!(img.pixel(x, y), [10, 10, 10, 255]);
        assert_eq!(img.pixel(32, 60)[1], 200);
    }

    #[test]
    fn checker_alternates() {
        let img = RgbaImage::checker(8, 2);
        assert_ne!(img.pixel(0, 0), img.pixel(4, 0));
        assert_eq!(img.pixel(0, 0), img.pixel(4, 4));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = RgbaImage::open("/definitely/not/here.png").unwrap_err();
        assert!(err.to_string().contains("not/here.png"));
    }
}
