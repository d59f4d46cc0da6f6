use crate::config::Config;
use crate::error::Result;
use crate::render::Rendered;
use image::{Rgb, RgbImage};
use rand::Rng;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// Dark gradient color pairs (top, bottom), cycled by quote index.
pub const COLOR_PAIRS: [([u8; 3], [u8; 3]); 9] = [
    ([120, 0, 0], [40, 0, 0]),    // dark red
    ([0, 0, 120], [0, 0, 40]),    // dark blue
    ([80, 0, 100], [30, 0, 40]),  // dark purple
    ([0, 80, 80], [0, 30, 30]),   // dark teal
    ([100, 80, 0], [40, 30, 0]),  // dark amber
    ([80, 80, 80], [30, 30, 30]), // dark gray
    ([0, 100, 0], [0, 40, 0]),    // dark green
    ([100, 0, 100], [40, 0, 40]), // dark magenta
    ([100, 50, 0], [40, 20, 0]),  // dark orange
];

const TEXTURE_BLOTCHES: usize = 100;

/// Palette selection is deterministic in the quote index.
pub fn palette_pair(index: usize) -> ([u8; 3], [u8; 3]) {
    COLOR_PAIRS[index % COLOR_PAIRS.len()]
}

pub struct BackgroundRenderer<'a> {
    cfg: &'a Config,
}

impl<'a> BackgroundRenderer<'a> {
    pub fn new(cfg: &'a Config) -> Self {
        Self { cfg }
    }

    /// Render the background for one quote index. Always leaves a usable
    /// image file behind: texture failures keep the plain gradient, and
    /// total failure degrades to a flat black placeholder.
    pub fn render(&self, index: usize) -> Rendered {
        let path = self
            .cfg
            .images_dir
            .join(format!("background_{}.png", index + 1));

        match self.render_gradient(index, &path) {
            Ok(()) => {
                if let Err(e) = self.splatter_texture(&path) {
                    warn!("Error adding texture: {}, using basic gradient", e);
                }
                if self.validate(&path) {
                    info!("Created background image {} at {}", index + 1, path.display());
                    Rendered::Full(path)
                } else {
                    self.black_placeholder(path)
                }
            }
            Err(e) => {
                warn!("Error generating background image: {}", e);
                self.black_placeholder(path)
            }
        }
    }

    fn render_gradient(&self, index: usize, path: &Path) -> Result<()> {
        let (top, bottom) = palette_pair(index);
        info!("Using color gradient: {:?} to {:?}", top, bottom);

        let (width, height) = (self.cfg.width, self.cfg.height);
        let mut img = RgbImage::new(width, height);
        for y in 0..height {
            let t = y as f32 / height as f32;
            let row = Rgb([
                lerp(top[0], bottom[0], t),
                lerp(top[1], bottom[1], t),
                lerp(top[2], bottom[2], t),
            ]);
            for x in 0..width {
                img.put_pixel(x, y, row);
            }
        }
        img.save(path)?;
        Ok(())
    }

    /// Overlay randomized semi-transparent dark blotches on the saved
    /// gradient. Placement, size, and opacity jitter; the palette does not.
    fn splatter_texture(&self, path: &Path) -> Result<()> {
        let mut img = image::open(path)?.to_rgb8();
        let mut rng = rand::thread_rng();
        let (width, height) = (self.cfg.width as i32, self.cfg.height as i32);

        for _ in 0..TEXTURE_BLOTCHES {
            let cx = rng.gen_range(0..=width);
            let cy = rng.gen_range(0..=height);
            let radius = rng.gen_range(5..=100);
            let alpha = rng.gen_range(0..=50) as f32 / 255.0;
            fill_circle(&mut img, cx, cy, radius, alpha);
        }

        img.save(path)?;
        Ok(())
    }

    fn validate(&self, path: &Path) -> bool {
        let size = match fs::metadata(path) {
            Ok(meta) => meta.len(),
            Err(e) => {
                warn!("Background image missing after save: {}", e);
                return false;
            }
        };
        if size == 0 {
            warn!("Background image is empty: {}", path.display());
            return false;
        }
        if size < self.cfg.min_image_bytes {
            warn!(
                "Background file is suspiciously small: {} bytes",
                size
            );
            return !self.cfg.strict_image_check;
        }
        true
    }

    fn black_placeholder(&self, path: PathBuf) -> Rendered {
        let img = RgbImage::new(self.cfg.width, self.cfg.height);
        if let Err(e) = img.save(&path) {
            error!("Failed to write placeholder background: {}", e);
        } else {
            info!("Created black placeholder image instead");
        }
        Rendered::Fallback(path)
    }
}

fn lerp(a: u8, b: u8, t: f32) -> u8 {
    (a as f32 + (b as f32 - a as f32) * t) as u8
}

/// Multiplicative darken of a filled circle; `alpha` is the blotch opacity.
fn fill_circle(img: &mut RgbImage, cx: i32, cy: i32, radius: i32, alpha: f32) {
    let (width, height) = (img.width() as i32, img.height() as i32);
    let r2 = radius * radius;
    for y in (cy - radius).max(0)..=(cy + radius).min(height - 1) {
        for x in (cx - radius).max(0)..=(cx + radius).min(width - 1) {
            let (dx, dy) = (x - cx, y - cy);
            if dx * dx + dy * dy <= r2 {
                let pixel = img.get_pixel_mut(x as u32, y as u32);
                for channel in pixel.0.iter_mut() {
                    *channel = (*channel as f32 * (1.0 - alpha)) as u8;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn palette_cycles_with_period_nine() {
        assert_eq!(palette_pair(0), COLOR_PAIRS[0]);
        assert_eq!(palette_pair(8), COLOR_PAIRS[8]);
        assert_eq!(palette_pair(9), COLOR_PAIRS[0]);
        assert_eq!(palette_pair(20), COLOR_PAIRS[2]);
    }

    #[test]
    fn render_always_leaves_a_decodable_image() {
        let tmp = tempdir().unwrap();
        let cfg = Config {
            images_dir: tmp.path().to_path_buf(),
            // small raster keeps the test fast
            width: 108,
            height: 192,
            ..Config::default()
        };

        let rendered = BackgroundRenderer::new(&cfg).render(0);
        let path = rendered.path();
        assert!(path.exists());
        assert!(fs::metadata(path).unwrap().len() > 0);

        let img = image::open(path).unwrap().to_rgb8();
        assert_eq!(img.dimensions(), (108, 192));
    }

    #[test]
    fn gradient_interpolates_between_pair_colors() {
        let tmp = tempdir().unwrap();
        let cfg = Config {
            images_dir: tmp.path().to_path_buf(),
            width: 32,
            height: 64,
            ..Config::default()
        };

        let renderer = BackgroundRenderer::new(&cfg);
        let path = tmp.path().join("gradient.png");
        renderer.render_gradient(1, &path).unwrap();

        let img = image::open(&path).unwrap().to_rgb8();
        let (top, bottom) = palette_pair(1);
        assert_eq!(img.get_pixel(0, 0).0, top);
        let last = img.get_pixel(0, 63).0;
        // bottom row is one lerp step above the exact bottom color
        assert!(last[2] >= bottom[2] && last[2] <= top[2]);
    }

    #[test]
    fn fill_circle_darkens_inside_only() {
        let mut img = RgbImage::from_pixel(21, 21, Rgb([100, 100, 100]));
        fill_circle(&mut img, 10, 10, 5, 0.5);
        assert_eq!(img.get_pixel(10, 10).0, [50, 50, 50]);
        assert_eq!(img.get_pixel(0, 0).0, [100, 100, 100]);
    }
}
