use crate::config::Config;
use crate::error::{PipelineError, Result};
use crate::quote::{self, ParsedQuote};
use crate::render::{font, Rendered};
use image::imageops::FilterType;
use image::RgbImage;
use rusttype::{Font, Scale};
use std::path::Path;
use tracing::{error, info, warn};

const WHITE: [u8; 3] = [255, 255, 255];

/// Contrast overlay strength, matching an alpha-100 black layer.
const OVERLAY_ALPHA: f32 = 100.0 / 255.0;

/// Character budget for wrapping the error message on a fallback frame.
const ERROR_WRAP_BUDGET: usize = 40;

/// Burns parsed quotes into background images. The typeface is resolved
/// once at construction.
pub struct FrameComposer<'a> {
    cfg: &'a Config,
    font: Option<Font<'static>>,
}

impl<'a> FrameComposer<'a> {
    pub fn new(cfg: &'a Config) -> Self {
        Self {
            cfg,
            font: font::load_font(),
        }
    }

    /// Compose the frame for one quote. Never skips a frame: any
    /// composition error degrades to a black frame carrying the message.
    pub fn compose(&self, background: &Path, raw_quote: &str, index: usize) -> Rendered {
        let path = self.cfg.frames_dir.join(format!("frame_{}.png", index + 1));
        match self.compose_inner(background, raw_quote, &path) {
            Ok(()) => {
                info!("Created frame {}", index + 1);
                Rendered::Full(path)
            }
            Err(e) => {
                warn!("Error creating frame {}: {}", index + 1, e);
                self.error_frame(&path, &e.to_string())
            }
        }
    }

    fn compose_inner(&self, background: &Path, raw_quote: &str, path: &Path) -> Result<()> {
        let ParsedQuote { text, title } = quote::parse(raw_quote);

        let mut img = self.load_background(background);
        darken(&mut img, OVERLAY_ALPHA);

        let font = self
            .font
            .as_ref()
            .ok_or_else(|| PipelineError::Render("no usable font found".to_string()))?;

        let quote_scale = Scale::uniform(self.cfg.quote_font_size);
        let mut y = (self.cfg.height / 4) as i32;
        for line in wrap_words(&text, self.cfg.max_chars_per_line) {
            let line_width = font::text_width(font, quote_scale, &line);
            let x = ((self.cfg.width as f32 - line_width) / 2.0) as i32;
            font::draw_text(&mut img, font, quote_scale, x, y, &line, WHITE);
            y += self.cfg.line_pitch as i32;
        }

        let title_scale = Scale::uniform(self.cfg.title_font_size);
        let title_line = format!("- {}", title);
        let title_width = font::text_width(font, title_scale, &title_line);
        let x = ((self.cfg.width as f32 - title_width) / 2.0) as i32;
        let y = (self.cfg.height * 3 / 4) as i32;
        font::draw_text(&mut img, font, title_scale, x, y, &title_line, WHITE);

        img.save(path)?;
        Ok(())
    }

    /// Load and normalize the background raster; a load failure falls
    /// back to a solid black base so the text still goes out.
    fn load_background(&self, path: &Path) -> RgbImage {
        match image::open(path) {
            Ok(img) => {
                let rgb = img.to_rgb8();
                if rgb.dimensions() == (self.cfg.width, self.cfg.height) {
                    rgb
                } else {
                    image::imageops::resize(
                        &rgb,
                        self.cfg.width,
                        self.cfg.height,
                        FilterType::Lanczos3,
                    )
                }
            }
            Err(e) => {
                warn!("Background error: {}. Using plain black background.", e);
                RgbImage::new(self.cfg.width, self.cfg.height)
            }
        }
    }

    /// Black frame with the failure message in place of the quote. When
    /// even the font is unavailable the frame stays blank and the message
    /// only reaches the log.
    fn error_frame(&self, path: &Path, message: &str) -> Rendered {
        let mut img = RgbImage::new(self.cfg.width, self.cfg.height);

        if let Some(font) = self.font.as_ref() {
            let scale = Scale::uniform(self.cfg.title_font_size);
            let mut y = (self.cfg.height / 2) as i32;
            for line in wrap_words(&format!("Error: {}", message), ERROR_WRAP_BUDGET) {
                let line_width = font::text_width(font, scale, &line);
                let x = ((self.cfg.width as f32 - line_width) / 2.0) as i32;
                font::draw_text(&mut img, font, scale, x, y, &line, WHITE);
                y += (self.cfg.line_pitch / 2) as i32;
            }
        } else {
            error!("Cannot render error text (no font): {}", message);
        }

        if let Err(e) = img.save(path) {
            error!("Failed to write error frame {}: {}", path.display(), e);
        }
        Rendered::Fallback(path.to_path_buf())
    }
}

/// Greedy word wrap: words accumulate until the next one would push the
/// line past `budget`; a single over-budget word becomes its own line.
pub fn wrap_words(text: &str, budget: usize) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let joined_len = if current.is_empty() {
            word.len()
        } else {
            current.len() + 1 + word.len()
        };

        if joined_len <= budget {
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
        } else if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
        } else {
            lines.push(word.to_string());
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Composite a uniform translucent black layer over the image.
fn darken(img: &mut RgbImage, alpha: f32) {
    for pixel in img.pixels_mut() {
        for channel in pixel.0.iter_mut() {
            *channel = (*channel as f32 * (1.0 - alpha)) as u8;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrapped_lines_respect_the_budget() {
        let text = "We all go a little mad sometimes haven't you";
        let lines = wrap_words(text, 25);
        assert!(!lines.is_empty());
        for line in &lines {
            assert!(line.len() <= 25, "line over budget: {:?}", line);
        }
        // No words lost or reordered.
        assert_eq!(lines.join(" "), text);
    }

    #[test]
    fn over_budget_word_gets_its_own_line() {
        let lines = wrap_words("aaa supercalifragilisticexpialidocious bbb", 10);
        assert_eq!(
            lines,
            vec!["aaa", "supercalifragilisticexpialidocious", "bbb"]
        );
    }

    #[test]
    fn exact_fit_stays_on_one_line() {
        assert_eq!(wrap_words("abcde fghij", 11), vec!["abcde fghij"]);
        assert_eq!(wrap_words("abcde fghij", 10), vec!["abcde", "fghij"]);
    }

    #[test]
    fn empty_text_wraps_to_nothing() {
        assert!(wrap_words("", 25).is_empty());
        assert!(wrap_words("   ", 25).is_empty());
    }

    #[test]
    fn darken_scales_every_channel() {
        let mut img = RgbImage::from_pixel(2, 2, image::Rgb([200, 100, 0]));
        darken(&mut img, OVERLAY_ALPHA);
        let px = img.get_pixel(0, 0).0;
        assert_eq!(px, [121, 60, 0]);
    }
}
