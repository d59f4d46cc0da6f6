use image::RgbImage;
use rusttype::{point, Font, Scale};
use std::fs;
use std::path::Path;
use tracing::{info, warn};
use walkdir::WalkDir;

/// Known font locations, tried in order.
const SYSTEM_FONT_PATHS: [&str; 6] = [
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/ubuntu/Ubuntu-B.ttf",
    "/Library/Fonts/Arial Bold.ttf",
    "/Library/Fonts/Helvetica.ttc",
    "C:\\Windows\\Fonts\\arialbd.ttf",
    "C:\\Windows\\Fonts\\segoeui.ttf",
];

/// Scanned for any loadable face when none of the known paths exist.
const FONT_SCAN_ROOTS: [&str; 4] = [
    "/usr/share/fonts",
    "/usr/local/share/fonts",
    "/System/Library/Fonts",
    "C:\\Windows\\Fonts",
];

/// Resolve a usable typeface: the fixed path list first, then the first
/// loadable `.ttf`/`.otf` under the platform font roots. `None` means the
/// system has no fonts at all and callers must degrade to text-free frames.
pub fn load_font() -> Option<Font<'static>> {
    for path in SYSTEM_FONT_PATHS {
        if let Some(font) = load_font_file(Path::new(path)) {
            info!("Using system font: {}", path);
            return Some(font);
        }
    }

    for root in FONT_SCAN_ROOTS {
        for entry in WalkDir::new(root).into_iter().filter_map(|e| e.ok()) {
            let path = entry.path();
            let ext = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e.to_ascii_lowercase());
            if matches!(ext.as_deref(), Some("ttf") | Some("otf")) {
                if let Some(font) = load_font_file(path) {
                    info!("Using fallback font: {}", path.display());
                    return Some(font);
                }
            }
        }
    }

    warn!("No usable font found on this system");
    None
}

fn load_font_file(path: &Path) -> Option<Font<'static>> {
    let data = fs::read(path).ok()?;
    Font::try_from_vec(data)
}

/// Advance width of `text` at `scale`, for horizontal centering.
pub fn text_width(font: &Font, scale: Scale, text: &str) -> f32 {
    font.layout(text, scale, point(0.0, 0.0))
        .last()
        .map(|glyph| glyph.position().x + glyph.unpositioned().h_metrics().advance_width)
        .unwrap_or(0.0)
}

/// Draw `text` with its top-left corner at `(x, y)`, blending `color`
/// into the buffer by glyph coverage.
pub fn draw_text(
    img: &mut RgbImage,
    font: &Font,
    scale: Scale,
    x: i32,
    y: i32,
    text: &str,
    color: [u8; 3],
) {
    let ascent = font.v_metrics(scale).ascent;
    let (width, height) = (img.width() as i32, img.height() as i32);

    for glyph in font.layout(text, scale, point(x as f32, y as f32 + ascent)) {
        if let Some(bb) = glyph.pixel_bounding_box() {
            glyph.draw(|gx, gy, coverage| {
                let px = bb.min.x + gx as i32;
                let py = bb.min.y + gy as i32;
                if px >= 0 && px < width && py >= 0 && py < height {
                    let pixel = img.get_pixel_mut(px as u32, py as u32);
                    for (channel, target) in pixel.0.iter_mut().zip(color) {
                        *channel =
                            (*channel as f32 + (target as f32 - *channel as f32) * coverage) as u8;
                    }
                }
            });
        }
    }
}
