//! Overlay font resolution
//!
//! The configured font files are tried in order once at start-up. The first
//! one that loads is used for every request; if none does, the built-in
//! bitmap font takes over so overlay rendering never fails on fonts.

use std::path::{Path, PathBuf};

use ab_glyph::{FontArc, PxScale};
use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_text_mut, text_size};
use tracing::{info, warn};

use super::builtin_font;

/// Font used to draw translated text
#[derive(Clone)]
pub enum OverlayFont {
    /// TrueType/OpenType font loaded from disk
    Loaded { font: FontArc, path: PathBuf },
    /// Built-in 5x7 bitmap font
    Builtin,
}

impl std::fmt::Debug for OverlayFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Loaded { path, .. } => f.debug_struct("Loaded").field("path", path).finish(),
            Self::Builtin => f.write_str("Builtin"),
        }
    }
}

fn load(path: &Path) -> Result<FontArc, String> {
    let data = std::fs::read(path).map_err(|e| e.to_string())?;
    FontArc::try_from_vec(data).map_err(|e| e.to_string())
}

impl OverlayFont {
    /// First font in `candidates` that loads, else the built-in font
    pub fn resolve(candidates: &[PathBuf]) -> Self {
        for path in candidates {
            match load(path) {
                Ok(font) => {
                    info!("Overlay font: {}", path.display());
                    return Self::Loaded {
                        font,
                        path: path.clone(),
                    };
                }
                Err(e) => warn!(path = %path.display(), error = %e, "Overlay font unavailable, trying next"),
            }
        }

        warn!("No overlay font could be loaded, using built-in bitmap font");
        Self::Builtin
    }

    pub fn is_builtin(&self) -> bool {
        matches!(self, Self::Builtin)
    }

    /// Font file name, or `builtin`
    pub fn name(&self) -> String {
        match self {
            Self::Loaded { path, .. } => path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
            Self::Builtin => "builtin".to_string(),
        }
    }

    /// Rendered size of a single line of text
    pub fn measure(&self, font_size: f32, text: &str) -> (u32, u32) {
        match self {
            Self::Loaded { font, .. } => text_size(PxScale::from(font_size), font, text),
            Self::Builtin => builtin_font::text_size(font_size, text),
        }
    }

    /// Draw one line of text with its top-left corner at `(x, y)`
    pub fn draw(&self, canvas: &mut RgbaImage, color: Rgba<u8>, x: i32, y: i32, font_size: f32, text: &str) {
        match self {
            Self::Loaded { font, .. } => {
                draw_text_mut(canvas, color, x, y, PxScale::from(font_size), font, text)
            }
            Self::Builtin => builtin_font::draw_text(canvas, color, x, y, font_size, text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_falls_back_to_builtin() {
        let mut junk = tempfile::NamedTempFile::new().unwrap();
        junk.write_all(b"not a font").unwrap();

        let font = OverlayFont::resolve(&[
            PathBuf::from("/nonexistent/font.ttf"),
            junk.path().to_path_buf(),
        ]);

        assert!(font.is_builtin());
        assert_eq!(font.name(), "builtin");
    }

    #[test]
    fn test_builtin_draws_and_measures() {
        let font = OverlayFont::Builtin;
        let mut canvas = RgbaImage::from_pixel(64, 16, Rgba([255, 255, 255, 255]));

        font.draw(&mut canvas, Rgba([0, 0, 0, 255]), 1, 1, 8.0, "OK");

        assert_eq!(font.measure(8.0, "OK"), (12, 8));
        assert!(canvas.pixels().any(|p| p.0 == [0, 0, 0, 255]));
    }
}
