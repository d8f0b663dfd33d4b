//! FreeType wrapper
//!
//! Font face loading with an optional glyph rasterization check

use freetype::face::LoadFlag;
use freetype::Library;
use log::info;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Glyph rendered by the load check
const TEST_GLYPH: char = 'A';

/// Font loading failures
#[derive(Debug, Error)]
pub enum FontError {
    #[error("FreeType initialization failed: {0}")]
    Init(String),

    #[error("invalid font size: {0}px")]
    InvalidSize(u32),

    #[error("FreeType font loading failed for {path}: {message}")]
    Load { path: PathBuf, message: String },

    #[error("FreeType size setting failed: {0}")]
    Size(String),

    #[error("FreeType failed to render glyph {ch:?}: {message}")]
    Glyph { ch: char, message: String },
}

/// Hinting mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HintingMode {
    /// Normal hinting (sharp, slightly thicker)
    #[default]
    Normal,
    /// Light hinting (natural curves, slightly thinner)
    Light,
    /// No hinting (most natural)
    None,
}

impl HintingMode {
    pub fn from_str(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "light" => Self::Light,
            "none" | "off" => Self::None,
            _ => Self::Normal,
        }
    }

    fn to_load_flag(self) -> LoadFlag {
        match self {
            Self::Normal => LoadFlag::TARGET_NORMAL,
            Self::Light => LoadFlag::TARGET_LIGHT,
            Self::None => LoadFlag::NO_HINTING,
        }
    }
}

/// Summary of a loaded face
#[allow(dead_code)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontInfo {
    pub family: String,
    pub size_px: u32,
    /// Bitmap size (width, rows) of the test glyph, when the check ran
    pub test_glyph: Option<(i32, i32)>,
}

/// FreeType library with at most one loaded face
pub struct FontLoader {
    library: Library,
    face: Option<freetype::Face>,
    hinting: HintingMode,
}

impl FontLoader {
    pub fn new(hinting: HintingMode) -> Result<Self, FontError> {
        let library = Library::init().map_err(|e| FontError::Init(e.to_string()))?;
        Ok(Self {
            library,
            face: None,
            hinting,
        })
    }

    /// Load a face from `path` at `size_px` pixels
    ///
    /// Replaces any previously loaded face. With `glyph_test` the glyph 'A'
    /// is rendered to verify the face is usable.
    pub fn load_font(
        &mut self,
        path: &Path,
        size_px: u32,
        glyph_test: bool,
    ) -> Result<FontInfo, FontError> {
        if size_px == 0 {
            return Err(FontError::InvalidSize(size_px));
        }

        let face = self
            .library
            .new_face(path, 0)
            .map_err(|e| FontError::Load {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        face.set_pixel_sizes(0, size_px)
            .map_err(|e| FontError::Size(e.to_string()))?;

        let test_glyph = if glyph_test {
            face.load_char(TEST_GLYPH as usize, LoadFlag::RENDER | self.hinting.to_load_flag())
                .map_err(|e| FontError::Glyph {
                    ch: TEST_GLYPH,
                    message: e.to_string(),
                })?;
            let bitmap = face.glyph().bitmap();
            Some((bitmap.width(), bitmap.rows()))
        } else {
            None
        };

        let family = face.family_name().unwrap_or_else(|| "unknown".to_string());
        info!(
            "FreeType font loaded: {} ({}px, hinting={:?})",
            family, size_px, self.hinting
        );
        if let Some((w, h)) = test_glyph {
            info!("Glyph test '{}': {}x{}", TEST_GLYPH, w, h);
        }

        self.face = Some(face);
        Ok(FontInfo {
            family,
            size_px,
            test_glyph,
        })
    }

    #[cfg(test)]
    pub fn has_face(&self) -> bool {
        self.face.is_some()
    }
}
