//! Configuration file management
//!
//! Loads TOML configuration files and provides application settings.
//! Default config path: ~/.config/trigon/config.toml

use anyhow::{Context, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::constants::{
    DEFAULT_FRAGMENT_SHADER, DEFAULT_RENDER_NODE, DEFAULT_SHADER_DIR, DEFAULT_VERTEX_SHADER,
};

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// GPU / surface settings
    pub gpu: GpuConfig,
    /// Shader file locations
    pub shaders: ShaderConfig,
    /// Triangle appearance
    pub triangle: TriangleConfig,
    /// Font settings
    pub font: FontConfig,
    /// Frame loop settings
    pub run: RunConfig,
}

/// GPU settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GpuConfig {
    /// DRM node the GBM device is created on
    pub render_node: String,
    /// Surface width (pixels)
    pub width: u32,
    /// Surface height (pixels)
    pub height: u32,
    /// Clear color (RRGGBB)
    pub clear_color: String,
}

/// Shader settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShaderConfig {
    /// Directory relative to the working directory
    pub dir: String,
    /// Vertex shader file name
    pub vertex: String,
    /// Fragment shader file name
    pub fragment: String,
}

/// Triangle settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TriangleConfig {
    /// Fill color (RRGGBB); empty leaves u_color untouched
    pub color: String,
}

/// Font settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FontConfig {
    /// Font file path (no font is loaded if empty)
    pub path: String,
    /// Font size (pixels)
    pub size: u32,
    /// Render a test glyph after loading
    pub glyph_test: bool,
    /// Hinting mode: "normal" | "light" | "none"
    pub hinting: String,
}

/// Frame loop settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Number of frames to render
    pub frames: u32,
    /// Save the last frame as PNG
    pub screenshot: bool,
    /// Screenshot save directory
    pub screenshot_dir: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gpu: GpuConfig::default(),
            shaders: ShaderConfig::default(),
            triangle: TriangleConfig::default(),
            font: FontConfig::default(),
            run: RunConfig::default(),
        }
    }
}

impl Default for GpuConfig {
    fn default() -> Self {
        Self {
            render_node: DEFAULT_RENDER_NODE.to_string(),
            width: 800,
            height: 600,
            clear_color: "1e1e1e".to_string(),
        }
    }
}

impl Default for ShaderConfig {
    fn default() -> Self {
        Self {
            dir: DEFAULT_SHADER_DIR.to_string(),
            vertex: DEFAULT_VERTEX_SHADER.to_string(),
            fragment: DEFAULT_FRAGMENT_SHADER.to_string(),
        }
    }
}

impl Default for TriangleConfig {
    fn default() -> Self {
        Self {
            color: "ff8000".to_string(),
        }
    }
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            path: String::new(),
            size: 16,
            glyph_test: false,
            hinting: "light".to_string(),
        }
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            frames: 60,
            screenshot: false,
            // Use ~ to be expanded at runtime
            screenshot_dir: "~".to_string(),
        }
    }
}

impl TriangleConfig {
    /// Parsed fill color, None if unset or invalid
    pub fn rgba(&self) -> Option<[f32; 4]> {
        if self.color.is_empty() {
            return None;
        }
        let color = parse_hex(&self.color);
        if color.is_none() {
            warn!("Invalid triangle color: {:?}", self.color);
        }
        color
    }
}

impl GpuConfig {
    pub fn clear_rgba(&self) -> [f32; 4] {
        parse_color(&self.clear_color)
    }
}

impl Config {
    /// System-wide config path
    const SYSTEM_CONFIG_PATH: &'static str = "/etc/trigon/config.toml";

    /// Get the path that would be used for loading config
    /// Returns None if using built-in defaults
    pub fn config_path() -> Option<PathBuf> {
        // 1. TRIGON_CONFIG environment variable
        if let Ok(path) = std::env::var("TRIGON_CONFIG") {
            let p = std::path::Path::new(&path);
            if p.exists() {
                return Some(p.to_path_buf());
            }
        }

        // 2. User config: ~/.config/trigon/config.toml
        if let Some(config_path) = Self::user_config_path() {
            if config_path.exists() {
                return Some(config_path);
            }
        }

        // 3. System config: /etc/trigon/config.toml
        let system_config = std::path::Path::new(Self::SYSTEM_CONFIG_PATH);
        if system_config.exists() {
            return Some(system_config.to_path_buf());
        }

        None
    }

    fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("trigon").join("config.toml"))
    }

    /// Load configuration with priority:
    /// 1. TRIGON_CONFIG environment variable
    /// 2. ~/.config/trigon/config.toml (user config)
    /// 3. /etc/trigon/config.toml (system config)
    /// 4. Built-in defaults
    pub fn load() -> Self {
        if let Some(path) = Self::config_path() {
            match Self::load_from_file(path.to_string_lossy().as_ref()) {
                Ok(config) => {
                    info!("Loaded config: {}", path.display());
                    return config;
                }
                Err(e) => {
                    warn!("Failed to load config {}: {:#}", path.display(), e);
                }
            }
        }
        info!("Using built-in default config");
        Self::default()
    }

    /// Load settings from specified path
    fn load_from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;
        Self::parse(&content).with_context(|| format!("Failed to parse config file: {}", path))
    }

    fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Path `write_default` writes to
    pub fn default_write_path() -> Result<PathBuf> {
        Self::user_config_path().ok_or_else(|| anyhow::anyhow!("Config directory not found"))
    }

    /// Write the built-in defaults to the user config path
    pub fn write_default() -> Result<PathBuf> {
        let path = Self::default_write_path()?;
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }

        let body = toml::to_string_pretty(&Self::default())?;
        let content = format!(
            "# trigon configuration\n# Location: ~/.config/trigon/config.toml\n\n{}",
            body
        );
        std::fs::write(&path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(path)
    }
}

/// Parse RRGGBB (optionally prefixed with '#') to RGBA
fn parse_hex(hex: &str) -> Option<[f32; 4]> {
    let hex = hex.trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some([r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0, 1.0])
}

/// Parse hex color string (RRGGBB) to RGBA, black on invalid input
pub fn parse_color(hex: &str) -> [f32; 4] {
    parse_hex(hex).unwrap_or([0.0, 0.0, 0.0, 1.0])
}
