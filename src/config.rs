use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::{
    foundation::{
        color::Color,
        error::{TexError, TexResult},
    },
    naming::CollisionPolicy,
};

/// Options for one conversion session.
///
/// Fields map one-to-one onto the JSON config file format; missing keys take
/// the defaults below.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Output resolution in dots per inch. Must be > 0.
    pub dpi: u32,
    /// Base font size in points. Must be > 0.
    pub font_size: u32,
    pub font_color: Color,
    pub background_color: Color,
    /// When set, the background color is ignored and the PNG keeps an alpha channel.
    pub transparent: bool,
    /// Pixels of padding around the trimmed equation, on every side.
    pub padding: u32,
    pub output_dir: PathBuf,
    pub filename_prefix: String,
    pub collision: CollisionPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dpi: 300,
            font_size: 14,
            font_color: Color::BLACK,
            background_color: Color::WHITE,
            transparent: false,
            padding: 10,
            output_dir: PathBuf::from("output"),
            filename_prefix: "equation_".to_owned(),
            collision: CollisionPolicy::Overwrite,
        }
    }
}

impl Config {
    pub fn from_json_file(path: &Path) -> TexResult<Self> {
        let f = File::open(path)
            .map_err(|e| TexError::config(format!("open config '{}': {e}", path.display())))?;
        let cfg: Self = serde_json::from_reader(BufReader::new(f))
            .map_err(|e| TexError::config(format!("parse config '{}': {e}", path.display())))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> TexResult<()> {
        if self.dpi == 0 {
            return Err(TexError::config("dpi must be > 0"));
        }
        if self.font_size == 0 {
            return Err(TexError::config("font_size must be > 0"));
        }
        if self
            .filename_prefix
            .chars()
            .any(|c| c == '/' || c == '\\' || c == '\0')
        {
            return Err(TexError::config(format!(
                "filename_prefix must not contain path separators: {:?}",
                self.filename_prefix
            )));
        }
        Ok(())
    }

    pub fn style(&self) -> Style {
        Style {
            dpi: self.dpi,
            font_size: self.font_size,
            font_color: self.font_color,
            background: if self.transparent {
                None
            } else {
                Some(self.background_color)
            },
            padding: self.padding,
        }
    }
}

/// Render parameters handed to every rasterization call.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Style {
    pub dpi: u32,
    pub font_size: u32,
    pub font_color: Color,
    /// `None` means a transparent background.
    pub background: Option<Color>,
    pub padding: u32,
}

impl Style {
    /// Pixels per point (user unit) at this resolution.
    pub fn scale(&self) -> f32 {
        self.dpi as f32 / 72.0
    }
}
