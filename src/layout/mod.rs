//! Template layout - where every value is stamped on the PDF template.
//!
//! The layout is plain configuration data loaded once at startup (JSON) and
//! shared read-only between records:
//! - `owner_name` - position of the owner's name at the top of page one
//! - `summary` - text block receiving the wrapped summary paragraph
//! - `page_one` / `page_two` - question label to one or more positions
//!
//! Coordinates are PDF user-space points with the origin at the bottom-left.

pub mod wrap;

use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use wrap::{wrap_text, FontMetrics};

/// Layout matching the bundled ECD inspection template.
const DEFAULT_LAYOUT: &str = include_str!("../../static/ecd_inspection_layout.json");

#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("failed to read layout file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid layout definition: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid layout: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldPosition {
    pub x: f32,
    pub y: f32,
}

impl FieldPosition {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// A field drawn once, or the same value drawn at several places.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Placement {
    Single(FieldPosition),
    Multiple(Vec<FieldPosition>),
}

impl Placement {
    pub fn positions(&self) -> &[FieldPosition] {
        match self {
            Placement::Single(position) => std::slice::from_ref(position),
            Placement::Multiple(positions) => positions,
        }
    }
}

/// Field label to placement, iterated in definition order.
pub type PageLayout = IndexMap<String, Placement>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryBlock {
    pub x: f32,
    /// Baseline of the first line.
    pub y: f32,
    pub max_width: f32,
    #[serde(default = "default_line_height")]
    pub line_height: f32,
}

fn default_line_height() -> f32 {
    15.0
}

fn default_font_size() -> f32 {
    12.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateLayout {
    #[serde(default = "default_font_size")]
    pub font_size: f32,
    pub owner_name: FieldPosition,
    pub summary: SummaryBlock,
    #[serde(default)]
    pub page_one: PageLayout,
    #[serde(default)]
    pub page_two: PageLayout,
}

impl TemplateLayout {
    /// Layout bundled with the binary.
    pub fn builtin() -> Result<Self, LayoutError> {
        Self::from_json(DEFAULT_LAYOUT)
    }

    pub fn from_json(json: &str) -> Result<Self, LayoutError> {
        let layout: TemplateLayout = serde_json::from_str(json)?;
        layout.validate()?;
        Ok(layout)
    }

    pub fn from_file(path: &Path) -> Result<Self, LayoutError> {
        let json = fs::read_to_string(path).map_err(|source| LayoutError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Load from `path` when given, otherwise fall back to the bundled layout.
    pub fn load(path: Option<&Path>) -> Result<Self, LayoutError> {
        match path {
            Some(path) => {
                log::info!("Loading template layout from {}", path.display());
                Self::from_file(path)
            }
            None => {
                log::info!("Using built-in template layout");
                Self::builtin()
            }
        }
    }

    fn validate(&self) -> Result<(), LayoutError> {
        if self.font_size <= 0.0 {
            return Err(LayoutError::Invalid("font_size must be positive".to_string()));
        }
        if self.summary.max_width <= 0.0 {
            return Err(LayoutError::Invalid(
                "summary.max_width must be positive".to_string(),
            ));
        }
        for (label, placement) in self.page_one.iter().chain(self.page_two.iter()) {
            if placement.positions().is_empty() {
                return Err(LayoutError::Invalid(format!(
                    "field '{}' has no positions",
                    label
                )));
            }
        }
        Ok(())
    }
}
