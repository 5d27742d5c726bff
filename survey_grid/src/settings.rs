//! Run parameters, loadable from a JSON file.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::io::surface::SurfaceFormat;

/// Entity kinds that can supply sample points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EntityKind {
    /// Circle centers.
    #[default]
    Circle,
    /// Point locations.
    Point,
}

impl EntityKind {
    /// DXF entity name.
    pub fn dxf_name(self) -> &'static str {
        match self {
            Self::Circle => "CIRCLE",
            Self::Point => "POINT",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dxf_name())
    }
}

impl FromStr for EntityKind {
    type Err = Error;

    /// Parses an entity kind. Case insensitive.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CIRCLE" => Ok(Self::Circle),
            "POINT" => Ok(Self::Point),
            other => Err(Error::InvalidParameter(format!(
                "unknown entity type {other:?}, expected CIRCLE or POINT"
            ))),
        }
    }
}

/// Styling of the labels and points added to the output drawing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotationStyle {
    pub layer: String,
    pub text_style: String,
    pub font: String,
    pub text_height: f64,
    pub label_color: i16,
    pub point_color: i16,
    /// Value written to `$PDMODE`.
    pub point_mode: i16,
    /// Value written to `$PDSIZE`.
    pub point_size: f64,
    /// Label nodes whose height is undefined as well.
    pub label_undefined: bool,
}

impl Default for AnnotationStyle {
    fn default() -> Self {
        Self {
            layer: "PY".into(),
            text_style: "myStandard".into(),
            font: "Arial.ttf".into(),
            text_height: 0.25,
            label_color: 4,
            point_color: 6,
            point_mode: 32,
            point_size: 0.25,
            label_undefined: true,
        }
    }
}

/// Layout of the cell table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableFormat {
    pub delimiter: char,
    pub width: usize,
    pub precision: usize,
}

impl Default for TableFormat {
    fn default() -> Self {
        Self {
            delimiter: ';',
            width: 10,
            precision: 4,
        }
    }
}

/// All parameters of one grid run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub entity: EntityKind,
    pub layer: String,
    pub step: f64,
    pub annotation: AnnotationStyle,
    pub table: TableFormat,
    pub surface: SurfaceFormat,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            entity: EntityKind::Circle,
            layer: "0".into(),
            step: 2.0,
            annotation: AnnotationStyle::default(),
            table: TableFormat::default(),
            surface: SurfaceFormat::LandXml,
        }
    }
}

impl Settings {
    /// Reads settings from a JSON file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let settings: Settings = serde_json::from_str(&data)?;
        Ok(settings)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Checks parameters that must be valid before any file is touched.
    pub fn validate(&self) -> Result<()> {
        if !self.step.is_finite() || self.step <= 0.0 {
            return Err(Error::InvalidParameter(format!(
                "grid step must be a positive number, got {}",
                self.step
            )));
        }
        if self.annotation.layer.trim().is_empty() {
            return Err(Error::InvalidParameter("annotation layer is empty".into()));
        }
        if self.annotation.text_height.is_nan() || self.annotation.text_height <= 0.0 {
            return Err(Error::InvalidParameter(format!(
                "text height must be positive, got {}",
                self.annotation.text_height
            )));
        }
        if self.table.delimiter.is_ascii_digit() || self.table.delimiter == '.' {
            return Err(Error::InvalidParameter(format!(
                "table delimiter {:?} clashes with numbers",
                self.table.delimiter
            )));
        }
        Ok(())
    }
}
