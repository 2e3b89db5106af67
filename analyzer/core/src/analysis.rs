//! Soil Analysis Model
//!
//! The structured result the classification endpoint returns for one image.
//!
//! # Wire Labels
//!
//! The service speaks Portuguese labels (`arenoso`, `úmido`, `médio`, ...).
//! They map onto closed English enumerations here. English labels and
//! unaccented spellings are accepted as aliases; serialization emits the
//! service's own labels so a payload survives a round trip unchanged.
//!
//! # Optional Fields
//!
//! Some service builds also send `soilType` and `confidence`. Other builds
//! do not, so both are carried when present and never required.

use std::fmt;

use serde::{Deserialize, Serialize};

// ============================================================================
// Enumerations
// ============================================================================

/// Soil texture class
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Texture {
    /// Coarse, drains quickly
    #[serde(rename = "arenoso", alias = "sandy")]
    Sandy,
    /// Fine, retains water
    #[serde(rename = "argiloso", alias = "clayey")]
    Clayey,
    /// Intermediate, smooth
    #[serde(rename = "siltoso", alias = "silty")]
    Silty,
}

impl Texture {
    /// All texture classes in display order
    pub const ALL: [Texture; 3] = [Texture::Sandy, Texture::Clayey, Texture::Silty];

    /// Human-readable label
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Sandy => "sandy",
            Self::Clayey => "clayey",
            Self::Silty => "silty",
        }
    }

    /// Label used by the classification service
    #[must_use]
    pub fn wire_label(&self) -> &'static str {
        match self {
            Self::Sandy => "arenoso",
            Self::Clayey => "argiloso",
            Self::Silty => "siltoso",
        }
    }
}

impl fmt::Display for Texture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Soil moisture class
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Moisture {
    /// Needs irrigation
    #[serde(rename = "seco", alias = "dry")]
    Dry,
    /// Healthy moisture
    #[serde(rename = "úmido", alias = "umido", alias = "moist")]
    Moist,
    /// Saturated, poor drainage
    #[serde(rename = "encharcado", alias = "waterlogged")]
    Waterlogged,
}

impl Moisture {
    /// All moisture classes in display order
    pub const ALL: [Moisture; 3] = [Moisture::Dry, Moisture::Moist, Moisture::Waterlogged];

    /// Human-readable label
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Dry => "dry",
            Self::Moist => "moist",
            Self::Waterlogged => "waterlogged",
        }
    }

    /// Label used by the classification service
    #[must_use]
    pub fn wire_label(&self) -> &'static str {
        match self {
            Self::Dry => "seco",
            Self::Moist => "úmido",
            Self::Waterlogged => "encharcado",
        }
    }
}

impl fmt::Display for Moisture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Ordered level used for fertility and organic matter
///
/// Ordering follows magnitude: `Low < Medium < High`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Level {
    /// Low
    #[serde(rename = "baixo", alias = "low")]
    Low,
    /// Medium
    #[serde(rename = "médio", alias = "medio", alias = "medium")]
    Medium,
    /// High
    #[serde(rename = "alto", alias = "high")]
    High,
}

impl Level {
    /// All levels, highest first (the order the result screen lists them)
    pub const ALL: [Level; 3] = [Level::High, Level::Medium, Level::Low];

    /// Human-readable label
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    /// Label used by the classification service
    #[must_use]
    pub fn wire_label(&self) -> &'static str {
        match self {
            Self::Low => "baixo",
            Self::Medium => "médio",
            Self::High => "alto",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ============================================================================
// SoilAnalysis
// ============================================================================

/// Result of classifying one soil photograph
///
/// Created only by deserializing a successful classification response and
/// held transiently while the result is on screen. Never persisted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SoilAnalysis {
    /// Texture class
    pub texture: Texture,
    /// Moisture class
    pub moisture: Moisture,
    /// Fertility level
    pub fertility: Level,
    /// Organic matter level
    pub organic_matter: Level,
    /// Color description as emitted by the service (name or hex value)
    pub dominant_color: String,
    /// Free-text recommendations, in service order
    #[serde(default)]
    pub suggestions: Vec<String>,
    /// Soil type label (only some service builds send it)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub soil_type: Option<String>,
    /// Classifier confidence in percent (only some service builds send it)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl SoilAnalysis {
    /// Create an analysis with no suggestions and no optional fields
    pub fn new(
        texture: Texture,
        moisture: Moisture,
        fertility: Level,
        organic_matter: Level,
        dominant_color: impl Into<String>,
    ) -> Self {
        Self {
            texture,
            moisture,
            fertility,
            organic_matter,
            dominant_color: dominant_color.into(),
            suggestions: Vec::new(),
            soil_type: None,
            confidence: None,
        }
    }

    /// Append a suggestion
    #[must_use]
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    /// Set the soil type label
    #[must_use]
    pub fn with_soil_type(mut self, soil_type: impl Into<String>) -> Self {
        self.soil_type = Some(soil_type.into());
        self
    }

    /// Set the confidence percentage
    #[must_use]
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }

    /// Whether the service sent any recommendations
    #[must_use]
    pub fn has_suggestions(&self) -> bool {
        !self.suggestions.is_empty()
    }
}
