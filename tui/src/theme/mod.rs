//! Theme and Colors
//!
//! Earth-toned palette for the soilscope terminal client, in a dark and a
//! light variant. Display tones from the Result Presenter map onto colors
//! here so the presenter itself stays terminal-agnostic.

use ratatui::style::{Color, Modifier, Style};

use crate::display::Tone;

// ============================================================================
// Soil Palette
// ============================================================================

/// Topsoil brown (accents, titles)
pub const SOIL_BROWN: Color = Color::Rgb(150, 98, 60);

/// Lighter loam for accents on dark backgrounds
pub const LOAM: Color = Color::Rgb(205, 150, 100);

/// Leaf green (good readings)
pub const LEAF_GREEN: Color = Color::Rgb(110, 200, 110);

/// Deep green for light backgrounds
pub const MOSS_GREEN: Color = Color::Rgb(40, 130, 50);

/// Straw yellow (fair readings)
pub const STRAW_YELLOW: Color = Color::Rgb(230, 200, 90);

/// Ochre for light backgrounds
pub const OCHRE: Color = Color::Rgb(170, 130, 20);

/// Clay red (poor readings)
pub const CLAY_RED: Color = Color::Rgb(230, 90, 80);

/// Brick for light backgrounds
pub const BRICK: Color = Color::Rgb(170, 45, 40);

/// Water blue (waterlogged)
pub const WATER_BLUE: Color = Color::Rgb(100, 170, 255);

/// Deep water for light backgrounds
pub const DEEP_WATER: Color = Color::Rgb(30, 90, 180);

/// Dry orange (dry soil)
pub const DRY_ORANGE: Color = Color::Rgb(240, 150, 70);

/// Burnt orange for light backgrounds
pub const BURNT_ORANGE: Color = Color::Rgb(190, 95, 20);

// ============================================================================
// Theme
// ============================================================================

/// Which variant is active
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ThemeMode {
    /// Light text on a dark terminal
    #[default]
    Dark,
    /// Dark text on a light terminal
    Light,
}

impl ThemeMode {
    /// The other variant
    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Self::Dark => Self::Light,
            Self::Light => Self::Dark,
        }
    }
}

/// Resolved colors for one variant
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Theme {
    /// Active variant
    pub mode: ThemeMode,
    /// Body text
    pub text: Color,
    /// Hints and secondary text
    pub dim: Color,
    /// Titles and highlights
    pub accent: Color,
    /// Borders
    pub border: Color,
    /// Inline error messages
    pub error: Color,
    good: Color,
    fair: Color,
    poor: Color,
    info: Color,
    warning: Color,
}

impl Theme {
    /// Dark variant
    #[must_use]
    pub fn dark() -> Self {
        Self {
            mode: ThemeMode::Dark,
            text: Color::Rgb(225, 220, 210),
            dim: Color::Rgb(120, 115, 105),
            accent: LOAM,
            border: Color::Rgb(90, 75, 60),
            error: CLAY_RED,
            good: LEAF_GREEN,
            fair: STRAW_YELLOW,
            poor: CLAY_RED,
            info: WATER_BLUE,
            warning: DRY_ORANGE,
        }
    }

    /// Light variant
    #[must_use]
    pub fn light() -> Self {
        Self {
            mode: ThemeMode::Light,
            text: Color::Rgb(40, 35, 30),
            dim: Color::Rgb(130, 120, 110),
            accent: SOIL_BROWN,
            border: Color::Rgb(180, 160, 140),
            error: BRICK,
            good: MOSS_GREEN,
            fair: OCHRE,
            poor: BRICK,
            info: DEEP_WATER,
            warning: BURNT_ORANGE,
        }
    }

    /// Theme for a mode
    #[must_use]
    pub fn for_mode(mode: ThemeMode) -> Self {
        match mode {
            ThemeMode::Dark => Self::dark(),
            ThemeMode::Light => Self::light(),
        }
    }

    /// Switch to the other variant
    #[must_use]
    pub fn toggled(&self) -> Self {
        Self::for_mode(self.mode.toggled())
    }

    /// Color for a display tone
    #[must_use]
    pub fn tone(&self, tone: Tone) -> Color {
        match tone {
            Tone::Good => self.good,
            Tone::Fair => self.fair,
            Tone::Poor => self.poor,
            Tone::Info => self.info,
            Tone::Warning => self.warning,
            Tone::Neutral => self.text,
        }
    }

    /// Body text style
    #[must_use]
    pub fn text_style(&self) -> Style {
        Style::default().fg(self.text)
    }

    /// Secondary text style
    #[must_use]
    pub fn dim_style(&self) -> Style {
        Style::default().fg(self.dim)
    }

    /// Title style
    #[must_use]
    pub fn title_style(&self) -> Style {
        Style::default()
            .fg(self.accent)
            .add_modifier(Modifier::BOLD)
    }

    /// Error style
    #[must_use]
    pub fn error_style(&self) -> Style {
        Style::default().fg(self.error)
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}
