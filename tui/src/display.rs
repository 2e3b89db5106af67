//! Result Presenter
//!
//! Turns a [`SoilAnalysis`] and its image handle into display rows. All
//! classification here is display-only: tones for color coding, a glyph per
//! texture, and a swatch for the dominant color when it can be recognised.
//!
//! Nothing in this module knows about terminals; the theme maps [`Tone`]
//! onto colors and the app lays the rows out.

use std::fmt::Write as _;

use analyzer_core::{format_size, ImageHandle, Level, Moisture, SoilAnalysis, Texture};

/// Display-only judgement of a reading
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tone {
    /// Favourable
    Good,
    /// Middling
    Fair,
    /// Unfavourable
    Poor,
    /// Noteworthy but not a judgement (waterlogged soil)
    Info,
    /// Needs attention (dry soil)
    Warning,
    /// No judgement
    Neutral,
}

/// Tone for fertility and organic matter
#[must_use]
pub fn level_tone(level: Level) -> Tone {
    match level {
        Level::High => Tone::Good,
        Level::Medium => Tone::Fair,
        Level::Low => Tone::Poor,
    }
}

/// Tone for moisture
#[must_use]
pub fn moisture_tone(moisture: Moisture) -> Tone {
    match moisture {
        Moisture::Moist => Tone::Good,
        Moisture::Dry => Tone::Warning,
        Moisture::Waterlogged => Tone::Info,
    }
}

/// Block glyph for a texture, coarse to fine
#[must_use]
pub fn texture_icon(texture: Texture) -> &'static str {
    match texture {
        Texture::Sandy => "░",
        Texture::Silty => "▒",
        Texture::Clayey => "▓",
    }
}

/// Glyph for a moisture level
#[must_use]
pub fn moisture_icon(moisture: Moisture) -> &'static str {
    match moisture {
        Moisture::Dry => "◇",
        Moisture::Moist => "◈",
        Moisture::Waterlogged => "◆",
    }
}

// ============================================================================
// Dominant Color
// ============================================================================

/// Known color words, Portuguese and English
const NAMED_COLORS: &[(&str, (u8, u8, u8))] = &[
    ("marrom", (121, 85, 61)),
    ("brown", (121, 85, 61)),
    ("castanho", (121, 85, 61)),
    ("preto", (35, 30, 28)),
    ("black", (35, 30, 28)),
    ("vermelho", (150, 60, 45)),
    ("avermelhado", (160, 82, 60)),
    ("red", (150, 60, 45)),
    ("amarelo", (200, 165, 90)),
    ("amarelado", (195, 160, 100)),
    ("yellow", (200, 165, 90)),
    ("laranja", (190, 110, 60)),
    ("orange", (190, 110, 60)),
    ("bege", (200, 180, 150)),
    ("beige", (200, 180, 150)),
    ("cinza", (128, 122, 115)),
    ("acinzentado", (128, 122, 115)),
    ("gray", (128, 122, 115)),
    ("grey", (128, 122, 115)),
    ("branco", (225, 220, 210)),
    ("white", (225, 220, 210)),
];

/// Best-effort RGB for a dominant color description
///
/// Accepts `#rrggbb`, `#rgb`, or a known color word optionally qualified
/// by "escuro"/"dark" or "claro"/"light".
#[must_use]
pub fn parse_color(description: &str) -> Option<(u8, u8, u8)> {
    let text = description.trim();

    if let Some(hex) = text.strip_prefix('#') {
        return parse_hex(hex);
    }

    let lower = text.to_lowercase();
    let words: Vec<&str> = lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();

    let base = words
        .iter()
        .find_map(|w| NAMED_COLORS.iter().find(|(name, _)| name == w))
        .map(|(_, rgb)| *rgb)?;

    let dark = words.iter().any(|w| matches!(*w, "escuro" | "escura" | "dark"));
    let light = words.iter().any(|w| matches!(*w, "claro" | "clara" | "light"));

    Some(if dark {
        scale(base, 0.6)
    } else if light {
        lighten(base, 0.4)
    } else {
        base
    })
}

fn parse_hex(hex: &str) -> Option<(u8, u8, u8)> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    match hex.len() {
        6 => Some((
            u8::from_str_radix(&hex[0..2], 16).ok()?,
            u8::from_str_radix(&hex[2..4], 16).ok()?,
            u8::from_str_radix(&hex[4..6], 16).ok()?,
        )),
        3 => {
            let digit = |i: usize| u8::from_str_radix(&hex[i..=i], 16).ok().map(|d| d * 17);
            Some((digit(0)?, digit(1)?, digit(2)?))
        }
        _ => None,
    }
}

fn scale((r, g, b): (u8, u8, u8), factor: f32) -> (u8, u8, u8) {
    let f = |c: u8| (f32::from(c) * factor).round() as u8;
    (f(r), f(g), f(b))
}

fn lighten((r, g, b): (u8, u8, u8), amount: f32) -> (u8, u8, u8) {
    let f = |c: u8| (f32::from(c) + (255.0 - f32::from(c)) * amount).round() as u8;
    (f(r), f(g), f(b))
}

// ============================================================================
// View Model
// ============================================================================

/// One labelled reading
#[derive(Clone, Debug, PartialEq)]
pub struct ResultRow {
    /// Row label
    pub label: &'static str,
    /// Display value
    pub value: String,
    /// Leading glyph, if any
    pub icon: Option<&'static str>,
    /// Color coding
    pub tone: Tone,
}

impl ResultRow {
    fn new(label: &'static str, value: impl Into<String>) -> Self {
        Self {
            label,
            value: value.into(),
            icon: None,
            tone: Tone::Neutral,
        }
    }

    fn icon(mut self, icon: &'static str) -> Self {
        self.icon = Some(icon);
        self
    }

    fn tone(mut self, tone: Tone) -> Self {
        self.tone = tone;
        self
    }
}

/// Metadata about the analyzed image
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageSummary {
    /// File name
    pub name: String,
    /// Media type
    pub media_type: String,
    /// Human-readable size
    pub size: String,
    /// Handle URL
    pub url: String,
}

impl From<&ImageHandle> for ImageSummary {
    fn from(handle: &ImageHandle) -> Self {
        Self {
            name: handle.name().to_string(),
            media_type: handle.media_type().to_string(),
            size: format_size(handle.size()),
            url: handle.url(),
        }
    }
}

/// Everything the Result screen shows
#[derive(Clone, Debug, PartialEq)]
pub struct ResultView {
    /// Readings in display order
    pub rows: Vec<ResultRow>,
    /// Swatch for the dominant color
    pub swatch: Option<(u8, u8, u8)>,
    /// Suggestions, in service order
    pub suggestions: Vec<String>,
    /// The analyzed image, when known
    pub image: Option<ImageSummary>,
}

impl ResultView {
    /// Build the view for an analysis
    #[must_use]
    pub fn new(analysis: &SoilAnalysis) -> Self {
        let mut rows = Vec::with_capacity(7);

        if let Some(ref soil_type) = analysis.soil_type {
            rows.push(ResultRow::new("Soil type", soil_type.clone()));
        }
        if let Some(confidence) = analysis.confidence {
            rows.push(ResultRow::new("Confidence", format_confidence(confidence)));
        }

        rows.push(ResultRow::new("Dominant color", analysis.dominant_color.clone()));
        rows.push(
            ResultRow::new("Texture", display_label(analysis.texture.label()))
                .icon(texture_icon(analysis.texture)),
        );
        rows.push(
            ResultRow::new("Moisture", display_label(analysis.moisture.label()))
                .icon(moisture_icon(analysis.moisture))
                .tone(moisture_tone(analysis.moisture)),
        );
        rows.push(
            ResultRow::new("Fertility", display_label(analysis.fertility.label()))
                .tone(level_tone(analysis.fertility)),
        );
        rows.push(
            ResultRow::new("Organic matter", display_label(analysis.organic_matter.label()))
                .tone(level_tone(analysis.organic_matter)),
        );

        Self {
            rows,
            swatch: parse_color(&analysis.dominant_color),
            suggestions: analysis.suggestions.clone(),
            image: None,
        }
    }

    /// Attach image metadata
    #[must_use]
    pub fn with_image(mut self, image: &ImageHandle) -> Self {
        self.image = Some(ImageSummary::from(image));
        self
    }

    /// Find a row by label
    #[must_use]
    pub fn row(&self, label: &str) -> Option<&ResultRow> {
        self.rows.iter().find(|r| r.label == label)
    }

    /// Width of the widest label, for alignment
    #[must_use]
    pub fn label_width(&self) -> usize {
        self.rows
            .iter()
            .map(|r| unicode_width::UnicodeWidthStr::width(r.label))
            .max()
            .unwrap_or(0)
    }
}

/// Capitalise a reading label ("waterlogged" -> "Waterlogged")
#[must_use]
pub fn display_label(label: &str) -> String {
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Confidence as the service reports it (a percentage)
#[must_use]
pub fn format_confidence(confidence: f64) -> String {
    format!("{confidence:.1}%")
}

/// Plain-text report for headless output
#[must_use]
pub fn render_report(view: &ResultView) -> String {
    let width = view.label_width();
    let mut out = String::new();

    let _ = writeln!(out, "Soil analysis");
    let _ = writeln!(out, "=============");

    if let Some(ref image) = view.image {
        let _ = writeln!(out, "Image: {} ({}, {})", image.name, image.media_type, image.size);
    }
    let _ = writeln!(out);

    for row in &view.rows {
        let pad = width.saturating_sub(unicode_width::UnicodeWidthStr::width(row.label));
        let _ = writeln!(out, "{}{}  {}", row.label, " ".repeat(pad), row.value);
    }

    if !view.suggestions.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Suggestions:");
        for suggestion in &view.suggestions {
            for (i, line) in textwrap::wrap(suggestion, 76).iter().enumerate() {
                let bullet = if i == 0 { "  - " } else { "    " };
                let _ = writeln!(out, "{bullet}{line}");
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use analyzer_core::ImageStore;
    use pretty_assertions::assert_eq;

    fn analysis() -> SoilAnalysis {
        SoilAnalysis::new(
            Texture::Clayey,
            Moisture::Waterlogged,
            Level::High,
            Level::Low,
            "Marrom escuro",
        )
        .with_suggestion("Melhore a drenagem do solo")
    }

    #[test]
    fn test_level_tones() {
        assert_eq!(level_tone(Level::High), Tone::Good);
        assert_eq!(level_tone(Level::Medium), Tone::Fair);
        assert_eq!(level_tone(Level::Low), Tone::Poor);
    }

    #[test]
    fn test_moisture_tones() {
        assert_eq!(moisture_tone(Moisture::Moist), Tone::Good);
        assert_eq!(moisture_tone(Moisture::Dry), Tone::Warning);
        assert_eq!(moisture_tone(Moisture::Waterlogged), Tone::Info);
    }

    #[test]
    fn test_texture_icons_are_distinct() {
        let icons: Vec<_> = Texture::ALL.iter().map(|t| texture_icon(*t)).collect();
        assert_eq!(icons.len(), 3);
        assert_ne!(icons[0], icons[1]);
        assert_ne!(icons[1], icons[2]);
        assert_ne!(icons[0], icons[2]);
    }

    #[test]
    fn test_rows_in_order() {
        let view = ResultView::new(&analysis());
        let labels: Vec<_> = view.rows.iter().map(|r| r.label).collect();
        assert_eq!(
            labels,
            vec!["Dominant color", "Texture", "Moisture", "Fertility", "Organic matter"]
        );

        let fertility = view.row("Fertility").unwrap();
        assert_eq!(fertility.value, "High");
        assert_eq!(fertility.tone, Tone::Good);
        assert_eq!(view.row("Organic matter").unwrap().tone, Tone::Poor);
        assert_eq!(view.row("Moisture").unwrap().tone, Tone::Info);
        assert_eq!(view.row("Texture").unwrap().icon, Some("▓"));
    }

    #[test]
    fn test_reading_values_are_capitalised() {
        let view = ResultView::new(&analysis());
        assert_eq!(view.row("Texture").unwrap().value, "Clayey");
        assert_eq!(view.row("Moisture").unwrap().value, "Waterlogged");
        assert_eq!(view.row("Organic matter").unwrap().value, "Low");
        assert_eq!(display_label(""), "");
    }

    #[test]
    fn test_optional_rows() {
        let view = ResultView::new(
            &analysis()
                .with_soil_type("Solo argiloso")
                .with_confidence(91.234),
        );
        assert_eq!(view.rows[0].label, "Soil type");
        assert_eq!(view.rows[0].value, "Solo argiloso");
        assert_eq!(view.row("Confidence").unwrap().value, "91.2%");
    }

    #[test]
    fn test_parse_hex_colors() {
        assert_eq!(parse_color("#8B4513"), Some((139, 69, 19)));
        assert_eq!(parse_color("#fff"), Some((255, 255, 255)));
        assert_eq!(parse_color("#12"), None);
        assert_eq!(parse_color("#zzzzzz"), None);
    }

    #[test]
    fn test_parse_named_colors() {
        assert_eq!(parse_color("Marrom"), Some((121, 85, 61)));
        assert_eq!(parse_color("Marrom escuro"), Some((73, 51, 37)));
        assert!(parse_color("Dark brown").is_some());
        assert_eq!(parse_color("Furta-cor"), None);
    }

    #[test]
    fn test_swatch_from_dominant_color() {
        let view = ResultView::new(&analysis());
        assert_eq!(view.swatch, Some((73, 51, 37)));
    }

    #[test]
    fn test_image_summary() {
        let store = ImageStore::new();
        let handle = store.create("field.jpg", "image/jpeg", vec![0; 2048]);
        let view = ResultView::new(&analysis()).with_image(&handle);

        let image = view.image.unwrap();
        assert_eq!(image.name, "field.jpg");
        assert_eq!(image.size, "2.0 KB");
        assert!(image.url.starts_with("soilscope://image/"));
    }

    #[test]
    fn test_report_text() {
        let report = render_report(&ResultView::new(&analysis()));

        assert!(report.contains("Dominant color  Marrom escuro"));
        assert!(report.contains("Texture         Clayey"));
        assert!(report.contains("Suggestions:"));
        assert!(report.contains("  - Melhore a drenagem do solo"));
    }

    #[test]
    fn test_report_without_suggestions() {
        let mut a = analysis();
        a.suggestions.clear();
        let report = render_report(&ResultView::new(&a));
        assert!(!report.contains("Suggestions:"));
    }
}
