//! Static Screen Content
//!
//! Copy for the landing and upload screens.

/// Application name shown in titles
pub const APP_NAME: &str = "soilscope";

/// Tagline under the landing title
pub const TAGLINE: &str = "Discover the characteristics of your soil from a photo";

/// One titled block of landing text
#[derive(Clone, Copy, Debug)]
pub struct Section {
    /// Heading
    pub title: &'static str,
    /// Paragraphs or list items
    pub items: &'static [&'static str],
    /// Render items as a numbered list
    pub numbered: bool,
}

/// Landing screen sections, top to bottom
pub const LANDING: &[Section] = &[
    Section {
        title: "What is soil analysis?",
        items: &[
            "Soil analysis is a fundamental step in agriculture: it identifies the physical \
             and chemical characteristics of a soil and how suitable it is for different crops.",
            "Send a photo of a soil sample and get a basic reading of your soil. It is quick, \
             practical and free of lab work.",
        ],
        numbered: false,
    },
    Section {
        title: "What we analyze",
        items: &[
            "Dominant color: hints at mineral composition and organic content.",
            "Texture: sandy, clayey or silty, which drives irrigation and cultivation.",
            "Moisture: how wet the soil is, to guide watering.",
            "Fertility: potential estimated from visual traits and color.",
            "Organic matter: content estimated from color.",
            "Suggestions: cultivation and management tips based on the full reading.",
        ],
        numbered: false,
    },
    Section {
        title: "How it works",
        items: &[
            "Photograph a soil sample in good light",
            "Upload the photo as JPG or PNG",
            "The classifier reads the visual traits of the soil",
            "Get a detailed reading and cultivation suggestions",
        ],
        numbered: true,
    },
    Section {
        title: "Why soil matters",
        items: &[
            "Soil is a non-renewable resource.",
            "It takes hundreds of years to form.",
            "It is the base of food production.",
            "It holds a quarter of the planet's biodiversity.",
            "It filters and purifies water.",
        ],
        numbered: false,
    },
];

/// Call to action at the bottom of the landing screen
pub const CALL_TO_ACTION: &str = "Ready to analyze your soil? Press Enter to start.";

/// Tips shown above the path input
pub const UPLOAD_TIPS: &[&str] = &[
    "Take the photo in good natural light",
    "Remove leaves, stones and other debris",
    "Photograph a representative patch of soil",
    "Use JPG or PNG images (10 MB at most)",
];

/// Explanation shown while a request is in flight
pub const ANALYZING_TEXT: &str = "The classifier is processing the image and identifying the \
                                  characteristics of the soil. This can take a few seconds.";

/// Flatten the landing sections into display lines
///
/// Each line is paired with whether it is a heading.
#[must_use]
pub fn landing_lines() -> Vec<(String, bool)> {
    let mut lines = vec![(TAGLINE.to_string(), false), (String::new(), false)];

    for section in LANDING {
        lines.push((section.title.to_string(), true));
        for (i, item) in section.items.iter().enumerate() {
            let text = if section.numbered {
                format!("  {}. {}", i + 1, item)
            } else if section.items.len() > 2 {
                format!("  • {item}")
            } else {
                (*item).to_string()
            };
            lines.push((text, false));
        }
        lines.push((String::new(), false));
    }

    lines.push((CALL_TO_ACTION.to_string(), true));
    lines
}
