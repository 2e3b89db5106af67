//! TextBlock Widget
//!
//! A borderless, scrollable region of styled lines. Long lines are wrapped
//! to the area width; scrolling is clamped so the last page stays full.

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::widgets::StatefulWidget;
use textwrap::wrap;
use unicode_width::UnicodeWidthStr;

/// State for a scrollable text block
#[derive(Clone, Copy, Debug, Default)]
pub struct TextBlockState {
    /// Scroll offset (lines from top)
    pub scroll_offset: usize,
    /// Total wrapped lines at last render
    pub total_lines: usize,
    /// Visible height at last render
    pub viewport: usize,
}

impl TextBlockState {
    /// Scroll by delta (positive = down)
    pub fn scroll(&mut self, delta: i32) {
        let magnitude = delta.unsigned_abs() as usize;
        self.scroll_offset = if delta < 0 {
            self.scroll_offset.saturating_sub(magnitude)
        } else {
            self.scroll_offset.saturating_add(magnitude).min(self.max_scroll())
        };
    }

    /// Scroll by one page
    pub fn page(&mut self, down: bool) {
        let page = self.viewport.saturating_sub(1).max(1) as i32;
        self.scroll(if down { page } else { -page });
    }

    /// Back to the top
    pub fn reset(&mut self) {
        self.scroll_offset = 0;
    }

    /// Whether anything is hidden below the viewport
    #[must_use]
    pub fn has_more_below(&self) -> bool {
        self.scroll_offset < self.max_scroll()
    }

    fn max_scroll(&self) -> usize {
        self.total_lines.saturating_sub(self.viewport)
    }
}

/// A borderless, scrollable block of styled lines
pub struct TextBlock<'a> {
    lines: &'a [(String, Style)],
}

impl<'a> TextBlock<'a> {
    /// Create a block over pre-styled lines
    #[must_use]
    pub fn new(lines: &'a [(String, Style)]) -> Self {
        Self { lines }
    }
}

impl StatefulWidget for TextBlock<'_> {
    type State = TextBlockState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        if area.width == 0 || area.height == 0 {
            return;
        }

        let width = area.width as usize;
        let wrapped: Vec<(String, Style)> = self
            .lines
            .iter()
            .flat_map(|(line, style)| {
                if line.is_empty() {
                    vec![(String::new(), *style)]
                } else {
                    wrap(line, width)
                        .into_iter()
                        .map(|cow| (cow.into_owned(), *style))
                        .collect()
                }
            })
            .collect();

        state.total_lines = wrapped.len();
        state.viewport = area.height as usize;
        state.scroll_offset = state.scroll_offset.min(state.max_scroll());

        for (i, (line, style)) in wrapped
            .iter()
            .skip(state.scroll_offset)
            .take(area.height as usize)
            .enumerate()
        {
            let y = area.y + i as u16;
            let clipped = clip_to_width(line, width);
            buf.set_string(area.x, y, clipped, *style);
        }
    }
}

/// Longest prefix of `text` that fits in `width` columns
fn clip_to_width(text: &str, width: usize) -> &str {
    if text.width() <= width {
        return text;
    }
    let mut used = 0;
    for (idx, ch) in text.char_indices() {
        let w = unicode_width::UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + w > width {
            return &text[..idx];
        }
        used += w;
    }
    text
}
