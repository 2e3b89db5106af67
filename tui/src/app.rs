//! Main Application
//!
//! The App struct manages the TUI lifecycle as a thin display client:
//! - Event loop (keyboard, bracketed paste, resize)
//! - Shell for navigation and the analysis request
//! - Rendering of the landing, upload and result screens
//!
//! Dropping a file onto the terminal arrives as a bracketed paste of its
//! path; the App normalises it and submits it like a typed path.

use std::path::PathBuf;
use std::time::Duration;

use crossterm::event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use futures::StreamExt;
use ratatui::backend::Backend;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::{Frame, Terminal};

use analyzer_core::{
    normalize_dropped_path, AnalysisError, ClassificationBackend, Screen, SelectedFile, Shell,
    ShellEvent,
};

use crate::content;
use crate::display::ResultView;
use crate::theme::{Theme, ThemeMode};
use crate::widgets::{TextBlock, TextBlockState};

/// Frame tick; drives the spinner and completion polling
const TICK: Duration = Duration::from_millis(100);

/// Spinner frames for the analyzing view
const SPINNER: &[&str] = &["◐", "◓", "◑", "◒"];

/// Transient message under the upload form
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notice {
    /// Informational
    Info(String),
    /// Something the user must fix
    Error(String),
}

/// Main application state
pub struct App<B: ClassificationBackend> {
    // === Core State ===
    /// Is the app still running?
    running: bool,
    /// Navigation and the analysis request
    shell: Shell<B>,
    /// Endpoint shown in the status bar
    endpoint: String,

    // === UI State ===
    theme: Theme,
    /// Path being typed on the upload screen
    path_input: String,
    notice: Option<Notice>,
    landing_lines: Vec<(String, Style)>,
    landing_scroll: TextBlockState,
    suggestions_scroll: TextBlockState,
    spinner_frame: usize,
}

impl<B: ClassificationBackend> App<B> {
    /// Create an App over a Shell
    pub fn new(shell: Shell<B>, theme: ThemeMode, endpoint: impl Into<String>) -> Self {
        let theme = Theme::for_mode(theme);
        Self {
            running: true,
            shell,
            endpoint: endpoint.into(),
            landing_lines: style_landing(&theme),
            theme,
            path_input: String::new(),
            notice: None,
            landing_scroll: TextBlockState::default(),
            suggestions_scroll: TextBlockState::default(),
            spinner_frame: 0,
        }
    }

    /// Whether the loop should keep going
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// The Shell driving navigation
    #[must_use]
    pub fn shell(&self) -> &Shell<B> {
        &self.shell
    }

    /// Active theme
    #[must_use]
    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    /// Text in the path input
    #[must_use]
    pub fn path_input(&self) -> &str {
        &self.path_input
    }

    /// Current notice, if any
    #[must_use]
    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    /// Main event loop
    pub async fn run<T: Backend>(&mut self, terminal: &mut Terminal<T>) -> anyhow::Result<()> {
        let mut event_stream = EventStream::new();

        // Render initial frame immediately so user sees UI
        terminal.draw(|frame| self.draw(frame))?;

        while self.running {
            tokio::select! {
                biased;

                maybe_event = event_stream.next() => {
                    match maybe_event {
                        Some(Ok(event)) => self.handle_event(event).await,
                        Some(Err(e)) => tracing::warn!(error = %e, "Terminal event error"),
                        None => self.running = false,
                    }
                }

                _ = tokio::time::sleep(TICK) => {
                    self.spinner_frame = self.spinner_frame.wrapping_add(1);
                }
            }

            self.process_shell_events();
            terminal.draw(|frame| self.draw(frame))?;
        }

        // Leaving mid-request aborts it
        self.shell.cancel_analysis();
        Ok(())
    }

    /// Apply any finished request to the UI
    pub fn process_shell_events(&mut self) {
        while let Some(event) = self.shell.poll() {
            match event {
                ShellEvent::ResultShown => {
                    self.path_input.clear();
                    self.notice = None;
                    self.suggestions_scroll.reset();
                }
                ShellEvent::UploadFailed { error } => {
                    tracing::debug!(kind = error.kind(), "Upload failed, message shown inline");
                }
            }
        }
    }

    /// Handle one terminal event
    pub async fn handle_event(&mut self, event: Event) {
        match event {
            // Only handle Press events (not Release or Repeat)
            Event::Key(key) if key.kind == KeyEventKind::Press => self.handle_key(key).await,
            Event::Paste(text) => self.handle_paste(&text).await,
            _ => {}
        }
    }

    async fn handle_key(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        match key.code {
            KeyCode::Char('c') if ctrl => {
                self.running = false;
                return;
            }
            KeyCode::Char('t') if ctrl => {
                self.toggle_theme();
                return;
            }
            _ => {}
        }

        match self.shell.screen() {
            Screen::Landing => self.handle_landing_key(key),
            Screen::Upload => self.handle_upload_key(key).await,
            Screen::Result => self.handle_result_key(key),
        }
    }

    fn handle_landing_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter | KeyCode::Char('s') => {
                self.notice = None;
                self.shell.start_analysis();
            }
            KeyCode::Up | KeyCode::Char('k') => self.landing_scroll.scroll(-1),
            KeyCode::Down | KeyCode::Char('j') => self.landing_scroll.scroll(1),
            KeyCode::PageUp => self.landing_scroll.page(false),
            KeyCode::PageDown => self.landing_scroll.page(true),
            KeyCode::Esc | KeyCode::Char('q') => self.running = false,
            _ => {}
        }
    }

    async fn handle_upload_key(&mut self, key: KeyEvent) {
        if self.shell.upload().is_analyzing() {
            if key.code == KeyCode::Esc {
                self.shell.cancel_analysis();
                self.shell.back_to_home();
                self.notice = Some(Notice::Info("Analysis cancelled.".into()));
            }
            return;
        }

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => {
                self.path_input.clear();
                self.notice = None;
                self.shell.back_to_home();
            }
            KeyCode::Enter => {
                let typed = self.path_input.clone();
                match normalize_dropped_path(&typed) {
                    Some(path) => self.submit_path(expand_home(path)).await,
                    None => {
                        self.notice = Some(Notice::Error(
                            "Type the path of a soil photo, or drop one here.".into(),
                        ));
                    }
                }
            }
            KeyCode::Char('u') if ctrl => self.path_input.clear(),
            KeyCode::Backspace => {
                self.path_input.pop();
            }
            KeyCode::Char(c) if !ctrl => {
                self.path_input.push(c);
                self.notice = None;
                self.shell.clear_error();
            }
            _ => {}
        }
    }

    fn handle_result_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter | KeyCode::Char('n') => self.shell.new_analysis(),
            KeyCode::Esc | KeyCode::Char('h') => self.shell.back_to_home(),
            KeyCode::Up | KeyCode::Char('k') => self.suggestions_scroll.scroll(-1),
            KeyCode::Down | KeyCode::Char('j') => self.suggestions_scroll.scroll(1),
            KeyCode::PageUp => self.suggestions_scroll.page(false),
            KeyCode::PageDown => self.suggestions_scroll.page(true),
            KeyCode::Char('q') => self.running = false,
            _ => {}
        }
    }

    async fn handle_paste(&mut self, text: &str) {
        if self.shell.upload().is_analyzing() {
            self.notice = Some(Notice::Info(
                "An analysis is already in progress.".into(),
            ));
            return;
        }

        match normalize_dropped_path(text) {
            Some(path) => {
                match self.shell.screen() {
                    Screen::Landing => self.shell.start_analysis(),
                    Screen::Result => self.shell.new_analysis(),
                    Screen::Upload => {}
                }
                self.path_input.clear();
                self.submit_path(expand_home(path)).await;
            }
            None if self.shell.screen() == Screen::Upload => {
                self.path_input.push_str(text.trim());
            }
            None => {}
        }
    }

    async fn submit_path(&mut self, path: PathBuf) {
        self.notice = None;

        let file = match SelectedFile::from_path(&path).await {
            Ok(file) => file,
            Err(err) => {
                tracing::info!(path = %path.display(), error = %err, "Selected file unusable");
                self.notice = Some(Notice::Error(err.user_message()));
                return;
            }
        };

        match self.shell.submit(file) {
            Ok(_) => self.path_input.clear(),
            Err(AnalysisError::Busy) => {
                self.notice = Some(Notice::Info(AnalysisError::Busy.user_message()));
            }
            // Validation failures are shown from the controller's error
            Err(_) => {}
        }
    }

    fn toggle_theme(&mut self) {
        self.theme = self.theme.toggled();
        self.landing_lines = style_landing(&self.theme);
    }

    // ========================================================================
    // Rendering
    // ========================================================================

    /// Draw the current screen
    pub fn draw(&mut self, frame: &mut Frame) {
        let [header, body, status] = Layout::vertical([
            Constraint::Length(2),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .areas(frame.area());

        self.draw_header(frame, header);

        match self.shell.screen() {
            Screen::Landing => self.draw_landing(frame, body),
            Screen::Upload if self.shell.upload().is_analyzing() => {
                self.draw_analyzing(frame, body);
            }
            Screen::Upload => self.draw_upload(frame, body),
            Screen::Result => self.draw_result(frame, body),
        }

        self.draw_status(frame, status);
    }

    fn draw_header(&self, frame: &mut Frame, area: Rect) {
        let line = Line::from(vec![
            Span::styled(content::APP_NAME, self.theme.title_style()),
            Span::styled(" · ", self.theme.dim_style()),
            Span::styled(self.shell.screen().title(), self.theme.text_style()),
        ]);
        let header = Paragraph::new(line).block(
            Block::default()
                .borders(Borders::BOTTOM)
                .border_style(Style::default().fg(self.theme.border)),
        );
        frame.render_widget(header, area);
    }

    fn draw_landing(&mut self, frame: &mut Frame, area: Rect) {
        let inner = inset(area, 2, 1);
        frame.render_stateful_widget(
            TextBlock::new(&self.landing_lines),
            inner,
            &mut self.landing_scroll,
        );
    }

    fn draw_upload(&self, frame: &mut Frame, area: Rect) {
        let tips_height = content::UPLOAD_TIPS.len() as u16 + 1;
        let [tips, input, message, _rest] = Layout::vertical([
            Constraint::Length(tips_height),
            Constraint::Length(3),
            Constraint::Length(2),
            Constraint::Min(0),
        ])
        .areas(inset(area, 2, 1));

        let mut tip_lines = vec![Line::styled(
            "Tips for a better analysis:",
            self.theme.title_style(),
        )];
        tip_lines.extend(content::UPLOAD_TIPS.iter().map(|tip| {
            Line::from(vec![
                Span::styled("  • ", self.theme.dim_style()),
                Span::styled(*tip, self.theme.text_style()),
            ])
        }));
        frame.render_widget(Paragraph::new(tip_lines), tips);

        let field = Paragraph::new(Line::from(vec![
            Span::styled(self.path_input.as_str(), self.theme.text_style()),
            Span::styled("_", self.theme.dim_style()),
        ]))
        .block(
            Block::bordered()
                .title(" Drop an image here or type its path ")
                .border_style(Style::default().fg(self.theme.accent)),
        );
        frame.render_widget(field, input);

        let message_line = match (&self.notice, self.shell.upload().error()) {
            (Some(Notice::Error(text)), _) => {
                Some(Line::styled(text.clone(), self.theme.error_style()))
            }
            (_, Some(text)) => Some(Line::styled(text.to_string(), self.theme.error_style())),
            (Some(Notice::Info(text)), None) => {
                Some(Line::styled(text.clone(), self.theme.dim_style()))
            }
            (None, None) => None,
        };
        if let Some(line) = message_line {
            frame.render_widget(Paragraph::new(line).wrap(Wrap { trim: true }), message);
        }
    }

    fn draw_analyzing(&self, frame: &mut Frame, area: Rect) {
        let spinner = SPINNER[self.spinner_frame % SPINNER.len()];
        let file = self.shell.upload().in_flight_file().unwrap_or("image");

        let lines = vec![
            Line::from(vec![
                Span::styled(format!("{spinner} "), Style::default().fg(self.theme.accent)),
                Span::styled("Analyzing your soil...", self.theme.title_style()),
            ]),
            Line::default(),
            Line::styled(content::ANALYZING_TEXT, self.theme.text_style()),
            Line::default(),
            Line::styled(format!("File: {file}"), self.theme.dim_style()),
        ];

        frame.render_widget(
            Paragraph::new(lines).wrap(Wrap { trim: true }),
            inset(area, 2, 1),
        );
    }

    fn draw_result(&mut self, frame: &mut Frame, area: Rect) {
        let Some(current) = self.shell.current() else {
            return;
        };
        let view = ResultView::new(&current.analysis).with_image(&current.image);

        let rows_height = view.rows.len() as u16 + 1;
        let [rows_area, suggestions_area, meta_area] = Layout::vertical([
            Constraint::Length(rows_height),
            Constraint::Min(2),
            Constraint::Length(1),
        ])
        .areas(inset(area, 2, 1));

        let label_width = view.label_width();
        let mut lines = Vec::with_capacity(view.rows.len());
        for row in &view.rows {
            let pad = label_width.saturating_sub(unicode_width::UnicodeWidthStr::width(row.label));
            let mut spans = vec![Span::styled(
                format!("{}{}  ", row.label, " ".repeat(pad)),
                self.theme.dim_style(),
            )];
            if let Some(icon) = row.icon {
                spans.push(Span::styled(format!("{icon} "), self.theme.text_style()));
            }
            if row.label == "Dominant color" {
                if let Some((r, g, b)) = view.swatch {
                    spans.push(Span::styled("██ ", Style::default().fg(Color::Rgb(r, g, b))));
                }
            }
            spans.push(Span::styled(
                row.value.clone(),
                Style::default()
                    .fg(self.theme.tone(row.tone))
                    .add_modifier(Modifier::BOLD),
            ));
            lines.push(Line::from(spans));
        }
        frame.render_widget(Paragraph::new(lines), rows_area);

        let [title_area, list_area] =
            Layout::vertical([Constraint::Length(1), Constraint::Min(1)]).areas(suggestions_area);
        frame.render_widget(
            Paragraph::new(Line::styled("Suggestions", self.theme.title_style())),
            title_area,
        );

        let suggestion_lines: Vec<(String, Style)> = if view.suggestions.is_empty() {
            vec![("No suggestions for this sample.".into(), self.theme.dim_style())]
        } else {
            view.suggestions
                .iter()
                .map(|s| (format!("• {s}"), self.theme.text_style()))
                .collect()
        };
        frame.render_stateful_widget(
            TextBlock::new(&suggestion_lines),
            list_area,
            &mut self.suggestions_scroll,
        );

        if let Some(image) = view.image {
            let meta = format!(
                "{} · {} · {} · {}",
                image.name, image.media_type, image.size, image.url
            );
            frame.render_widget(
                Paragraph::new(Line::styled(meta, self.theme.dim_style())),
                meta_area,
            );
        }
    }

    fn draw_status(&self, frame: &mut Frame, area: Rect) {
        let keys = match self.shell.screen() {
            Screen::Landing => "Enter start | ↑↓ scroll | q quit",
            Screen::Upload if self.shell.upload().is_analyzing() => "Esc cancel",
            Screen::Upload => "Enter analyze | Esc back",
            Screen::Result => "n new analysis | h home | ↑↓ scroll | q quit",
        };
        let state = match (&self.notice, self.shell.screen()) {
            (Some(Notice::Info(text)), Screen::Landing) => text.as_str(),
            _ => self.shell.upload().status().description(),
        };
        let status = format!(
            " {} | {} | {} | Ctrl+T theme",
            state, self.endpoint, keys
        );
        frame.render_widget(
            Paragraph::new(Line::styled(status, self.theme.dim_style())),
            area,
        );
    }
}

fn style_landing(theme: &Theme) -> Vec<(String, Style)> {
    content::landing_lines()
        .into_iter()
        .map(|(text, heading)| {
            let style = if heading {
                theme.title_style()
            } else {
                theme.text_style()
            };
            (text, style)
        })
        .collect()
}

fn inset(area: Rect, horizontal: u16, vertical: u16) -> Rect {
    Rect {
        x: area.x.saturating_add(horizontal),
        y: area.y.saturating_add(vertical),
        width: area.width.saturating_sub(horizontal * 2),
        height: area.height.saturating_sub(vertical * 2),
    }
}

/// Expand a leading `~/` to the home directory
fn expand_home(path: PathBuf) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => dirs::home_dir().map_or(path.clone(), |home| home.join(rest)),
        Err(_) => path,
    }
}
