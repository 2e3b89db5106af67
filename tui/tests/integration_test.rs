//! Integration Tests for the TUI + Analyzer Core
//!
//! These tests drive the App with synthetic terminal events against a mock
//! classification backend, and render into ratatui's `TestBackend` to check
//! what each screen shows.
//!
//! # Test Coverage
//!
//! 1. **Navigation**: landing → upload → result → upload/landing
//! 2. **Drop**: a pasted path is submitted like a dropped file
//! 3. **Errors**: rejected files and failed requests stay on the upload screen
//! 4. **Headless**: `--analyze` text and JSON output

use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers};
use pretty_assertions::assert_eq;
use ratatui::backend::TestBackend;
use ratatui::Terminal;
use tempfile::NamedTempFile;
use tokio_test::{assert_err, assert_ok};

use analyzer_core::{
    AnalysisError, ClassificationBackend, ImagePayload, Level, Moisture, Screen, Shell,
    SoilAnalysis, Texture, UploadLimits,
};
use soilscope_tui::app::Notice;
use soilscope_tui::headless::{analyze_file, HeadlessError, OutputFormat};
use soilscope_tui::theme::ThemeMode;
use soilscope_tui::App;

// ============================================================================
// Mock Backend
// ============================================================================

struct MockBackend {
    requests: AtomicUsize,
    fail_with: Option<String>,
    delay: Duration,
}

impl MockBackend {
    fn ok() -> Arc<Self> {
        Arc::new(Self {
            requests: AtomicUsize::new(0),
            fail_with: None,
            delay: Duration::ZERO,
        })
    }

    fn failing(detail: &str) -> Arc<Self> {
        Arc::new(Self {
            requests: AtomicUsize::new(0),
            fail_with: Some(detail.to_string()),
            delay: Duration::ZERO,
        })
    }

    fn slow() -> Arc<Self> {
        Arc::new(Self {
            requests: AtomicUsize::new(0),
            fail_with: None,
            delay: Duration::from_millis(200),
        })
    }

    fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ClassificationBackend for MockBackend {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn classify(&self, _image: ImagePayload) -> Result<SoilAnalysis, AnalysisError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if let Some(ref detail) = self.fail_with {
            return Err(AnalysisError::ClassificationRequestFailed {
                status: 500,
                detail: detail.clone(),
            });
        }
        Ok(SoilAnalysis::new(
            Texture::Sandy,
            Moisture::Dry,
            Level::Medium,
            Level::Low,
            "Amarelado",
        )
        .with_suggestion("Implemente sistema de irrigação")
        .with_suggestion("Adicione matéria orgânica"))
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn app(backend: Arc<MockBackend>) -> App<MockBackend> {
    App::new(
        Shell::new(backend, UploadLimits::default()),
        ThemeMode::Dark,
        "http://localhost:5000/analyze",
    )
}

fn key(code: KeyCode) -> Event {
    Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
}

fn photo(suffix: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(b"soil-photo").unwrap();
    file
}

async fn type_text(app: &mut App<MockBackend>, text: &str) {
    for c in text.chars() {
        app.handle_event(key(KeyCode::Char(c))).await;
    }
}

async fn wait_for_screen(app: &mut App<MockBackend>, screen: Screen) {
    for _ in 0..200 {
        app.process_shell_events();
        if app.shell().screen() == screen && !app.shell().upload().is_analyzing() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("never reached {screen:?}");
}

async fn wait_until_idle(app: &mut App<MockBackend>) {
    for _ in 0..200 {
        app.process_shell_events();
        if !app.shell().upload().is_analyzing() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("request never finished");
}

fn render(app: &mut App<MockBackend>) -> String {
    let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
    terminal.draw(|frame| app.draw(frame)).unwrap();

    let buffer = terminal.backend().buffer();
    let width = buffer.area.width as usize;
    buffer
        .content()
        .chunks(width)
        .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
        .collect::<Vec<_>>()
        .join("\n")
}

fn path_text(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

// ============================================================================
// Navigation
// ============================================================================

#[tokio::test]
async fn test_landing_renders_sections() {
    let mut app = app(MockBackend::ok());
    let screen = render(&mut app);

    assert!(screen.contains("soilscope"));
    assert!(screen.contains("What is soil analysis?"));
    assert!(screen.contains("Enter start"));
}

#[tokio::test]
async fn test_typed_path_reaches_result() {
    let backend = MockBackend::ok();
    let mut app = app(backend.clone());
    let photo = photo(".png");

    app.handle_event(key(KeyCode::Enter)).await;
    assert_eq!(app.shell().screen(), Screen::Upload);
    assert!(render(&mut app).contains("Tips for a better analysis"));

    type_text(&mut app, &path_text(photo.path())).await;
    app.handle_event(key(KeyCode::Enter)).await;
    wait_for_screen(&mut app, Screen::Result).await;

    assert_eq!(backend.requests(), 1);
    assert_eq!(app.path_input(), "");

    let screen = render(&mut app);
    assert!(screen.contains("Fertility"));
    assert!(screen.contains("Medium"));
    assert!(screen.contains("Implemente sistema de irrigação"));
    assert!(screen.contains("image/png"));
}

#[tokio::test]
async fn test_new_analysis_and_home_release_image() {
    let mut app = app(MockBackend::ok());
    let photo = photo(".jpg");

    app.handle_event(Event::Paste(path_text(photo.path()))).await;
    wait_for_screen(&mut app, Screen::Result).await;
    assert_eq!(app.shell().images().live_count(), 1);

    app.handle_event(key(KeyCode::Char('n'))).await;
    assert_eq!(app.shell().screen(), Screen::Upload);
    assert_eq!(app.shell().images().live_count(), 0);

    app.handle_event(key(KeyCode::Esc)).await;
    assert_eq!(app.shell().screen(), Screen::Landing);
}

#[tokio::test]
async fn test_quit_keys() {
    let mut app = app(MockBackend::ok());
    app.handle_event(key(KeyCode::Char('q'))).await;
    assert!(!app.is_running());

    let mut app = self::app(MockBackend::ok());
    app.handle_event(Event::Key(KeyEvent::new(
        KeyCode::Char('c'),
        KeyModifiers::CONTROL,
    )))
    .await;
    assert!(!app.is_running());
}

#[tokio::test]
async fn test_theme_toggle() {
    let mut app = app(MockBackend::ok());
    assert_eq!(app.theme().mode, ThemeMode::Dark);

    app.handle_event(Event::Key(KeyEvent::new(
        KeyCode::Char('t'),
        KeyModifiers::CONTROL,
    )))
    .await;
    assert_eq!(app.theme().mode, ThemeMode::Light);
}

// ============================================================================
// Drop and Errors
// ============================================================================

#[tokio::test]
async fn test_dropped_quoted_path_from_landing() {
    let backend = MockBackend::ok();
    let mut app = app(backend.clone());
    let photo = photo(".png");

    app.handle_event(Event::Paste(format!("'{}'", path_text(photo.path()))))
        .await;
    wait_for_screen(&mut app, Screen::Result).await;
    assert_eq!(backend.requests(), 1);
}

#[tokio::test]
async fn test_non_image_shows_inline_error() {
    let backend = MockBackend::ok();
    let mut app = app(backend.clone());
    let notes = photo(".txt");

    app.handle_event(key(KeyCode::Enter)).await;
    app.handle_event(Event::Paste(path_text(notes.path()))).await;

    assert_eq!(app.shell().screen(), Screen::Upload);
    assert!(app.shell().upload().error().is_some());
    assert!(render(&mut app).contains("Please select an image file"));

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(backend.requests(), 0);
}

#[tokio::test]
async fn test_missing_file_notice() {
    let mut app = app(MockBackend::ok());

    app.handle_event(key(KeyCode::Enter)).await;
    type_text(&mut app, "/definitely/not/here.png").await;
    app.handle_event(key(KeyCode::Enter)).await;

    assert!(matches!(app.notice(), Some(Notice::Error(_))));
    assert_eq!(app.shell().screen(), Screen::Upload);
}

#[tokio::test]
async fn test_failed_request_stays_on_upload() {
    let mut app = app(MockBackend::failing("server error"));
    let photo = photo(".png");

    app.handle_event(key(KeyCode::Enter)).await;
    app.handle_event(Event::Paste(path_text(photo.path()))).await;
    wait_until_idle(&mut app).await;

    assert_eq!(app.shell().screen(), Screen::Upload);
    assert!(render(&mut app).contains("Analysis failed: server error"));
}

#[tokio::test]
async fn test_escape_cancels_analysis() {
    let mut app = app(MockBackend::slow());
    let photo = photo(".png");

    app.handle_event(Event::Paste(path_text(photo.path()))).await;
    assert!(app.shell().upload().is_analyzing());
    assert!(render(&mut app).contains("Analyzing your soil..."));

    app.handle_event(key(KeyCode::Esc)).await;
    assert_eq!(app.shell().screen(), Screen::Landing);
    assert!(!app.shell().upload().is_analyzing());

    tokio::time::sleep(Duration::from_millis(300)).await;
    app.process_shell_events();
    assert_eq!(app.shell().screen(), Screen::Landing);
    assert!(app.shell().current().is_none());
}

// ============================================================================
// Headless
// ============================================================================

#[tokio::test]
async fn test_headless_text_report() {
    let mut shell = Shell::new(MockBackend::ok(), UploadLimits::default());
    let photo = photo(".jpg");
    let mut out = Vec::new();

    assert_ok!(analyze_file(&mut shell, photo.path(), OutputFormat::Text, &mut out).await);

    let report = String::from_utf8(out).unwrap();
    assert!(report.contains("Texture         Sandy"));
    assert!(report.contains("image/jpeg"));
    assert!(report.contains("  - Adicione matéria orgânica"));
}

#[tokio::test]
async fn test_headless_json_uses_wire_labels() {
    let mut shell = Shell::new(MockBackend::ok(), UploadLimits::default());
    let photo = photo(".png");
    let mut out = Vec::new();

    assert_ok!(analyze_file(&mut shell, photo.path(), OutputFormat::Json, &mut out).await);

    let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(value["texture"], "arenoso");
    assert_eq!(value["organicMatter"], "baixo");
    assert_eq!(value["suggestions"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_headless_failure() {
    let mut shell = Shell::new(MockBackend::failing("server error"), UploadLimits::default());
    let photo = photo(".png");
    let mut out = Vec::new();

    let err = assert_err!(analyze_file(&mut shell, photo.path(), OutputFormat::Text, &mut out).await);

    assert!(matches!(err, HeadlessError::Analysis(_)));
    assert_eq!(err.to_string(), "Analysis failed: server error");
    assert!(out.is_empty());
}

#[tokio::test]
async fn test_headless_rejects_non_image() {
    let backend = MockBackend::ok();
    let mut shell = Shell::new(backend.clone(), UploadLimits::default());
    let notes = photo(".txt");
    let mut out = Vec::new();

    let err = assert_err!(analyze_file(&mut shell, notes.path(), OutputFormat::Text, &mut out).await);

    assert!(matches!(
        err,
        HeadlessError::Analysis(AnalysisError::InvalidFileType { .. })
    ));
    assert_eq!(backend.requests(), 0);
}
