//! soilscope TUI - Terminal client for soil photo analysis
//!
//! A full-screen terminal client over `analyzer-core`: a landing page, an
//! upload screen that accepts a typed or dropped path, and a result screen
//! with color-coded readings and cultivation suggestions.
//!
//! # Architecture
//!
//! - **App**: event loop and screen rendering over the core Shell
//! - **Display**: Result Presenter (tones, icons, color swatch, text report)
//! - **Headless**: one-shot `--analyze` mode without a terminal UI
//! - **Theme**: earth-toned light and dark palettes
//! - **Widgets**: borderless scrollable text blocks

pub mod app;
pub mod content;
pub mod display;
pub mod headless;
pub mod theme;
pub mod widgets;

pub use app::App;
