//! Headless One-Shot Analysis
//!
//! `soilscope --analyze <PATH>` drives the same Shell flow as the
//! interactive client (validate, submit, wait) and prints the outcome
//! instead of drawing it.

use std::io::Write;
use std::path::Path;

use thiserror::Error;

use analyzer_core::{AnalysisError, ClassificationBackend, SelectedFile, Shell, ShellEvent};

use crate::display::{render_report, ResultView};

/// How to print a successful result
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable report
    #[default]
    Text,
    /// The service payload as pretty JSON
    Json,
}

/// Why a headless run failed
#[derive(Debug, Error)]
pub enum HeadlessError {
    /// The analysis itself failed
    #[error("{}", .0.user_message())]
    Analysis(#[from] AnalysisError),

    /// Writing the report failed
    #[error("Failed to write output: {0}")]
    Output(#[from] std::io::Error),

    /// Encoding the JSON output failed
    #[error("Failed to encode output: {0}")]
    Encode(#[from] serde_json::Error),

    /// The request ended without an outcome
    #[error("The analysis ended without a result")]
    NoOutcome,
}

/// Analyze one file and write the result to `out`
///
/// # Errors
///
/// Returns [`HeadlessError::Analysis`] for any validation or service
/// failure, or an output error if writing fails.
pub async fn analyze_file<B, W>(
    shell: &mut Shell<B>,
    path: &Path,
    format: OutputFormat,
    out: &mut W,
) -> Result<(), HeadlessError>
where
    B: ClassificationBackend,
    W: Write,
{
    shell.start_analysis();

    let file = SelectedFile::from_path(path).await?;
    shell.submit(file)?;

    match shell.next_event().await {
        Some(ShellEvent::ResultShown) => {}
        Some(ShellEvent::UploadFailed { error }) => return Err(error.into()),
        None => return Err(HeadlessError::NoOutcome),
    }

    let current = shell.current().ok_or(HeadlessError::NoOutcome)?;

    match format {
        OutputFormat::Text => {
            let view = ResultView::new(&current.analysis).with_image(&current.image);
            out.write_all(render_report(&view).as_bytes())?;
        }
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, &current.analysis)?;
            writeln!(out)?;
        }
    }
    out.flush()?;

    Ok(())
}
