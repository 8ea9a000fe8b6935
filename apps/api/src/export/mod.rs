//! PDF export: hands a rendered preview to an external HTML→PDF rasterizer.
//!
//! Fire-and-forget: `export_to_pdf` spawns the job and logs the outcome. Nothing
//! flows back into document state.

pub mod handlers;

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::render::RenderedResume;

pub const DEFAULT_FILE_NAME: &str = "my-resume";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Rasterizer exited with {0}")]
    Rasterizer(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PageFormat {
    Letter,
}

impl PageFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            PageFormat::Letter => "Letter",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Orientation {
    Portrait,
}

impl Orientation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Orientation::Portrait => "Portrait",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PdfOptions {
    /// Without the `.pdf` extension.
    pub file_name: String,
    pub margin_in: f32,
    /// JPEG quality for embedded images, 0.0 – 1.0.
    pub image_quality: f32,
    pub scale: u8,
    pub page_format: PageFormat,
    pub orientation: Orientation,
}

impl Default for PdfOptions {
    fn default() -> Self {
        Self {
            file_name: DEFAULT_FILE_NAME.to_string(),
            margin_in: 0.5,
            image_quality: 0.98,
            scale: 2,
            page_format: PageFormat::Letter,
            orientation: Orientation::Portrait,
        }
    }
}

impl PdfOptions {
    /// Default options with a file name restricted to `[A-Za-z0-9_-]`.
    pub fn named(name: &str) -> Self {
        let file_name: String = name
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '-'
                }
            })
            .collect();
        if file_name.is_empty() {
            return Self::default();
        }
        Self {
            file_name,
            ..Self::default()
        }
    }

    pub fn output_file(&self) -> String {
        format!("{}.pdf", self.file_name)
    }
}

#[async_trait]
pub trait PdfRasterizer: Send + Sync {
    /// Rasterizes `html` and returns the path of the written PDF.
    async fn rasterize(&self, html: &str, options: &PdfOptions) -> Result<PathBuf, ExportError>;
}

/// Runs an external wkhtmltopdf-compatible program.
pub struct CommandRasterizer {
    program: String,
    output_dir: PathBuf,
}

impl CommandRasterizer {
    pub fn new(program: impl Into<String>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            output_dir: output_dir.into(),
        }
    }
}

#[async_trait]
impl PdfRasterizer for CommandRasterizer {
    async fn rasterize(&self, html: &str, options: &PdfOptions) -> Result<PathBuf, ExportError> {
        tokio::fs::create_dir_all(&self.output_dir).await?;

        // Removed when dropped at the end of this call.
        let input = tempfile::Builder::new()
            .prefix("vitae-")
            .suffix(".html")
            .tempfile()?;
        tokio::fs::write(input.path(), standalone_page(html)).await?;

        let output = self.output_dir.join(options.output_file());
        let margin = format!("{}in", options.margin_in);
        let quality = ((options.image_quality * 100.0).round() as u32).to_string();
        let zoom = options.scale.to_string();

        let status = Command::new(&self.program)
            .arg("--quiet")
            .args(["--page-size", options.page_format.as_str()])
            .args(["--orientation", options.orientation.as_str()])
            .args(["--margin-top", margin.as_str(), "--margin-bottom", margin.as_str()])
            .args(["--margin-left", margin.as_str(), "--margin-right", margin.as_str()])
            .args(["--image-quality", quality.as_str()])
            .args(["--zoom", zoom.as_str()])
            .arg(input.path())
            .arg(&output)
            .status()
            .await?;

        if !status.success() {
            return Err(ExportError::Rasterizer(status.to_string()));
        }
        Ok(output)
    }
}

fn standalone_page(body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>Resume</title></head>\n<body>\n{body}</body>\n</html>\n"
    )
}

/// Starts a PDF export and returns immediately. The outcome is only logged.
pub fn export_to_pdf(
    rasterizer: Arc<dyn PdfRasterizer>,
    rendered: RenderedResume,
    options: PdfOptions,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        match rasterizer.rasterize(&rendered.html, &options).await {
            Ok(path) => info!(
                "Exported {} ({} template) to {}",
                options.output_file(),
                rendered.template,
                path.display()
            ),
            Err(e) => warn!("PDF export of {} failed: {e}", options.output_file()),
        }
    })
}

#[cfg(test)]
pub mod recording {
    use std::sync::Mutex;

    use super::*;

    /// Records every rasterize call instead of producing a PDF.
    #[derive(Default)]
    pub struct RecordingRasterizer {
        pub calls: Mutex<Vec<(String, PdfOptions)>>,
    }

    #[async_trait]
    impl PdfRasterizer for RecordingRasterizer {
        async fn rasterize(
            &self,
            html: &str,
            options: &PdfOptions,
        ) -> Result<PathBuf, ExportError> {
            self.calls
                .lock()
                .unwrap()
                .push((html.to_string(), options.clone()));
            Ok(PathBuf::from(options.output_file()))
        }
    }
}
