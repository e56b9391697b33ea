//! Image-manipulation collaborator: crop and OCR-conditioning, each a call
//! out to an external `magick` subprocess.

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::error::ImageToolError;

/// A crop rectangle, top-left origin, in pixels.
#[derive(Debug, Clone, Copy)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

#[async_trait]
pub trait ImageTool: Send + Sync {
    /// Crops `png_bytes` to `rect`, returning a new PNG-encoded image.
    async fn crop(&self, png_bytes: &[u8], rect: Rect) -> Result<Vec<u8>, ImageToolError>;

    /// Conditions a crop for OCR: grayscale, auto-level, a local-adaptive
    /// threshold clone darkened against a global-threshold clone, negated,
    /// alpha dropped.
    async fn condition_for_ocr(&self, png_bytes: &[u8]) -> Result<Vec<u8>, ImageToolError>;
}

/// Default `ImageTool` implementation: shells out to the `magick` CLI.
pub struct MagickImageTool;

impl MagickImageTool {
    pub fn new() -> Self {
        Self
    }

    async fn run_magick(args: &[&str], input: &[u8]) -> Result<Vec<u8>, ImageToolError> {
        let mut cmd = Command::new("magick");
        cmd.args(args);
        cmd.stdin(std::process::Stdio::piped());
        cmd.stdout(std::process::Stdio::piped());
        cmd.stderr(std::process::Stdio::piped());

        let mut child = cmd.spawn()?;

        let mut stdin = child.stdin.take().expect("stdin was piped");
        let input = input.to_vec();
        let writer = tokio::spawn(async move {
            let _ = stdin.write_all(&input).await;
        });

        let output = child.wait_with_output().await?;
        let _ = writer.await;

        if !output.status.success() {
            return Err(ImageToolError::Failed(
                String::from_utf8_lossy(&output.stderr).to_string(),
            ));
        }
        if output.stdout.is_empty() {
            return Err(ImageToolError::Failed("empty output".to_string()));
        }

        Ok(output.stdout)
    }
}

impl Default for MagickImageTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageTool for MagickImageTool {
    async fn crop(&self, png_bytes: &[u8], rect: Rect) -> Result<Vec<u8>, ImageToolError> {
        let geometry = format!("{}x{}+{}+{}", rect.w, rect.h, rect.x, rect.y);
        Self::run_magick(
            &["png:-", "-crop", &geometry, "+repage", "png:-"],
            png_bytes,
        )
        .await
    }

    async fn condition_for_ocr(&self, png_bytes: &[u8]) -> Result<Vec<u8>, ImageToolError> {
        Self::run_magick(
            &[
                "png:-",
                "-colorspace",
                "Gray",
                "-auto-level",
                "(",
                "+clone",
                "-lat",
                "8x8+5%",
                ")",
                "(",
                "+clone",
                "-threshold",
                "60%",
                ")",
                "-compose",
                "darken",
                "-composite",
                "-negate",
                "-alpha",
                "off",
                "png:-",
            ],
            png_bytes,
        )
        .await
    }
}
