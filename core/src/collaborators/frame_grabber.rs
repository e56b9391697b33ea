//! Frame-grabber collaborator: extracts a single decoded keyframe from a
//! media playlist URL via an external subprocess, honoring a seek offset
//! (for skipping past an ad break) and an optional proxy.

use std::time::Duration;

use async_trait::async_trait;
use tokio::time::timeout;

use crate::error::FrameGrabberError;
use crate::model::Frame;

const HARD_TIMEOUT: Duration = Duration::from_secs(30);

/// Grabs a single decoded frame from a playlist URL, with a 30s hard cap
/// and a seek offset for ad-skip support.
#[async_trait]
pub trait FrameGrabber: Send + Sync {
    /// Extracts one keyframe at 1920x1080 from `playlist_url`, seeking
    /// `seek_secs` into the stream first (0.0 for no skip).
    async fn grab_frame(
        &self,
        playlist_url: &str,
        proxy: Option<&str>,
        seek_secs: f64,
    ) -> Result<Frame, FrameGrabberError>;
}

/// Default `FrameGrabber` implementation: shells out to `ffmpeg`.
pub struct FfmpegFrameGrabber;

impl FfmpegFrameGrabber {
    pub fn new() -> Self {
        Self
    }
}

impl Default for FfmpegFrameGrabber {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FrameGrabber for FfmpegFrameGrabber {
    async fn grab_frame(
        &self,
        playlist_url: &str,
        proxy: Option<&str>,
        seek_secs: f64,
    ) -> Result<Frame, FrameGrabberError> {
        let mut cmd = tokio::process::Command::new("ffmpeg");

        if let Some(proxy) = proxy {
            cmd.arg("-http_proxy").arg(proxy);
        }
        if seek_secs > 0.0 {
            cmd.arg("-ss").arg(format!("{seek_secs}"));
        }

        cmd.arg("-i")
            .arg(playlist_url)
            .args(["-vf", "scale=1920:1080"])
            .args(["-vframes", "1"])
            .args(["-f", "image2pipe"])
            .args(["-c", "png"])
            .arg("-")
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .kill_on_drop(true);

        let child = cmd.spawn().map_err(FrameGrabberError::Spawn)?;

        let output = match timeout(HARD_TIMEOUT, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => return Err(FrameGrabberError::Spawn(e)),
            Err(_) => return Err(FrameGrabberError::Timeout),
        };

        if !output.status.success() {
            return Err(FrameGrabberError::Failed(
                String::from_utf8_lossy(&output.stderr).to_string(),
            ));
        }
        if output.stdout.is_empty() {
            return Err(FrameGrabberError::EmptyOutput);
        }

        Ok(Frame::new(output.stdout))
    }
}
