//! Centralized error types for the snipewatch core library.
//!
//! Mirrors the collaborator-error-to-application-error shape used across
//! the codebase: each collaborator exposes its own error enum, and
//! [`SnipeError`] wraps them for anything that needs a single error type
//! (the pipeline coordinator, the alert loop).

use thiserror::Error;

/// Trait for error types that provide machine-readable error codes.
pub trait ErrorCode {
    /// Returns a machine-readable error code for logs/metrics.
    fn code(&self) -> &'static str;
}

/// Error returned by the live-media-playlist collaborator.
///
/// `NotFound` means the broadcast ended between roster time and fetch
/// time, and is not a failure.
#[derive(Debug, Error)]
pub enum LiveApiError {
    #[error("live API request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("live API returned status {0}")]
    Status(u16),
    #[error("stream not found")]
    NotFound,
    #[error("no quality with a parseable resolution")]
    NoQuality,
}

impl LiveApiError {
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Status(_))
    }
}

/// Error returned by the roster (paginated live-stream listing) collaborator.
#[derive(Debug, Error)]
pub enum RosterApiError {
    #[error("roster API request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("roster API returned status {0}")]
    Status(u16),
    #[error("roster API returned malformed page: {0}")]
    Decode(String),
}

impl RosterApiError {
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Status(_))
    }
}

/// Error returned by the OCR collaborator.
#[derive(Debug, Error)]
pub enum OcrError {
    #[error("OCR request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("OCR returned status {0}")]
    Status(u16),
    #[error("OCR service reported an error: {0}")]
    ServiceError(String),
}

/// Error returned by the image-conditioning subprocess collaborator.
#[derive(Debug, Error)]
pub enum ImageToolError {
    #[error("failed to launch image tool: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("image tool exited with failure: {0}")]
    Failed(String),
}

/// Error returned by the frame-grabber subprocess collaborator.
#[derive(Debug, Error)]
pub enum FrameGrabberError {
    #[error("failed to launch frame grabber: {0}")]
    Spawn(std::io::Error),
    #[error("frame grabber timed out")]
    Timeout,
    #[error("frame grabber produced no output")]
    EmptyOutput,
    #[error("frame grabber exited with failure: {0}")]
    Failed(String),
}

/// Error returned by the chat-send collaborator.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("chat send failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("chat API returned status {0}")]
    Status(u16),
}

/// Error returned by the datastore collaborator.
#[derive(Debug, Error)]
pub enum DatastoreError {
    #[error("datastore operation failed: {0}")]
    Backend(String),
}

/// Application-wide error type for anything that needs to unify collaborator
/// errors (the pipeline coordinator, the alert loop, bootstrap).
#[derive(Debug, Error)]
pub enum SnipeError {
    #[error("roster: {0}")]
    Roster(#[from] RosterApiError),
    #[error("live api: {0}")]
    LiveApi(#[from] LiveApiError),
    #[error("ocr: {0}")]
    Ocr(#[from] OcrError),
    #[error("image tool: {0}")]
    ImageTool(#[from] ImageToolError),
    #[error("frame grabber: {0}")]
    FrameGrabber(#[from] FrameGrabberError),
    #[error("chat: {0}")]
    Chat(#[from] ChatError),
    #[error("datastore: {0}")]
    Datastore(#[from] DatastoreError),
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ErrorCode for SnipeError {
    fn code(&self) -> &'static str {
        match self {
            Self::Roster(_) => "roster_error",
            Self::LiveApi(_) => "live_api_error",
            Self::Ocr(_) => "ocr_error",
            Self::ImageTool(_) => "image_tool_error",
            Self::FrameGrabber(_) => "frame_grabber_error",
            Self::Chat(_) => "chat_error",
            Self::Datastore(_) => "datastore_error",
            Self::Configuration(_) => "configuration_error",
            Self::Internal(_) => "internal_error",
        }
    }
}

/// Convenient Result alias for application-wide operations.
pub type SnipeResult<T> = Result<T, SnipeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_is_not_transient() {
        assert!(!LiveApiError::NotFound.is_transient());
        assert!(LiveApiError::Status(503).is_transient());
    }

    #[test]
    fn snipe_error_codes() {
        assert_eq!(
            SnipeError::Configuration("x".into()).code(),
            "configuration_error"
        );
    }
}
