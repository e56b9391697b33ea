//! Trait abstractions for external collaborators.
//!
//! These traits enable dependency injection for testability: services
//! depend on the trait, not a concrete HTTP/subprocess implementation.

pub mod chat;
pub mod datastore;
pub mod frame_grabber;
pub mod image_tool;
pub mod live_media;
pub mod ocr;
pub mod roster;

pub use chat::{ChatApi, HttpChatClient};
pub use datastore::{Datastore, InMemoryDatastore};
pub use frame_grabber::{FfmpegFrameGrabber, FrameGrabber};
pub use image_tool::{ImageTool, MagickImageTool, Rect};
pub use live_media::{select_optimal_quality, HttpLiveMediaClient, LiveMediaApi, MediaQuality};
pub use ocr::{HttpOcrClient, OcrMatch, OcrService};
pub use roster::{HttpRosterClient, LiveStreamRecord, RosterApi, RosterPage};
