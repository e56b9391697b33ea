//! Business-logic services: the three long-lived loops and their shared
//! helpers.

pub mod alert;
pub mod frame_acquisition;
pub mod image_analyzer;
pub mod pipeline;
pub mod roster_fetcher;
pub mod search;

pub use alert::AlertLoop;
pub use frame_acquisition::{acquire_frame, pick_proxy};
pub use image_analyzer::{analyze_frame, keep_longest_four, purify_username};
pub use pipeline::{PipelineCollaborators, PipelineCoordinator};
pub use roster_fetcher::RosterFetcher;
pub use search::{escape_like_query, search_streams};
