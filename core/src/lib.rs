//! snipewatch-core - shared library for the stream-snipe detection system.
//!
//! This crate provides the core functionality for polling a streaming
//! platform's roster of live broadcasts of a configured game, pulling a
//! frame from each, OCR-reading player nicknames out of the HUD, and
//! alerting configured streamers when a watched nickname shows up.
//!
//! # Architecture
//!
//! - [`model`]: core data types (`Stream`, `StreamTask`, `AlertEntry`, `TriggerKey`)
//! - [`config`]: grouped configuration with validation
//! - [`error`]: centralized error types
//! - [`ttl_map`]: generic TTL cache backing the alert loop's dedupe state
//! - [`collaborators`]: trait abstractions for everything external (HTTP
//!   APIs, OCR microservice, image/video subprocesses, chat, datastore)
//! - [`services`]: the three long-lived loops (roster fetcher, pipeline
//!   coordinator, alert loop) plus their pure-function helpers
//! - [`bootstrap`]: composition root wiring collaborators and services together

pub mod bootstrap;
pub mod collaborators;
pub mod config;
pub mod error;
pub mod model;
pub mod services;
pub mod ttl_map;

pub use bootstrap::{bootstrap_services, BootstrappedServices};
pub use config::Config;
pub use error::{ErrorCode, SnipeError, SnipeResult};
pub use model::{now_millis, AlertEntry, Frame, Stream, StreamTask, TriggerKey};
