//! Application bootstrap and dependency wiring.
//!
//! The composition root: the single place where every collaborator and
//! service is instantiated and wired together.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use tokio_util::sync::CancellationToken;

use crate::collaborators::{
    ChatApi, Datastore, FfmpegFrameGrabber, FrameGrabber, HttpChatClient, HttpLiveMediaClient,
    HttpOcrClient, HttpRosterClient, ImageTool, InMemoryDatastore, LiveMediaApi, MagickImageTool,
    OcrService, RosterApi,
};
use crate::config::Config;
use crate::error::{SnipeError, SnipeResult};
use crate::model::AlertEntry;
use crate::services::{AlertLoop, PipelineCollaborators, PipelineCoordinator, RosterFetcher};

/// Container for all bootstrapped services.
///
/// Holds the three long-lived loops plus the cancellation token that stops
/// all of them together. Cloning is cheap: everything inside is an `Arc`.
#[derive(Clone)]
pub struct BootstrappedServices {
    pub roster_fetcher: Arc<RosterFetcher>,
    pub pipeline: Arc<PipelineCoordinator>,
    pub alert_loop: Arc<AlertLoop>,
    pub datastore: Arc<dyn Datastore>,
    pub cancel_token: CancellationToken,
}

impl BootstrappedServices {
    /// Signals every background loop to stop after its current unit of work.
    pub fn shutdown(&self) {
        log::info!("beginning graceful shutdown");
        self.cancel_token.cancel();
    }
}

fn build_http_client() -> reqwest::Result<Client> {
    Client::builder().timeout(Duration::from_secs(30)).build()
}

/// Bootstraps all services with their dependencies, in dependency order:
///
/// 1. shared HTTP client and cancellation token
/// 2. collaborators (roster, live-media, OCR, image-tool, frame-grabber, chat)
/// 3. OCR health check (fatal at startup if it fails)
/// 4. datastore
/// 5. the three long-lived loops: roster fetcher, pipeline coordinator, alert loop
pub async fn bootstrap_services(config: &Config) -> SnipeResult<BootstrappedServices> {
    config
        .validate()
        .map_err(SnipeError::Configuration)?;

    let http_client =
        build_http_client().map_err(|e| SnipeError::Internal(format!("http client: {e}")))?;
    let cancel_token = CancellationToken::new();

    let roster: Arc<dyn RosterApi> = Arc::new(HttpRosterClient::new(
        http_client.clone(),
        config.twitch.roster_base_url.clone(),
    ));
    let live_media: Arc<dyn LiveMediaApi> =
        Arc::new(HttpLiveMediaClient::new(config.twitch.live_media_base_url.clone()));
    let ocr: Arc<dyn OcrService> = Arc::new(HttpOcrClient::new(config.ocr.base_url.clone()));
    let image_tool: Arc<dyn ImageTool> = Arc::new(MagickImageTool::new());
    let frame_grabber: Arc<dyn FrameGrabber> = Arc::new(FfmpegFrameGrabber::new());
    let chat: Arc<dyn ChatApi> = Arc::new(HttpChatClient::new(
        http_client.clone(),
        config.twitch.chat_base_url.clone(),
    ));

    ocr.health_check().await?;

    let datastore: Arc<dyn Datastore> = Arc::new(InMemoryDatastore::new());

    let roster_fetcher = Arc::new(RosterFetcher::new(
        Arc::clone(&roster),
        Arc::clone(&datastore),
        config.twitch.game_id.clone(),
        cancel_token.clone(),
    ));

    let pipeline = Arc::new(PipelineCoordinator::new(
        PipelineCollaborators {
            datastore: Arc::clone(&datastore),
            live_media,
            frame_grabber,
            image_tool,
            ocr,
            http: http_client.clone(),
        },
        config.processing.clone(),
        config.proxy.list.clone(),
        config.twitch.ads_check,
    ));

    let alert_entries: Vec<AlertEntry> = config.alert.list.clone();
    let alert_loop = Arc::new(AlertLoop::new(
        Arc::clone(&datastore),
        chat,
        alert_entries,
        Duration::from_secs(config.alert.ttl_secs),
        Duration::from_secs(config.alert.check_interval_secs),
        config.alert.dry_run,
        cancel_token.clone(),
    ));

    Ok(BootstrappedServices {
        roster_fetcher,
        pipeline,
        alert_loop,
        datastore,
        cancel_token,
    })
}
