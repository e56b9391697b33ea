//! Pipeline coordinator: fans a batch of online streams out across a
//! bounded fetch-worker pool, then a bounded process-worker pool, with an
//! index-ordered producer and a counting forwarder as the completion
//! barrier between them.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;

use crate::collaborators::{Datastore, FrameGrabber, ImageTool, LiveMediaApi, OcrService};
use crate::config::ProcessingConfig;
use crate::error::SnipeResult;
use crate::model::{Stream, StreamTask};

use super::frame_acquisition::acquire_frame;
use super::image_analyzer::analyze_frame;

/// Collaborators the pipeline needs for one cycle, grouped so
/// `PipelineCoordinator::new` doesn't take an unwieldy argument list.
pub struct PipelineCollaborators {
    pub datastore: Arc<dyn Datastore>,
    pub live_media: Arc<dyn LiveMediaApi>,
    pub frame_grabber: Arc<dyn FrameGrabber>,
    pub image_tool: Arc<dyn ImageTool>,
    pub ocr: Arc<dyn OcrService>,
    pub http: reqwest::Client,
}

pub struct PipelineCoordinator {
    collaborators: PipelineCollaborators,
    config: ProcessingConfig,
    proxies: Vec<String>,
    ads_check: bool,
}

/// Delay between pipeline cycles when idle, so the loop doesn't busy-spin
/// while waiting for the roster fetcher to populate online streams.
const BETWEEN_CYCLE_DELAY: Duration = Duration::from_secs(5);

impl PipelineCoordinator {
    pub fn new(
        collaborators: PipelineCollaborators,
        config: ProcessingConfig,
        proxies: Vec<String>,
        ads_check: bool,
    ) -> Self {
        Self {
            collaborators,
            config,
            proxies,
            ads_check,
        }
    }

    /// Runs the pipeline loop until cancelled: one cycle over every
    /// currently-online stream, then a short idle delay, repeated.
    pub async fn run(&self, cancel: &CancellationToken) {
        loop {
            if cancel.is_cancelled() {
                return;
            }

            if let Err(e) = self.run_cycle(cancel).await {
                log::error!("pipeline cycle failed: {e}");
            }

            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = tokio::time::sleep(BETWEEN_CYCLE_DELAY) => {}
            }
        }
    }

    /// Runs one full cycle over every currently-online stream. Returns
    /// once every task has passed through both worker pools. Workers check
    /// `cancel` before each task and drain the rest of the cycle as no-ops
    /// once it fires, rather than performing fresh acquisition/analysis.
    pub async fn run_cycle(&self, cancel: &CancellationToken) -> SnipeResult<()> {
        let streams = self.collaborators.datastore.get_online_streams().await?;
        if streams.is_empty() {
            return Ok(());
        }
        let task_count = streams.len();
        let started = Instant::now();

        log::debug!(
            "starting processing cycle: {} streams, {} fetch workers, {} process workers",
            task_count,
            self.config.fetch_worker_count,
            self.config.process_worker_count
        );

        let (fetch_tx, fetch_rx) = mpsc::channel::<StreamTask>(self.config.fetch_worker_count);
        let (internal_tx, internal_rx) =
            mpsc::channel::<StreamTask>(self.config.frame_buffer_size);
        let (process_tx, process_rx) =
            mpsc::channel::<StreamTask>(self.config.process_worker_count);

        let fetch_rx = Arc::new(Mutex::new(fetch_rx));
        let process_rx = Arc::new(Mutex::new(process_rx));
        let mut handles = Vec::new();

        for _ in 0..self.config.fetch_worker_count {
            handles.push(tokio::spawn(run_fetch_worker(
                Arc::clone(&fetch_rx),
                internal_tx.clone(),
                Arc::clone(&self.collaborators.live_media),
                Arc::clone(&self.collaborators.frame_grabber),
                Arc::clone(&self.collaborators.datastore),
                self.collaborators.http.clone(),
                self.proxies.clone(),
                self.ads_check,
                Duration::from_secs(self.config.fetch_timeout_secs),
                cancel.clone(),
            )));
        }
        drop(internal_tx);

        for _ in 0..self.config.process_worker_count {
            handles.push(tokio::spawn(run_process_worker(
                Arc::clone(&process_rx),
                Arc::clone(&self.collaborators.image_tool),
                Arc::clone(&self.collaborators.ocr),
                Arc::clone(&self.collaborators.datastore),
                Duration::from_secs(self.config.process_timeout_secs),
                cancel.clone(),
            )));
        }

        let producer = tokio::spawn(enqueue_in_order(fetch_tx, streams));
        let forwarder = tokio::spawn(forward_exactly_n(internal_rx, process_tx, task_count));

        let _ = producer.await;
        let _ = forwarder.await;
        for handle in handles {
            let _ = handle.await;
        }

        let elapsed = started.elapsed().as_secs_f64().max(f64::EPSILON);
        log::debug!(
            "processing cycle finished: {} streams in {:.2}s ({:.2}/s)",
            task_count,
            elapsed,
            task_count as f64 / elapsed
        );

        Ok(())
    }
}

#[allow(clippy::too_many_arguments)]
async fn run_fetch_worker(
    fetch_rx: Arc<Mutex<mpsc::Receiver<StreamTask>>>,
    internal_tx: mpsc::Sender<StreamTask>,
    live_media: Arc<dyn LiveMediaApi>,
    frame_grabber: Arc<dyn FrameGrabber>,
    datastore: Arc<dyn Datastore>,
    http: reqwest::Client,
    proxies: Vec<String>,
    ads_check: bool,
    timeout: Duration,
    cancel: CancellationToken,
) {
    loop {
        let task = {
            let mut rx = fetch_rx.lock().await;
            rx.recv().await
        };
        let Some(task) = task else { break };

        if cancel.is_cancelled() {
            if internal_tx.send(task.with_result(None, true)).await.is_err() {
                break;
            }
            continue;
        }

        let result = tokio::time::timeout(
            timeout,
            acquire_frame(
                &live_media,
                &frame_grabber,
                &datastore,
                &http,
                &task.stream,
                &proxies,
                ads_check,
            ),
        )
        .await;

        let task = match result {
            Ok(Ok(None)) => {
                log::debug!("{} is offline at fetch time, skipping", task.stream.id);
                task.with_result(None, false)
            }
            Ok(Ok(frame)) => task.with_result(frame, false),
            Ok(Err(e)) => {
                log::warn!("fetch failed for {}: {e}", task.stream.id);
                task.with_result(None, true)
            }
            Err(_) => {
                log::warn!("fetch timed out for {}", task.stream.id);
                task.with_result(None, true)
            }
        };

        if internal_tx.send(task).await.is_err() {
            break;
        }
    }
}

async fn run_process_worker(
    process_rx: Arc<Mutex<mpsc::Receiver<StreamTask>>>,
    image_tool: Arc<dyn ImageTool>,
    ocr: Arc<dyn OcrService>,
    datastore: Arc<dyn Datastore>,
    timeout: Duration,
    cancel: CancellationToken,
) {
    loop {
        let task = {
            let mut rx = process_rx.lock().await;
            rx.recv().await
        };
        let Some(task) = task else { break };

        if cancel.is_cancelled() || task.error || task.frame.is_none() {
            continue;
        }
        let frame = task.frame.as_ref().expect("checked above");

        let analyzed = tokio::time::timeout(timeout, analyze_frame(&image_tool, &ocr, frame)).await;

        match analyzed {
            Ok(Ok(names)) => {
                if let Err(e) = datastore.update_stream_data(&task.stream.id, names).await {
                    log::error!("failed to persist player names for {}: {e}", task.stream.id);
                }
            }
            Ok(Err(e)) => log::warn!("analysis failed for {}: {e}", task.stream.id),
            Err(_) => log::warn!("analysis timed out for {}", task.stream.id),
        }
    }
}

async fn enqueue_in_order(tx: mpsc::Sender<StreamTask>, streams: Vec<Stream>) {
    for (index, stream) in streams.into_iter().enumerate() {
        if tx.send(StreamTask::pending(index, stream)).await.is_err() {
            return;
        }
    }
}

/// Reads exactly `n` tasks from `internal_rx`, forwarding each to
/// `process_tx`, then drops both ends to close the downstream channel.
async fn forward_exactly_n(
    mut internal_rx: mpsc::Receiver<StreamTask>,
    process_tx: mpsc::Sender<StreamTask>,
    n: usize,
) {
    let mut counter = 0;
    while counter < n {
        let Some(task) = internal_rx.recv().await else {
            break;
        };
        if process_tx.send(task).await.is_err() {
            break;
        }
        counter += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn forwarder_stops_after_exactly_n_tasks() {
        let (internal_tx, internal_rx) = mpsc::channel(10);
        let (process_tx, mut process_rx) = mpsc::channel(10);

        for i in 0..5 {
            internal_tx
                .send(StreamTask::pending(i, Stream::new(format!("s{i}"), 0)))
                .await
                .unwrap();
        }
        drop(internal_tx);

        forward_exactly_n(internal_rx, process_tx, 5).await;

        let mut received = 0;
        while process_rx.recv().await.is_some() {
            received += 1;
        }
        assert_eq!(received, 5);
    }

    #[tokio::test]
    async fn producer_enqueues_in_index_order() {
        let (tx, mut rx) = mpsc::channel(10);
        let streams = vec![
            Stream::new("a", 0),
            Stream::new("b", 0),
            Stream::new("c", 0),
        ];
        enqueue_in_order(tx, streams).await;

        let seen = Arc::new(AtomicUsize::new(0));
        let mut indices = Vec::new();
        while let Some(task) = rx.recv().await {
            indices.push(task.index);
            seen.fetch_add(1, Ordering::SeqCst);
        }
        assert_eq!(indices, vec![0, 1, 2]);
    }
}
