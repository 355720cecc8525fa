use std::sync::Arc;
use std::time::{Duration, Instant};
use image::{DynamicImage, ImageFormat};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use crate::downloader::cache::{CacheEntry, ImageUrlCache};
use crate::downloader::http_pool::{HttpFetch, HttpRequest};
use crate::downloader::{DownloadSummary, Downloadable};
use crate::errors::{AppError, Result};
use crate::utils::{cancellable, get_extension, sleep_or_cancel};

/// Delay after each failed attempt; its length is the attempt count.
pub const BACKOFF_SCHEDULE: [Duration; 3] = [
    Duration::from_millis(200),
    Duration::from_millis(500),
    Duration::from_secs(1),
];

struct DownloadJob {
    index: usize,
    url: String,
    key: String,
    entry: CacheEntry,
}

/// Bounded-parallelism cover art downloader.
#[derive(Clone)]
pub struct ImageDownloadManager {
    fetch: Arc<dyn HttpFetch>,
    cache: Arc<ImageUrlCache>,
    max_concurrent: usize,
    backoff: Vec<Duration>,
}

impl ImageDownloadManager {
    pub fn new(fetch: Arc<dyn HttpFetch>, cache: Arc<ImageUrlCache>, max_concurrent: usize) -> Self {
        Self {
            fetch,
            cache,
            max_concurrent: max_concurrent.max(1),
            backoff: BACKOFF_SCHEDULE.to_vec(),
        }
    }

    /// Downloads every item's artwork and attaches it by index.
    ///
    /// Per-item failures are logged and leave that item without an image.
    /// Only cancellation is returned as an error.
    pub async fn download_images<T: Downloadable>(
        &self,
        items: &mut [T],
        cancel: &CancellationToken,
    ) -> Result<DownloadSummary> {
        let start = Instant::now();
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let mut summary = DownloadSummary::default();
        let mut tasks = JoinSet::new();

        for (index, item) in items.iter().enumerate() {
            if item.image_url().is_empty() {
                // Skip album art if it doesn't exist
                summary.skipped += 1;
                continue;
            }
            let job = DownloadJob {
                index,
                url: item.image_url().to_string(),
                key: item.identifier().to_string(),
                entry: item.cache_entry(),
            };
            let manager = self.clone();
            let semaphore = Arc::clone(&semaphore);
            let cancel = cancel.clone();

            tasks.spawn(async move {
                let index = job.index;
                let permit = tokio::select! {
                    _ = cancel.cancelled() => return (index, Err(AppError::Cancelled)),
                    permit = semaphore.acquire_owned() => permit,
                };
                let _permit = match permit {
                    Ok(permit) => permit,
                    Err(_) => return (index, Err(AppError::Cancelled)),
                };
                (index, manager.run_job(job, &cancel).await)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, Ok(image))) => {
                    items[index].set_image(image);
                    summary.downloaded += 1;
                }
                Ok((_, Err(AppError::Cancelled))) => {
                    log::warn!("⏹️ [DOWNLOAD] Cancelled, aborting {} remaining downloads", tasks.len());
                    tasks.abort_all();
                    return Err(AppError::Cancelled);
                }
                Ok((index, Err(e))) => {
                    log::error!(
                        "❌ [DOWNLOAD] Error downloading image for item {} ({}): {}",
                        index,
                        items[index].image_url(),
                        e
                    );
                    summary.failed += 1;
                }
                Err(e) => {
                    log::error!("❌ [DOWNLOAD] Download task failed: {}", e);
                    summary.failed += 1;
                }
            }
        }

        log::info!(
            "🖼️ [DOWNLOAD] {} downloaded, {} skipped, {} failed in {:?}",
            summary.downloaded,
            summary.skipped,
            summary.failed,
            start.elapsed()
        );
        Ok(summary)
    }

    async fn run_job(&self, job: DownloadJob, cancel: &CancellationToken) -> Result<DynamicImage> {
        let image = self.download_with_retry(&job.url, cancel).await?;
        self.cache.set(job.key, job.entry).await;
        Ok(image)
    }

    /// Fetches and decodes one image, retrying on the backoff schedule.
    pub async fn download_with_retry(&self, url: &str, cancel: &CancellationToken) -> Result<DynamicImage> {
        let mut last_error = None;
        for (attempt, delay) in self.backoff.iter().enumerate() {
            match self.download_image(url, cancel).await {
                Ok(image) => return Ok(image),
                Err(AppError::Cancelled) => return Err(AppError::Cancelled),
                Err(e) => {
                    log::warn!(
                        "⚠️ [DOWNLOAD] Attempt {} of {} failed for {}: {}",
                        attempt + 1,
                        self.backoff.len(),
                        url,
                        e
                    );
                    last_error = Some(e);
                }
            }
            sleep_or_cancel(*delay, cancel).await?;
        }

        Err(AppError::FetchFailed(format!(
            "failed to download image after {} retries: {}",
            self.backoff.len(),
            last_error.map(|e| e.to_string()).unwrap_or_default()
        )))
    }

    async fn download_image(&self, url: &str, cancel: &CancellationToken) -> Result<DynamicImage> {
        let response = cancellable(cancel, self.fetch.send(HttpRequest::get(url))).await?;
        if response.status != 200 {
            return Err(AppError::FetchFailed(format!("unexpected status code: {}", response.status)));
        }

        let extension = get_extension(url);
        tokio::task::spawn_blocking(move || decode_image(&response.body, extension.as_deref()))
            .await
            .map_err(|e| AppError::DecodeFailed(e.to_string()))?
    }
}

/// Decodes with a dedicated decoder for jpg and gif, sniffing anything else.
pub fn decode_image(bytes: &[u8], extension: Option<&str>) -> Result<DynamicImage> {
    let decoded = match extension {
        Some("jpg") | Some("jpeg") => image::load_from_memory_with_format(bytes, ImageFormat::Jpeg),
        Some("gif") => image::load_from_memory_with_format(bytes, ImageFormat::Gif),
        _ => image::load_from_memory(bytes),
    };
    decoded.map_err(|e| AppError::DecodeFailed(e.to_string()))
}
