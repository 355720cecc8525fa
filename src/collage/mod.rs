pub mod album;
pub mod artist;
pub mod item;
pub mod track;

use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use crate::api::{CollageRequest, CollageType};
use crate::config::AppConfig;
use crate::downloader::cache::ImageUrlCache;
use crate::downloader::http_pool::HttpFetch;
use crate::downloader::manager::ImageDownloadManager;
use crate::errors::{AppError, Result};
use crate::lastfm::LastFmClient;
use crate::processing::{CollageOutput, Compositor};
use crate::spotify::SpotifyClient;

pub use item::{ItemDetails, RankedItem};

/// Runs one collage request through fetch, normalise, download and composite.
pub struct CollageGenerator {
    config: AppConfig,
    lastfm: LastFmClient,
    spotify: Option<SpotifyClient>,
    cache: Arc<ImageUrlCache>,
    downloader: ImageDownloadManager,
    compositor: Arc<Compositor>,
}

impl CollageGenerator {
    pub fn new(config: &AppConfig, fetch: Arc<dyn HttpFetch>, cache: Arc<ImageUrlCache>) -> Self {
        let spotify = SpotifyClient::from_config(Arc::clone(&fetch), &config.spotify);
        if spotify.is_none() {
            log::info!("ℹ️ [SPOTIFY] No credentials configured, Spotify fallback disabled");
        }

        Self {
            config: config.clone(),
            lastfm: LastFmClient::new(Arc::clone(&fetch), &config.lastfm),
            spotify,
            downloader: ImageDownloadManager::new(fetch, Arc::clone(&cache), config.downloader.workers),
            cache,
            compositor: Arc::new(Compositor::new(&config.fonts)),
        }
    }

    pub fn with_compositor(mut self, compositor: Compositor) -> Self {
        self.compositor = Arc::new(compositor);
        self
    }

    /// Rejects counts above the per-type ceiling.
    pub fn check_ceiling(&self, method: CollageType, count: usize) -> Result<()> {
        let limit = match method {
            CollageType::Album => self.config.max_images.albums,
            CollageType::Artist => Some(self.config.max_images.artists),
            CollageType::Track => Some(self.config.max_images.tracks),
        };
        match limit {
            Some(limit) if count > limit => {
                log::warn!("⚠️ [COLLAGE] {} {} images requested, limit is {}", count, method, limit);
                Err(AppError::TooManyImages)
            }
            _ => Ok(()),
        }
    }

    pub async fn generate(&self, request: &CollageRequest, cancel: &CancellationToken) -> Result<CollageOutput> {
        let start = Instant::now();
        let count = request.count();
        self.check_ceiling(request.method, count)?;

        let cutoffs = &self.config.image_size_cutoffs;
        let size = request.image_size(cutoffs);
        let options = request.display_options(cutoffs);

        log::info!(
            "🎯 [COLLAGE] {} collage for {} ({}x{}, period {}, size {})",
            request.method,
            request.username,
            request.rows,
            request.columns,
            request.period,
            size.as_str()
        );

        let mut items = match request.method {
            CollageType::Album => self.get_albums(&request.username, request.period, count, size, cancel).await?,
            CollageType::Artist => self.get_artists(&request.username, request.period, count, size, cancel).await?,
            CollageType::Track => self.get_tracks(&request.username, request.period, count, size, cancel).await?,
        };
        if cancel.is_cancelled() {
            return Err(AppError::Cancelled);
        }

        self.downloader.download_images(&mut items, cancel).await?;
        if cancel.is_cancelled() {
            return Err(AppError::Cancelled);
        }

        let compositor = Arc::clone(&self.compositor);
        let output = tokio::task::spawn_blocking(move || compositor.create_collage(&items, &options))
            .await
            .map_err(|e| AppError::Encode(format!("compositor task failed: {}", e)))??;

        log::info!("✅ [COLLAGE] Request for {} finished in {:?}", request.username, start.elapsed());
        Ok(output)
    }
}
