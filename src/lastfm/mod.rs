pub mod types;

use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use url::Url;
use crate::api::{ImageSize, Period};
use crate::config::LastFmConfig;
use crate::downloader::http_pool::{HttpFetch, HttpRequest};
use crate::errors::{AppError, Result};
use crate::utils::cancellable;

pub use types::{RankedPage, TopAlbums, TopArtists, TopTracks, TrackInfo};

/// Image URLs stop getting returned by the API at around 500 per page.
pub const MAX_PER_PAGE: usize = 500;

/// Client for the Last.fm statistics API.
#[derive(Clone)]
pub struct LastFmClient {
    fetch: Arc<dyn HttpFetch>,
    endpoint: String,
    api_key: String,
}

impl LastFmClient {
    pub fn new(fetch: Arc<dyn HttpFetch>, config: &LastFmConfig) -> Self {
        Self {
            fetch,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
        }
    }

    /// Fetches and merges pages of a ranked list until `count` items are held
    /// or the provider reports no further pages.
    pub async fn fetch_ranked<R: RankedPage>(
        &self,
        username: &str,
        period: Period,
        count: usize,
        cancel: &CancellationToken,
    ) -> Result<R> {
        let mut aggregate = R::default();
        let mut page: u32 = 1;

        log::info!("📡 [LASTFM] Fetching {} for {} (period {}, count {})", R::METHOD, username, period, count);

        while aggregate.total_fetched() < count {
            let limit = (count - aggregate.total_fetched()).min(MAX_PER_PAGE);
            log::debug!(
                "📡 [LASTFM] Page {} (limit {}, fetched {}/{})",
                page,
                limit,
                aggregate.total_fetched(),
                count
            );

            let url = self.build_url(&[
                ("method", R::METHOD.to_string()),
                ("user", username.to_string()),
                ("period", period.as_str().to_string()),
                ("limit", limit.to_string()),
                ("page", page.to_string()),
            ])?;

            let start = Instant::now();
            let response = cancellable(cancel, self.fetch.send(HttpRequest::get(url))).await?;
            log::info!("📡 [LASTFM] {} page {} completed in {:?}", R::METHOD, page, start.elapsed());

            if response.status == 404 {
                return Err(AppError::UserNotFound);
            }
            if response.status != 200 {
                return Err(AppError::FetchFailed(format!("unexpected status code: {}", response.status)));
            }

            let parsed: R = response.json()?;
            let total_pages = parsed.total_pages();
            let fetched_before = aggregate.total_fetched();
            aggregate.append(parsed);

            if total_pages == page || total_pages == 0 {
                break;
            }
            if aggregate.total_fetched() == fetched_before {
                log::warn!("⚠️ [LASTFM] Page {} of {} was empty, stopping", page, total_pages);
                break;
            }
            page += 1;
        }

        aggregate.truncate(count);
        log::info!("✅ [LASTFM] {} returned {} items", R::METHOD, aggregate.total_fetched());
        Ok(aggregate)
    }

    /// Album title and artwork for one track at the given size.
    pub async fn get_track_info(
        &self,
        track: &str,
        artist: &str,
        size: ImageSize,
        cancel: &CancellationToken,
    ) -> Result<TrackInfo> {
        let url = self.build_url(&[
            ("method", "track.getInfo".to_string()),
            ("track", track.to_string()),
            ("artist", artist.to_string()),
        ])?;

        let response = cancellable(cancel, self.fetch.send(HttpRequest::get(url))).await?;
        if response.status == 404 {
            return Err(AppError::FetchFailed("track not found".to_string()));
        }
        if !response.is_success() {
            return Err(AppError::FetchFailed(format!("unexpected status code: {}", response.status)));
        }

        let info: types::TrackInfoResponse = response.json()?;
        let album = info.track.album;
        match types::image_at(&album.images, size) {
            Some(url) => Ok(TrackInfo {
                album_name: album.title.clone(),
                image_url: url.to_string(),
            }),
            None => Err(AppError::NoImageFound),
        }
    }

    fn build_url(&self, params: &[(&str, String)]) -> Result<String> {
        let mut url = Url::parse(&self.endpoint)
            .map_err(|e| AppError::Validation(format!("invalid Last.fm endpoint: {}", e)))?;
        {
            let mut query = url.query_pairs_mut();
            for (name, value) in params {
                query.append_pair(name, value);
            }
            query.append_pair("api_key", &self.api_key);
            query.append_pair("format", "json");
        }
        Ok(url.into())
    }
}
