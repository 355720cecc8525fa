use std::sync::Arc;
use serde::Deserialize;
use tokio::sync::OnceCell;
use tokio_util::sync::CancellationToken;
use crate::config::SpotifyConfig;
use crate::downloader::http_pool::{HttpFetch, HttpRequest};
use crate::errors::{AppError, Result};
use crate::lastfm::TrackInfo;
use crate::utils::cancellable;

const SEARCH_LIMIT: u32 = 5;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Default, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    tracks: Option<SearchPage<TrackItem>>,
    #[serde(default)]
    albums: Option<SearchPage<AlbumItem>>,
}

#[derive(Debug, Deserialize)]
struct SearchPage<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

#[derive(Debug, Default, Deserialize)]
struct NamedRef {
    #[serde(default)]
    name: String,
}

#[derive(Debug, Default, Deserialize)]
struct SpotifyImage {
    url: String,
    #[serde(default)]
    width: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct AlbumItem {
    #[serde(default)]
    name: String,
    #[serde(default)]
    artists: Vec<NamedRef>,
    #[serde(default)]
    images: Vec<SpotifyImage>,
}

#[derive(Debug, Default, Deserialize)]
struct TrackItem {
    #[serde(default)]
    name: String,
    #[serde(default)]
    artists: Vec<NamedRef>,
    #[serde(default)]
    album: AlbumItem,
}

impl AlbumItem {
    fn largest_image(&self) -> Option<&str> {
        self.images
            .iter()
            .filter(|image| !image.url.is_empty())
            .max_by_key(|image| image.width.unwrap_or(0))
            .map(|image| image.url.as_str())
    }
}

/// Secondary artwork source, used when Last.fm has no image.
pub struct SpotifyClient {
    fetch: Arc<dyn HttpFetch>,
    client_id: String,
    client_secret: String,
    token_endpoint: String,
    search_endpoint: String,
    token: OnceCell<String>,
}

impl SpotifyClient {
    /// `None` when no credentials are configured.
    pub fn from_config(fetch: Arc<dyn HttpFetch>, config: &SpotifyConfig) -> Option<Self> {
        let (client_id, client_secret) = config.credentials()?;
        Some(Self {
            fetch,
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            token_endpoint: config.token_endpoint.clone(),
            search_endpoint: config.search_endpoint.clone(),
            token: OnceCell::new(),
        })
    }

    async fn access_token(&self, cancel: &CancellationToken) -> Result<&str> {
        let token = self
            .token
            .get_or_try_init(|| self.request_token(cancel))
            .await?;
        Ok(token.as_str())
    }

    async fn request_token(&self, cancel: &CancellationToken) -> Result<String> {
        log::info!("🔑 [SPOTIFY] Requesting client credentials token");
        let request = HttpRequest::post_form(
            self.token_endpoint.clone(),
            vec![
                ("grant_type".to_string(), "client_credentials".to_string()),
                ("client_id".to_string(), self.client_id.clone()),
                ("client_secret".to_string(), self.client_secret.clone()),
            ],
        );
        let response = cancellable(cancel, self.fetch.send(request)).await?;
        if response.status != 200 {
            return Err(AppError::FetchFailed(format!(
                "spotify authentication failed: status {}",
                response.status
            )));
        }
        let token: TokenResponse = response.json()?;
        Ok(token.access_token)
    }

    async fn search(&self, query: &str, kind: &str, cancel: &CancellationToken) -> Result<SearchResponse> {
        let token = self.access_token(cancel).await?;
        let url = format!(
            "{}?q={}&type={}&limit={}",
            self.search_endpoint,
            urlencoding::encode(query),
            kind,
            SEARCH_LIMIT
        );
        let request = HttpRequest::get(url).header("Authorization", format!("Bearer {}", token));

        let response = cancellable(cancel, self.fetch.send(request)).await?;
        if !response.is_success() {
            log::warn!("⚠️ [SPOTIFY] Search returned status {} for query: {}", response.status, query);
            return Err(AppError::FetchFailed(format!("spotify search failed: status {}", response.status)));
        }
        response.json()
    }

    /// Album name and largest cover for a track.
    pub async fn search_track(&self, track: &str, artist: &str, cancel: &CancellationToken) -> Result<TrackInfo> {
        let query = format!("artist:\"{}\" track:\"{}\"", artist, track);
        let response = self.search(&query, "track", cancel).await?;
        let items = response.tracks.map(|page| page.items).unwrap_or_default();

        for item in &items {
            let artists: Vec<&str> = item.artists.iter().map(|a| a.name.as_str()).collect();
            if !is_good_match(artist, track, &artists, &item.name) {
                continue;
            }
            if let Some(url) = item.album.largest_image() {
                log::debug!("✅ [SPOTIFY] Track match '{}' by '{}'", item.name, artists.join(", "));
                return Ok(TrackInfo {
                    album_name: item.album.name.clone(),
                    image_url: url.to_string(),
                });
            }
        }
        Err(AppError::NoImageFound)
    }

    /// Largest cover URL for an album.
    pub async fn search_album(&self, album: &str, artist: &str, cancel: &CancellationToken) -> Result<String> {
        let query = format!("artist:\"{}\" album:\"{}\"", artist, album);
        let response = self.search(&query, "album", cancel).await?;
        let items = response.albums.map(|page| page.items).unwrap_or_default();

        items
            .iter()
            .filter(|item| {
                let artists: Vec<&str> = item.artists.iter().map(|a| a.name.as_str()).collect();
                is_good_match(artist, album, &artists, &item.name)
            })
            .find_map(|item| item.largest_image())
            .map(str::to_string)
            .ok_or(AppError::NoImageFound)
    }
}

/// Title must share most words with the target and at least one artist half of them.
fn is_good_match(target_artist: &str, target_title: &str, result_artists: &[&str], result_title: &str) -> bool {
    let title_similarity = calculate_similarity(&target_title.to_lowercase(), &result_title.to_lowercase());
    if title_similarity < 0.6 {
        return false;
    }

    let target_artist = target_artist.to_lowercase();
    let best_artist_similarity = result_artists
        .iter()
        .map(|artist| calculate_similarity(&target_artist, &artist.to_lowercase()))
        .fold(0.0_f32, f32::max);

    best_artist_similarity >= 0.5
}

/// Share of words in `s1` that also appear in `s2`.
fn calculate_similarity(s1: &str, s2: &str) -> f32 {
    let words1: Vec<&str> = s1.split_whitespace().collect();
    let words2: Vec<&str> = s2.split_whitespace().collect();

    if words1.is_empty() || words2.is_empty() {
        return 0.0;
    }

    let matching_words = words1.iter().filter(|word| words2.contains(word)).count();
    matching_words as f32 / words1.len() as f32
}
