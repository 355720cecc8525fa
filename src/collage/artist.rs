use std::collections::HashMap;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use crate::api::{ImageSize, Period};
use crate::collage::{CollageGenerator, RankedItem};
use crate::downloader::Downloadable;
use crate::errors::Result;
use crate::lastfm::types::image_at;
use crate::lastfm::{TopAlbums, TopArtists};

/// Artist name to the artwork of their most played album that has one.
pub fn artist_artwork(albums: &TopAlbums, size: ImageSize) -> HashMap<String, String> {
    let mut artwork = HashMap::new();
    for album in &albums.topalbums.album {
        if let Some(url) = image_at(&album.images, size) {
            artwork
                .entry(album.artist.name.clone())
                .or_insert_with(|| url.to_string());
        }
    }
    artwork
}

impl CollageGenerator {
    /// Top artists, back-filled from the user's top albums since artist
    /// records carry no usable artwork.
    pub(crate) async fn get_artists(
        &self,
        username: &str,
        period: Period,
        count: usize,
        size: ImageSize,
        cancel: &CancellationToken,
    ) -> Result<Vec<RankedItem>> {
        let page: TopArtists = self.lastfm.fetch_ranked(username, period, count, cancel).await?;
        let start = Instant::now();

        let mut items = Vec::with_capacity(page.topartists.artist.len());
        let mut missing = Vec::new();
        let mut cache_hits = 0;

        for record in &page.topartists.artist {
            let mut item = RankedItem::artist(record, size);
            if let Some(entry) = self.cache.get(item.identifier()).await {
                item.apply_cache_entry(entry);
                cache_hits += 1;
            } else {
                missing.push(items.len());
            }
            items.push(item);
        }

        if !missing.is_empty() {
            let albums: TopAlbums = self
                .lastfm
                .fetch_ranked(username, period, self.config.artist_album_lookup_count, cancel)
                .await?;
            let artwork = artist_artwork(&albums, size);

            let mut unmatched = 0;
            for index in missing {
                match artwork.get(&items[index].name) {
                    Some(url) => items[index].set_image_url(url.as_str()),
                    None => unmatched += 1,
                }
            }
            if unmatched > 0 {
                log::warn!("⚠️ [ARTIST] {} artists have no album artwork among the top albums", unmatched);
            }
        }

        log::info!(
            "🔗 [ARTIST] Image URLs resolved for {} in {:?} ({} of {} from cache)",
            username,
            start.elapsed(),
            cache_hits,
            items.len()
        );
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collage::tests::{generator, method, test_config};
    use crate::test_support::{json_response, query_param, status_response, ScriptedFetch};
    use serde_json::json;
    use std::sync::Arc;

    fn site(request: &crate::downloader::http_pool::HttpRequest) -> Result<crate::downloader::http_pool::HttpResponse> {
        match method(request).as_deref() {
            Some("user.gettopartists") => Ok(json_response(json!({
                "topartists": {
                    "artist": [
                        {"name": "Autechre", "url": "https://www.last.fm/music/Autechre", "playcount": "50"},
                        {"name": "Plaid", "url": "https://www.last.fm/music/Plaid", "playcount": "20"},
                        {"name": "Seefeel", "url": "https://www.last.fm/music/Seefeel", "playcount": "5"}
                    ],
                    "@attr": {"totalPages": "1", "page": "1"}
                }
            }))),
            Some("user.gettopalbums") => Ok(json_response(json!({
                "topalbums": {
                    "album": [
                        {"name": "Amber", "artist": {"name": "Autechre"},
                         "image": [{"size": "extralarge", "#text": "https://img.test/amber.png"}]},
                        {"name": "Tri Repetae", "artist": {"name": "Autechre"},
                         "image": [{"size": "extralarge", "#text": "https://img.test/tri.png"}]},
                        {"name": "Not For Threes", "artist": {"name": "Plaid"},
                         "image": [{"size": "extralarge", "#text": ""}]},
                        {"name": "Double Figure", "artist": {"name": "Plaid"},
                         "image": [{"size": "extralarge", "#text": "https://img.test/double.png"}]}
                    ],
                    "@attr": {"totalPages": "1", "page": "1"}
                }
            }))),
            _ => Ok(status_response(500)),
        }
    }

    #[tokio::test]
    async fn back_fills_from_most_played_album_with_art() {
        let fetch = Arc::new(ScriptedFetch::new(site));
        let generator = generator(Arc::clone(&fetch), &test_config());

        let items = generator
            .get_artists("someone", Period::Overall, 3, ImageSize::ExtraLarge, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(items[0].image_url(), "https://img.test/amber.png");
        assert_eq!(items[1].image_url(), "https://img.test/double.png");
        assert_eq!(items[2].image_url(), "");

        let requests = fetch.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(query_param(&requests[1].url, "method").as_deref(), Some("user.gettopalbums"));
        assert_eq!(query_param(&requests[1].url, "limit").as_deref(), Some("500"));
    }

    #[tokio::test]
    async fn skips_album_lookup_when_everything_is_cached() {
        let fetch = Arc::new(ScriptedFetch::new(site));
        let generator = generator(Arc::clone(&fetch), &test_config());
        for name in ["Autechre", "Plaid", "Seefeel"] {
            generator
                .cache
                .set(
                    format!("https://www.last.fm/music/{}extralarge", name),
                    crate::downloader::cache::CacheEntry {
                        url: format!("https://img.test/{}.png", name),
                        album: String::new(),
                    },
                )
                .await;
        }

        let items = generator
            .get_artists("someone", Period::Overall, 3, ImageSize::ExtraLarge, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(items[2].image_url(), "https://img.test/Seefeel.png");
        assert_eq!(fetch.count_matching("user.gettopalbums"), 0);
    }
}
