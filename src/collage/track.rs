use std::time::Instant;
use futures::future::join_all;
use tokio_util::sync::CancellationToken;
use crate::api::{ImageSize, Period};
use crate::collage::{CollageGenerator, RankedItem};
use crate::downloader::Downloadable;
use crate::errors::{AppError, Result};
use crate::lastfm::{TopTracks, TrackInfo};

impl CollageGenerator {
    /// Top tracks, resolved one by one against `track.getInfo` then Spotify.
    ///
    /// Lookups run all at once; track collages are capped low enough for that.
    pub(crate) async fn get_tracks(
        &self,
        username: &str,
        period: Period,
        count: usize,
        size: ImageSize,
        cancel: &CancellationToken,
    ) -> Result<Vec<RankedItem>> {
        let page: TopTracks = self.lastfm.fetch_ranked(username, period, count, cancel).await?;
        let start = Instant::now();

        let mut items = Vec::with_capacity(page.toptracks.track.len());
        let mut missing = Vec::new();
        let mut cache_hits = 0;

        for record in &page.toptracks.track {
            let mut item = RankedItem::track(record, size);
            if let Some(entry) = self.cache.get(item.identifier()).await {
                item.apply_cache_entry(entry);
                cache_hits += 1;
            } else {
                missing.push(items.len());
            }
            items.push(item);
        }

        let lookups = missing.iter().map(|&index| {
            let track = items[index].name.clone();
            let artist = items[index].artist_name().to_string();
            async move { (index, self.resolve_track(&track, &artist, size, cancel).await) }
        });
        let results = join_all(lookups).await;

        for (index, result) in results {
            match result {
                Ok(info) => {
                    items[index].set_image_url(info.image_url);
                    items[index].set_album(info.album_name);
                }
                Err(AppError::Cancelled) => return Err(AppError::Cancelled),
                Err(e) => log::error!(
                    "❌ [TRACK] Error getting track info for '{}' by '{}': {}",
                    items[index].name,
                    items[index].artist_name(),
                    e
                ),
            }
        }

        log::info!(
            "🔗 [TRACK] Image URLs resolved for {} in {:?} ({} of {} from cache)",
            username,
            start.elapsed(),
            cache_hits,
            items.len()
        );
        Ok(items)
    }

    async fn resolve_track(
        &self,
        track: &str,
        artist: &str,
        size: ImageSize,
        cancel: &CancellationToken,
    ) -> Result<TrackInfo> {
        match self.lastfm.get_track_info(track, artist, size, cancel).await {
            Ok(info) if !info.image_url.is_empty() => return Ok(info),
            Ok(_) => log::warn!("⚠️ [TRACK] Last.fm returned no image for '{}'", track),
            Err(AppError::Cancelled) => return Err(AppError::Cancelled),
            Err(e) => log::warn!("⚠️ [TRACK] Error getting track info from Last.fm: {}", e),
        }

        let Some(spotify) = self.spotify.as_ref() else {
            return Err(AppError::NoImageFound);
        };
        match spotify.search_track(track, artist, cancel).await {
            Ok(info) if !info.image_url.is_empty() => Ok(info),
            Ok(_) => Err(AppError::NoImageFound),
            Err(AppError::Cancelled) => Err(AppError::Cancelled),
            Err(e) => {
                log::warn!("⚠️ [TRACK] Error getting track info from Spotify: {}", e);
                Err(AppError::NoImageFound)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::api::{ImageSize, Period};
    use crate::collage::tests::{generator, method, test_config};
    use crate::downloader::Downloadable;
    use crate::processing::Drawable;
    use crate::test_support::{json_response, query_param, status_response, ScriptedFetch};
    use serde_json::json;
    use std::sync::Arc;
    use tokio_util::sync::CancellationToken;

    #[tokio::test]
    async fn resolves_each_track_through_track_info() {
        let fetch = Arc::new(ScriptedFetch::new(|request| match method(request).as_deref() {
            Some("user.gettoptracks") => Ok(json_response(json!({
                "toptracks": {
                    "track": [
                        {"name": "Flim", "artist": {"name": "Aphex Twin"}, "playcount": "30"},
                        {"name": "Lost Track", "artist": {"name": "Unknown"}, "playcount": "2"}
                    ],
                    "@attr": {"totalPages": "1", "page": "1"}
                }
            }))),
            Some("track.getInfo") if query_param(&request.url, "track").as_deref() == Some("Flim") => {
                Ok(json_response(json!({
                    "track": {"album": {
                        "title": "Come to Daddy",
                        "image": [{"size": "extralarge", "#text": "https://img.test/daddy.png"}]
                    }}
                })))
            }
            _ => Ok(status_response(404)),
        }));
        let generator = generator(Arc::clone(&fetch), &test_config());

        let items = generator
            .get_tracks("someone", Period::SevenDays, 2, ImageSize::ExtraLarge, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].image_url(), "https://img.test/daddy.png");
        assert_eq!(items[0].text_fields().album, Some("Come to Daddy"));
        assert_eq!(items[1].image_url(), "");
        assert_eq!(fetch.count_matching("track.getInfo"), 2);
    }
}
