use std::time::Instant;
use futures::stream::{self, StreamExt};
use tokio_util::sync::CancellationToken;
use crate::api::{ImageSize, Period};
use crate::collage::{CollageGenerator, RankedItem};
use crate::downloader::Downloadable;
use crate::errors::{AppError, Result};
use crate::lastfm::types::image_at;
use crate::lastfm::TopAlbums;

impl CollageGenerator {
    /// Top albums with artwork from the record, the cache, or a Spotify search.
    pub(crate) async fn get_albums(
        &self,
        username: &str,
        period: Period,
        count: usize,
        size: ImageSize,
        cancel: &CancellationToken,
    ) -> Result<Vec<RankedItem>> {
        let page: TopAlbums = self.lastfm.fetch_ranked(username, period, count, cancel).await?;
        let start = Instant::now();

        let mut items = Vec::with_capacity(page.topalbums.album.len());
        let mut missing = Vec::new();
        let mut cache_hits = 0;

        for record in &page.topalbums.album {
            let mut item = RankedItem::album(record, size);
            if let Some(entry) = self.cache.get(item.identifier()).await {
                item.apply_cache_entry(entry);
                cache_hits += 1;
            } else if let Some(url) = image_at(&record.images, size) {
                item.set_image_url(url);
            } else {
                missing.push((items.len(), record.name.clone(), record.artist.name.clone()));
            }
            items.push(item);
        }

        if !missing.is_empty() {
            self.search_missing_albums(&mut items, missing, cancel).await?;
        }

        log::info!(
            "🔗 [ALBUM] Image URLs resolved for {} in {:?} ({} of {} from cache)",
            username,
            start.elapsed(),
            cache_hits,
            items.len()
        );
        Ok(items)
    }

    async fn search_missing_albums(
        &self,
        items: &mut [RankedItem],
        missing: Vec<(usize, String, String)>,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let Some(spotify) = self.spotify.as_ref() else {
            log::debug!("🔗 [ALBUM] {} albums without artwork and no Spotify fallback", missing.len());
            return Ok(());
        };

        let results: Vec<_> = stream::iter(missing)
            .map(|(index, album, artist)| async move {
                let result = spotify.search_album(&album, &artist, cancel).await;
                (index, album, artist, result)
            })
            .buffer_unordered(self.config.downloader.workers.max(1))
            .collect()
            .await;

        for (index, album, artist, result) in results {
            match result {
                Ok(url) => items[index].set_image_url(url),
                Err(AppError::Cancelled) => return Err(AppError::Cancelled),
                Err(e) => log::error!("❌ [ALBUM] Error getting album info for '{}' by '{}': {}", album, artist, e),
            }
        }
        Ok(())
    }
}
