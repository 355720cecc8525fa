pub mod cache;
pub mod http_pool;
pub mod manager;

use image::DynamicImage;
use cache::CacheEntry;

/// An entity whose cover art can be fetched and attached in place.
pub trait Downloadable {
    /// Empty when there is no artwork to fetch.
    fn image_url(&self) -> &str;
    /// Key under which the resolved artwork is cached.
    fn identifier(&self) -> &str;
    fn cache_entry(&self) -> CacheEntry;
    fn set_image(&mut self, image: DynamicImage);
}

/// Outcome counts for one batch of downloads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DownloadSummary {
    pub downloaded: usize,
    pub skipped: usize,
    pub failed: usize,
}
