use image::DynamicImage;
use crate::api::ImageSize;
use crate::downloader::cache::CacheEntry;
use crate::downloader::Downloadable;
use crate::lastfm::types::{AlbumRecord, ArtistRecord, TrackRecord};
use crate::processing::{Drawable, TextFields};

/// Per-type fields of a ranked item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemDetails {
    Album { artist: String },
    Artist,
    Track { artist: String, album: String },
}

/// One ranked entity placed into one grid cell.
#[derive(Debug, Clone)]
pub struct RankedItem {
    pub name: String,
    pub playcount: String,
    pub details: ItemDetails,
    identifier: String,
    image_url: String,
    image: Option<DynamicImage>,
}

impl RankedItem {
    pub fn album(record: &AlbumRecord, size: ImageSize) -> Self {
        let identifier = if record.mbid.is_empty() {
            format!("{}{}{}", record.name, record.artist.name, size.as_str())
        } else {
            format!("{}{}", record.mbid, size.as_str())
        };
        Self::new(
            &record.name,
            &record.playcount,
            ItemDetails::Album {
                artist: record.artist.name.clone(),
            },
            identifier,
        )
    }

    pub fn artist(record: &ArtistRecord, size: ImageSize) -> Self {
        let identifier = if record.mbid.is_empty() {
            format!("{}{}", record.url, size.as_str())
        } else {
            format!("{}{}", record.mbid, size.as_str())
        };
        Self::new(&record.name, &record.playcount, ItemDetails::Artist, identifier)
    }

    pub fn track(record: &TrackRecord, size: ImageSize) -> Self {
        let identifier = if record.mbid.is_empty() {
            format!("{}{}{}", record.name, record.artist.name, size.as_str())
        } else {
            format!("{}{}", record.mbid, size.as_str())
        };
        Self::new(
            &record.name,
            &record.playcount,
            ItemDetails::Track {
                artist: record.artist.name.clone(),
                album: String::new(),
            },
            identifier,
        )
    }

    fn new(name: &str, playcount: &str, details: ItemDetails, identifier: String) -> Self {
        Self {
            name: name.to_string(),
            playcount: playcount.to_string(),
            details,
            identifier,
            image_url: String::new(),
            image: None,
        }
    }

    pub fn artist_name(&self) -> &str {
        match &self.details {
            ItemDetails::Album { artist } | ItemDetails::Track { artist, .. } => artist,
            ItemDetails::Artist => &self.name,
        }
    }

    pub fn set_image_url(&mut self, url: impl Into<String>) {
        self.image_url = url.into();
    }

    /// Resolved album for a track; ignored for other kinds.
    pub fn set_album(&mut self, name: impl Into<String>) {
        if let ItemDetails::Track { album, .. } = &mut self.details {
            *album = name.into();
        }
    }

    /// Applies a cached lookup.
    pub fn apply_cache_entry(&mut self, entry: CacheEntry) {
        self.set_album(entry.album);
        self.image_url = entry.url;
    }
}

impl Downloadable for RankedItem {
    fn image_url(&self) -> &str {
        &self.image_url
    }

    fn identifier(&self) -> &str {
        &self.identifier
    }

    fn cache_entry(&self) -> CacheEntry {
        let album = match &self.details {
            ItemDetails::Track { album, .. } => album.clone(),
            _ => String::new(),
        };
        CacheEntry {
            url: self.image_url.clone(),
            album,
        }
    }

    fn set_image(&mut self, image: DynamicImage) {
        self.image = Some(image);
    }
}

impl Drawable for RankedItem {
    fn image(&self) -> Option<&DynamicImage> {
        self.image.as_ref()
    }

    fn text_fields(&self) -> TextFields<'_> {
        let playcount = Some(self.playcount.as_str());
        match &self.details {
            ItemDetails::Album { artist } => TextFields {
                track: None,
                artist: Some(artist.as_str()),
                album: Some(self.name.as_str()),
                playcount,
            },
            ItemDetails::Artist => TextFields {
                track: None,
                artist: Some(self.name.as_str()),
                album: None,
                playcount,
            },
            ItemDetails::Track { artist, album } => TextFields {
                track: Some(self.name.as_str()),
                artist: Some(artist.as_str()),
                album: Some(album.as_str()),
                playcount,
            },
        }
    }
}
