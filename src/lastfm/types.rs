use serde::Deserialize;
use serde::de::DeserializeOwned;
use crate::api::ImageSize;

/// One page of a ranked list, mergeable with later pages of the same kind.
pub trait RankedPage: DeserializeOwned + Default + Send {
    /// Provider method name, e.g. `user.gettopalbums`.
    const METHOD: &'static str;

    fn append(&mut self, other: Self);
    /// Total page count reported by the provider, 0 when absent.
    fn total_pages(&self) -> u32;
    fn total_fetched(&self) -> usize;
    fn truncate(&mut self, len: usize);
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LastFmImage {
    #[serde(default)]
    pub size: String,
    #[serde(rename = "#text", default)]
    pub url: String,
}

/// First non-empty image URL at `size`.
pub fn image_at(images: &[LastFmImage], size: ImageSize) -> Option<&str> {
    images
        .iter()
        .find(|image| image.size == size.as_str() && !image.url.is_empty())
        .map(|image| image.url.as_str())
}

/// Pagination envelope. Every field arrives as a string.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageAttr {
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub total_pages: String,
    #[serde(default)]
    pub page: String,
    #[serde(default)]
    pub per_page: String,
    #[serde(default)]
    pub total: String,
}

impl PageAttr {
    pub fn total_pages(&self) -> u32 {
        self.total_pages.trim().parse().unwrap_or(0)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArtistRef {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub mbid: String,
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AlbumRecord {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub artist: ArtistRef,
    #[serde(default)]
    pub mbid: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub playcount: String,
    #[serde(default, rename = "image")]
    pub images: Vec<LastFmImage>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArtistRecord {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub mbid: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub playcount: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TrackRecord {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub artist: ArtistRef,
    #[serde(default)]
    pub mbid: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub playcount: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AlbumList {
    #[serde(rename = "@attr", default)]
    pub attr: PageAttr,
    #[serde(default)]
    pub album: Vec<AlbumRecord>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TopAlbums {
    pub topalbums: AlbumList,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArtistList {
    #[serde(rename = "@attr", default)]
    pub attr: PageAttr,
    #[serde(default)]
    pub artist: Vec<ArtistRecord>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TopArtists {
    pub topartists: ArtistList,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TrackList {
    #[serde(rename = "@attr", default)]
    pub attr: PageAttr,
    #[serde(default)]
    pub track: Vec<TrackRecord>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TopTracks {
    pub toptracks: TrackList,
}

macro_rules! ranked_page {
    ($page:ty, $method:literal, $list:ident, $items:ident) => {
        impl RankedPage for $page {
            const METHOD: &'static str = $method;

            fn append(&mut self, other: Self) {
                self.$list.$items.extend(other.$list.$items);
                self.$list.attr = other.$list.attr;
            }

            fn total_pages(&self) -> u32 {
                self.$list.attr.total_pages()
            }

            fn total_fetched(&self) -> usize {
                self.$list.$items.len()
            }

            fn truncate(&mut self, len: usize) {
                self.$list.$items.truncate(len);
            }
        }
    };
}

ranked_page!(TopAlbums, "user.gettopalbums", topalbums, album);
ranked_page!(TopArtists, "user.gettopartists", topartists, artist);
ranked_page!(TopTracks, "user.gettoptracks", toptracks, track);

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TrackInfoAlbum {
    #[serde(default)]
    pub title: String,
    #[serde(default, rename = "image")]
    pub images: Vec<LastFmImage>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TrackInfoTrack {
    #[serde(default, alias = "Album")]
    pub album: TrackInfoAlbum,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TrackInfoResponse {
    pub track: TrackInfoTrack,
}

/// Album artwork resolved for a single track.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackInfo {
    pub album_name: String,
    pub image_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_top_albums_page() {
        let body = r##"{
            "topalbums": {
                "album": [{
                    "artist": {"url": "https://www.last.fm/music/Boards+of+Canada", "name": "Boards of Canada", "mbid": ""},
                    "image": [
                        {"size": "small", "#text": "https://img/34.png"},
                        {"size": "extralarge", "#text": "https://img/300.png"}
                    ],
                    "mbid": "abc-123",
                    "url": "https://www.last.fm/music/Boards+of+Canada/Geogaddi",
                    "playcount": "42",
                    "@attr": {"rank": "1"},
                    "name": "Geogaddi"
                }],
                "@attr": {"user": "someone", "totalPages": "7", "page": "1", "perPage": "1", "total": "7"}
            }
        }"##;
        let page: TopAlbums = serde_json::from_str(body).unwrap();
        assert_eq!(page.total_pages(), 7);
        assert_eq!(page.total_fetched(), 1);

        let album = &page.topalbums.album[0];
        assert_eq!(album.artist.name, "Boards of Canada");
        assert_eq!(album.playcount, "42");
        assert_eq!(image_at(&album.images, ImageSize::ExtraLarge), Some("https://img/300.png"));
        assert_eq!(image_at(&album.images, ImageSize::Large), None);
    }

    #[test]
    fn missing_envelope_is_a_decode_error() {
        assert!(serde_json::from_str::<TopTracks>(r#"{"error": 6, "message": "User not found"}"#).is_err());
    }

    #[test]
    fn append_merges_same_page_type() {
        let mut first: TopArtists = serde_json::from_str(
            r#"{"topartists": {"artist": [{"name": "A"}], "@attr": {"totalPages": "2", "page": "1"}}}"#,
        )
        .unwrap();
        let second: TopArtists = serde_json::from_str(
            r#"{"topartists": {"artist": [{"name": "B"}, {"name": "C"}], "@attr": {"totalPages": "2", "page": "2"}}}"#,
        )
        .unwrap();
        first.append(second);
        assert_eq!(first.total_fetched(), 3);
        first.truncate(2);
        let names: Vec<_> = first.topartists.artist.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
    }

    #[test]
    fn unparsable_total_pages_counts_as_zero() {
        let attr = PageAttr {
            total_pages: "n/a".to_string(),
            ..Default::default()
        };
        assert_eq!(attr.total_pages(), 0);
    }
}
