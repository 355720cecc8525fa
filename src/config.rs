use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use crate::errors::{AppError, Result};

const ENV_PREFIX: &str = "SONG_STITCH";
const CONFIG_PATH_VAR: &str = "SONG_STITCH_CONFIG";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    pub lastfm: LastFmConfig,
    pub spotify: SpotifyConfig,
    pub max_images: MaxImages,
    pub image_size_cutoffs: ImageSizeCutoffs,
    pub downloader: DownloaderConfig,
    pub fonts: FontConfig,
    /// Albums pulled to back-fill artist artwork.
    pub artist_album_lookup_count: usize,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LastFmConfig {
    pub endpoint: String,
    pub api_key: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SpotifyConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub token_endpoint: String,
    pub search_endpoint: String,
}

/// Per-type item ceilings. `None` means no ceiling.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MaxImages {
    pub albums: Option<usize>,
    pub artists: usize,
    pub tracks: usize,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ImageSizeCutoffs {
    pub extra_large: usize,
    pub large: usize,
    pub medium: usize,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DownloaderConfig {
    pub workers: usize,
    pub timeout_seconds: u64,
    pub user_agent: String,
    pub cache_capacity: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct FontConfig {
    pub regular: PathBuf,
    pub bold: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            lastfm: LastFmConfig::default(),
            spotify: SpotifyConfig::default(),
            max_images: MaxImages::default(),
            image_size_cutoffs: ImageSizeCutoffs::default(),
            downloader: DownloaderConfig::default(),
            fonts: FontConfig::default(),
            artist_album_lookup_count: 500,
        }
    }
}

impl Default for LastFmConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://ws.audioscrobbler.com/2.0/".to_string(),
            api_key: String::new(),
        }
    }
}

impl Default for SpotifyConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            token_endpoint: "https://accounts.spotify.com/api/token".to_string(),
            search_endpoint: "https://api.spotify.com/v1/search".to_string(),
        }
    }
}

impl Default for MaxImages {
    fn default() -> Self {
        Self {
            albums: None,
            artists: 100,
            tracks: 25,
        }
    }
}

impl Default for ImageSizeCutoffs {
    fn default() -> Self {
        Self {
            extra_large: 100,
            large: 1000,
            medium: 2000,
        }
    }
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        Self {
            workers: 10,
            timeout_seconds: 15,
            user_agent: "SongStitch/1.0 (+https://songstitch.art)".to_string(),
            cache_capacity: 10_000,
        }
    }
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            regular: PathBuf::from("./assets/NotoSans-Regular.ttf"),
            bold: PathBuf::from("./assets/NotoSans-Bold.ttf"),
        }
    }
}

impl AppConfig {
    /// Loads defaults, then the config file (if any), then the environment.
    pub fn load() -> Result<Self> {
        let path = std::env::var(CONFIG_PATH_VAR)
            .ok()
            .map(PathBuf::from)
            .or_else(Self::get_config_path);
        Self::load_from(path.as_deref())
    }

    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder()
            .add_source(config::Config::try_from(&AppConfig::default())?);

        if let Some(path) = path {
            log::debug!("⚙️ [CONFIG] Reading config file {:?}", path);
            builder = builder.add_source(config::File::from(path).required(false));
        }

        builder = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            // Plain variable names used by existing deployments
            .set_override_option("lastfm.endpoint", std::env::var("LASTFM_ENDPOINT").ok())?
            .set_override_option("lastfm.api_key", std::env::var("LASTFM_API_KEY").ok())?
            .set_override_option("spotify.client_id", std::env::var("SPOTIFY_CLIENT_ID").ok())?
            .set_override_option("spotify.client_secret", std::env::var("SPOTIFY_CLIENT_SECRET").ok())?;

        let config: AppConfig = builder.build()?.try_deserialize()?;
        Ok(config)
    }

    fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("song-stitch").join("config.toml"))
    }

    pub fn validate(&self) -> Result<()> {
        if self.lastfm.api_key.trim().is_empty() {
            return Err(AppError::Validation("Last.fm API key is not set".to_string()));
        }
        if self.downloader.workers == 0 {
            return Err(AppError::Validation("downloader.workers must be greater than 0".to_string()));
        }
        Ok(())
    }
}

impl SpotifyConfig {
    /// Client id and secret, only when both are set.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (&self.client_id, &self.client_secret) {
            (Some(id), Some(secret)) if !id.is_empty() && !secret.is_empty() => Some((id, secret)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_documented_ceilings() {
        let config = AppConfig::default();
        assert_eq!(config.max_images.artists, 100);
        assert_eq!(config.max_images.tracks, 25);
        assert!(config.max_images.albums.is_none());
        assert_eq!(config.downloader.workers, 10);
        assert_eq!(config.downloader.cache_capacity, 10_000);
    }

    #[test]
    fn file_values_override_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "artist_album_lookup_count = 250").unwrap();
        writeln!(file, "[downloader]").unwrap();
        writeln!(file, "workers = 4").unwrap();
        writeln!(file, "[image_size_cutoffs]").unwrap();
        writeln!(file, "extra_large = 49").unwrap();

        let config = AppConfig::load_from(Some(file.path())).unwrap();
        assert_eq!(config.downloader.workers, 4);
        assert_eq!(config.image_size_cutoffs.extra_large, 49);
        assert_eq!(config.artist_album_lookup_count, 250);
        // untouched keys keep their defaults
        assert_eq!(config.image_size_cutoffs.large, 1000);
        assert_eq!(config.downloader.timeout_seconds, 15);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = AppConfig::load_from(Some(Path::new("/nonexistent/song-stitch.toml"))).unwrap();
        assert_eq!(config.max_images.tracks, 25);
    }

    #[test]
    fn validation_rejects_missing_key_and_zero_workers() {
        let mut config = AppConfig::default();
        assert!(config.validate().is_err());

        config.lastfm.api_key = "abc123".to_string();
        assert!(config.validate().is_ok());

        config.downloader.workers = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn spotify_credentials_require_both_halves() {
        let mut config = AppConfig::default();
        assert!(config.spotify.credentials().is_none());
        config.spotify.client_id = Some("id".to_string());
        assert!(config.spotify.credentials().is_none());
        config.spotify.client_secret = Some("secret".to_string());
        assert_eq!(config.spotify.credentials(), Some(("id", "secret")));
    }
}
