use std::path::PathBuf;
use std::sync::Arc;
use anyhow::Context as _;
use clap::Parser;
use log::info;
use tokio_util::sync::CancellationToken;
use song_stitch::api::CollageRequest;
use song_stitch::config::AppConfig;
use song_stitch::downloader::cache::ImageUrlCache;
use song_stitch::downloader::http_pool::HttpPool;
use song_stitch::CollageGenerator;

#[derive(Parser, Debug)]
#[command(name = "song-stitch", version, about = "Build a cover-art collage from a Last.fm listening history")]
struct Cli {
    /// Last.fm username.
    #[arg(long)]
    username: String,

    /// album, artist or track.
    #[arg(long, default_value = "album")]
    method: String,

    /// 7day, 1month, 3month, 6month, 12month or overall.
    #[arg(long, default_value = "7day")]
    period: String,

    #[arg(long, default_value_t = 3)]
    rows: u32,

    #[arg(long, default_value_t = 3)]
    columns: u32,

    /// Overlay the artist name.
    #[arg(long)]
    artist: bool,

    /// Overlay the album name.
    #[arg(long)]
    album: bool,

    /// Overlay the track name.
    #[arg(long)]
    track: bool,

    /// Overlay the play count.
    #[arg(long)]
    playcount: bool,

    #[arg(long)]
    boldfont: bool,

    #[arg(long)]
    grayscale: bool,

    /// Encode as WebP instead of JPEG (ignored with --grayscale).
    #[arg(long)]
    webp: bool,

    /// Output width in pixels, 0 keeps the natural size.
    #[arg(long, default_value_t = 0)]
    width: u32,

    /// Output height in pixels, 0 keeps the natural size.
    #[arg(long, default_value_t = 0)]
    height: u32,

    #[arg(long, default_value_t = 12)]
    fontsize: u32,

    /// topleft, topcentre, topright, bottomleft, bottomcentre or bottomright.
    #[arg(long, default_value = "topleft")]
    textlocation: String,

    /// Config file, overriding SONG_STITCH_CONFIG.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output path; defaults to collage.jpg or collage.webp.
    #[arg(long)]
    output: Option<PathBuf>,
}

impl Cli {
    fn to_request(&self) -> song_stitch::Result<CollageRequest> {
        let request = CollageRequest {
            method: self.method.parse()?,
            username: self.username.clone(),
            period: self.period.parse()?,
            rows: self.rows,
            columns: self.columns,
            display_album: self.album,
            display_artist: self.artist,
            display_track: self.track,
            display_playcount: self.playcount,
            width: self.width,
            height: self.height,
            font_size: self.fontsize,
            bold_font: self.boldfont,
            grayscale: self.grayscale,
            webp: self.webp,
            text_location: self.textlocation.parse()?,
        };
        request.validate()?;
        Ok(request)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let request = cli.to_request().context("invalid request")?;

    let config = match &cli.config {
        Some(path) => AppConfig::load_from(Some(path.as_path())),
        None => AppConfig::load(),
    }
    .context("failed to load configuration")?;
    config.validate().context("invalid configuration")?;
    info!("⚙️ [CONFIG] Configuration loaded successfully");

    let fetch = Arc::new(HttpPool::new(&config.downloader).context("failed to build HTTP client")?);
    let cache = Arc::new(ImageUrlCache::new(config.downloader.cache_capacity));
    let generator = CollageGenerator::new(&config, fetch, cache);

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("⏹️ [MAIN] Interrupted, cancelling request");
            on_interrupt.cancel();
        }
    });

    let output = match generator.generate(&request, &cancel).await {
        Ok(output) => output,
        Err(e) => {
            log::error!("❌ [MAIN] {} ({}): {}", e.public_message(), e.status_code(), e);
            return Err(e.into());
        }
    };

    let path = cli
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(format!("collage.{}", output.format.extension())));
    tokio::fs::write(&path, &output.bytes)
        .await
        .with_context(|| format!("failed to write {}", path.display()))?;

    info!(
        "💾 [MAIN] Wrote {} ({}, {} bytes, {}x{})",
        path.display(),
        output.format.content_type(),
        output.bytes.len(),
        output.image.width(),
        output.image.height()
    );
    Ok(())
}
