use std::future::Future;
use std::sync::OnceLock;
use std::time::Duration;
use regex::Regex;
use tokio_util::sync::CancellationToken;
use crate::errors::{AppError, Result};

/// Removes the `api_key` query parameter from a message before it is logged or returned.
pub fn clean_error(message: &str) -> String {
    static API_KEY: OnceLock<Regex> = OnceLock::new();
    let regex = API_KEY.get_or_init(|| {
        Regex::new(r"(&|\?)api_key=[^&\s)]+(&|\b)").expect("api_key pattern is valid")
    });
    regex.replace_all(message, "$1").into_owned()
}

/// Lowercased file extension (without the dot) of the last URL path segment.
pub fn get_extension(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    let file_name = parsed.path_segments()?.last()?;
    let (stem, ext) = file_name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Runs `future` unless `cancel` fires first.
pub async fn cancellable<F, T>(cancel: &CancellationToken, future: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(AppError::Cancelled),
        result = future => result,
    }
}

/// Sleeps for `delay`, returning early with `Cancelled` if the token fires.
pub async fn sleep_or_cancel(delay: Duration, cancel: &CancellationToken) -> Result<()> {
    tokio::select! {
        _ = cancel.cancelled() => Err(AppError::Cancelled),
        _ = tokio::time::sleep(delay) => Ok(()),
    }
}
