pub mod api;
pub mod collage;
pub mod config;
pub mod downloader;
pub mod errors;
pub mod lastfm;
pub mod processing;
pub mod spotify;
pub mod utils;

#[cfg(test)]
mod test_support;

pub use collage::CollageGenerator;
pub use errors::{AppError, Result};
