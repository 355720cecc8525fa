//! Test doubles shared by the in-module test suites.

use std::io::Cursor;
use std::sync::Mutex;
use async_trait::async_trait;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use crate::downloader::http_pool::{HttpFetch, HttpRequest, HttpResponse};
use crate::errors::Result;

type Handler = dyn Fn(&HttpRequest) -> Result<HttpResponse> + Send + Sync;

/// `HttpFetch` that answers from a closure and records every request.
pub struct ScriptedFetch {
    handler: Box<Handler>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedFetch {
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&HttpRequest) -> Result<HttpResponse> + Send + Sync + 'static,
    {
        Self {
            handler: Box::new(handler),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Requests whose URL contains `needle`.
    pub fn count_matching(&self, needle: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.url.contains(needle))
            .count()
    }
}

#[async_trait]
impl HttpFetch for ScriptedFetch {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        self.requests.lock().unwrap().push(request.clone());
        (self.handler)(&request)
    }
}

pub fn json_response(value: serde_json::Value) -> HttpResponse {
    HttpResponse {
        status: 200,
        body: serde_json::to_vec(&value).unwrap(),
    }
}

pub fn status_response(status: u16) -> HttpResponse {
    HttpResponse {
        status,
        body: Vec::new(),
    }
}

pub fn image_response(bytes: Vec<u8>) -> HttpResponse {
    HttpResponse { status: 200, body: bytes }
}

pub fn solid_image(width: u32, height: u32, colour: [u8; 3]) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb(colour)))
}

pub fn encoded_image(width: u32, height: u32, colour: [u8; 3], format: ImageFormat) -> Vec<u8> {
    let mut buffer = Cursor::new(Vec::new());
    solid_image(width, height, colour)
        .write_to(&mut buffer, format)
        .unwrap();
    buffer.into_inner()
}

/// Query parameter value of a recorded request URL.
pub fn query_param(url: &str, name: &str) -> Option<String> {
    url::Url::parse(url)
        .ok()?
        .query_pairs()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}
