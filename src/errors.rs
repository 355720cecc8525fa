use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("User not found")]
    UserNotFound,

    #[error("Too many images requested")]
    TooManyImages,

    #[error("No image found")]
    NoImageFound,

    #[error("Fetch failed: {0}")]
    FetchFailed(String),

    #[error("Decode failed: {0}")]
    DecodeFailed(String),

    #[error("Request cancelled")]
    Cancelled,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Font error: {0}")]
    Font(String),

    #[error("Encode error: {0}")]
    Encode(String),
}

impl AppError {
    /// HTTP status a caller should answer with for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            AppError::UserNotFound => 404,
            AppError::TooManyImages | AppError::Validation(_) => 400,
            // Client closed request
            AppError::Cancelled => 499,
            _ => 500,
        }
    }

    /// Message safe to hand back to a client.
    pub fn public_message(&self) -> &'static str {
        match self {
            AppError::UserNotFound => "User not found",
            AppError::TooManyImages => "Requested collage size is too large for the collage type",
            AppError::Validation(_) => "Invalid request",
            AppError::Cancelled => "Context cancelled",
            _ => "An error occurred processing your request",
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, AppError::Cancelled)
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
