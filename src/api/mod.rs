use std::fmt;
use std::str::FromStr;
use crate::config::ImageSizeCutoffs;
use crate::errors::{AppError, Result};

/// Which ranked entity the collage is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollageType {
    Album,
    Artist,
    Track,
}

impl CollageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CollageType::Album => "album",
            CollageType::Artist => "artist",
            CollageType::Track => "track",
        }
    }
}

impl fmt::Display for CollageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CollageType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "album" => Ok(CollageType::Album),
            "artist" => Ok(CollageType::Artist),
            "track" => Ok(CollageType::Track),
            other => Err(AppError::Validation(format!("invalid method: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    SevenDays,
    OneMonth,
    ThreeMonths,
    SixMonths,
    TwelveMonths,
    Overall,
}

impl Period {
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::SevenDays => "7day",
            Period::OneMonth => "1month",
            Period::ThreeMonths => "3month",
            Period::SixMonths => "6month",
            Period::TwelveMonths => "12month",
            Period::Overall => "overall",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "7day" => Ok(Period::SevenDays),
            "1month" => Ok(Period::OneMonth),
            "3month" => Ok(Period::ThreeMonths),
            "6month" => Ok(Period::SixMonths),
            "12month" => Ok(Period::TwelveMonths),
            "overall" => Ok(Period::Overall),
            other => Err(AppError::Validation(format!("invalid period: {}", other))),
        }
    }
}

/// Corner or edge of a cell the overlay text hangs from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextLocation {
    TopLeft,
    TopCentre,
    TopRight,
    BottomLeft,
    BottomCentre,
    BottomRight,
}

impl TextLocation {
    pub fn is_top(&self) -> bool {
        matches!(self, TextLocation::TopLeft | TextLocation::TopCentre | TextLocation::TopRight)
    }
}

impl Default for TextLocation {
    fn default() -> Self {
        TextLocation::TopLeft
    }
}

impl FromStr for TextLocation {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "topleft" => Ok(TextLocation::TopLeft),
            "topcentre" => Ok(TextLocation::TopCentre),
            "topright" => Ok(TextLocation::TopRight),
            "bottomleft" => Ok(TextLocation::BottomLeft),
            "bottomcentre" => Ok(TextLocation::BottomCentre),
            "bottomright" => Ok(TextLocation::BottomRight),
            other => Err(AppError::Validation(format!("invalid text location: {}", other))),
        }
    }
}

/// Provider image size tier, picked from the number of cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSize {
    ExtraLarge,
    Large,
    Medium,
    Small,
}

impl ImageSize {
    pub fn for_cell_count(count: usize, cutoffs: &ImageSizeCutoffs) -> Self {
        if count <= cutoffs.extra_large {
            ImageSize::ExtraLarge
        } else if count <= cutoffs.large {
            ImageSize::Large
        } else if count <= cutoffs.medium {
            ImageSize::Medium
        } else {
            ImageSize::Small
        }
    }

    /// Name used by the provider's `image[].size` field.
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageSize::ExtraLarge => "extralarge",
            ImageSize::Large => "large",
            ImageSize::Medium => "medium",
            ImageSize::Small => "small",
        }
    }

    /// Cell edge in pixels.
    pub fn dimension(&self) -> u32 {
        match self {
            ImageSize::ExtraLarge => 300,
            ImageSize::Large => 174,
            ImageSize::Medium => 64,
            ImageSize::Small => 34,
        }
    }
}

/// A fully resolved collage request.
#[derive(Debug, Clone)]
pub struct CollageRequest {
    pub method: CollageType,
    pub username: String,
    pub period: Period,
    pub rows: u32,
    pub columns: u32,
    pub display_album: bool,
    pub display_artist: bool,
    pub display_track: bool,
    pub display_playcount: bool,
    pub width: u32,
    pub height: u32,
    pub font_size: u32,
    pub bold_font: bool,
    pub grayscale: bool,
    pub webp: bool,
    pub text_location: TextLocation,
}

impl Default for CollageRequest {
    fn default() -> Self {
        Self {
            method: CollageType::Album,
            username: String::new(),
            period: Period::SevenDays,
            rows: 3,
            columns: 3,
            display_album: false,
            display_artist: false,
            display_track: false,
            display_playcount: false,
            width: 0,
            height: 0,
            font_size: 12,
            bold_font: false,
            grayscale: false,
            webp: false,
            text_location: TextLocation::TopLeft,
        }
    }
}

impl CollageRequest {
    pub fn count(&self) -> usize {
        (self.rows * self.columns) as usize
    }

    pub fn validate(&self) -> Result<()> {
        if self.username.trim().is_empty() {
            return Err(AppError::Validation("username is required".to_string()));
        }
        check_range("rows", self.rows, 1, 15)?;
        check_range("columns", self.columns, 1, 15)?;
        check_range("width", self.width, 0, 3000)?;
        check_range("height", self.height, 0, 3000)?;
        check_range("fontsize", self.font_size, 8, 30)?;
        Ok(())
    }

    pub fn image_size(&self, cutoffs: &ImageSizeCutoffs) -> ImageSize {
        ImageSize::for_cell_count(self.count(), cutoffs)
    }

    pub fn display_options(&self, cutoffs: &ImageSizeCutoffs) -> DisplayOptions {
        DisplayOptions {
            rows: self.rows,
            columns: self.columns,
            image_dimension: self.image_size(cutoffs).dimension(),
            artist_name: self.display_artist,
            album_name: self.display_album,
            track_name: self.display_track,
            play_count: self.display_playcount,
            text_location: self.text_location,
            font_size: self.font_size as f32,
            bold_font: self.bold_font,
            width: self.width,
            height: self.height,
            grayscale: self.grayscale,
            webp: self.webp,
        }
    }
}

fn check_range(name: &str, value: u32, min: u32, max: u32) -> Result<()> {
    if value < min || value > max {
        return Err(AppError::Validation(format!(
            "invalid {}: {} (expected {}-{})",
            name, value, min, max
        )));
    }
    Ok(())
}

/// Immutable rendering options for one collage.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayOptions {
    pub rows: u32,
    pub columns: u32,
    pub image_dimension: u32,
    pub artist_name: bool,
    pub album_name: bool,
    pub track_name: bool,
    pub play_count: bool,
    pub text_location: TextLocation,
    pub font_size: f32,
    pub bold_font: bool,
    /// 0 leaves the dimension free.
    pub width: u32,
    pub height: u32,
    pub grayscale: bool,
    pub webp: bool,
}

impl DisplayOptions {
    pub fn resize(&self) -> bool {
        self.width > 0 || self.height > 0
    }

    pub fn any_text(&self) -> bool {
        self.artist_name || self.album_name || self.track_name || self.play_count
    }

    pub fn canvas_size(&self) -> (u32, u32) {
        (self.image_dimension * self.columns, self.image_dimension * self.rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_size_tiers_follow_cutoffs() {
        let cutoffs = ImageSizeCutoffs::default();
        assert_eq!(ImageSize::for_cell_count(9, &cutoffs), ImageSize::ExtraLarge);
        assert_eq!(ImageSize::for_cell_count(100, &cutoffs), ImageSize::ExtraLarge);
        assert_eq!(ImageSize::for_cell_count(101, &cutoffs), ImageSize::Large);
        assert_eq!(ImageSize::for_cell_count(1000, &cutoffs), ImageSize::Large);
        assert_eq!(ImageSize::for_cell_count(2000, &cutoffs), ImageSize::Medium);
        assert_eq!(ImageSize::for_cell_count(2001, &cutoffs), ImageSize::Small);
        assert_eq!(ImageSize::Large.dimension(), 174);
    }

    #[test]
    fn parses_request_vocabulary() {
        assert_eq!("track".parse::<CollageType>().unwrap(), CollageType::Track);
        assert_eq!("12month".parse::<Period>().unwrap(), Period::TwelveMonths);
        assert_eq!("bottomcentre".parse::<TextLocation>().unwrap(), TextLocation::BottomCentre);
        assert!("weekly".parse::<Period>().is_err());
        assert!("middle".parse::<TextLocation>().is_err());
        assert_eq!(Period::Overall.to_string(), "overall");
    }

    #[test]
    fn validate_enforces_ranges() {
        let mut request = CollageRequest {
            username: "someone".to_string(),
            ..Default::default()
        };
        assert!(request.validate().is_ok());

        request.rows = 16;
        assert!(matches!(request.validate(), Err(AppError::Validation(_))));

        request.rows = 3;
        request.font_size = 7;
        assert!(request.validate().is_err());

        request.font_size = 12;
        request.width = 3001;
        assert!(request.validate().is_err());

        request.width = 0;
        request.username = " ".to_string();
        assert!(request.validate().is_err());
    }

    #[test]
    fn display_options_derive_canvas_from_tier() {
        let request = CollageRequest {
            username: "someone".to_string(),
            rows: 3,
            columns: 4,
            ..Default::default()
        };
        let options = request.display_options(&ImageSizeCutoffs::default());
        assert_eq!(options.image_dimension, 300);
        assert_eq!(options.canvas_size(), (1200, 900));
        assert!(!options.resize());
        assert!(!options.any_text());
    }
}
