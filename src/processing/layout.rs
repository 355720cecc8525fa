use crate::api::{DisplayOptions, TextLocation};
use crate::processing::TextFields;

/// Horizontal gap between the cell edge and the text column.
pub const TEXT_INSET_X: f32 = 10.0;
/// Gap above the first baseline, on top of the font size.
pub const TEXT_INSET_Y: f32 = 8.0;
pub const LINE_SPACING: f32 = 3.0;
/// Cell width lost to insets when aligning text.
pub const CELL_TEXT_MARGIN: f32 = 20.0;

/// A positioned line of overlay text. `y` is the baseline.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub text: String,
    pub x: f32,
    pub y: f32,
}

/// Top-left pixel of cell `index` in a row-major grid.
pub fn cell_origin(index: usize, columns: u32, dimension: u32) -> (u32, u32) {
    let columns = columns.max(1) as usize;
    let x = (index % columns) as u32 * dimension;
    let y = (index / columns) as u32 * dimension;
    (x, y)
}

/// Enabled, non-empty fields in draw order.
///
/// Order is track, artist, album, play count; reversed for bottom anchors so
/// the first line drawn sits nearest the bottom edge.
pub fn collect_lines(fields: &TextFields<'_>, options: &DisplayOptions) -> Vec<String> {
    let candidates = [
        (options.track_name, fields.track.map(str::to_string)),
        (options.artist_name, fields.artist.map(str::to_string)),
        (options.album_name, fields.album.map(str::to_string)),
        (
            options.play_count,
            fields
                .playcount
                .filter(|count| !count.is_empty())
                .map(|count| format!("Plays: {}", count)),
        ),
    ];

    let mut lines: Vec<String> = candidates
        .into_iter()
        .filter_map(|(enabled, value)| value.filter(|v| enabled && !v.is_empty()))
        .collect();

    if !options.text_location.is_top() {
        lines.reverse();
    }
    lines
}

/// Positions `lines` inside the cell at `origin`.
///
/// `measure` returns the rendered `(width, height)` of a string.
pub fn layout_text<F>(lines: Vec<String>, origin: (u32, u32), options: &DisplayOptions, measure: F) -> Vec<TextLine>
where
    F: Fn(&str) -> (f32, f32),
{
    let area = options.image_dimension as f32 - CELL_TEXT_MARGIN;
    let advance = options.font_size + LINE_SPACING;
    let top = options.text_location.is_top();
    let base_x = origin.0 as f32 + TEXT_INSET_X;
    let base_y = origin.1 as f32;

    let mut cursor = TEXT_INSET_Y + options.font_size;
    let mut placed = Vec::with_capacity(lines.len());

    for text in lines {
        let (width, height) = measure(&text);
        let x_offset = match options.text_location {
            TextLocation::TopLeft | TextLocation::BottomLeft => 0.0,
            TextLocation::TopCentre | TextLocation::BottomCentre => area / 2.0 - width / 2.0,
            TextLocation::TopRight | TextLocation::BottomRight => area - width,
        };
        let y_offset = if top { 0.0 } else { area - height };

        placed.push(TextLine {
            text,
            x: base_x + x_offset,
            y: base_y + cursor + y_offset,
        });

        if top {
            cursor += advance;
        } else {
            cursor -= advance;
        }
    }
    placed
}

/// Output dimensions for a resize request, or `None` when nothing changes.
///
/// A zero dimension is derived from the other, preserving aspect ratio.
pub fn target_dimensions(current: (u32, u32), requested: (u32, u32)) -> Option<(u32, u32)> {
    let (current_w, current_h) = current;
    let (width, height) = requested;

    if width == 0 && height == 0 {
        return None;
    }
    if width == current_w && height == current_h {
        return None;
    }
    if current_w == 0 || current_h == 0 {
        return None;
    }

    let target = if height == 0 {
        (width, (width as f64 * current_h as f64 / current_w as f64) as u32)
    } else if width == 0 {
        ((height as f64 * current_w as f64 / current_h as f64) as u32, height)
    } else {
        (width, height)
    };

    if target == current || target.0 == 0 || target.1 == 0 {
        None
    } else {
        Some(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::CollageRequest;
    use crate::config::ImageSizeCutoffs;

    fn options(location: TextLocation) -> DisplayOptions {
        let request = CollageRequest {
            username: "someone".to_string(),
            display_artist: true,
            display_playcount: true,
            text_location: location,
            font_size: 12,
            ..Default::default()
        };
        request.display_options(&ImageSizeCutoffs::default())
    }

    fn fixed_measure(_: &str) -> (f32, f32) {
        (50.0, 16.0)
    }

    #[test]
    fn cells_are_row_major() {
        assert_eq!(cell_origin(0, 3, 300), (0, 0));
        assert_eq!(cell_origin(2, 3, 300), (600, 0));
        assert_eq!(cell_origin(4, 3, 300), (300, 300));
        assert_eq!(cell_origin(7, 3, 300), (300, 600));
    }

    #[test]
    fn top_anchor_keeps_field_order() {
        let fields = TextFields {
            track: Some("Roygbiv"),
            artist: Some("Boards of Canada"),
            album: Some("Music Has the Right to Children"),
            playcount: Some("42"),
        };
        let mut options = options(TextLocation::TopLeft);
        options.track_name = true;
        options.album_name = true;

        let lines = collect_lines(&fields, &options);
        assert_eq!(
            lines,
            vec!["Roygbiv", "Boards of Canada", "Music Has the Right to Children", "Plays: 42"]
        );

        let placed = layout_text(lines, (300, 0), &options, fixed_measure);
        assert_eq!(placed[0].x, 310.0);
        assert_eq!(placed[0].y, 20.0);
        assert_eq!(placed[1].y, 35.0);
        assert_eq!(placed[3].y, 65.0);
    }

    #[test]
    fn bottom_left_draws_play_count_nearest_the_edge() {
        let fields = TextFields {
            artist: Some("Aphex Twin"),
            playcount: Some("7"),
            ..Default::default()
        };
        let options = options(TextLocation::BottomLeft);
        let lines = collect_lines(&fields, &options);
        assert_eq!(lines, vec!["Plays: 7", "Aphex Twin"]);

        let placed = layout_text(lines, (0, 300), &options, fixed_measure);
        let plays = &placed[0];
        let artist = &placed[1];
        // no horizontal offset for left anchors
        assert_eq!(plays.x, TEXT_INSET_X);
        assert_eq!(artist.x, TEXT_INSET_X);
        // cell 300px, area 280: 300 + 20 + (280 - 16)
        assert_eq!(plays.y, 584.0);
        assert_eq!(artist.y, 569.0);
        assert!(plays.y > artist.y);
    }

    #[test]
    fn disabled_and_empty_fields_are_skipped() {
        let fields = TextFields {
            track: Some("ignored"),
            artist: Some(""),
            album: None,
            playcount: Some(""),
        };
        let options = options(TextLocation::TopLeft);
        assert!(collect_lines(&fields, &options).is_empty());
    }

    #[test]
    fn centre_and_right_anchors_offset_by_width() {
        let lines = vec!["x".to_string()];
        let centre = layout_text(lines.clone(), (0, 0), &options(TextLocation::TopCentre), fixed_measure);
        assert_eq!(centre[0].x, 10.0 + 140.0 - 25.0);
        let right = layout_text(lines, (0, 0), &options(TextLocation::BottomRight), fixed_measure);
        assert_eq!(right[0].x, 10.0 + 280.0 - 50.0);
    }

    #[test]
    fn resize_targets() {
        assert_eq!(target_dimensions((900, 900), (0, 0)), None);
        assert_eq!(target_dimensions((900, 900), (900, 900)), None);
        assert_eq!(target_dimensions((1200, 900), (600, 0)), Some((600, 450)));
        assert_eq!(target_dimensions((1200, 900), (0, 300)), Some((400, 300)));
        assert_eq!(target_dimensions((900, 900), (100, 50)), Some((100, 50)));
    }
}
