//! Image analysis: crop, condition, OCR, then distill raw OCR hits down to
//! a handful of plausible player nicknames.

use std::sync::Arc;

use regex::Regex;

use crate::collaborators::{ImageTool, OcrService, Rect};
use crate::error::SnipeError;
use crate::model::Frame;

/// Crop rectangle for the player-name overlay, in source-frame pixels.
const CROP_RECT: Rect = Rect {
    x: 145,
    y: 420,
    w: 233,
    h: 415,
};

const MIN_CONFIDENCE: f64 = 0.5;
const MIN_TEXT_LEN: usize = 3;
const MAX_NAMES: usize = 4;

/// Runs the full crop -> condition -> OCR -> filter -> purify pipeline on a
/// single frame, returning up to 4 plausible player nicknames in their
/// original OCR-reported order.
pub async fn analyze_frame(
    image_tool: &Arc<dyn ImageTool>,
    ocr: &Arc<dyn OcrService>,
    frame: &Frame,
) -> Result<Vec<String>, SnipeError> {
    let cropped = image_tool.crop(&frame.bytes, CROP_RECT).await?;
    let conditioned = image_tool.condition_for_ocr(&cropped).await?;
    let matches = ocr.recognize(&conditioned).await?;

    let names: Vec<String> = matches
        .into_iter()
        .filter(|m| m.confidence >= MIN_CONFIDENCE)
        .map(|m| purify_username(&m.text))
        .filter(|text| text.chars().count() >= MIN_TEXT_LEN)
        .collect();

    Ok(keep_longest_four(names))
}

/// Writes a conditioned crop to a temp file for inspection during test runs.
/// Never called from production code paths.
#[cfg(test)]
fn save_debug_image(png_bytes: &[u8], label: &str) -> std::io::Result<std::path::PathBuf> {
    let path = std::env::temp_dir().join(format!("{label}.png"));
    std::fs::write(&path, png_bytes)?;
    Ok(path)
}

/// Collapses runs of 2+ whitespace to a single space, then replaces HTML
/// tags with a space, then trims the result.
pub fn purify_username(raw: &str) -> String {
    static WS_RE_SRC: &str = r"\s{2,}";
    static TAG_RE_SRC: &str = "<[^>]*>";

    let ws_re = Regex::new(WS_RE_SRC).expect("static whitespace regex is valid");
    let collapsed = ws_re.replace_all(raw, " ");

    let tag_re = Regex::new(TAG_RE_SRC).expect("static tag regex is valid");
    let without_tags = tag_re.replace_all(&collapsed, " ");

    without_tags.trim().to_string()
}

/// Keeps the 4 longest strings, breaking length ties by original index,
/// then restores original relative order among the kept entries.
pub fn keep_longest_four(names: Vec<String>) -> Vec<String> {
    if names.len() <= MAX_NAMES {
        return names;
    }

    let mut ranked: Vec<(usize, String)> = names.into_iter().enumerate().collect();
    ranked.sort_by(|a, b| {
        b.1.chars()
            .count()
            .cmp(&a.1.chars().count())
            .then(a.0.cmp(&b.0))
    });
    ranked.truncate(MAX_NAMES);
    ranked.sort_by_key(|(idx, _)| *idx);

    ranked.into_iter().map(|(_, name)| name).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_image_hook_writes_readable_file() {
        let path = save_debug_image(b"not really a png", "image_analyzer_test").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"not really a png");
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn purify_collapses_whitespace_and_strips_tags() {
        assert_eq!(
            purify_username("foo   bar <b>baz</b>  "),
            "foo bar  baz"
        );
    }

    #[test]
    fn keep_longest_four_preserves_original_order_of_survivors() {
        let names = vec![
            "a".to_string(),
            "bb".to_string(),
            "ccc".to_string(),
            "dd".to_string(),
            "eeee".to_string(),
        ];
        let kept = keep_longest_four(names);
        assert_eq!(kept, vec!["bb", "ccc", "dd", "eeee"]);
    }

    #[test]
    fn keep_longest_four_is_a_noop_under_the_cap() {
        let names = vec!["a".to_string(), "bb".to_string()];
        assert_eq!(keep_longest_four(names.clone()), names);
    }

    #[test]
    fn confidence_and_length_filtering_scenario() {
        let texts = ["alpha", "bravocharl", "no!!", "delta123", "echo_fox", "zzzzzzzzzzzzzzz"];
        let confidences = [0.9, 0.8, 0.4, 0.7, 0.6, 0.95];
        let lengths = [5, 12, 20, 4, 9, 15];

        let names: Vec<String> = texts
            .iter()
            .zip(confidences.iter())
            .zip(lengths.iter())
            .filter(|((_, &conf), _)| conf >= MIN_CONFIDENCE)
            .map(|((text, _), _)| purify_username(text))
            .filter(|text| text.chars().count() >= MIN_TEXT_LEN)
            .collect();

        // index 2 (confidence 0.4) is dropped by the confidence filter.
        assert_eq!(names.len(), 5);
        let kept = keep_longest_four(names);
        assert_eq!(kept.len(), 4);
    }
}
