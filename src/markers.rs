use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::timecode;

/// An inline marker found in generated guide text, pointing at a video
/// instant (screenshot) or range (animated clip).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Marker {
    pub kind: MarkerKind,
    /// Exact substring matched in the document. Used only for positional
    /// substitution, never for computation.
    pub raw_text: String,
    /// Start of the instant/range, in seconds.
    pub start_instant: u64,
    /// End of the range, in seconds. `None` for point markers.
    pub end_instant: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarkerKind {
    Point,
    Range,
}

impl Marker {
    /// Human-readable timestamp text inside the brackets, e.g. `00:01:30`
    /// or `00:05 - 00:08`. Carried into placeholders so a reader can still
    /// locate the instant when an artifact is missing.
    pub fn timestamp_label(&self) -> &str {
        self.raw_text
            .trim_start_matches("[PHOTO:")
            .trim_start_matches("[GIF:")
            .trim_end_matches(']')
            .trim()
    }

    /// Start timestamp text, used for artifact naming. For ranges this is
    /// the first of the two timestamps.
    pub fn start_text(&self) -> &str {
        match self.kind {
            MarkerKind::Point => self.timestamp_label(),
            MarkerKind::Range => self
                .timestamp_label()
                .split('-')
                .next()
                .unwrap_or("")
                .trim(),
        }
    }

    /// Range duration in seconds. 0 for point markers and degenerate ranges.
    pub fn duration_seconds(&self) -> u64 {
        self.end_instant
            .map(|end| end.saturating_sub(self.start_instant))
            .unwrap_or(0)
    }
}

/// Scan generated text for photo and clip markers.
///
/// Recognizes exactly two grammars, case-sensitive:
/// - `[PHOTO: HH:MM:SS]` — a single-frame screenshot instant
/// - `[GIF: T1 - T2]` with `T` as `MM:SS` or `HH:MM:SS` — a short clip range
///
/// Anything else in brackets is literal text and stays untouched. Each
/// occurrence yields its own marker, even for repeated identical text, and
/// the result is ordered by first appearance in the document.
pub fn parse(document_text: &str) -> Vec<Marker> {
    let photo_re = Regex::new(r"\[PHOTO: (\d{2}:\d{2}:\d{2})\]").unwrap();
    let gif_re =
        Regex::new(r"\[GIF: (\d{2}:\d{2}(?::\d{2})?) - (\d{2}:\d{2}(?::\d{2})?)\]").unwrap();

    // Collect both dialects with byte offsets, then merge into
    // first-appearance order.
    let mut found: Vec<(usize, Marker)> = Vec::new();

    for caps in photo_re.captures_iter(document_text) {
        let whole = caps.get(0).unwrap();
        let stamp = &caps[1];
        found.push((
            whole.start(),
            Marker {
                kind: MarkerKind::Point,
                raw_text: whole.as_str().to_string(),
                start_instant: timecode::to_ordinal(stamp),
                end_instant: None,
            },
        ));
    }

    for caps in gif_re.captures_iter(document_text) {
        let whole = caps.get(0).unwrap();
        let start = timecode::to_ordinal(&caps[1]);
        // Degenerate ranges clamp to the start instant rather than going
        // negative.
        let end = timecode::to_ordinal(&caps[2]).max(start);
        found.push((
            whole.start(),
            Marker {
                kind: MarkerKind::Range,
                raw_text: whole.as_str().to_string(),
                start_instant: start,
                end_instant: Some(end),
            },
        ));
    }

    found.sort_by_key(|(offset, _)| *offset);
    found.into_iter().map(|(_, marker)| marker).collect()
}
