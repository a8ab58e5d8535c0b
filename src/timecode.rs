/// Timestamp normalization helpers shared by the marker pipeline.
///
/// All timestamp arithmetic runs on a canonical ordinal: a non-negative
/// count of seconds. Textual timestamps come from generated documents and
/// are best-effort by contract, so malformed input maps to 0 instead of
/// failing the render.

/// Convert a textual timestamp into integer seconds.
///
/// Two colon-delimited parts are read as `MM:SS`, three as `HH:MM:SS`.
/// Any other shape, and any unparseable component, contributes 0.
pub fn to_ordinal(text: &str) -> u64 {
    let parts: Vec<&str> = text.split(':').collect();

    let component = |s: &str| s.trim().parse::<u64>().unwrap_or(0);

    match parts.as_slice() {
        [minutes, seconds] => component(minutes) * 60 + component(seconds),
        [hours, minutes, seconds] => {
            component(hours) * 3600 + component(minutes) * 60 + component(seconds)
        }
        _ => 0,
    }
}

/// Convert a textual timestamp into a filesystem-safe token.
///
/// `:` is the only substituted character, so two distinct timestamps never
/// collide after substitution. The token joined with the source video's
/// basename is the canonical artifact filename stem.
pub fn to_safe_token(text: &str) -> String {
    text.replace(':', "_")
}
