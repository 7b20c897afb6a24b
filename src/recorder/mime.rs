/// Preferred recorder output
pub const PREFERRED_MIME_TYPE: &str = "audio/webm;codecs=opus";

/// Generic container used when the preferred codec is missing
pub const FALLBACK_MIME_TYPE: &str = "audio/webm";

/// Pick the recorder mime type. `None` means "let the platform choose";
/// negotiation never fails.
pub fn negotiate_mime_type(is_supported: impl Fn(&str) -> bool) -> Option<&'static str> {
    [PREFERRED_MIME_TYPE, FALLBACK_MIME_TYPE]
        .into_iter()
        .find(|mime| is_supported(mime))
}
