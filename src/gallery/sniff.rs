const OCTET_STREAM: &str = "application/octet-stream";

/// Guesses a content type from leading bytes only. Unknown input is reported as
/// `application/octet-stream`; deciding what to reject is left to the caller.
pub fn sniff_content_type(prefix: &[u8]) -> &'static str {
    let window = &prefix[..prefix.len().min(super::SNIFF_LEN)];
    infer::get(window)
        .map(|kind| kind.mime_type())
        .unwrap_or(OCTET_STREAM)
}
