//! Page classification and URL helpers.
//!
//! The classifier is a pure function over marker substrings. The markers are
//! brittle and Bandcamp-specific on purpose; everything downstream only sees
//! the resulting [`PageKind`].

/// Marker identifying a Bandcamp page at all.
const SITE_MARKER: &str = "bandcamp.com";

/// Marker for the embedded track listing table of an album page.
const TRACK_LIST_MARKER: &str = "track_list";

/// Marker for the discography sidebar present on track and album pages.
/// A page without it is the discography overview itself.
const DISCOGRAPHY_MARKER: &str = "id=\"discography\"";

/// The kind of Bandcamp page a piece of content represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    /// A single track page.
    Track,
    /// An album page with a track listing.
    Album,
    /// An artist discography overview.
    Discography,
}

/// Classify fetched page content.
///
/// Returns `None` for content that is not a Bandcamp page. The precedence
/// matters since pages can contain overlapping markers: the album check runs
/// before the discography check, and a track is only the final fallback.
pub fn classify(content: &str) -> Option<PageKind> {
    if !content.contains(SITE_MARKER) {
        return None;
    }

    if content.contains(TRACK_LIST_MARKER) {
        Some(PageKind::Album)
    } else if !content.contains(DISCOGRAPHY_MARKER) {
        Some(PageKind::Discography)
    } else {
        Some(PageKind::Track)
    }
}

/// Validate that a URL carries a scheme prefix.
pub fn valid_url(url: &str) -> bool {
    url.contains("http://") || url.contains("https://")
}

/// Extract the `scheme://host` part of a URL.
pub fn base_url(url: &str) -> Option<String> {
    let mut parts = url.split('/');
    let scheme = parts.next()?;
    parts.next()?;
    let host = parts.next()?;

    if scheme.is_empty() || host.is_empty() {
        return None;
    }

    Some(format!("{}//{}", scheme, host))
}

/// Normalize a possibly protocol-relative media URL to an absolute one.
///
/// Bandcamp serves media links as `//host/path` some of the time.
pub fn absolute_url(url: &str) -> String {
    if let Some(rest) = url.strip_prefix("//") {
        format!("http://{}", rest)
    } else {
        url.to_string()
    }
}

/// Resolve a scraped href against the page's `scheme://host` base.
///
/// Handles the three forms Bandcamp pages use: protocol-relative
/// (`//host/path`), host-relative (`/path`), and already absolute.
pub fn resolve_url(url: &str, base: &str) -> String {
    if url.starts_with("//") {
        absolute_url(url)
    } else if url.starts_with('/') {
        format!("{}{}", base, url)
    } else {
        url.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_album() {
        let content = r#"bandcamp.com <table class="track_list track_table" id="track_table"> Digital Album"#;
        assert_eq!(classify(content), Some(PageKind::Album));
    }

    #[test]
    fn test_classify_discography() {
        let content = "bandcamp.com <div>albums and tracks</div>";
        assert_eq!(classify(content), Some(PageKind::Discography));
    }

    #[test]
    fn test_classify_track() {
        // Track pages carry the discography sidebar but no track table.
        let content = r#"bandcamp.com <div id="discography"></div>"#;
        assert_eq!(classify(content), Some(PageKind::Track));
    }

    #[test]
    fn test_classify_foreign_page() {
        assert_eq!(classify("<html>somewhere else entirely</html>"), None);
    }

    #[test]
    fn test_valid_url() {
        assert!(valid_url("https://artist.bandcamp.com/music"));
        assert!(valid_url("http://artist.bandcamp.com"));
        assert!(!valid_url("artist.bandcamp.com/music"));
    }

    #[test]
    fn test_base_url() {
        assert_eq!(
            base_url("https://artist.bandcamp.com/album/record").as_deref(),
            Some("https://artist.bandcamp.com")
        );
        assert_eq!(base_url("nonsense"), None);
    }

    #[test]
    fn test_resolve_url() {
        let base = "https://artist.bandcamp.com";
        assert_eq!(
            resolve_url("/img/cover.jpg", base),
            "https://artist.bandcamp.com/img/cover.jpg"
        );
        assert_eq!(
            resolve_url("//f4.bcbits.com/img/a.jpg", base),
            "http://f4.bcbits.com/img/a.jpg"
        );
        assert_eq!(resolve_url("https://host/x.png", base), "https://host/x.png");
    }

    #[test]
    fn test_absolute_url() {
        assert_eq!(
            absolute_url("//t4.bcbits.com/stream/abc/mp3-128/1"),
            "http://t4.bcbits.com/stream/abc/mp3-128/1"
        );
        assert_eq!(absolute_url("https://host/x"), "https://host/x");
    }
}
