//! Metadata extraction from Bandcamp page content.
//!
//! Everything in here is deliberately narrow string scraping against known
//! Bandcamp markers. The rest of the crate only consumes the structured
//! [`MediaReference`] record and the link lists, so the brittle parts stay
//! behind this boundary and tests can run on canned HTML fixtures.
//!
//! Absent fields are data (`Option`), never error paths.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::page::absolute_url;

/// Structured description of a downloadable track, extracted from a page.
///
/// Only produced when a media URL could be resolved; a page without one
/// (purchase-gated tracks) yields no reference at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaReference {
    /// Track title.
    pub title: String,
    /// Artist name. Empty when the page lists "Various Artists" and no band
    /// data could be recovered.
    pub artist: String,
    /// Album this track belongs to, when the page names one.
    pub album: Option<String>,
    /// 1-based position within an album, assigned by the album resolver.
    pub track_index: Option<u32>,
    /// Four-digit release year.
    pub release_year: Option<String>,
    /// Artwork image URL.
    pub artwork_url: Option<String>,
    /// Absolute URL of the streamable audio file.
    pub media_url: String,
}

/// Return the substring between the first `start` marker and the next `end`.
pub fn string_between<'a>(content: &'a str, start: &str, end: &str) -> Option<&'a str> {
    let (_, rest) = content.split_once(start)?;
    match rest.split_once(end) {
        Some((inner, _)) => Some(inner),
        None => None,
    }
}

/// Decode the handful of HTML entities that occur in Bandcamp metadata.
pub fn decode_entities(text: &str) -> String {
    text.replace("&quot;", "\"")
        .replace("&#34;", "\"")
        .replace("&apos;", "'")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

/// Extract `(title, artist)` from the page's title meta tag.
///
/// Bandcamp formats it as `"<title>, by <artist>"`; pages without the
/// `, by` part yield an empty artist.
pub fn page_meta_title(content: &str) -> Option<(String, String)> {
    let meta = string_between(content, r#"<meta name="title" content=""#, r#"">"#)?;
    let meta = decode_entities(meta.trim());

    match meta.split_once(", by ") {
        Some((title, artist)) => Some((title.to_string(), artist.to_string())),
        None => Some((meta, String::new())),
    }
}

/// Extract the band name from the embedded `BandData` script blob.
///
/// Both spacing spellings of the `name` key occur in the wild.
pub fn band_name(content: &str) -> Option<String> {
    let data = string_between(content, "var BandData = {", "}")?;

    let name = string_between(data, "name : \"", "\",")
        .or_else(|| string_between(data, "name: \"", "\","))?;

    if name.is_empty() {
        return None;
    }

    Some(decode_entities(name))
}

/// Normalize a scraped artist name.
///
/// "Various Artists" is treated as absent so per-track band data wins over
/// the compilation label; the `BandData` blob is the fallback for both.
pub fn normalize_artist(artist: String, content: &str) -> String {
    if artist != "Various Artists" && !artist.is_empty() {
        return artist;
    }

    band_name(content).unwrap_or_default()
}

/// Extract the album name a single track page belongs to.
pub fn track_album(content: &str) -> Option<String> {
    let album = string_between(content, r#"<span itemprop="name">"#, "</span>")?;

    if album.is_empty() {
        return None;
    }

    Some(decode_entities(album))
}

/// Extract the four-digit release year from the publish date meta tag.
pub fn release_year(content: &str) -> Option<String> {
    let date = string_between(content, r#"<meta itemprop="datePublished" content=""#, r#"">"#)?;

    // `get` rejects short values and non-ASCII prefixes alike.
    let year = date.get(0..4)?;
    Some(year.to_string())
}

/// Extract the page artwork URL.
pub fn artwork_url(content: &str) -> Option<String> {
    let url = string_between(content, r#"<a class="popupImage" href=""#, r#"">"#)?;

    if url.is_empty() {
        return None;
    }

    Some(url.to_string())
}

/// Extract the streamable media URL from the embedded `trackinfo` blob.
///
/// Returns `None` when the track has no public stream (the `file` entry is
/// null for purchase-only tracks). Protocol-relative URLs are normalized.
pub fn media_url(content: &str) -> Option<String> {
    let inner = string_between(content, "trackinfo: [{", "}]")
        .or_else(|| string_between(content, r#""trackinfo":[{"#, "}]"))?;

    let raw = format!("{{{}}}", inner);
    let info: serde_json::Value = serde_json::from_str(&raw).ok()?;

    let url = info.get("file")?.get("mp3-128")?.as_str()?;

    if url.is_empty() {
        return None;
    }

    Some(absolute_url(url))
}

/// Extract the full media reference of a track page.
///
/// `track_index` is left unset; it is assigned by the album resolver.
pub fn extract_media_reference(content: &str) -> Option<MediaReference> {
    let (title, artist) = page_meta_title(content)?;
    let artist = normalize_artist(artist, content);

    let media_url = media_url(content)?;

    Some(MediaReference {
        title,
        artist,
        album: track_album(content),
        track_index: None,
        release_year: release_year(content),
        artwork_url: artwork_url(content),
        media_url,
    })
}

/// Marker opening the album track listing table.
const TRACK_TABLE_MARKER: &str = r#"<table class="track_list track_table" id="track_table">"#;

/// Marker of a track link inside a table row.
const TRACK_LINK_MARKER: &str = r#"<a href="/track/"#;

/// Extract the relative track path segments from an album's track table.
///
/// Rows without a track link and rows with an empty or duplicate path are
/// skipped; the returned order is the order of the rows in the table.
pub fn album_track_paths(content: &str) -> Vec<String> {
    let table = match string_between(content, TRACK_TABLE_MARKER, "</table>") {
        Some(table) => table,
        None => return Vec::new(),
    };

    let mut names: Vec<String> = Vec::new();

    for row in table.split("<tr") {
        let rest = match row.find(TRACK_LINK_MARKER) {
            Some(position) => &row[position + TRACK_LINK_MARKER.len()..],
            None => continue,
        };

        let name: String = rest.chars().take_while(|&c| c != '"').collect();

        if name.is_empty() || names.contains(&name) {
            continue;
        }

        names.push(name);
    }

    names
}

/// Collect album and track links from a discography page.
///
/// Matches relative, base-prefixed and subdomain-absolute link forms to
/// tolerate markup variations, deduplicates, and returns albums before
/// tracks while preserving in-page discovery order within each list.
pub fn discography_links(content: &str, base: &str) -> (Vec<String>, Vec<String>) {
    (
        scan_links(content, base, "album"),
        scan_links(content, base, "track"),
    )
}

fn scan_links(content: &str, base: &str, segment: &str) -> Vec<String> {
    let patterns = [
        format!(r#"<a href="(/{segment}/[^"?]+)"#),
        format!(r#"<a href="({base}/{segment}/[^"?]+)"#, base = regex::escape(base)),
        format!(r#"<a href="(https?://[\w.-]+\.bandcamp\.com/{segment}/[^"?]+)"#),
    ];

    let mut urls: Vec<String> = Vec::new();

    for pattern in &patterns {
        let matcher = Regex::new(pattern).expect("static link pattern");

        for capture in matcher.captures_iter(content) {
            let href = &capture[1];

            let url = if href.starts_with("http://") || href.starts_with("https://") {
                href.to_string()
            } else {
                format!("{}{}", base, href)
            };

            if !urls.contains(&url) {
                urls.push(url);
            }
        }
    }

    urls
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_between() {
        assert_eq!(string_between("a[inner]b", "[", "]"), Some("inner"));
        assert_eq!(string_between("a[inner", "[", "]"), None);
        assert_eq!(string_between("plain", "[", "]"), None);
    }

    #[test]
    fn test_decode_entities() {
        assert_eq!(decode_entities("Tom &amp; Jerry &quot;live&quot;"), "Tom & Jerry \"live\"");
    }

    #[test]
    fn test_page_meta_title() {
        let content = r#"<meta name="title" content="Song, by Some Artist">"#;
        assert_eq!(
            page_meta_title(content),
            Some(("Song".to_string(), "Some Artist".to_string()))
        );
    }

    #[test]
    fn test_various_artists_falls_back_to_band_data() {
        let content = r#"var BandData = {
            name : "Real Band",
        }"#;
        assert_eq!(normalize_artist("Various Artists".to_string(), content), "Real Band");
        assert_eq!(normalize_artist("Kept".to_string(), content), "Kept");
    }

    #[test]
    fn test_release_year() {
        let content = r#"<meta itemprop="datePublished" content="20160401000000">"#;
        assert_eq!(release_year(content).as_deref(), Some("2016"));

        // Garbled values with a multibyte character inside the year prefix
        // are data problems, not panics.
        let garbled = r#"<meta itemprop="datePublished" content="201é2016">"#;
        assert_eq!(release_year(garbled), None);

        let short = r#"<meta itemprop="datePublished" content="20">"#;
        assert_eq!(release_year(short), None);
    }

    #[test]
    fn test_media_url_normalizes_protocol_relative() {
        let content = r#"trackinfo: [{"file":{"mp3-128":"//t4.bcbits.com/stream/abc"},"title":"Song"}]"#;
        assert_eq!(
            media_url(content).as_deref(),
            Some("http://t4.bcbits.com/stream/abc")
        );
    }

    #[test]
    fn test_media_url_absent_for_purchase_only_track() {
        let content = r#"trackinfo: [{"file":null,"title":"Song"}]"#;
        assert_eq!(media_url(content), None);
    }

    #[test]
    fn test_album_track_paths_skips_empty_rows() {
        let content = format!(
            "{}{}</table>",
            r#"<table class="track_list track_table" id="track_table">"#,
            concat!(
                r#"<tr><td><a href="/track/first">First</a></td></tr>"#,
                r#"<tr><td>no link in this row</td></tr>"#,
                r#"<tr><td><a href="/track/">empty</a></td></tr>"#,
                r#"<tr><td><a href="/track/second">Second</a></td></tr>"#,
                r#"<tr><td><a href="/track/third">Third</a></td></tr>"#,
            )
        );

        assert_eq!(album_track_paths(&content), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_discography_links_mixed_forms() {
        let base = "https://artist.bandcamp.com";
        let content = concat!(
            r#"<a href="/album/one">"#,
            r#"<a href="https://artist.bandcamp.com/album/two">"#,
            r#"<a href="/album/one">"#,
            r#"<a href="/track/loose">"#,
            r#"<a href="/track/loose?label=1">"#,
        );

        let (albums, tracks) = discography_links(content, base);
        assert_eq!(
            albums,
            vec![
                "https://artist.bandcamp.com/album/one",
                "https://artist.bandcamp.com/album/two"
            ]
        );
        assert_eq!(tracks, vec!["https://artist.bandcamp.com/track/loose"]);
    }
}
