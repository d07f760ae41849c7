//! Entity resolvers for the three kinds of Bandcamp pages.
//!
//! Each resolver follows the same two-phase protocol: `prepare()` fetches
//! and parses its own page (no heavy I/O), `fetch()` (album/discography)
//! resolves children, and `download()` transfers the queued media. A child
//! that fails to prepare is dropped from its parent's queue; it never aborts
//! the siblings.

mod album;
mod discography;
mod track;

pub use album::Album;
pub use discography::Discography;
pub use track::Track;

/// Lifecycle state of an entity resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EntityState {
    /// Created with a URL only; no page content resolved yet.
    #[default]
    Unprepared,
    /// Metadata resolved, ready to fetch children or download.
    Prepared,
    /// Preparation failed (bad URL, bad status, wrong page type, or no
    /// streamable media).
    Failed,
}

/// A child entity of a discography page.
///
/// Discography queues mix albums and loose tracks; the closed enum keeps
/// dispatch static and the queue free of placeholder slots.
#[derive(Debug)]
pub enum DiscographyItem {
    /// A loose track linked directly from the discography page.
    Track(Track),
    /// An album, which resolves its own track queue.
    Album(Album),
}

impl DiscographyItem {
    /// Source URL of the underlying entity.
    pub fn url(&self) -> &str {
        match self {
            DiscographyItem::Track(track) => track.url(),
            DiscographyItem::Album(album) => album.url(),
        }
    }

    /// Display title of the underlying entity.
    pub fn title(&self) -> &str {
        match self {
            DiscographyItem::Track(track) => track.title(),
            DiscographyItem::Album(album) => album.title(),
        }
    }
}

/// Render a strike-through version of `text` for skipped queue entries.
pub(crate) fn strike(text: &str) -> String {
    if cfg!(windows) {
        return format!("X {}", text);
    }

    let mut out = String::with_capacity(text.len() * 3);
    for c in text.chars() {
        out.push(c);
        out.push('\u{0336}');
    }
    out
}

/// Pick a filename extension for an artwork URL, defaulting to jpg.
pub(crate) fn art_extension(url: &str) -> &str {
    let path = url.split(['?', '#']).next().unwrap_or(url);

    path.rsplit('.')
        .next()
        .filter(|ext| !ext.is_empty() && ext.len() <= 4 && !ext.contains('/'))
        .unwrap_or("jpg")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_art_extension() {
        assert_eq!(art_extension("https://f4.bcbits.com/img/a123_10.jpg"), "jpg");
        assert_eq!(art_extension("https://f4.bcbits.com/img/a123_10.png?v=2"), "png");
        assert_eq!(art_extension("https://host/noextension"), "jpg");
    }

    #[cfg(not(windows))]
    #[test]
    fn test_strike_interleaves_combining_char() {
        assert_eq!(strike("ab"), "a\u{336}b\u{336}");
    }
}
