//! Filename formatting policy shared by all resolvers.
//!
//! Bandcamp track titles sometimes already embed `"Artist - Track"` in the
//! title field. The formatter detects that case, keeps the embedded artist
//! segment and interleaves album and index between the two halves.

/// Format a track filename from its metadata fields.
///
/// Empty `album` and `None` index are omitted together with their
/// separators. The full shape is `"{artist} - {album} - {index} {title}"`.
pub fn format_track_name(title: &str, artist: &str, album: &str, index: Option<u32>) -> String {
    if let Some((head, tail)) = title.split_once(" - ") {
        // The title already contains an artist display segment.
        match (album.is_empty(), index) {
            (false, Some(i)) => format!("{} - {} - {} {}", head, album, i, tail),
            (false, None) => format!("{} - {} - {}", head, album, tail),
            (true, Some(i)) => format!("{} - {} {}", head, i, tail),
            (true, None) => format!("{} - {}", head, tail),
        }
    } else {
        match (album.is_empty(), index) {
            (false, Some(i)) => format!("{} - {} - {} {}", artist, album, i, title),
            (false, None) => format!("{} - {} - {}", artist, album, title),
            (true, Some(i)) => format!("{} - {} {}", artist, i, title),
            (true, None) => format!("{} - {}", artist, title),
        }
    }
}

/// Format a short track filename, omitting artist and album fields.
pub fn short_track_name(title: &str, index: Option<u32>) -> String {
    let tail = match title.split_once(" - ") {
        Some((_, tail)) => tail,
        None => title,
    };

    match index {
        Some(i) => format!("{} {}", i, tail),
        None => tail.to_string(),
    }
}

/// Strip characters that are unsafe in filenames on common filesystems.
///
/// Idempotent: sanitizing twice equals sanitizing once.
pub fn sanitize_filename(name: &str) -> String {
    name.replace('/', "&")
        .replace(['\\', ':', '*', '?', '"', '<', '>', '|'], "")
}
