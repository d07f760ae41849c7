//! Integration tests for the entity resolvers against canned page fixtures.
//!
//! The fixtures carry the minimal set of markers the classifier and the
//! scrapers look for, served through a mock HTTP server so the full
//! prepare/fetch/download chain runs over the wire.

use std::path::Path;

use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use campdown::{Album, Campdown, CampdownError, Config, Discography, DiscographyItem, EntityState, HttpClient, Track};

fn test_config(output: &Path) -> Config {
    Config {
        output: output.to_path_buf(),
        verbose: false,
        short: false,
        art_enabled: false,
        tag_enabled: false,
        sleep_secs: 0,
        timeout_secs: 5,
        max_retries: 1,
        retry_rate_limited: true,
    }
}

/// A track page: site marker plus the discography sidebar, no track table.
fn track_page(title: &str, artist: &str, media_url: Option<&str>) -> String {
    let trackinfo = match media_url {
        Some(url) => format!(r#"trackinfo: [{{"file":{{"mp3-128":"{}"}},"title":"t"}}]"#, url),
        None => r#"trackinfo: [{"file":null,"title":"t"}]"#.to_string(),
    };

    format!(
        concat!(
            "<html><!-- bandcamp.com -->\n",
            "<div id=\"discography\"></div>\n",
            "<meta name=\"title\" content=\"{title}, by {artist}\">\n",
            "<meta itemprop=\"datePublished\" content=\"20160401000000\">\n",
            "{trackinfo}\n",
            "</html>"
        ),
        title = title,
        artist = artist,
        trackinfo = trackinfo,
    )
}

/// An album page: site marker plus the track table (which carries the
/// `track_list` class the classifier keys on).
fn album_page(rows: &str, art_url: &str) -> String {
    format!(
        concat!(
            "<html><!-- bandcamp.com -->\n",
            "<meta name=\"title\" content=\"Record, by ArtistA\">\n",
            "<a class=\"popupImage\" href=\"{art}\">\n",
            "<table class=\"track_list track_table\" id=\"track_table\">{rows}</table>\n",
            "</html>"
        ),
        art = art_url,
        rows = rows,
    )
}

/// A discography page: site marker only, no track table, no sidebar.
fn discography_page(links: &str) -> String {
    format!(
        concat!(
            "<html><!-- bandcamp.com -->\n",
            "<meta name=\"Description\" content=\"DiscoArtist.\n2 releases\">\n",
            "{links}\n",
            "</html>"
        ),
        links = links,
    )
}

async fn mount_page(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

async fn mount_bytes(server: &MockServer, route: &str, body: &[u8]) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body.to_vec()))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_track_prepare_extracts_metadata() {
    let server = MockServer::start().await;
    let media = format!("{}/stream/one.mp3", server.uri());
    mount_page(&server, "/track/one", track_page("SongA", "ArtistA", Some(&media))).await;

    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let config = test_config(temp_dir.path());
    let client = HttpClient::new(5);

    let mut track = Track::new(format!("{}/track/one", server.uri()), temp_dir.path(), config);
    let prepared = track.prepare(&client).await.expect("prepare should not error");

    assert!(prepared);
    assert_eq!(track.state(), EntityState::Prepared);
    assert_eq!(track.title(), "SongA");
    assert_eq!(track.artist(), "ArtistA");
    assert_eq!(track.media_url(), Some(media.as_str()));
}

#[tokio::test]
async fn test_purchase_gated_track_is_unavailable() {
    let server = MockServer::start().await;
    mount_page(&server, "/track/gated", track_page("Hidden", "ArtistA", None)).await;

    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let config = test_config(temp_dir.path());
    let client = HttpClient::new(5);

    let mut track = Track::new(format!("{}/track/gated", server.uri()), temp_dir.path(), config);
    let prepared = track.prepare(&client).await.expect("prepare should not error");

    assert!(!prepared);
    assert_eq!(track.state(), EntityState::Failed);
}

#[tokio::test]
async fn test_album_fetch_builds_indexed_queue() {
    let server = MockServer::start().await;

    // Five rows: one without a link, one with an empty path, one duplicate.
    // Only the three distinct named tracks survive discovery.
    let rows = concat!(
        r#"<tr><td><a href="/track/a">A</a></td></tr>"#,
        r#"<tr><td>no link here</td></tr>"#,
        r#"<tr><td><a href="/track/">empty</a></td></tr>"#,
        r#"<tr><td><a href="/track/b">B</a></td></tr>"#,
        r#"<tr><td><a href="/track/a">A again</a></td></tr>"#,
        r#"<tr><td><a href="/track/c">C</a></td></tr>"#,
    );
    mount_page(&server, "/album/rec", album_page(rows, "/img/cover.jpg")).await;

    for (route, title) in [("/track/a", "SongA"), ("/track/b", "SongB"), ("/track/c", "SongC")] {
        let media = format!("{}/stream{}.mp3", server.uri(), route);
        mount_page(&server, route, track_page(title, "ArtistA", Some(&media))).await;
    }

    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let config = test_config(temp_dir.path());
    let client = HttpClient::new(5);

    let mut album = Album::new(format!("{}/album/rec", server.uri()), temp_dir.path(), config);
    assert!(album.prepare(&client).await.expect("prepare should not error"));
    album.fetch(&client).await.expect("fetch should not error");

    assert_eq!(album.title(), "Record");
    assert_eq!(album.artist(), "ArtistA");
    assert!(temp_dir.path().join("ArtistA - Record").is_dir());

    let indices: Vec<Option<u32>> = album.queue().iter().map(Track::index).collect();
    assert_eq!(indices, vec![Some(1), Some(2), Some(3)]);
}

#[tokio::test]
async fn test_album_failed_track_keeps_sibling_indices() {
    let server = MockServer::start().await;

    let rows = concat!(
        r#"<tr><td><a href="/track/a">A</a></td></tr>"#,
        r#"<tr><td><a href="/track/gated">Gated</a></td></tr>"#,
        r#"<tr><td><a href="/track/b">B</a></td></tr>"#,
    );
    mount_page(&server, "/album/rec", album_page(rows, "/img/cover.jpg")).await;

    let media_a = format!("{}/stream/a.mp3", server.uri());
    let media_b = format!("{}/stream/b.mp3", server.uri());
    mount_page(&server, "/track/a", track_page("SongA", "ArtistA", Some(&media_a))).await;
    mount_page(&server, "/track/gated", track_page("Hidden", "ArtistA", None)).await;
    mount_page(&server, "/track/b", track_page("SongB", "ArtistA", Some(&media_b))).await;

    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let config = test_config(temp_dir.path());
    let client = HttpClient::new(5);

    let mut album = Album::new(format!("{}/album/rec", server.uri()), temp_dir.path(), config);
    assert!(album.prepare(&client).await.expect("prepare should not error"));
    album.fetch(&client).await.expect("fetch should not error");

    // The gated track is excluded but still occupies its table position.
    let indices: Vec<Option<u32>> = album.queue().iter().map(Track::index).collect();
    assert_eq!(indices, vec![Some(1), Some(3)]);
}

#[tokio::test]
async fn test_album_download_writes_files_and_cover() {
    let server = MockServer::start().await;

    let rows = concat!(
        r#"<tr><td><a href="/track/a">A</a></td></tr>"#,
        r#"<tr><td><a href="/track/b">B</a></td></tr>"#,
    );
    mount_page(&server, "/album/rec", album_page(rows, "/img/cover.jpg")).await;

    let media_a = format!("{}/stream/a.mp3", server.uri());
    let media_b = format!("{}/stream/b.mp3", server.uri());
    mount_page(&server, "/track/a", track_page("SongA", "ArtistA", Some(&media_a))).await;
    mount_page(&server, "/track/b", track_page("SongB", "ArtistA", Some(&media_b))).await;
    mount_bytes(&server, "/stream/a.mp3", b"audio bytes a").await;
    mount_bytes(&server, "/stream/b.mp3", b"audio bytes bb").await;
    mount_bytes(&server, "/img/cover.jpg", b"jpeg bytes").await;

    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let config = Config {
        art_enabled: true,
        ..test_config(temp_dir.path())
    };
    let client = HttpClient::new(5);

    let mut album = Album::new(format!("{}/album/rec", server.uri()), temp_dir.path(), config);
    assert!(album.prepare(&client).await.expect("prepare should not error"));
    album.fetch(&client).await.expect("fetch should not error");
    album.download(&client).await.expect("download should not error");

    let album_dir = temp_dir.path().join("ArtistA - Record");
    let file_a = album_dir.join("ArtistA - Record - 1 SongA.mp3");
    let file_b = album_dir.join("ArtistA - Record - 2 SongB.mp3");

    assert_eq!(std::fs::read(&file_a).expect("track a should exist"), b"audio bytes a");
    assert_eq!(std::fs::read(&file_b).expect("track b should exist"), b"audio bytes bb");
    assert_eq!(
        std::fs::read(album_dir.join("cover.jpg")).expect("cover should exist"),
        b"jpeg bytes"
    );
}

#[tokio::test]
async fn test_album_art_failure_does_not_block_tracks() {
    let server = MockServer::start().await;

    // An artwork href that cannot even form a request. The tracks must
    // still land and the album download must report success.
    let rows = r#"<tr><td><a href="/track/a">A</a></td></tr>"#;
    mount_page(&server, "/album/rec", album_page(rows, "bogus-art-href")).await;

    let media_a = format!("{}/stream/a.mp3", server.uri());
    mount_page(&server, "/track/a", track_page("SongA", "ArtistA", Some(&media_a))).await;
    mount_bytes(&server, "/stream/a.mp3", b"audio bytes a").await;

    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let config = Config {
        art_enabled: true,
        ..test_config(temp_dir.path())
    };
    let client = HttpClient::new(5);

    let mut album = Album::new(format!("{}/album/rec", server.uri()), temp_dir.path(), config);
    assert!(album.prepare(&client).await.expect("prepare should not error"));
    album.fetch(&client).await.expect("fetch should not error");
    album.download(&client).await.expect("artwork failure must not abort the album");

    let album_dir = temp_dir.path().join("ArtistA - Record");
    assert_eq!(
        std::fs::read(album_dir.join("ArtistA - Record - 1 SongA.mp3"))
            .expect("track should exist"),
        b"audio bytes a"
    );
    assert!(!album_dir.join("cover.jpg").exists());
}

#[tokio::test]
async fn test_discography_resolves_albums_before_tracks() {
    let server = MockServer::start().await;

    let links = concat!(
        r#"<a href="/track/loose">"#,
        r#"<a href="/album/rec">"#,
        r#"<a href="/track/gated">"#,
    );
    mount_page(&server, "/music", discography_page(links)).await;

    let rows = r#"<tr><td><a href="/track/a">A</a></td></tr>"#;
    mount_page(&server, "/album/rec", album_page(rows, "/img/cover.jpg")).await;

    let media_a = format!("{}/stream/a.mp3", server.uri());
    let media_loose = format!("{}/stream/loose.mp3", server.uri());
    mount_page(&server, "/track/a", track_page("SongA", "ArtistA", Some(&media_a))).await;
    mount_page(&server, "/track/loose", track_page("SongLoose", "ArtistA", Some(&media_loose))).await;
    mount_page(&server, "/track/gated", track_page("Hidden", "ArtistA", None)).await;
    mount_bytes(&server, "/stream/a.mp3", b"audio bytes a").await;
    mount_bytes(&server, "/stream/loose.mp3", b"audio bytes loose").await;

    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let config = test_config(temp_dir.path());
    let client = HttpClient::new(5);

    let mut discography =
        Discography::new(format!("{}/music", server.uri()), temp_dir.path(), config);
    assert!(discography.prepare(&client).await.expect("prepare should not error"));

    // The album is queued ahead of both tracks despite link order.
    assert_eq!(discography.artist(), "DiscoArtist");
    assert!(matches!(discography.queue()[0], DiscographyItem::Album(_)));
    assert!(matches!(discography.queue()[1], DiscographyItem::Track(_)));
    assert!(matches!(discography.queue()[2], DiscographyItem::Track(_)));

    discography.fetch(&client).await.expect("fetch should not error");

    // The gated track is dropped; the rest survive.
    assert_eq!(discography.queue().len(), 2);

    discography.download(&client).await.expect("download should not error");

    let artist_dir = temp_dir.path().join("DiscoArtist");
    let album_track = artist_dir
        .join("ArtistA - Record")
        .join("ArtistA - Record - 1 SongA.mp3");
    let loose_track = artist_dir.join("ArtistA - SongLoose.mp3");

    assert_eq!(std::fs::read(album_track).expect("album track should exist"), b"audio bytes a");
    assert_eq!(std::fs::read(loose_track).expect("loose track should exist"), b"audio bytes loose");
}

#[tokio::test]
async fn test_run_downloads_a_track_end_to_end() {
    let server = MockServer::start().await;

    let media = format!("{}/stream/one.mp3", server.uri());
    mount_page(&server, "/track/one", track_page("SongA", "ArtistA", Some(&media))).await;
    mount_bytes(&server, "/stream/one.mp3", b"audio bytes").await;

    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let config = test_config(temp_dir.path());

    Campdown::new(config)
        .run(&format!("{}/track/one", server.uri()))
        .await
        .expect("run should succeed");

    assert_eq!(
        std::fs::read(temp_dir.path().join("ArtistA - SongA.mp3")).expect("file should exist"),
        b"audio bytes"
    );
}

#[tokio::test]
async fn test_run_rejects_foreign_pages() {
    let server = MockServer::start().await;
    mount_page(&server, "/other", "<html>nothing of interest</html>".to_string()).await;

    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let config = test_config(temp_dir.path());

    let result = Campdown::new(config)
        .run(&format!("{}/other", server.uri()))
        .await;

    assert!(matches!(result, Err(CampdownError::UnrecognizedPage)));
}

#[tokio::test]
async fn test_run_rejects_invalid_urls() {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let config = test_config(temp_dir.path());

    let result = Campdown::new(config).run("artist.bandcamp.com/music").await;

    assert!(matches!(result, Err(CampdownError::InvalidUrl(_))));
}
