use super::*;
use crate::config::LibrarySettings;
use std::fs;

fn t(id: &str, album: &str, artist: &str, number: u32, plays: u64) -> Track {
    Track {
        id: TrackId::from(id),
        title: id.to_uppercase(),
        album: AlbumRef {
            id: album.into(),
            title: album.into(),
        },
        artist: ArtistRef {
            id: artist.into(),
            name: artist.into(),
        },
        track_number: number,
        duration_ms: 180_000,
        audio_url: None,
        explicit: false,
        play_count: plays,
    }
}

const JSON_EXPORT: &str = r#"{
  "items": [
    {
      "id": "trk-1",
      "title": "Opening",
      "albumId": "alb-1",
      "album": { "id": "alb-1", "title": "First Light", "albumType": "album", "trackCount": 2 },
      "artistId": "art-1",
      "artist": { "id": "art-1", "name": "Nova", "verified": true },
      "trackNumber": 1,
      "durationMs": 201000,
      "audioUrl": "file:///music/opening.flac",
      "playCount": 42,
      "explicit": false
    },
    {
      "id": "trk-2",
      "title": "Closing",
      "album": { "id": "alb-1", "title": "First Light" },
      "artist": { "id": "art-1", "name": "Nova" },
      "trackNumber": 2,
      "durationMs": 187000,
      "playCount": 7,
      "explicit": true
    }
  ],
  "total": 2,
  "limit": 20,
  "offset": 0
}"#;

#[test]
fn load_parses_json_export_ignoring_extra_fields() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tracks.json");
    fs::write(&path, JSON_EXPORT).unwrap();

    let catalog = load(&path, &LibrarySettings::default()).unwrap();
    assert_eq!(catalog.tracks.len(), 2);

    let first = &catalog.tracks[0];
    assert_eq!(first.id, TrackId::from("trk-1"));
    assert_eq!(first.album.title, "First Light");
    assert_eq!(first.artist.name, "Nova");
    assert_eq!(first.duration_ms, 201_000);
    assert_eq!(first.play_count, 42);
    assert_eq!(
        first.local_path(),
        Some(std::path::PathBuf::from("/music/opening.flac"))
    );

    let second = &catalog.tracks[1];
    assert!(second.explicit);
    assert_eq!(second.audio_url, None);
    assert_eq!(second.local_path(), None);
}

#[test]
fn load_parses_toml_export() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tracks.toml");
    fs::write(
        &path,
        r#"
total = 1

[[items]]
id = "trk-9"
title = "Tide"
trackNumber = 3
durationMs = 99000
audioUrl = "/music/tide.mp3"

[items.album]
id = "alb-9"
title = "Coast"

[items.artist]
id = "art-9"
name = "Harbor"
"#,
    )
    .unwrap();

    let catalog = load(&path, &LibrarySettings::default()).unwrap();
    assert_eq!(catalog.tracks.len(), 1);
    assert_eq!(catalog.tracks[0].display(), "Harbor - Tide");
    assert_eq!(catalog.tracks[0].track_number, 3);
    assert_eq!(catalog.tracks[0].play_count, 0);
}

#[test]
fn load_rejects_unknown_extension_and_missing_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tracks.csv");
    fs::write(&path, "id,title").unwrap();

    assert!(matches!(
        load(&path, &LibrarySettings::default()),
        Err(CatalogError::UnsupportedFormat(_))
    ));
    assert!(matches!(
        load(&dir.path().join("missing.json"), &LibrarySettings::default()),
        Err(CatalogError::NotFound(_))
    ));
}

#[test]
fn load_reports_malformed_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tracks.json");
    fs::write(&path, r#"{ "items": [ { "id": 1 } ] }"#).unwrap();

    let err = load(&path, &LibrarySettings::default()).unwrap_err();
    assert!(matches!(err, CatalogError::Json { .. }));
    assert!(err.to_string().contains("tracks.json"));
}

#[test]
fn album_tracks_are_ordered_by_track_number() {
    let catalog = Catalog::new(vec![
        t("c", "alb", "art", 3, 0),
        t("x", "other", "art", 1, 0),
        t("a", "alb", "art", 1, 0),
        t("b", "alb", "art", 2, 0),
    ]);

    let ids: Vec<String> = catalog
        .album_tracks("alb")
        .iter()
        .map(|t| t.id.0.clone())
        .collect();
    assert_eq!(ids, vec!["a", "b", "c"]);
}

#[test]
fn artist_top_tracks_sorts_by_play_count_and_truncates() {
    let catalog = Catalog::new(vec![
        t("low", "alb", "art", 1, 1),
        t("high", "alb", "art", 2, 100),
        t("mid", "alb", "art", 3, 50),
        t("else", "alb", "someone", 1, 1000),
    ]);

    let ids: Vec<String> = catalog
        .artist_top_tracks("art", 2)
        .iter()
        .map(|t| t.id.0.clone())
        .collect();
    assert_eq!(ids, vec!["high", "mid"]);
}

#[test]
fn local_path_rejects_remote_locators() {
    let mut track = t("a", "alb", "art", 1, 0);
    track.audio_url = Some("https://cdn.example.com/a.mp3".into());
    assert_eq!(track.local_path(), None);

    track.audio_url = Some("  ".into());
    assert_eq!(track.local_path(), None);

    track.audio_url = Some("/srv/a.mp3".into());
    assert_eq!(
        track.local_path(),
        Some(std::path::PathBuf::from("/srv/a.mp3"))
    );
}

const PLAYLIST_PAGE: &str = r#"{
  "items": [
    {
      "id": "pl-1",
      "name": "Night Drive",
      "ownerId": "usr-1",
      "isPublic": true,
      "isAiCurated": false,
      "tracks": [
        { "id": "trk-3", "title": "Third", "album": { "id": "alb-2", "title": "B" }, "artist": { "id": "art-1", "name": "Nova" }, "trackNumber": 3 },
        { "id": "trk-1", "title": "First", "album": { "id": "alb-1", "title": "A" }, "artist": { "id": "art-1", "name": "Nova" }, "trackNumber": 1 }
      ]
    },
    {
      "id": "pl-2",
      "name": "Mornings",
      "description": "slow ones",
      "tracks": [
        { "id": "trk-1", "title": "First", "album": { "id": "alb-1", "title": "A" }, "artist": { "id": "art-1", "name": "Nova" }, "trackNumber": 1 }
      ]
    }
  ],
  "total": 2
}"#;

#[test]
fn load_parses_playlist_page_keeping_playlist_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("playlists.json");
    fs::write(&path, PLAYLIST_PAGE).unwrap();

    let catalog = load(&path, &LibrarySettings::default()).unwrap();
    assert_eq!(catalog.playlists.len(), 2);

    let ids: Vec<&str> = catalog.playlists[0]
        .tracks
        .iter()
        .map(|t| t.id.0.as_str())
        .collect();
    assert_eq!(ids, vec!["trk-3", "trk-1"]);
    assert_eq!(catalog.playlists[1].description.as_deref(), Some("slow ones"));

    // Tracks shared by both playlists appear once in the listing.
    assert_eq!(catalog.len(), 2);
    assert!(std::sync::Arc::ptr_eq(
        &catalog.playlists[0].tracks[1],
        &catalog.playlists[1].tracks[0]
    ));

    let trk_1 = TrackId::from("trk-1");
    let holding: Vec<&str> = catalog
        .playlists_with(&trk_1)
        .map(|p| p.name.as_str())
        .collect();
    assert_eq!(holding, vec!["Night Drive", "Mornings"]);
}

#[test]
fn load_parses_single_playlist_toml() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("playlist.toml");
    fs::write(
        &path,
        r#"
id = "pl-7"
name = "Road"

[[tracks]]
id = "trk-b"
title = "Bend"
album = { id = "alb", title = "Map" }
artist = { id = "art", name = "Atlas" }

[[tracks]]
id = "trk-a"
title = "Arrival"
album = { id = "alb", title = "Map" }
artist = { id = "art", name = "Atlas" }
"#,
    )
    .unwrap();

    let catalog = load(&path, &LibrarySettings::default()).unwrap();
    assert_eq!(catalog.playlists.len(), 1);
    assert_eq!(catalog.playlists[0].name, "Road");
    let ids: Vec<&str> = catalog.tracks.iter().map(|t| t.id.0.as_str()).collect();
    assert_eq!(ids, vec!["trk-b", "trk-a"]);
}

#[test]
fn with_playlists_reuses_listing_tracks() {
    let catalog = Catalog::with_playlists(
        vec![t("a", "alb", "art", 1, 0), t("b", "alb", "art", 2, 0)],
        vec![PlaylistRecord {
            id: "pl".into(),
            name: "Mix".into(),
            description: None,
            tracks: vec![t("b", "alb", "art", 2, 0), t("z", "other", "art", 1, 0)],
        }],
    );

    let ids: Vec<&str> = catalog.tracks.iter().map(|t| t.id.0.as_str()).collect();
    assert_eq!(ids, vec!["a", "b", "z"]);
    assert!(std::sync::Arc::ptr_eq(&catalog.tracks[1], &catalog.playlists[0].tracks[0]));
    assert_eq!(catalog.playlists_with(&TrackId::from("a")).count(), 0);
}
