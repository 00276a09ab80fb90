use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

/// Stable track identifier; queue lookups compare tracks by this id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(transparent)]
pub struct TrackId(pub String);

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TrackId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AlbumRef {
    pub id: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ArtistRef {
    pub id: String,
    pub name: String,
}

/// A catalog track. Immutable once loaded; the player only ever holds
/// `Arc<Track>` handles to it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub id: TrackId,
    pub title: String,
    pub album: AlbumRef,
    pub artist: ArtistRef,
    #[serde(default)]
    pub track_number: u32,
    #[serde(default)]
    pub duration_ms: u64,
    /// Playable audio locator: a filesystem path or a `file://` URL.
    #[serde(default)]
    pub audio_url: Option<String>,
    #[serde(default)]
    pub explicit: bool,
    #[serde(default)]
    pub play_count: u64,
}

impl Track {
    /// "Artist - Title", or just the title when the artist name is blank.
    pub fn display(&self) -> String {
        let artist = self.artist.name.trim();
        if artist.is_empty() {
            self.title.clone()
        } else {
            format!("{} - {}", artist, self.title)
        }
    }

    pub fn duration(&self) -> Option<Duration> {
        (self.duration_ms > 0).then(|| Duration::from_millis(self.duration_ms))
    }

    /// Resolve `audio_url` into a local file path.
    ///
    /// Returns `None` for tracks without a locator or with a remote scheme.
    pub fn local_path(&self) -> Option<PathBuf> {
        let url = self.audio_url.as_deref()?.trim();
        if url.is_empty() {
            return None;
        }
        if let Some(rest) = url.strip_prefix("file://") {
            return Some(PathBuf::from(rest));
        }
        if url.contains("://") {
            return None;
        }
        Some(PathBuf::from(url))
    }
}

/// One page of a remote listing, as served by the catalog API.
#[derive(Debug, Clone, Deserialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    #[serde(default)]
    pub total: usize,
    #[serde(default)]
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
}

/// A playlist as served by the catalog API. Unknown fields (owner, cover,
/// timestamps) are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub tracks: Vec<Track>,
}

/// A playlist resolved against the catalog: its tracks, in playlist order,
/// share the catalog's `Arc`s.
#[derive(Debug, Clone)]
pub struct Playlist {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub tracks: Vec<Arc<Track>>,
}

/// All tracks known to the player, in display order, plus any playlists.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub tracks: Vec<Arc<Track>>,
    pub playlists: Vec<Playlist>,
}

impl Catalog {
    pub fn new(tracks: Vec<Track>) -> Self {
        Self::with_playlists(tracks, Vec::new())
    }

    /// Build a catalog from loose tracks and playlists. Playlist tracks the
    /// listing does not already hold are appended, so every queued track is
    /// also browsable.
    pub fn with_playlists(tracks: Vec<Track>, playlists: Vec<PlaylistRecord>) -> Self {
        let mut by_id: HashMap<TrackId, Arc<Track>> = HashMap::new();
        let mut all: Vec<Arc<Track>> = Vec::with_capacity(tracks.len());

        let mut intern = |track: Track, all: &mut Vec<Arc<Track>>| -> Arc<Track> {
            by_id
                .entry(track.id.clone())
                .or_insert_with(|| {
                    let arc = Arc::new(track);
                    all.push(arc.clone());
                    arc
                })
                .clone()
        };

        for track in tracks {
            intern(track, &mut all);
        }
        let playlists = playlists
            .into_iter()
            .map(|p| Playlist {
                id: p.id,
                name: p.name,
                description: p.description,
                tracks: p.tracks.into_iter().map(|t| intern(t, &mut all)).collect(),
            })
            .collect();

        Self {
            tracks: all,
            playlists,
        }
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}
