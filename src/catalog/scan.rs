use std::path::Path;

use lofty::prelude::*;
use tracing::{debug, trace};
use walkdir::WalkDir;

use crate::config::LibrarySettings;

use super::model::{AlbumRef, ArtistRef, Track, TrackId};

const UNKNOWN_ARTIST: &str = "Unknown Artist";
const UNKNOWN_ALBUM: &str = "Unknown Album";

fn is_audio_file(path: &Path, settings: &LibrarySettings) -> bool {
    let exts: Vec<String> = settings
        .extensions
        .iter()
        .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|e| !e.is_empty())
        .collect();

    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            exts.iter().any(|e| e == &ext)
        })
        .unwrap_or(false)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|s| s.to_str())
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

/// Lowercase, dash-separated identifier fragment.
pub(super) fn slug(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut dash = false;
    for c in s.trim().chars() {
        if c.is_alphanumeric() {
            out.extend(c.to_lowercase());
            dash = false;
        } else if !dash && !out.is_empty() {
            out.push('-');
            dash = true;
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    out
}

fn non_blank(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn track_from_file(path: &Path) -> Track {
    let mut title = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("UNKNOWN")
        .to_string();
    let mut artist: Option<String> = None;
    let mut album: Option<String> = None;
    let mut track_number = 0;
    let mut duration_ms = 0;

    match lofty::read_from_path(path) {
        Ok(tagged) => {
            duration_ms = tagged.properties().duration().as_millis() as u64;

            if let Some(tag) = tagged.primary_tag().or_else(|| tagged.first_tag()) {
                if let Some(v) = non_blank(tag.title().map(|v| v.into_owned())) {
                    title = v;
                }
                artist = non_blank(tag.artist().map(|v| v.into_owned()));
                album = non_blank(tag.album().map(|v| v.into_owned()));
                track_number = tag.track().unwrap_or(0);
            }
        }
        Err(e) => trace!(path = %path.display(), error = %e, "no readable tags"),
    }

    // Loose files are usually grouped by directory.
    let album = album.or_else(|| {
        path.parent()
            .and_then(|p| p.file_name())
            .and_then(|s| s.to_str())
            .map(str::to_string)
    });

    let artist_name = artist.unwrap_or_else(|| UNKNOWN_ARTIST.to_string());
    let album_title = album.unwrap_or_else(|| UNKNOWN_ALBUM.to_string());
    let artist_id = slug(&artist_name);
    let album_id = format!("{}/{}", artist_id, slug(&album_title));
    let location = path.display().to_string();

    Track {
        id: TrackId(location.clone()),
        title,
        album: AlbumRef {
            id: album_id,
            title: album_title,
        },
        artist: ArtistRef {
            id: artist_id,
            name: artist_name,
        },
        track_number,
        duration_ms,
        audio_url: Some(location),
        explicit: false,
        play_count: 0,
    }
}

/// Walk `dir` and build a track for every audio file found.
pub fn scan(dir: &Path, settings: &LibrarySettings) -> Vec<Track> {
    let mut tracks: Vec<Track> = Vec::new();

    let mut walker = WalkDir::new(dir).follow_links(settings.follow_links);

    // Non-recursive = only the root directory.
    let depth_cap = if settings.recursive {
        settings.max_depth
    } else {
        Some(1)
    };
    if let Some(d) = depth_cap {
        walker = walker.max_depth(d);
    }

    for entry in walker
        .into_iter()
        .filter_entry(|e| settings.include_hidden || e.depth() == 0 || !is_hidden(e.path()))
        .filter_map(Result::ok)
    {
        let path = entry.path();
        if path.is_file()
            && (settings.include_hidden || !is_hidden(path))
            && is_audio_file(path, settings)
        {
            tracks.push(track_from_file(path));
        }
    }

    tracks.sort_by_cached_key(|t| t.display().to_lowercase());
    debug!(dir = %dir.display(), count = tracks.len(), "library scan finished");
    tracks
}
