//! Catalog: the tracks the player can queue.
//!
//! Tracks come either from scanning a local music directory or from an
//! export of the remote catalog API. The player never mutates them; it
//! receives ready-made, ordered `Arc<Track>` sequences from the context
//! builders here.

mod error;
mod file;
mod model;
mod scan;

use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use crate::config::LibrarySettings;

pub use error::CatalogError;
pub use model::*;

/// Default number of tracks queued from an artist's top tracks.
pub const TOP_TRACKS_LIMIT: usize = 10;

/// Load a catalog from a music directory or an export file.
pub fn load(path: &Path, settings: &LibrarySettings) -> error::Result<Catalog> {
    if !path.exists() {
        return Err(CatalogError::NotFound(path.to_path_buf()));
    }

    let catalog = if path.is_dir() {
        Catalog::new(scan::scan(path, settings))
    } else {
        let export = file::load_export(path)?;
        Catalog::with_playlists(export.tracks, export.playlists)
    };

    if catalog.is_empty() {
        warn!(path = %path.display(), "catalog is empty");
    } else {
        info!(
            path = %path.display(),
            tracks = catalog.len(),
            playlists = catalog.playlists.len(),
            "catalog loaded"
        );
    }
    Ok(catalog)
}

impl Catalog {
    /// Tracks of one album, ordered by track number.
    pub fn album_tracks(&self, album_id: &str) -> Vec<Arc<Track>> {
        let mut tracks: Vec<Arc<Track>> = self
            .tracks
            .iter()
            .filter(|t| t.album.id == album_id)
            .cloned()
            .collect();
        tracks.sort_by_key(|t| t.track_number);
        tracks
    }

    /// Playlists that hold the track with `id`, in catalog order.
    pub fn playlists_with<'a>(&'a self, id: &'a TrackId) -> impl Iterator<Item = &'a Playlist> + 'a {
        self.playlists
            .iter()
            .filter(move |p| p.tracks.iter().any(|t| &t.id == id))
    }

    /// An artist's most played tracks, at most `limit` of them.
    pub fn artist_top_tracks(&self, artist_id: &str, limit: usize) -> Vec<Arc<Track>> {
        let mut tracks: Vec<Arc<Track>> = self
            .tracks
            .iter()
            .filter(|t| t.artist.id == artist_id)
            .cloned()
            .collect();
        // Stable sort keeps catalog order among equal play counts.
        tracks.sort_by(|a, b| b.play_count.cmp(&a.play_count));
        tracks.truncate(limit);
        tracks
    }
}

#[cfg(test)]
mod tests;
