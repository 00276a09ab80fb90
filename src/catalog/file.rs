//! Catalog export files.
//!
//! An export is one API response saved as JSON, or the same structure written
//! as TOML: a paginated track listing (`{ items, total, limit, offset }`), a
//! paginated playlist listing, or a single playlist (`{ id, name, tracks }`).

use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use super::error::{CatalogError, Result};
use super::model::{Paginated, PlaylistRecord, Track};

/// Shapes an export file may take. Playlist pages are tried before track
/// pages since their items are stricter.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Export {
    Playlists(Paginated<PlaylistRecord>),
    Tracks(Paginated<Track>),
    Playlist(PlaylistRecord),
}

/// Tracks and playlists read from one export file.
#[derive(Debug, Default)]
pub struct ExportContents {
    pub tracks: Vec<Track>,
    pub playlists: Vec<PlaylistRecord>,
}

pub fn load_export(path: &Path) -> Result<ExportContents> {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    let text = fs::read_to_string(path).map_err(|source| CatalogError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let export: Export = match ext.as_str() {
        "json" => serde_json::from_str(&text).map_err(|source| CatalogError::Json {
            path: path.to_path_buf(),
            source,
        })?,
        "toml" => toml::from_str(&text).map_err(|source| CatalogError::Toml {
            path: path.to_path_buf(),
            source,
        })?,
        _ => return Err(CatalogError::UnsupportedFormat(path.to_path_buf())),
    };

    Ok(match export {
        Export::Tracks(page) => ExportContents {
            tracks: full_page(path, page),
            playlists: Vec::new(),
        },
        Export::Playlists(page) => ExportContents {
            tracks: Vec::new(),
            playlists: full_page(path, page),
        },
        Export::Playlist(playlist) => ExportContents {
            tracks: Vec::new(),
            playlists: vec![playlist],
        },
    })
}

fn full_page<T>(path: &Path, page: Paginated<T>) -> Vec<T> {
    if page.total > page.items.len() {
        debug!(
            path = %path.display(),
            total = page.total,
            offset = page.offset,
            limit = page.limit,
            loaded = page.items.len(),
            "export holds a partial page"
        );
    }
    page.items
}
