//! Application model: the browsable catalog list, selection, filter and the
//! play contexts built from them.
//!
//! Playback itself lives in `PlayerStore`; the app only decides *what* to
//! hand to it.

use std::sync::Arc;

use crate::catalog::{Catalog, TOP_TRACKS_LIMIT, Track, TrackId};
use crate::player::PlayerState;

/// A track to start and the queue to start it in.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayContext {
    pub track: Arc<Track>,
    pub queue: Vec<Arc<Track>>,
}

/// The main application model.
pub struct App {
    catalog: Catalog,
    /// "Artist - Title" per catalog track, computed once.
    labels: Vec<String>,
    lower_labels: Option<Vec<String>>,

    pub selected: usize,
    pub follow_playback: bool,
    pub filter_mode: bool,
    pub filter_query: String,
    /// Where the catalog came from, shown in the status line.
    pub source: Option<String>,
    pub metadata_window: bool,
}

impl App {
    pub fn new(catalog: Catalog) -> Self {
        let labels: Vec<String> = catalog.tracks.iter().map(|t| t.display()).collect();
        // Lowercase labels are cached for large catalogs only.
        let lower_labels = (labels.len() > 100)
            .then(|| labels.iter().map(|l| l.to_ascii_lowercase()).collect());

        Self {
            catalog,
            labels,
            lower_labels,
            selected: 0,
            follow_playback: true,
            filter_mode: false,
            filter_query: String::new(),
            source: None,
            metadata_window: false,
        }
    }

    pub fn tracks(&self) -> &[Arc<Track>] {
        &self.catalog.tracks
    }

    pub fn label(&self, idx: usize) -> &str {
        &self.labels[idx]
    }

    pub fn selected_track(&self) -> Option<&Arc<Track>> {
        self.catalog.tracks.get(self.selected)
    }

    pub fn set_source(&mut self, source: String) {
        self.source = Some(source);
    }

    pub fn toggle_metadata_window(&mut self) {
        self.metadata_window = !self.metadata_window;
    }

    pub fn follow_playback_on(&mut self) {
        self.follow_playback = true;
    }

    pub fn follow_playback_off(&mut self) {
        self.follow_playback = false;
    }

    /// Catalog index of the track with `id`.
    pub fn index_of(&self, id: &TrackId) -> Option<usize> {
        self.catalog.tracks.iter().position(|t| &t.id == id)
    }

    /// Move the cursor onto the playing track, if it is visible.
    pub fn select_playing(&mut self, state: &PlayerState) -> bool {
        let Some(idx) = state
            .current_track
            .as_ref()
            .and_then(|t| self.index_of(&t.id))
        else {
            return false;
        };
        if !self.display_indices().contains(&idx) {
            return false;
        }
        self.selected = idx;
        true
    }

    /// Keep the cursor on the playing track while following playback.
    pub fn follow(&mut self, state: &PlayerState) {
        if self.follow_playback && !self.filter_mode {
            self.select_playing(state);
        }
    }

    /// Catalog indices in display order, narrowed by the active filter.
    pub fn display_indices(&self) -> Vec<usize> {
        let all = 0..self.labels.len();
        let query = self.filter_query.trim();
        if query.is_empty() {
            return all.collect();
        }

        match self.lower_labels.as_deref() {
            Some(lower) => {
                let query_lower = query.to_ascii_lowercase();
                all.filter(|&i| Self::fuzzy_match_positions_lower(&lower[i], &query_lower).is_some())
                    .collect()
            }
            None => all
                .filter(|&i| Self::fuzzy_match_positions(&self.labels[i], query).is_some())
                .collect(),
        }
    }

    /// The visible list, in display order.
    pub fn visible_tracks(&self) -> Vec<Arc<Track>> {
        self.display_indices()
            .into_iter()
            .map(|i| self.catalog.tracks[i].clone())
            .collect()
    }

    /// Play the selected track with the visible list as the queue.
    ///
    /// `None` when the cursor is not on a visible track, e.g. when the filter
    /// matches nothing.
    pub fn visible_context(&self) -> Option<PlayContext> {
        let display = self.display_indices();
        if !display.contains(&self.selected) {
            return None;
        }
        Some(PlayContext {
            track: self.selected_track()?.clone(),
            queue: display
                .into_iter()
                .map(|i| self.catalog.tracks[i].clone())
                .collect(),
        })
    }

    /// Play the selected track within its album.
    pub fn album_context(&self) -> Option<PlayContext> {
        let track = self.selected_track()?.clone();
        let queue = self.catalog.album_tracks(&track.album.id);
        Some(PlayContext { track, queue })
    }

    /// Play the selected track's artist from their most played track.
    pub fn artist_context(&self) -> Option<PlayContext> {
        let selected = self.selected_track()?;
        let queue = self
            .catalog
            .artist_top_tracks(&selected.artist.id, TOP_TRACKS_LIMIT);
        let track = queue.first()?.clone();
        Some(PlayContext { track, queue })
    }

    /// Play the selected track within the first playlist that holds it,
    /// queueing the playlist in its own order.
    pub fn playlist_context(&self) -> Option<PlayContext> {
        let track = self.selected_track()?.clone();
        let playlist = self.catalog.playlists_with(&track.id).next()?;
        Some(PlayContext {
            queue: playlist.tracks.clone(),
            track,
        })
    }

    /// Names of the playlists holding track `idx`.
    pub fn playlist_names(&self, idx: usize) -> Vec<&str> {
        let Some(track) = self.catalog.tracks.get(idx) else {
            return Vec::new();
        };
        self.catalog
            .playlists_with(&track.id)
            .map(|p| p.name.as_str())
            .collect()
    }

    pub fn uses_lower_labels(&self) -> bool {
        self.lower_labels.is_some()
    }

    /// Match positions of `query_lower` within the label of track `idx`.
    pub fn fuzzy_match_positions_for_track_lower(
        &self,
        idx: usize,
        query_lower: &str,
    ) -> Option<Vec<usize>> {
        if query_lower.is_empty() {
            return Some(Vec::new());
        }

        match self.lower_labels.as_deref() {
            Some(lower) => Self::fuzzy_match_positions_lower(&lower[idx], query_lower),
            None => Self::fuzzy_match_positions(&self.labels[idx], query_lower),
        }
    }

    /// Next visible index after `current`, wrapping to the first.
    pub fn next_in_view_from(&self, current: usize) -> Option<usize> {
        let display = self.display_indices();
        if display.is_empty() {
            return None;
        }

        match display.iter().position(|&i| i == current) {
            Some(p) => Some(display[(p + 1) % display.len()]),
            None => Some(display[0]),
        }
    }

    /// Previous visible index before `current`, wrapping to the last.
    pub fn prev_in_view_from(&self, current: usize) -> Option<usize> {
        let display = self.display_indices();
        let last = *display.last()?;

        match display.iter().position(|&i| i == current) {
            Some(0) | None => Some(last),
            Some(p) => Some(display[p - 1]),
        }
    }

    /// Subsequence match: char positions in `label` matching `query`, ignoring
    /// ASCII case, or `None` when `query` is not a subsequence.
    pub fn fuzzy_match_positions(label: &str, query: &str) -> Option<Vec<usize>> {
        let mut positions = Vec::new();
        let mut chars = label.chars().enumerate();

        for qc in query.chars() {
            let qc = qc.to_ascii_lowercase();
            let (pos, _) = chars.find(|(_, c)| c.to_ascii_lowercase() == qc)?;
            positions.push(pos);
        }

        Some(positions)
    }

    fn fuzzy_match_positions_lower(label_lower: &str, query_lower: &str) -> Option<Vec<usize>> {
        let mut positions = Vec::new();
        let mut chars = label_lower.chars().enumerate();

        for qc in query_lower.chars() {
            let (pos, _) = chars.find(|&(_, c)| c == qc)?;
            positions.push(pos);
        }

        Some(positions)
    }

    pub fn enter_filter_mode(&mut self) {
        self.filter_mode = true;
        self.follow_playback_off();
        self.ensure_selected_visible();
    }

    pub fn exit_filter_mode(&mut self) {
        self.filter_mode = false;
    }

    pub fn clear_filter(&mut self) {
        self.filter_query.clear();
        self.filter_mode = false;
        self.ensure_selected_visible();
    }

    pub fn push_filter_char(&mut self, c: char) {
        self.filter_query.push(c);
        self.ensure_selected_visible();
    }

    pub fn pop_filter_char(&mut self) {
        self.filter_query.pop();
        self.ensure_selected_visible();
    }

    /// Move the cursor to the first visible track if it fell out of view.
    fn ensure_selected_visible(&mut self) {
        let display = self.display_indices();
        match display.first() {
            None => self.selected = 0,
            Some(&first) if !display.contains(&self.selected) => self.selected = first,
            Some(_) => {}
        }
    }

    pub fn next(&mut self) {
        if let Some(next) = self.next_in_view_from(self.selected) {
            self.selected = next;
        }
    }

    pub fn prev(&mut self) {
        if let Some(prev) = self.prev_in_view_from(self.selected) {
            self.selected = prev;
        }
    }

    pub fn select_first(&mut self) {
        if let Some(&first) = self.display_indices().first() {
            self.selected = first;
        }
    }

    pub fn select_last(&mut self) {
        if let Some(&last) = self.display_indices().last() {
            self.selected = last;
        }
    }
}
