//! UI rendering for the terminal user interface.
//!
//! Everything here is a pure function of `App`, the current `PlayerState`
//! snapshot and the UI settings; nothing in this module mutates state.

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style, Stylize},
    widgets::{Block, Borders, Clear, Gauge, List, ListItem, ListState, Padding, Paragraph, Wrap},
};
use std::{collections::BTreeMap, sync::LazyLock, time::Duration};

use crate::app::App;
use crate::catalog::Track;
use crate::config::{ControlsSettings, TimeField, UiSettings};
use crate::player::PlayerState;

static CONTROLS_MAP: LazyLock<BTreeMap<&'static str, &'static str>> = LazyLock::new(|| {
    BTreeMap::from([
        ("j/k", "up/down"),
        ("gg/G", "top/bottom"),
        ("enter", "play list"),
        ("Q", "queue list"),
        ("a/A", "play album/artist"),
        ("P", "play playlist"),
        ("space/p", "play/pause"),
        ("h/l", "prev/next"),
        ("+/-", "volume"),
        ("m", "mute"),
        ("/", "filter"),
        ("s", "shuffle"),
        ("r", "repeat"),
        ("K", "metadata"),
        ("zz", "jump to playing"),
        ("q", "quit"),
    ])
});

/// Render the controls help text, incorporating scrub seconds.
fn controls_text(scrub_seconds: u64) -> String {
    let order = [
        "j/k", "h/l", "H/L", "enter", "Q", "a/A", "P", "space/p", "+/-", "m", "gg/G", "zz", "K", "/", "s",
        "r", "q",
    ];
    order
        .iter()
        .filter_map(|k| {
            if *k == "H/L" {
                Some(format!("[H/L] seek -/+{}s", scrub_seconds))
            } else {
                CONTROLS_MAP.get(*k).map(|v| format!("[{}] {}", k, v))
            }
        })
        .collect::<Vec<String>>()
        .join(" | ")
}

fn format_mmss(d: Duration) -> String {
    let secs = d.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// Elapsed/total/remaining text for the progress bar, per `UiSettings`.
fn now_playing_time_text(state: &PlayerState, ui: &UiSettings) -> Option<String> {
    let track = state.current_track.as_ref()?;
    let elapsed = Duration::from_millis(state.elapsed_ms());
    let total = track.duration();

    let parts: Vec<String> = ui
        .now_playing_time_fields
        .iter()
        .filter_map(|f| match f {
            TimeField::Elapsed => Some(format_mmss(elapsed)),
            TimeField::Total => total.map(format_mmss),
            TimeField::Remaining => total.map(|t| format!("-{}", format_mmss(t.saturating_sub(elapsed)))),
        })
        .collect();

    (!parts.is_empty()).then(|| parts.join(&ui.now_playing_time_separator))
}

fn status_text(app: &App, state: &PlayerState) -> String {
    let mut parts: Vec<String> = Vec::new();

    parts.push(if app.follow_playback {
        " CURSOR: Follow".to_string()
    } else {
        " CURSOR: Free-roam".to_string()
    });
    parts.push(format!("REPEAT: {}", state.repeat.label()));
    parts.push(format!(
        "SHUFFLE: {}",
        if state.shuffle { "ON" } else { "OFF" }
    ));

    let q = app.filter_query.trim();
    if app.filter_mode || !q.is_empty() {
        let mut filter_part = String::from("FILTER:");
        if !q.is_empty() {
            filter_part.push(' ');
            filter_part.push_str(q);
        }
        parts.push(filter_part);
    }

    parts.push(format!("VOL: {:.0}%", state.volume * 100.0));

    match &state.current_track {
        Some(track) => {
            parts.push(format!("Song: {}", track.display()));
            if !state.queue.is_empty() {
                let pos = state
                    .current_index()
                    .map_or_else(|| "-".to_string(), |i| (i + 1).to_string());
                parts.push(format!("Queue: {}/{}", pos, state.queue.len()));
            }
            parts.push(if state.is_playing { "Playing" } else { "Paused" }.to_string());
        }
        None => parts.push("Stopped".to_string()),
    }

    if let Some(source) = &app.source {
        parts.push(format!("Source: {}", source));
    }

    parts.join(" • ")
}

/// Compute a centered rectangle with given size constrained to `r`.
fn centered_rect_sized(mut width: u16, mut height: u16, r: Rect) -> Rect {
    width = width.min(r.width.saturating_sub(2)).max(10);
    height = height.min(r.height.saturating_sub(2)).max(5);

    let x = r.x + (r.width.saturating_sub(width) / 2);
    let y = r.y + (r.height.saturating_sub(height) / 2);
    Rect {
        x,
        y,
        width,
        height,
    }
}

/// Format an optional duration, rounding up partial seconds, showing total seconds.
fn format_duration_mmss_ceil(d: Option<Duration>) -> String {
    let Some(d) = d else {
        return "-".to_string();
    };

    let mut total_secs = d.as_secs();
    if d.subsec_nanos() > 0 {
        total_secs = total_secs.saturating_add(1);
    }
    format!("{}:{:02} ({}s)", total_secs / 60, total_secs % 60, total_secs)
}

fn metadata_text(track: &Track, playlists: &[&str]) -> String {
    let playlists = if playlists.is_empty() {
        "-".to_string()
    } else {
        playlists.join(", ")
    };
    format!(
        "Title: {}\nArtist: {}\nAlbum: {}\nTrack: {}\nDuration: {}\nExplicit: {}\nPlays: {}\nPlaylists: {}\nLocator: {}",
        track.title,
        track.artist.name,
        track.album.title,
        track.track_number,
        format_duration_mmss_ceil(track.duration()),
        if track.explicit { "yes" } else { "no" },
        track.play_count,
        playlists,
        track.audio_url.as_deref().unwrap_or("-"),
    )
}

/// Label with the characters matched by the filter upper-cased.
fn highlighted_label(app: &App, idx: usize, query: &str, query_lower: Option<&str>) -> String {
    let label = app.label(idx);
    let positions = match query_lower {
        Some(ql) => app.fuzzy_match_positions_for_track_lower(idx, ql),
        None => App::fuzzy_match_positions(label, query),
    };
    let Some(positions) = positions else {
        return label.to_string();
    };

    let mut rendered = String::with_capacity(label.len());
    let mut pos_iter = positions.into_iter();
    let mut next_pos = pos_iter.next();
    for (ci, ch) in label.chars().enumerate() {
        if next_pos == Some(ci) {
            rendered.extend(ch.to_uppercase());
            next_pos = pos_iter.next();
        } else {
            rendered.push(ch);
        }
    }
    rendered
}

/// `Gauge::ratio` panics outside [0, 1]; progress is stored unclamped.
fn gauge_ratio(progress: f64) -> f64 {
    if progress.is_finite() {
        progress.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

fn bordered(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .title(title)
        .padding(Padding {
            left: 1,
            right: 0,
            top: 0,
            bottom: 0,
        })
}

/// Render the entire UI into `frame`.
pub fn draw(
    frame: &mut Frame,
    app: &App,
    state: &PlayerState,
    ui_settings: &UiSettings,
    controls_settings: &ControlsSettings,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(4),
            Constraint::Min(1),
            Constraint::Length(3),
            Constraint::Length(4),
        ])
        .split(frame.area());

    let header = Paragraph::new(ui_settings.header_text.as_str())
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" myndral ")
                .title_alignment(Alignment::Center),
        );
    frame.render_widget(header, chunks[0]);

    let status = Paragraph::new(status_text(app, state))
        .block(bordered(" status "))
        .wrap(Wrap { trim: true });
    frame.render_widget(status, chunks[1]);

    // Track list
    {
        let display = app.display_indices();
        let q = app.filter_query.trim();
        let query_lower = (!q.is_empty() && app.uses_lower_labels()).then(|| q.to_ascii_lowercase());
        let playing = state
            .current_track
            .as_ref()
            .and_then(|t| app.index_of(&t.id));

        // Only build items for the rows that fit, keeping the cursor centered.
        let total = display.len();
        let list_height = chunks[2].height.saturating_sub(2) as usize;
        let sel_pos = display.iter().position(|&i| i == app.selected).unwrap_or(0);
        let (start, end) = if total <= list_height || list_height == 0 {
            (0, total)
        } else {
            let half = list_height / 2;
            let start = sel_pos.saturating_sub(half).min(total - list_height);
            (start, start + list_height)
        };

        let items: Vec<ListItem> = display[start..end]
            .iter()
            .map(|&i| {
                let label = if q.is_empty() {
                    app.label(i).to_string()
                } else {
                    highlighted_label(app, i, q, query_lower.as_deref())
                };
                let marker = if Some(i) == playing { "♪ " } else { "  " };
                ListItem::new(format!("{marker}{label}"))
            })
            .collect();

        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!(" tracks ({}/{}) ", total, app.tracks().len())),
            )
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
            .highlight_symbol("> ");
        let mut list_state = ListState::default();
        if total > 0 {
            list_state.select(Some(sel_pos - start));
        }
        frame.render_stateful_widget(list, chunks[2], &mut list_state);

        if app.metadata_window {
            let popup_area = centered_rect_sized(72, 12, chunks[2]);
            frame.render_widget(Clear, popup_area);

            let meta = app
                .selected_track()
                .map_or_else(
                    || "No track selected".to_string(),
                    |t| metadata_text(t, &app.playlist_names(app.selected)),
                );
            let popup = Paragraph::new(meta)
                .block(bordered(" metadata (K closes) "))
                .wrap(Wrap { trim: true });
            frame.render_widget(popup, popup_area);
        }
    }

    let label = now_playing_time_text(state, ui_settings).unwrap_or_default();
    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title(" progress "))
        .gauge_style(Style::default().bold())
        .ratio(gauge_ratio(state.progress))
        .label(label);
    frame.render_widget(gauge, chunks[3]);

    let footer = Paragraph::new(controls_text(controls_settings.scrub_seconds))
        .block(bordered(" controls "))
        .wrap(Wrap { trim: true });
    frame.render_widget(footer, chunks[4]);
}
