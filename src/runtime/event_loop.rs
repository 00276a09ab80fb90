use std::sync::mpsc;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::{debug, info};

use crate::app::{App, PlayContext};
use crate::audio::{AudioBridge, AudioEvent, AudioOutput};
use crate::config;
use crate::mpris::ControlCmd;
use crate::player::{PlayerCmd, PlayerStore};
use crate::runtime::mpris_sync::MprisSync;
use crate::runtime::startup;
use crate::ui;

/// Everything the loop reads from or drives.
pub struct Session<'a, O: AudioOutput> {
    pub settings: &'a config::Settings,
    pub app: &'a mut App,
    pub store: &'a mut PlayerStore,
    pub bridge: &'a mut AudioBridge<O>,
    pub mpris: &'a MprisSync,
    pub audio_rx: &'a mpsc::Receiver<AudioEvent>,
    pub control_tx: &'a mpsc::Sender<ControlCmd>,
    pub control_rx: &'a mpsc::Receiver<ControlCmd>,
}

/// Two-key prefixes (`gg`, `zz`) carried across key presses.
#[derive(Debug, Default)]
pub struct EventLoopState {
    pending_gg: bool,
    pending_zz: bool,
}

impl EventLoopState {
    fn clear_prefixes(&mut self) {
        self.pending_gg = false;
        self.pending_zz = false;
    }
}

/// Main terminal event loop. Returns `Ok(())` when shutdown is requested.
pub fn run<O: AudioOutput>(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    session: &mut Session<'_, O>,
    state: &mut EventLoopState,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        while let Ok(ev) = session.audio_rx.try_recv() {
            session.bridge.handle_event(ev, session.store);
            session.bridge.sync(session.store.state());
        }

        session.mpris.pump();
        session.app.follow(session.store.state());

        terminal.draw(|f| {
            ui::draw(
                f,
                &*session.app,
                session.store.state(),
                &session.settings.ui,
                &session.settings.controls,
            )
        })?;

        while let Ok(cmd) = session.control_rx.try_recv() {
            let quit = handle_control_cmd(cmd, session);
            session.bridge.sync(session.store.state());
            if quit {
                shutdown(session);
                return Ok(());
            }
        }

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                let quit = handle_key_event(key, session, state);
                session.bridge.sync(session.store.state());
                if quit {
                    shutdown(session);
                    return Ok(());
                }
            }
        }
    }
}

fn shutdown<O: AudioOutput>(session: &mut Session<'_, O>) {
    info!("shutting down");
    session
        .bridge
        .shutdown(Duration::from_millis(session.settings.audio.quit_fade_out_ms));
}

fn play(store: &mut PlayerStore, ctx: PlayContext) {
    store.play_track(ctx.track, Some(ctx.queue));
}

/// Start the selected track with the visible list when nothing is loaded yet.
fn start_or<O: AudioOutput>(session: &mut Session<'_, O>, otherwise: impl FnOnce(&mut PlayerStore)) {
    if session.store.state().current_track.is_some() {
        otherwise(session.store);
    } else if let Some(ctx) = session.app.visible_context() {
        play(session.store, ctx);
    }
}

/// Move the position by `seconds` of the current track.
fn seek_by<O: AudioOutput>(session: &mut Session<'_, O>, seconds: f64) {
    let state = session.store.state();
    let Some(track) = state.current_track.as_ref() else {
        return;
    };
    if track.duration_ms == 0 {
        debug!(track = %track.id, "cannot seek without a known duration");
        return;
    }
    let delta = seconds * 1000.0 / track.duration_ms as f64;
    let target = (state.progress + delta).clamp(0.0, 1.0);
    session.bridge.seek(session.store, target);
}

fn change_volume(store: &mut PlayerStore, delta: f64) {
    let volume = (store.state().volume + delta).clamp(0.0, 1.0);
    store.dispatch(PlayerCmd::SetVolume(volume));
}

fn handle_control_cmd<O: AudioOutput>(cmd: ControlCmd, session: &mut Session<'_, O>) -> bool {
    if !session.app.filter_mode {
        session.app.follow_playback_on();
    }

    match cmd {
        ControlCmd::Quit => return true,
        ControlCmd::Play => start_or(session, |s| s.dispatch(PlayerCmd::Resume)),
        ControlCmd::Pause => session.store.dispatch(PlayerCmd::Pause),
        ControlCmd::PlayPause => start_or(session, PlayerStore::toggle_play),
        ControlCmd::Stop => {
            session.store.dispatch(PlayerCmd::Pause);
            session.bridge.seek(session.store, 0.0);
        }
        ControlCmd::Next => session.store.dispatch(PlayerCmd::Next),
        ControlCmd::Prev => session.store.dispatch(PlayerCmd::Prev),
        ControlCmd::SetRepeat(mode) => startup::set_repeat(session.store, mode),
        ControlCmd::SetShuffle(on) => {
            if session.store.state().shuffle != on {
                session.store.dispatch(PlayerCmd::ToggleShuffle);
            }
        }
        ControlCmd::SetVolume(v) => session.store.dispatch(PlayerCmd::SetVolume(v)),
    }
    false
}

fn handle_filter_key<O: AudioOutput>(key: KeyEvent, session: &mut Session<'_, O>) {
    let app = &mut *session.app;
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Esc => app.clear_filter(),
        KeyCode::Backspace => app.pop_filter_char(),
        KeyCode::Char('j' | 'n') if ctrl => {
            app.follow_playback_off();
            app.next();
        }
        KeyCode::Char('k' | 'p') if ctrl => {
            app.follow_playback_off();
            app.prev();
        }
        KeyCode::Char(c) if !c.is_control() => app.push_filter_char(c),
        KeyCode::Enter => {
            let Some(ctx) = app.visible_context() else {
                return;
            };
            app.exit_filter_mode();
            app.follow_playback_on();
            play(session.store, ctx);
        }
        _ => {}
    }
}

fn handle_key_event<O: AudioOutput>(
    key: KeyEvent,
    session: &mut Session<'_, O>,
    state: &mut EventLoopState,
) -> bool {
    if session.app.filter_mode {
        state.clear_prefixes();
        handle_filter_key(key, session);
        return false;
    }

    let pending_gg = std::mem::take(&mut state.pending_gg);
    let pending_zz = std::mem::take(&mut state.pending_zz);
    let scrub = session.settings.controls.scrub_seconds as f64;
    let step = session.settings.controls.volume_step;

    match key.code {
        KeyCode::Char('q') => return true,
        KeyCode::Char('/') => session.app.enter_filter_mode(),
        KeyCode::Char('s') => session.store.dispatch(PlayerCmd::ToggleShuffle),
        KeyCode::Char('r') => session.store.dispatch(PlayerCmd::CycleRepeat),
        KeyCode::Char('z') => {
            if pending_zz {
                session.app.select_playing(session.store.state());
            } else {
                state.pending_zz = true;
            }
        }
        KeyCode::Char('g') => {
            if pending_gg {
                session.app.follow_playback_off();
                session.app.select_first();
            } else {
                state.pending_gg = true;
            }
        }
        KeyCode::Char('G') => {
            session.app.follow_playback_off();
            session.app.select_last();
        }
        KeyCode::Char('j') => {
            session.app.follow_playback_off();
            session.app.next();
        }
        KeyCode::Char('k') => {
            session.app.follow_playback_off();
            session.app.prev();
        }
        KeyCode::Enter => {
            let current = session.store.state().current_track.as_ref();
            let is_playing_selected = session.store.state().is_playing
                && current.is_some_and(|t| Some(&t.id) == session.app.selected_track().map(|s| &s.id));
            if !is_playing_selected {
                if let Some(ctx) = session.app.visible_context() {
                    session.app.follow_playback_on();
                    play(session.store, ctx);
                }
            }
        }
        KeyCode::Char('a') => {
            if let Some(ctx) = session.app.album_context() {
                session.app.follow_playback_on();
                play(session.store, ctx);
            }
        }
        KeyCode::Char('A') => {
            if let Some(ctx) = session.app.artist_context() {
                session.app.follow_playback_on();
                play(session.store, ctx);
            }
        }
        KeyCode::Char('P') => match session.app.playlist_context() {
            Some(ctx) => {
                session.app.follow_playback_on();
                play(session.store, ctx);
            }
            None => debug!("selected track is in no playlist"),
        },
        KeyCode::Char('Q') => {
            let queue = session.app.visible_tracks();
            if !queue.is_empty() {
                session.store.dispatch(PlayerCmd::SetQueue(queue));
            }
        }
        KeyCode::Char('p' | ' ') => {
            let _ = session.control_tx.send(ControlCmd::PlayPause);
        }
        KeyCode::Char('l') => {
            let _ = session.control_tx.send(ControlCmd::Next);
        }
        KeyCode::Char('h') => {
            let _ = session.control_tx.send(ControlCmd::Prev);
        }
        KeyCode::Char('L') => seek_by(session, scrub),
        KeyCode::Char('H') => seek_by(session, -scrub),
        KeyCode::Char('+' | '=') => change_volume(session.store, step),
        KeyCode::Char('-') => change_volume(session.store, -step),
        KeyCode::Char('m') => session.store.toggle_mute(),
        KeyCode::Char('K') => session.app.toggle_metadata_window(),
        _ => {}
    }

    false
}
