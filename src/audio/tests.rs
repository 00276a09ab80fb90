use super::*;
use crate::catalog::{AlbumRef, ArtistRef, Track, TrackId};
use crate::player::{PlaybackController, PlayerCmd, PlayerStore};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Load(PathBuf),
    Unload,
    Playing(bool),
    Volume(f64),
    Seek(f64),
}

#[derive(Default)]
struct Recorder {
    calls: Vec<Call>,
}

impl AudioOutput for Recorder {
    fn load(&mut self, source: AudioSource, _serial: u64) {
        self.calls.push(Call::Load(source.path));
    }

    fn unload(&mut self) {
        self.calls.push(Call::Unload);
    }

    fn set_playing(&mut self, playing: bool) {
        self.calls.push(Call::Playing(playing));
    }

    fn set_volume(&mut self, volume: f64) {
        self.calls.push(Call::Volume(volume));
    }

    fn seek(&mut self, fraction: f64, _serial: u64) {
        self.calls.push(Call::Seek(fraction));
    }
}

fn track(id: &str, url: Option<&str>) -> Arc<Track> {
    Arc::new(Track {
        id: TrackId::from(id),
        title: id.to_string(),
        album: AlbumRef {
            id: "alb".into(),
            title: "Album".into(),
        },
        artist: ArtistRef {
            id: "art".into(),
            name: "Artist".into(),
        },
        track_number: 1,
        duration_ms: 180_000,
        audio_url: url.map(str::to_string),
        explicit: false,
        play_count: 0,
    })
}

fn queue() -> Vec<Arc<Track>> {
    vec![
        track("a", Some("file:///music/a.flac")),
        track("b", Some("/music/b.mp3")),
        track("c", Some("file:///music/c.ogg")),
    ]
}

fn store() -> PlayerStore {
    PlayerStore::with_controller(PlaybackController::with_rng(StdRng::seed_from_u64(3)))
}

/// Store playing the track at `idx` of `queue()`, with a bridge already in step.
fn playing_at(idx: usize) -> (PlayerStore, AudioBridge<Recorder>) {
    let q = queue();
    let mut store = store();
    store.play_track(q[idx].clone(), Some(q));
    let mut bridge = AudioBridge::new(Recorder::default());
    bridge.sync(store.state());
    (store, bridge)
}

/// Events as the output would tag them for what it is currently serving.
fn progress(bridge: &AudioBridge<Recorder>, fraction: f64) -> AudioEvent {
    AudioEvent::Progress {
        serial: bridge.serial(),
        fraction,
    }
}

fn ended(bridge: &AudioBridge<Recorder>) -> AudioEvent {
    AudioEvent::Ended {
        serial: bridge.serial(),
    }
}

fn calls_since(bridge: &AudioBridge<Recorder>, from: usize) -> Vec<Call> {
    bridge.output().calls[from..].to_vec()
}

#[test]
fn first_sync_loads_starts_and_sets_volume() {
    let (_, bridge) = playing_at(0);
    assert_eq!(
        bridge.output().calls,
        vec![
            Call::Load(PathBuf::from("/music/a.flac")),
            Call::Playing(true),
            Call::Volume(0.8),
        ]
    );
}

#[test]
fn sync_without_changes_is_silent() {
    let (store, mut bridge) = playing_at(0);
    let before = bridge.output().calls.len();
    bridge.sync(store.state());
    assert!(calls_since(&bridge, before).is_empty());
}

#[test]
fn pause_only_touches_transport() {
    let (mut store, mut bridge) = playing_at(0);
    let before = bridge.output().calls.len();

    store.dispatch(PlayerCmd::Pause);
    bridge.sync(store.state());

    assert_eq!(calls_since(&bridge, before), vec![Call::Playing(false)]);
}

#[test]
fn next_track_reloads_without_seeking() {
    let (mut store, mut bridge) = playing_at(0);
    let ev = progress(&bridge, 0.4);
    bridge.handle_event(ev, &mut store);
    let before = bridge.output().calls.len();

    store.dispatch(PlayerCmd::Next);
    bridge.sync(store.state());

    assert_eq!(
        calls_since(&bridge, before),
        vec![Call::Load(PathBuf::from("/music/b.mp3"))]
    );
}

#[test]
fn progress_events_update_store_without_seeking() {
    let (mut store, mut bridge) = playing_at(1);
    let before = bridge.output().calls.len();

    let ev = progress(&bridge, 0.3);
    bridge.handle_event(ev, &mut store);
    bridge.sync(store.state());

    assert_eq!(store.state().progress, 0.3);
    assert!(calls_since(&bridge, before).is_empty());
}

#[test]
fn prev_past_threshold_seeks_output_to_start() {
    let (mut store, mut bridge) = playing_at(1);
    let ev = progress(&bridge, 0.5);
    bridge.handle_event(ev, &mut store);
    let before = bridge.output().calls.len();

    store.dispatch(PlayerCmd::Prev);
    bridge.sync(store.state());

    assert_eq!(calls_since(&bridge, before), vec![Call::Seek(0.0)]);
    assert_eq!(store.state().current_track.as_ref().unwrap().id.0, "b");
}

#[test]
fn ended_at_queue_end_rewinds_and_stops() {
    let (mut store, mut bridge) = playing_at(2);
    let ev = progress(&bridge, 0.99);
    bridge.handle_event(ev, &mut store);
    let before = bridge.output().calls.len();

    let ev = ended(&bridge);
    bridge.handle_event(ev, &mut store);
    bridge.sync(store.state());

    assert!(!store.state().is_playing);
    assert_eq!(
        calls_since(&bridge, before),
        vec![Call::Seek(0.0), Call::Playing(false)]
    );
}

#[test]
fn ended_with_repeat_one_replays_same_source() {
    let (mut store, mut bridge) = playing_at(1);
    store.dispatch(PlayerCmd::CycleRepeat);
    store.dispatch(PlayerCmd::CycleRepeat);
    let ev = progress(&bridge, 1.0);
    bridge.handle_event(ev, &mut store);
    let before = bridge.output().calls.len();

    let ev = ended(&bridge);
    bridge.handle_event(ev, &mut store);
    bridge.sync(store.state());

    assert!(store.state().is_playing);
    assert_eq!(calls_since(&bridge, before), vec![Call::Seek(0.0)]);
}

#[test]
fn ended_with_repeat_all_wraps_to_head() {
    let (mut store, mut bridge) = playing_at(2);
    store.dispatch(PlayerCmd::CycleRepeat);
    let before = bridge.output().calls.len();

    let ev = ended(&bridge);
    bridge.handle_event(ev, &mut store);
    bridge.sync(store.state());

    assert_eq!(
        calls_since(&bridge, before),
        vec![Call::Load(PathBuf::from("/music/a.flac"))]
    );
}

#[test]
fn track_without_locator_unloads_output() {
    let (mut store, mut bridge) = playing_at(0);
    let before = bridge.output().calls.len();

    store.play_track(track("remote", Some("https://cdn.example/x.mp3")), None);
    bridge.sync(store.state());

    assert_eq!(calls_since(&bridge, before), vec![Call::Unload]);
}

#[test]
fn volume_change_is_forwarded_once() {
    let (mut store, mut bridge) = playing_at(0);
    let before = bridge.output().calls.len();

    store.toggle_mute();
    bridge.sync(store.state());
    bridge.sync(store.state());

    assert_eq!(calls_since(&bridge, before), vec![Call::Volume(0.0)]);
}

#[test]
fn user_seek_moves_output_and_store() {
    let (mut store, mut bridge) = playing_at(0);
    let before = bridge.output().calls.len();

    bridge.seek(&mut store, 0.25);
    bridge.sync(store.state());

    assert_eq!(store.state().progress, 0.25);
    assert_eq!(calls_since(&bridge, before), vec![Call::Seek(0.25)]);
}

#[test]
fn user_seek_without_loaded_track_is_ignored() {
    let mut store = store();
    let mut bridge = AudioBridge::new(Recorder::default());

    bridge.seek(&mut store, 0.5);

    assert!(bridge.output().calls.is_empty());
    assert_eq!(store.state().progress, 0.0);
}

#[test]
fn source_from_track_keeps_known_duration() {
    let t = track("a", Some("file:///music/a.flac"));
    let source = AudioSource::from_track(&t).unwrap();
    assert_eq!(source.path, PathBuf::from("/music/a.flac"));
    assert_eq!(source.duration, Some(std::time::Duration::from_secs(180)));

    assert!(AudioSource::from_track(&track("x", None)).is_none());
}

#[test]
fn ended_without_progress_restarts_repeat_one() {
    let (mut store, mut bridge) = playing_at(1);
    store.dispatch(PlayerCmd::CycleRepeat);
    store.dispatch(PlayerCmd::CycleRepeat);
    let before = bridge.output().calls.len();

    let ev = ended(&bridge);
    bridge.handle_event(ev, &mut store);
    bridge.sync(store.state());

    assert!(store.state().is_playing);
    assert_eq!(calls_since(&bridge, before), vec![Call::Seek(0.0)]);
}

#[test]
fn single_track_repeat_all_restarts_after_ended() {
    let only = track("solo", Some("/music/solo.wav"));
    let mut store = store();
    store.play_track(only.clone(), Some(vec![only]));
    store.dispatch(PlayerCmd::CycleRepeat);
    let mut bridge = AudioBridge::new(Recorder::default());
    bridge.sync(store.state());
    let before = bridge.output().calls.len();

    let ev = ended(&bridge);
    bridge.handle_event(ev, &mut store);
    bridge.sync(store.state());

    assert_eq!(calls_since(&bridge, before), vec![Call::Seek(0.0)]);

    // Back to normal once the restart went out.
    let before = bridge.output().calls.len();
    bridge.sync(store.state());
    assert!(calls_since(&bridge, before).is_empty());
}

#[test]
fn events_from_previous_source_are_dropped() {
    let (mut store, mut bridge) = playing_at(0);
    let ev = progress(&bridge, 0.99);
    bridge.handle_event(ev, &mut store);
    let queued_end = ended(&bridge);

    store.dispatch(PlayerCmd::Next);
    bridge.sync(store.state());
    assert_eq!(store.state().current_track.as_ref().unwrap().id.0, "b");

    bridge.handle_event(queued_end, &mut store);
    bridge.handle_event(
        AudioEvent::Progress {
            serial: queued_end.serial(),
            fraction: 0.97,
        },
        &mut store,
    );

    assert_eq!(store.state().current_track.as_ref().unwrap().id.0, "b");
    assert_eq!(store.state().progress, 0.0);
}

#[test]
fn progress_from_before_a_seek_is_dropped() {
    let (mut store, mut bridge) = playing_at(0);
    let stale = progress(&bridge, 0.8);

    bridge.seek(&mut store, 0.1);
    bridge.handle_event(stale, &mut store);

    assert_eq!(store.state().progress, 0.1);
    assert_ne!(stale.serial(), bridge.serial());
}
