//! MPRIS D-Bus service (`org.mpris.MediaPlayer2.myndral`).
//!
//! Runs on its own thread. Method calls and property writes become
//! `ControlCmd`s on a channel the event loop drains; property reads are
//! answered from a snapshot the runtime refreshes with `MprisHandle::sync`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, mpsc::Sender};

use async_io::{Timer, block_on};
use tracing::{error, info};
use zbus::{Connection, interface};
use zvariant::{ObjectPath, OwnedValue, Value};

use crate::player::{PlayerState, RepeatMode};

const BUS_NAME: &str = "org.mpris.MediaPlayer2.myndral";
const OBJECT_PATH: &str = "/org/mpris/MediaPlayer2";
const TRACK_PATH_PREFIX: &str = "/org/mpris/MediaPlayer2/track/";

#[derive(Clone, Debug, PartialEq)]
pub enum ControlCmd {
    Quit,
    Play,
    Pause,
    PlayPause,
    Stop,
    Next,
    Prev,
    SetRepeat(RepeatMode),
    SetShuffle(bool),
    SetVolume(f64),
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
enum PlaybackStatus {
    #[default]
    Stopped,
    Playing,
    Paused,
}

impl PlaybackStatus {
    fn of(state: &PlayerState) -> Self {
        match (&state.current_track, state.is_playing) {
            (None, _) => Self::Stopped,
            (Some(_), true) => Self::Playing,
            (Some(_), false) => Self::Paused,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Stopped => "Stopped",
            Self::Playing => "Playing",
            Self::Paused => "Paused",
        }
    }
}

fn loop_status(mode: RepeatMode) -> &'static str {
    match mode {
        RepeatMode::None => "None",
        RepeatMode::One => "Track",
        RepeatMode::All => "Playlist",
    }
}

fn parse_loop_status(s: &str) -> Option<RepeatMode> {
    match s {
        "None" => Some(RepeatMode::None),
        "Track" => Some(RepeatMode::One),
        "Playlist" => Some(RepeatMode::All),
        _ => None,
    }
}

/// MPRIS track object path for a catalog id.
///
/// Object path elements only allow `[A-Za-z0-9_]`, so anything else becomes `_`.
fn track_object_path(id: &str) -> Option<ObjectPath<'static>> {
    let mut element: String = id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    if element.is_empty() {
        element.push('_');
    }
    ObjectPath::try_from(format!("{TRACK_PATH_PREFIX}{element}")).ok()
}

#[derive(Debug, Default)]
struct SharedState {
    status: PlaybackStatus,
    title: Option<String>,
    artist: Vec<String>,
    album: Option<String>,
    url: Option<String>,
    length_micros: Option<i64>,
    track_id: Option<ObjectPath<'static>>,
    repeat: RepeatMode,
    shuffle: bool,
    volume: f64,
}

impl SharedState {
    fn update(&mut self, state: &PlayerState) {
        self.status = PlaybackStatus::of(state);
        self.repeat = state.repeat;
        self.shuffle = state.shuffle;
        self.volume = state.volume;

        let track = state.current_track.as_deref();
        self.title = track.map(|t| t.title.clone());
        self.artist = track
            .map(|t| vec![t.artist.name.clone()])
            .unwrap_or_default();
        self.album = track.map(|t| t.album.title.clone());
        self.url = track.and_then(|t| {
            t.local_path()
                .map(|p| format!("file://{}", p.display()))
                .or_else(|| t.audio_url.clone())
        });
        self.length_micros = track.and_then(|t| {
            t.duration()
                .map(|d| i64::try_from(d.as_micros()).unwrap_or(i64::MAX))
        });
        self.track_id = track.and_then(|t| track_object_path(&t.id.0));
    }
}

#[derive(Clone)]
pub struct MprisHandle {
    state: Arc<Mutex<SharedState>>,
}

impl MprisHandle {
    /// Refresh what MPRIS clients see from a player snapshot.
    pub fn sync(&self, state: &PlayerState) {
        if let Ok(mut s) = self.state.lock() {
            s.update(state);
        }
    }
}

struct RootIface {
    tx: Sender<ControlCmd>,
}

#[interface(name = "org.mpris.MediaPlayer2")]
impl RootIface {
    fn raise(&self) {}

    fn quit(&self) {
        let _ = self.tx.send(ControlCmd::Quit);
    }

    #[zbus(property)]
    fn can_quit(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_raise(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn has_track_list(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn identity(&self) -> &str {
        "myndral"
    }

    #[zbus(property)]
    fn supported_uri_schemes(&self) -> Vec<String> {
        vec!["file".to_string()]
    }

    #[zbus(property)]
    fn supported_mime_types(&self) -> Vec<String> {
        vec![]
    }
}

struct PlayerIface {
    tx: Sender<ControlCmd>,
    state: Arc<Mutex<SharedState>>,
}

impl PlayerIface {
    fn send(&self, cmd: ControlCmd) {
        let _ = self.tx.send(cmd);
    }

    fn read<T>(&self, f: impl FnOnce(&SharedState) -> T, fallback: T) -> T {
        self.state.lock().map(|s| f(&s)).unwrap_or(fallback)
    }
}

fn owned(value: Value<'_>) -> Option<OwnedValue> {
    OwnedValue::try_from(value).ok()
}

#[interface(name = "org.mpris.MediaPlayer2.Player")]
impl PlayerIface {
    fn next(&self) {
        self.send(ControlCmd::Next);
    }

    fn previous(&self) {
        self.send(ControlCmd::Prev);
    }

    fn play(&self) {
        self.send(ControlCmd::Play);
    }

    fn pause(&self) {
        self.send(ControlCmd::Pause);
    }

    fn play_pause(&self) {
        self.send(ControlCmd::PlayPause);
    }

    fn stop(&self) {
        self.send(ControlCmd::Stop);
    }

    #[zbus(property)]
    fn playback_status(&self) -> &str {
        self.read(|s| s.status.as_str(), PlaybackStatus::Stopped.as_str())
    }

    #[zbus(property)]
    fn loop_status(&self) -> &str {
        self.read(|s| loop_status(s.repeat), loop_status(RepeatMode::None))
    }

    #[zbus(property)]
    fn set_loop_status(&mut self, value: String) -> zbus::fdo::Result<()> {
        let mode = parse_loop_status(&value)
            .ok_or_else(|| zbus::fdo::Error::InvalidArgs(format!("unknown LoopStatus {value:?}")))?;
        self.send(ControlCmd::SetRepeat(mode));
        Ok(())
    }

    #[zbus(property)]
    fn shuffle(&self) -> bool {
        self.read(|s| s.shuffle, false)
    }

    #[zbus(property)]
    fn set_shuffle(&mut self, value: bool) {
        self.send(ControlCmd::SetShuffle(value));
    }

    #[zbus(property)]
    fn volume(&self) -> f64 {
        self.read(|s| s.volume, 0.0)
    }

    #[zbus(property)]
    fn set_volume(&mut self, value: f64) {
        self.send(ControlCmd::SetVolume(value.clamp(0.0, 1.0)));
    }

    #[zbus(property)]
    fn rate(&self) -> f64 {
        1.0
    }

    #[zbus(property)]
    fn can_control(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_play(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_pause(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_seek(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn can_go_next(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_go_previous(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn metadata(&self) -> HashMap<String, OwnedValue> {
        let Ok(s) = self.state.lock() else {
            return HashMap::new();
        };

        let mut map = HashMap::new();
        let mut put = |key: &str, value: Option<Value<'_>>| {
            if let Some(v) = value.and_then(owned) {
                map.insert(key.to_string(), v);
            }
        };
        put("mpris:trackid", s.track_id.clone().map(Value::from));
        put("mpris:length", s.length_micros.map(Value::from));
        put("xesam:title", s.title.clone().map(Value::from));
        put(
            "xesam:artist",
            (!s.artist.is_empty()).then(|| Value::from(s.artist.clone())),
        );
        put("xesam:album", s.album.clone().map(Value::from));
        put("xesam:url", s.url.clone().map(Value::from));
        map
    }
}

/// Start the MPRIS service. Failing to reach the session bus is logged and
/// leaves the player running without MPRIS.
pub fn spawn_mpris(tx: Sender<ControlCmd>) -> MprisHandle {
    let state = Arc::new(Mutex::new(SharedState::default()));

    let state_for_thread = state.clone();
    std::thread::spawn(move || {
        block_on(async move {
            let connection = match Connection::session().await {
                Ok(c) => c,
                Err(e) => {
                    error!(error = %e, "MPRIS: failed to connect to session bus");
                    return;
                }
            };

            if let Err(e) = connection.request_name(BUS_NAME).await {
                error!(error = %e, "MPRIS: failed to acquire name");
                return;
            }

            let object_server = connection.object_server();

            if let Err(e) = object_server
                .at(OBJECT_PATH, RootIface { tx: tx.clone() })
                .await
            {
                error!(error = %e, "MPRIS: failed to register root iface");
                return;
            }

            if let Err(e) = object_server
                .at(
                    OBJECT_PATH,
                    PlayerIface {
                        tx,
                        state: state_for_thread,
                    },
                )
                .await
            {
                error!(error = %e, "MPRIS: failed to register player iface");
                return;
            }
            info!(name = BUS_NAME, "MPRIS service registered");

            // Keep the service alive.
            loop {
                Timer::after(std::time::Duration::from_secs(3600)).await;
            }
        });
    });

    MprisHandle { state }
}
