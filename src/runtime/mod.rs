use std::env;
use std::path::PathBuf;
use std::sync::mpsc;

use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::info;

use crate::app::App;
use crate::audio::{AudioBridge, RodioOutput};
use crate::catalog;
use crate::mpris::ControlCmd;
use crate::player::PlayerStore;

mod event_loop;
mod logging;
mod mpris_sync;
mod settings;
mod startup;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let (settings, config_problem) = settings::load_settings();
    let log_path = logging::init(&settings.log);
    settings::report(config_problem.as_deref());
    info!(log = ?log_path, "myndral starting");

    let path = match env::args_os().nth(1) {
        Some(arg) => PathBuf::from(arg),
        None => env::current_dir()?,
    };
    let catalog = catalog::load(&path, &settings.library)?;

    let (output, audio_rx) = RodioOutput::spawn(settings.audio.clone())?;
    let mut bridge = AudioBridge::new(output);

    let mut store = PlayerStore::new();
    startup::apply_playback_defaults(&mut store, &settings.playback);
    bridge.sync(store.state());

    let mut app = App::new(catalog);
    app.follow_playback = settings.ui.follow_playback;
    app.set_source(path.display().to_string());

    let (control_tx, control_rx) = mpsc::channel::<ControlCmd>();
    let mpris = mpris_sync::MprisSync::new(crate::mpris::spawn_mpris(control_tx.clone()), &mut store);

    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let run_result = {
        let mut session = event_loop::Session {
            settings: &settings,
            app: &mut app,
            store: &mut store,
            bridge: &mut bridge,
            mpris: &mpris,
            audio_rx: &audio_rx,
            control_tx: &control_tx,
            control_rx: &control_rx,
        };
        let mut state = event_loop::EventLoopState::default();
        event_loop::run(&mut terminal, &mut session, &mut state)
    };

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    run_result
}
