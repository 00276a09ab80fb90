use tracing::warn;

use crate::config;

/// Load settings, falling back to defaults on any error.
///
/// Runs before logging exists, so problems go to stderr. `report` repeats
/// them into the log once the subscriber is installed.
pub fn load_settings() -> (config::Settings, Option<String>) {
    match config::Settings::load() {
        Ok(s) => match s.validate() {
            Ok(()) => (s, None),
            Err(msg) => {
                let msg = format!("invalid config, using defaults: {msg}");
                eprintln!("myndral: {msg}");
                (config::Settings::default(), Some(msg))
            }
        },
        Err(e) => {
            let msg = format!("failed to load config, using defaults: {e}");
            eprintln!("myndral: {msg}");
            (config::Settings::default(), Some(msg))
        }
    }
}

pub fn report(problem: Option<&str>) {
    if let Some(msg) = problem {
        warn!("{msg}");
    }
}
