//! exauq-cli - Command-line front end for simulation job management
//!
//! Library half of the `exauq` binary: settings loading and backend
//! construction, kept here so they can be tested without running the CLI.

mod backend;
mod settings;

pub use backend::build_interface;
pub use settings::{
    BackendKind, ExauqSettings, HardwareSettings, HttpSettings, JobsSettings, LocalSettings,
    LogSettings, SlurmSettings, load_settings, load_settings_from_paths, settings_paths,
};

/// Parse `"1.0,2.5"` into coordinates.
pub fn parse_coordinates(text: &str) -> Result<Vec<f64>, String> {
    let text = text.trim();
    if text.is_empty() {
        return Err("expected comma-separated numbers, got nothing".to_string());
    }
    text.split(',')
        .map(|part| {
            let part = part.trim();
            part.parse::<f64>()
                .map_err(|_| format!("'{part}' is not a number"))
        })
        .collect()
}
