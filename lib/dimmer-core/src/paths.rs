use std::path::PathBuf;

/// Base directory for Dimmer data files
fn data_dir() -> Option<PathBuf> {
    dirs::data_local_dir().map(|dir| dir.join("Dimmer"))
}

/// Base directory for Dimmer config files
fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("Dimmer"))
}

pub fn log_file_path() -> Option<PathBuf> {
    data_dir().map(|dir| dir.join("dimmer.log"))
}

pub fn default_config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.yaml"))
}

/// Creates the data directory if needed and returns it.
pub fn ensure_data_dir() -> Option<PathBuf> {
    data_dir().and_then(|dir| {
        std::fs::create_dir_all(&dir).ok()?;
        Some(dir)
    })
}
