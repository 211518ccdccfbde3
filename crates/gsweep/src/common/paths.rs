//! Path Utilities
//!
//! Resolution of the gsweep settings directory (`~/.gsweep/`).

use std::path::PathBuf;

/// Get the gsweep base directory (`~/.gsweep/`)
pub fn gsweep_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".gsweep"))
}

/// Get the optional JSON config file (`~/.gsweep/config.json`)
pub fn config_path() -> Option<PathBuf> {
    gsweep_dir().map(|dir| dir.join("config.json"))
}
