//! Standard locations for skiff state on disk.

use std::path::PathBuf;

/// Base directory for skiff state (`~/.skiff`).
pub fn base_dir() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".skiff"))
        .unwrap_or_else(|| PathBuf::from(".skiff"))
}

/// Path to the config file (`~/.skiff/config.json`).
pub fn config_path() -> PathBuf {
    base_dir().join("config.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_path_under_base_dir() {
        let path = config_path();
        assert!(path.starts_with(base_dir()));
        assert_eq!(path.file_name().unwrap(), "config.json");
    }
}
