use std::env;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "config.txt";

/// Board and settings files live next to the executable; the current
/// directory is used when it already holds a settings file (running via
/// `cargo run` or from a checkout).
pub fn get_base_dir() -> PathBuf {
    let exe_dir = env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

    if exe_dir.join(CONFIG_FILE_NAME).exists() {
        return exe_dir;
    }

    if let Ok(cwd) = env::current_dir() {
        if cwd.join(CONFIG_FILE_NAME).exists() {
            return cwd;
        }
    }

    exe_dir
}

pub fn resolve_config_path(raw: Option<String>, base_dir: &Path) -> PathBuf {
    if let Some(path) = raw {
        let path = PathBuf::from(path);
        if path.is_absolute() {
            return path;
        }
        if let Ok(cwd) = env::current_dir() {
            return cwd.join(path);
        }
        return path;
    }

    base_dir.join(CONFIG_FILE_NAME)
}
