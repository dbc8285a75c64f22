use directories::ProjectDirs;
use std::path::PathBuf;

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    /// History database under `$HOME/.local/state/cloze`, or the platform
    /// data dir when `HOME` is unset
    pub fn db_path() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            let state_dir = PathBuf::from(home)
                .join(".local")
                .join("state")
                .join("cloze");
            Some(state_dir.join("history.db"))
        } else {
            ProjectDirs::from("", "", "cloze")
                .map(|proj_dirs| proj_dirs.data_local_dir().join("history.db"))
        }
    }
}
