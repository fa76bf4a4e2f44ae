use directories::ProjectDirs;
use std::path::PathBuf;

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    fn state_dir() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            Some(
                PathBuf::from(home)
                    .join(".local")
                    .join("state")
                    .join("hitr"),
            )
        } else {
            ProjectDirs::from("", "", "hitr").map(|pd| pd.data_local_dir().to_path_buf())
        }
    }

    pub fn db_path() -> Option<PathBuf> {
        Self::state_dir().map(|d| d.join("history.db"))
    }

    pub fn log_csv_path() -> Option<PathBuf> {
        Self::state_dir().map(|d| d.join("log.csv"))
    }

    pub fn trace_log_path() -> Option<PathBuf> {
        Self::state_dir().map(|d| d.join("hitr.log"))
    }

    pub fn config_path() -> Option<PathBuf> {
        if let Some(pd) = ProjectDirs::from("", "", "hitr") {
            Some(pd.config_dir().join("config.json"))
        } else {
            Self::state_dir().map(|d| d.join("config.json"))
        }
    }
}
