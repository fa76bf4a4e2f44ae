use crate::app_dirs::AppDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Length of the get-ready lead-in before round 1, when enabled.
pub const COUNTDOWN_SECS: u32 = 5;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    clap::ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

impl Difficulty {
    /// Metabolic equivalent used for the calorie estimate. Boxing MET values
    /// range roughly 7-9 by intensity; these are estimates, not a match to
    /// any fitness authority.
    pub fn met(&self) -> u32 {
        match self {
            Difficulty::Beginner => 7,
            Difficulty::Intermediate => 8,
            Difficulty::Advanced => 9,
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "beginner" => Some(Difficulty::Beginner),
            "intermediate" => Some(Difficulty::Intermediate),
            "advanced" => Some(Difficulty::Advanced),
            _ => None,
        }
    }
}

/// Immutable workout parameters for one session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkoutConfig {
    pub rounds: u32,
    pub round_length_secs: u32,
    pub break_length_secs: u32,
    pub difficulty: Difficulty,
    /// Free-form category key (e.g. "punching", "footwork"). Unknown keys
    /// fall back to generic focus content.
    pub workout_type: String,
    /// Whether to run the get-ready countdown before round 1.
    pub countdown: bool,
}

impl Default for WorkoutConfig {
    fn default() -> Self {
        Self {
            rounds: 6,
            round_length_secs: 60,
            break_length_secs: 20,
            difficulty: Difficulty::Intermediate,
            workout_type: "punching".to_string(),
            countdown: true,
        }
    }
}

/// App-level toggles that survive across sessions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppSettings {
    pub music: bool,
    pub voice: bool,
    pub voice_countdown: bool,
    pub voice_encouragement: bool,
    /// Body weight for the calorie estimate.
    pub weight_kg: f64,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            music: true,
            voice: true,
            voice_countdown: true,
            voice_encouragement: true,
            weight_kg: 70.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Config {
    pub workout: WorkoutConfig,
    pub settings: AppSettings,
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = AppDirs::config_path().unwrap_or_else(|| PathBuf::from("hitr_config.json"));
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        if let Ok(bytes) = fs::read(&self.path) {
            if let Ok(cfg) = serde_json::from_slice::<Config>(&bytes) {
                return cfg;
            }
        }
        Config::default()
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg).unwrap_or_default();
        fs::write(&self.path, data)
    }
}
