use include_dir::{include_dir, Dir};
use rand::seq::SliceRandom;
use serde::Deserialize;
use serde_json::from_str;
use std::collections::HashMap;
use tracing::warn;

use crate::util::capitalize_first;

static CONTENT_DIR: Dir = include_dir!("src/content");

/// One per-round exercise focus shown and announced at round start.
#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct FocusContent {
    pub title: String,
    pub instruction: String,
}

#[derive(Deserialize, Debug)]
struct ContentFile {
    name: String,
    drills: Vec<FocusContent>,
}

#[derive(Deserialize, Debug)]
struct PhraseFile {
    encouragement: HashMap<String, Vec<String>>,
}

/// Substitute focus for workout types with no content list.
pub fn fallback_focus(workout_type: &str) -> FocusContent {
    FocusContent {
        title: format!("{} training", capitalize_first(workout_type)),
        instruction: "Focus on proper form".to_string(),
    }
}

/// Source of focus drills and encouragement phrases.
///
/// `focus` never fails: unknown or empty workout types get a generic
/// fallback so announcements always carry real text.
pub trait ContentProvider {
    fn focus(&self, workout_type: &str, round_index: usize) -> FocusContent;
    /// Number of drills for a type; 0 when the type is unknown.
    fn content_len(&self, workout_type: &str) -> usize;
    /// Random phrase for the type. Cosmetic only; never drives state.
    fn encouragement(&self, workout_type: &str) -> String;
}

/// Content embedded at compile time from `src/content/*.json`.
#[derive(Debug, Clone)]
pub struct BuiltinContent {
    drills: HashMap<String, Vec<FocusContent>>,
    encouragement: HashMap<String, Vec<String>>,
}

impl BuiltinContent {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let mut drills = HashMap::new();
        let mut encouragement = HashMap::new();

        for file in CONTENT_DIR.files() {
            let Some(name) = file.path().file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if !name.ends_with(".json") {
                continue;
            }
            let text = file
                .contents_utf8()
                .expect("Unable to interpret content file as a string");
            if name == "phrases.json" {
                let phrases: PhraseFile =
                    from_str(text).expect("Unable to deserialize phrase json");
                encouragement = phrases.encouragement;
            } else {
                let content: ContentFile =
                    from_str(text).expect("Unable to deserialize content json");
                drills.insert(content.name, content.drills);
            }
        }

        Self {
            drills,
            encouragement,
        }
    }
}

impl ContentProvider for BuiltinContent {
    fn focus(&self, workout_type: &str, round_index: usize) -> FocusContent {
        match self.drills.get(workout_type) {
            Some(list) if !list.is_empty() => list[round_index % list.len()].clone(),
            _ => {
                warn!(workout_type, "no focus content for type, using fallback");
                fallback_focus(workout_type)
            }
        }
    }

    fn content_len(&self, workout_type: &str) -> usize {
        self.drills.get(workout_type).map_or(0, |l| l.len())
    }

    fn encouragement(&self, workout_type: &str) -> String {
        let list = self
            .encouragement
            .get(workout_type)
            .filter(|l| !l.is_empty())
            .or_else(|| self.encouragement.get("generic"))
            .filter(|l| !l.is_empty());

        match list {
            Some(phrases) => phrases
                .choose(&mut rand::thread_rng())
                .cloned()
                .unwrap_or_else(|| "Keep going!".to_string()),
            None => "Keep going!".to_string(),
        }
    }
}
