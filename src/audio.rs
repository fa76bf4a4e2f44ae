use rand::seq::SliceRandom;
use std::io::Write;

use crate::config::Difficulty;
use crate::effects::{CueKind, EffectError};

/// Background music category, matched to workout intensity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum MusicMood {
    Relaxed,
    Energetic,
    Intense,
}

/// Mood selection mirrors the difficulty scale.
pub fn mood_for(difficulty: Difficulty) -> MusicMood {
    match difficulty {
        Difficulty::Beginner => MusicMood::Relaxed,
        Difficulty::Advanced => MusicMood::Intense,
        Difficulty::Intermediate => MusicMood::Energetic,
    }
}

fn tracks_for(mood: MusicMood) -> &'static [&'static str] {
    match mood {
        MusicMood::Relaxed => &["Relaxed Beat 1", "Relaxed Beat 2"],
        MusicMood::Energetic => &["Energetic Beat 1", "Energetic Beat 2"],
        MusicMood::Intense => &["Intense Beat 1", "Intense Beat 2"],
    }
}

/// Black-box audio capability the dispatcher routes cues and music to.
pub trait AudioSink {
    fn play_cue(&mut self, kind: CueKind) -> Result<(), EffectError>;
    fn start_music(&mut self, mood: MusicMood) -> Result<(), EffectError>;
    fn pause_music(&mut self) -> Result<(), EffectError>;
    fn resume_music(&mut self) -> Result<(), EffectError>;
    fn stop_music(&mut self) -> Result<(), EffectError>;
}

/// Audio sink that does nothing; used in headless tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAudio;

impl AudioSink for NullAudio {
    fn play_cue(&mut self, _kind: CueKind) -> Result<(), EffectError> {
        Ok(())
    }
    fn start_music(&mut self, _mood: MusicMood) -> Result<(), EffectError> {
        Ok(())
    }
    fn pause_music(&mut self) -> Result<(), EffectError> {
        Ok(())
    }
    fn resume_music(&mut self) -> Result<(), EffectError> {
        Ok(())
    }
    fn stop_music(&mut self) -> Result<(), EffectError> {
        Ok(())
    }
}

#[derive(Debug, Clone)]
struct Track {
    title: String,
    paused: bool,
}

/// Terminal audio: BEL cues plus a simulated looping track whose title is
/// surfaced in the workout screen. Round boundaries get a double bell so
/// they stand out from countdown ticks.
#[derive(Debug, Default)]
pub struct TerminalAudio {
    track: Option<Track>,
}

impl TerminalAudio {
    pub fn new() -> Self {
        Self::default()
    }

    fn bell(times: u32) -> Result<(), EffectError> {
        let mut out = std::io::stdout();
        for _ in 0..times {
            out.write_all(b"\x07")?;
        }
        out.flush()?;
        Ok(())
    }

    /// Track line for the UI, e.g. `Energetic Beat 2 (paused)`.
    pub fn track_display(&self) -> Option<String> {
        self.track.as_ref().map(|t| {
            if t.paused {
                format!("{} (paused)", t.title)
            } else {
                t.title.clone()
            }
        })
    }
}

impl AudioSink for TerminalAudio {
    fn play_cue(&mut self, kind: CueKind) -> Result<(), EffectError> {
        match kind {
            CueKind::RoundStart | CueKind::RoundEnd | CueKind::Complete => Self::bell(2),
            _ => Self::bell(1),
        }
    }

    fn start_music(&mut self, mood: MusicMood) -> Result<(), EffectError> {
        let title = tracks_for(mood)
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or("Energetic Beat 1");
        self.track = Some(Track {
            title: title.to_string(),
            paused: false,
        });
        Ok(())
    }

    fn pause_music(&mut self) -> Result<(), EffectError> {
        if let Some(track) = self.track.as_mut() {
            track.paused = true;
        }
        Ok(())
    }

    fn resume_music(&mut self) -> Result<(), EffectError> {
        if let Some(track) = self.track.as_mut() {
            track.paused = false;
        }
        Ok(())
    }

    fn stop_music(&mut self) -> Result<(), EffectError> {
        self.track = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mood_follows_difficulty() {
        assert_eq!(mood_for(Difficulty::Beginner), MusicMood::Relaxed);
        assert_eq!(mood_for(Difficulty::Intermediate), MusicMood::Energetic);
        assert_eq!(mood_for(Difficulty::Advanced), MusicMood::Intense);
    }

    #[test]
    fn every_mood_has_tracks() {
        for mood in [MusicMood::Relaxed, MusicMood::Energetic, MusicMood::Intense] {
            assert!(!tracks_for(mood).is_empty());
        }
    }

    #[test]
    fn music_lifecycle_updates_track_display() {
        let mut audio = TerminalAudio::new();
        assert_eq!(audio.track_display(), None);

        audio.start_music(MusicMood::Intense).unwrap();
        let title = audio.track_display().unwrap();
        assert!(title.starts_with("Intense Beat"));

        audio.pause_music().unwrap();
        assert!(audio.track_display().unwrap().ends_with("(paused)"));

        audio.resume_music().unwrap();
        assert!(!audio.track_display().unwrap().ends_with("(paused)"));

        audio.stop_music().unwrap();
        assert_eq!(audio.track_display(), None);
    }

    #[test]
    fn pause_without_track_is_harmless() {
        let mut audio = TerminalAudio::new();
        audio.pause_music().unwrap();
        audio.resume_music().unwrap();
        assert_eq!(audio.track_display(), None);
    }

    #[test]
    fn mood_display_is_lowercase() {
        assert_eq!(MusicMood::Energetic.to_string(), "energetic");
    }
}
