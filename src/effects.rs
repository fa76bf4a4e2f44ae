use thiserror::Error;
use tracing::warn;

use crate::audio::{AudioSink, MusicMood};
use crate::content::FocusContent;
use crate::session::SessionState;
use crate::voice::VoiceSink;

/// Short sound cues the audio sink can play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "camelCase")]
pub enum CueKind {
    Start,
    RoundStart,
    RoundEnd,
    Countdown,
    Pause,
    Resume,
    Complete,
}

/// Semantic voice lines; the sink owns phrasing and queueing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Announcement {
    GetReady,
    RoundStart {
        round: u32,
        total: u32,
        focus: FocusContent,
    },
    RoundEnd,
    BreakEnd,
    CountdownNumber(u32),
    Encouragement {
        workout_type: String,
    },
    WorkoutComplete,
}

/// One side effect produced by a state transition, dispatched in list order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    SelectFocus(FocusContent),
    PlayCue(CueKind),
    Announce(Announcement),
    StartMusic(MusicMood),
    PauseMusic,
    ResumeMusic,
    StopMusic,
    /// Emitted as the final effect of every transition into `Complete`;
    /// the scheduler must stop delivering ticks before any further input.
    CancelTimer,
}

#[derive(Debug, Error)]
pub enum EffectError {
    #[error("audio cue failed: {0}")]
    Audio(String),
    #[error("voice announcement failed: {0}")]
    Voice(String),
}

impl From<std::io::Error> for EffectError {
    fn from(e: std::io::Error) -> Self {
        EffectError::Audio(e.to_string())
    }
}

/// Receives a fresh state snapshot after every dispatched transition.
/// Push-only; the engine never queries it back.
pub trait UiObserver {
    fn on_state_change(&mut self, snapshot: &SessionState);
    fn on_focus_change(&mut self, _focus: &FocusContent) {}
}

/// Observer that ignores everything; used by headless tests and `--history`.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl UiObserver for NullObserver {
    fn on_state_change(&mut self, _snapshot: &SessionState) {}
}

#[derive(Debug, Clone, Copy, Default)]
#[must_use]
pub struct DispatchOutcome {
    /// True when the effect list contained `CancelTimer`; the caller must
    /// stop the tick source before processing the next event.
    pub timer_cancelled: bool,
}

/// Routes transition effects to the audio/voice sinks in order.
///
/// A failed sink call is logged and skipped; it never blocks the remaining
/// effects or rolls back the state transition. State stays the source of
/// truth regardless of presentation success.
pub struct Dispatcher<A: AudioSink, V: VoiceSink, U: UiObserver> {
    pub audio: A,
    pub voice: V,
    pub ui: U,
}

impl<A: AudioSink, V: VoiceSink, U: UiObserver> Dispatcher<A, V, U> {
    pub fn new(audio: A, voice: V, ui: U) -> Self {
        Self { audio, voice, ui }
    }

    pub fn dispatch(&mut self, effects: &[Effect], snapshot: &SessionState) -> DispatchOutcome {
        let mut outcome = DispatchOutcome::default();
        for effect in effects {
            if let Err(err) = self.apply(effect, &mut outcome) {
                warn!(%err, ?effect, "effect dispatch failed, skipping");
            }
        }
        self.ui.on_state_change(snapshot);
        outcome
    }

    fn apply(
        &mut self,
        effect: &Effect,
        outcome: &mut DispatchOutcome,
    ) -> Result<(), EffectError> {
        match effect {
            Effect::SelectFocus(focus) => {
                self.ui.on_focus_change(focus);
                Ok(())
            }
            Effect::PlayCue(kind) => self.audio.play_cue(*kind),
            Effect::Announce(line) => self.voice.announce(line),
            Effect::StartMusic(mood) => self.audio.start_music(*mood),
            Effect::PauseMusic => self.audio.pause_music(),
            Effect::ResumeMusic => self.audio.resume_music(),
            Effect::StopMusic => self.audio.stop_music(),
            Effect::CancelTimer => {
                outcome.timer_cancelled = true;
                Ok(())
            }
        }
    }
}
