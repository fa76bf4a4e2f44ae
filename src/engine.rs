use thiserror::Error;

use crate::audio::mood_for;
use crate::config::{AppSettings, WorkoutConfig, COUNTDOWN_SECS};
use crate::content::{ContentProvider, FocusContent};
use crate::effects::{Announcement, CueKind, Effect};
use crate::session::{Phase, SessionState};

/// An operation was invoked in a phase that does not support it. This is a
/// lifecycle bug in the caller, not a recoverable condition; callers must
/// not retry blindly.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("invalid {op} while in phase {phase}")]
    InvalidTransition { op: &'static str, phase: Phase },
}

/// The sole authority over how `SessionState` evolves.
///
/// Each operation processes exactly one input to completion: it mutates the
/// state and returns the ordered side-effect list the caller must dispatch.
/// Announcements always follow their sound cue in that list so audio
/// layering stays deterministic. The engine never awaits effect completion.
pub struct Engine<C: ContentProvider> {
    config: WorkoutConfig,
    settings: AppSettings,
    content: C,
    state: SessionState,
}

impl<C: ContentProvider> Engine<C> {
    pub fn new(config: WorkoutConfig, settings: AppSettings, content: C) -> Self {
        Self {
            config,
            settings,
            content,
            state: SessionState::default(),
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn config(&self) -> &WorkoutConfig {
        &self.config
    }

    pub fn settings(&self) -> &AppSettings {
        &self.settings
    }

    /// Begin a session from `Idle`. Enters the get-ready countdown when the
    /// configuration asks for one, otherwise round 1 directly.
    pub fn start(&mut self) -> Result<Vec<Effect>, EngineError> {
        if self.state.phase != Phase::Idle {
            return Err(EngineError::InvalidTransition {
                op: "start",
                phase: self.state.phase,
            });
        }

        self.state = SessionState {
            current_round: 1,
            ..SessionState::default()
        };

        let mut effects = Vec::new();
        if self.config.countdown {
            self.state.phase = Phase::Countdown;
            self.state.time_remaining_secs = COUNTDOWN_SECS;
            let focus = self.select_focus();
            effects.push(Effect::SelectFocus(focus));
            if self.settings.music {
                effects.push(Effect::StartMusic(mood_for(self.config.difficulty)));
            }
            effects.push(Effect::PlayCue(CueKind::Start));
            effects.push(Effect::Announce(Announcement::GetReady));
        } else {
            if self.settings.music {
                effects.push(Effect::StartMusic(mood_for(self.config.difficulty)));
            }
            effects.extend(self.enter_round(false));
        }
        Ok(effects)
    }

    /// Advance the session by one second.
    ///
    /// Ticks keep arriving while paused (pausing does not stop the clock
    /// source) and are absorbed without touching state. A tick that drives
    /// the phase timer to exactly 0 performs the transition and emits the
    /// transition's effects; it never emits a "0" countdown cue.
    pub fn tick(&mut self) -> Result<Vec<Effect>, EngineError> {
        if !self.state.is_running() {
            return Err(EngineError::InvalidTransition {
                op: "tick",
                phase: self.state.phase,
            });
        }
        if self.state.is_paused {
            return Ok(Vec::new());
        }

        self.state.time_remaining_secs = self.state.time_remaining_secs.saturating_sub(1);
        if matches!(self.state.phase, Phase::RoundActive | Phase::Break) {
            self.state.elapsed_total_secs += 1;
        }

        if self.state.time_remaining_secs == 0 {
            return Ok(self.expire());
        }

        let mut effects = Vec::new();
        let remaining = self.state.time_remaining_secs;
        if remaining <= 3 {
            effects.push(Effect::PlayCue(CueKind::Countdown));
            effects.push(Effect::Announce(Announcement::CountdownNumber(remaining)));
        } else if self.state.phase == Phase::RoundActive {
            let elapsed_in_round = self.config.round_length_secs - remaining;
            if elapsed_in_round == self.config.round_length_secs / 2 {
                effects.push(Effect::Announce(Announcement::Encouragement {
                    workout_type: self.config.workout_type.clone(),
                }));
            }
        }
        Ok(effects)
    }

    /// Pause the clock. Idempotent: pausing an already-paused session
    /// changes nothing and emits nothing.
    pub fn pause(&mut self) -> Result<Vec<Effect>, EngineError> {
        if !self.state.is_running() {
            return Err(EngineError::InvalidTransition {
                op: "pause",
                phase: self.state.phase,
            });
        }
        if self.state.is_paused {
            return Ok(Vec::new());
        }
        self.state.is_paused = true;
        let mut effects = vec![Effect::PlayCue(CueKind::Pause)];
        if self.settings.music {
            effects.push(Effect::PauseMusic);
        }
        Ok(effects)
    }

    /// Resume the clock. Idempotent like `pause`.
    pub fn resume(&mut self) -> Result<Vec<Effect>, EngineError> {
        if !self.state.is_running() {
            return Err(EngineError::InvalidTransition {
                op: "resume",
                phase: self.state.phase,
            });
        }
        if !self.state.is_paused {
            return Ok(Vec::new());
        }
        self.state.is_paused = false;
        let mut effects = vec![Effect::PlayCue(CueKind::Resume)];
        if self.settings.music {
            effects.push(Effect::ResumeMusic);
        }
        Ok(effects)
    }

    /// Terminate the session from any running phase. No celebratory cue;
    /// the summary reflects only fully completed rounds, with the cut-short
    /// round visible via `rounds_attempted`.
    pub fn end_early(&mut self) -> Result<Vec<Effect>, EngineError> {
        if !self.state.is_running() {
            return Err(EngineError::InvalidTransition {
                op: "endEarly",
                phase: self.state.phase,
            });
        }
        Ok(self.complete(false))
    }

    /// Return from `Complete` to `Idle`, clearing all counters.
    pub fn reset(&mut self) -> Result<Vec<Effect>, EngineError> {
        if self.state.phase != Phase::Complete {
            return Err(EngineError::InvalidTransition {
                op: "reset",
                phase: self.state.phase,
            });
        }
        self.state = SessionState::default();
        Ok(Vec::new())
    }

    fn select_focus(&mut self) -> FocusContent {
        let len = self.content.content_len(&self.config.workout_type).max(1);
        self.state.focus_index = (self.state.current_round.max(1) as usize - 1) % len;
        self.content
            .focus(&self.config.workout_type, self.state.focus_index)
    }

    fn enter_round(&mut self, after_break: bool) -> Vec<Effect> {
        self.state.phase = Phase::RoundActive;
        self.state.time_remaining_secs = self.config.round_length_secs;
        self.state.rounds_attempted = self.state.current_round;
        let focus = self.select_focus();

        let mut effects = vec![
            Effect::SelectFocus(focus.clone()),
            Effect::PlayCue(CueKind::RoundStart),
        ];
        if after_break {
            effects.push(Effect::Announce(Announcement::BreakEnd));
        }
        effects.push(Effect::Announce(Announcement::RoundStart {
            round: self.state.current_round,
            total: self.config.rounds,
            focus,
        }));
        effects
    }

    fn expire(&mut self) -> Vec<Effect> {
        match self.state.phase {
            Phase::Countdown => self.enter_round(false),
            Phase::RoundActive => {
                self.state.rounds_completed += 1;
                if self.state.current_round >= self.config.rounds {
                    self.complete(true)
                } else {
                    self.state.phase = Phase::Break;
                    self.state.time_remaining_secs = self.config.break_length_secs;
                    vec![
                        Effect::PlayCue(CueKind::RoundEnd),
                        Effect::Announce(Announcement::RoundEnd),
                    ]
                }
            }
            Phase::Break => {
                self.state.current_round += 1;
                self.enter_round(true)
            }
            // expire is only reachable from running phases via tick
            phase => unreachable!("phase {} cannot expire", phase),
        }
    }

    fn complete(&mut self, celebrate: bool) -> Vec<Effect> {
        self.state.phase = Phase::Complete;
        self.state.is_paused = false;
        self.state.time_remaining_secs = 0;

        let mut effects = Vec::new();
        if celebrate {
            effects.push(Effect::PlayCue(CueKind::Complete));
            effects.push(Effect::Announce(Announcement::WorkoutComplete));
        }
        if self.settings.music {
            effects.push(Effect::StopMusic);
        }
        effects.push(Effect::CancelTimer);
        effects
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Difficulty;
    use crate::content::BuiltinContent;
    use assert_matches::assert_matches;

    fn config(rounds: u32, round_len: u32, break_len: u32, countdown: bool) -> WorkoutConfig {
        WorkoutConfig {
            rounds,
            round_length_secs: round_len,
            break_length_secs: break_len,
            difficulty: Difficulty::Intermediate,
            workout_type: "punching".to_string(),
            countdown,
        }
    }

    fn quiet_settings() -> AppSettings {
        AppSettings {
            music: false,
            ..AppSettings::default()
        }
    }

    fn engine(rounds: u32, round_len: u32, break_len: u32, countdown: bool) -> Engine<BuiltinContent> {
        Engine::new(
            config(rounds, round_len, break_len, countdown),
            quiet_settings(),
            BuiltinContent::new(),
        )
    }

    fn tick_n(e: &mut Engine<BuiltinContent>, n: u32) {
        for _ in 0..n {
            e.tick().unwrap();
        }
    }

    #[test]
    fn start_without_countdown_enters_round_one() {
        let mut e = engine(3, 60, 20, false);
        let effects = e.start().unwrap();

        assert_eq!(e.state().phase, Phase::RoundActive);
        assert_eq!(e.state().current_round, 1);
        assert_eq!(e.state().time_remaining_secs, 60);
        assert_eq!(e.state().focus_index, 0);

        // Ordered: focus selection, then cue, then announcement
        assert_matches!(effects[0], Effect::SelectFocus(_));
        assert_matches!(effects[1], Effect::PlayCue(CueKind::RoundStart));
        assert_matches!(
            effects[2],
            Effect::Announce(Announcement::RoundStart { round: 1, total: 3, .. })
        );
    }

    #[test]
    fn start_with_countdown_enters_lead_in() {
        let mut e = engine(3, 60, 20, true);
        let effects = e.start().unwrap();

        assert_eq!(e.state().phase, Phase::Countdown);
        assert_eq!(e.state().time_remaining_secs, COUNTDOWN_SECS);
        assert_matches!(effects[0], Effect::SelectFocus(_));
        assert_matches!(effects[1], Effect::PlayCue(CueKind::Start));
        assert_matches!(effects[2], Effect::Announce(Announcement::GetReady));
    }

    #[test]
    fn countdown_ticks_do_not_accrue_elapsed_time() {
        let mut e = engine(3, 60, 20, true);
        e.start().unwrap();
        tick_n(&mut e, COUNTDOWN_SECS - 1);
        assert_eq!(e.state().phase, Phase::Countdown);
        assert_eq!(e.state().elapsed_total_secs, 0);

        e.tick().unwrap();
        assert_eq!(e.state().phase, Phase::RoundActive);
        assert_eq!(e.state().elapsed_total_secs, 0);
    }

    #[test]
    fn countdown_cues_fire_for_final_three_seconds() {
        let mut e = engine(3, 60, 20, true);
        e.start().unwrap();

        // 5 -> 4: nothing yet
        assert!(e.tick().unwrap().is_empty());
        for expected in [3u32, 2, 1] {
            let effects = e.tick().unwrap();
            assert_eq!(effects[0], Effect::PlayCue(CueKind::Countdown));
            assert_eq!(
                effects[1],
                Effect::Announce(Announcement::CountdownNumber(expected))
            );
        }
    }

    #[test]
    fn expiry_tick_performs_transition_without_zero_countdown() {
        let mut e = engine(3, 60, 20, true);
        e.start().unwrap();
        tick_n(&mut e, COUNTDOWN_SECS - 1);

        let effects = e.tick().unwrap();
        assert_eq!(e.state().phase, Phase::RoundActive);
        assert!(!effects
            .iter()
            .any(|eff| matches!(eff, Effect::Announce(Announcement::CountdownNumber(_)))));
        assert!(effects
            .iter()
            .any(|eff| matches!(eff, Effect::PlayCue(CueKind::RoundStart))));
    }

    // Scenario A: rounds=3, round=60s, break=20s, no countdown.
    #[test]
    fn round_break_round_progression() {
        let mut e = engine(3, 60, 20, false);
        e.start().unwrap();
        assert_eq!(e.state().phase, Phase::RoundActive);
        assert_eq!(e.state().current_round, 1);
        assert_eq!(e.state().time_remaining_secs, 60);

        tick_n(&mut e, 60);
        assert_eq!(e.state().phase, Phase::Break);
        assert_eq!(e.state().current_round, 1);
        assert_eq!(e.state().time_remaining_secs, 20);
        assert_eq!(e.state().rounds_completed, 1);

        tick_n(&mut e, 20);
        assert_eq!(e.state().phase, Phase::RoundActive);
        assert_eq!(e.state().current_round, 2);
        assert_eq!(e.state().time_remaining_secs, 60);
        assert_eq!(e.state().focus_index, 1);
    }

    // Scenario B: the last round completes the workout with no trailing break.
    #[test]
    fn final_round_expiry_completes_workout() {
        let mut e = engine(3, 60, 20, false);
        e.start().unwrap();
        tick_n(&mut e, 60 + 20 + 60 + 20 + 59);
        assert_eq!(e.state().phase, Phase::RoundActive);
        assert_eq!(e.state().current_round, 3);

        let effects = e.tick().unwrap();
        assert_eq!(e.state().phase, Phase::Complete);
        assert_eq!(e.state().rounds_completed, 3);
        assert_eq!(e.state().elapsed_total_secs, 3 * 60 + 2 * 20);
        assert_matches!(effects[0], Effect::PlayCue(CueKind::Complete));
        assert_matches!(effects[1], Effect::Announce(Announcement::WorkoutComplete));
        assert_eq!(effects.last(), Some(&Effect::CancelTimer));
    }

    // Scenario C: pausing freezes both clocks exactly.
    #[test]
    fn paused_ticks_change_nothing() {
        let mut e = engine(3, 60, 20, false);
        e.start().unwrap();
        tick_n(&mut e, 10);
        assert_eq!(e.state().time_remaining_secs, 50);
        assert_eq!(e.state().elapsed_total_secs, 10);

        e.pause().unwrap();
        tick_n(&mut e, 5);
        assert_eq!(e.state().time_remaining_secs, 50);
        assert_eq!(e.state().elapsed_total_secs, 10);

        e.resume().unwrap();
        e.tick().unwrap();
        assert_eq!(e.state().time_remaining_secs, 49);
        assert_eq!(e.state().elapsed_total_secs, 11);
    }

    #[test]
    fn pause_is_idempotent() {
        let mut e = engine(3, 60, 20, false);
        e.start().unwrap();

        let first = e.pause().unwrap();
        assert!(!first.is_empty());
        let state_after_first = e.state().clone();

        let second = e.pause().unwrap();
        assert!(second.is_empty());
        assert_eq!(e.state(), &state_after_first);
    }

    #[test]
    fn resume_when_not_paused_is_a_no_op() {
        let mut e = engine(3, 60, 20, false);
        e.start().unwrap();
        assert!(e.resume().unwrap().is_empty());
        assert!(!e.state().is_paused);
    }

    // Scenario D: ending during round 2 of 5 counts one completed round and
    // two attempted, with real elapsed time.
    #[test]
    fn end_early_mid_round_keeps_partial_round_separate() {
        let mut e = engine(5, 60, 20, false);
        e.start().unwrap();
        tick_n(&mut e, 60 + 20 + 30);
        assert_eq!(e.state().current_round, 2);
        assert_eq!(e.state().time_remaining_secs, 30);

        let effects = e.end_early().unwrap();
        assert_eq!(e.state().phase, Phase::Complete);
        assert_eq!(e.state().rounds_completed, 1);
        assert_eq!(e.state().rounds_attempted, 2);
        assert_eq!(e.state().elapsed_total_secs, 110);
        assert_eq!(effects.last(), Some(&Effect::CancelTimer));
        assert!(!effects
            .iter()
            .any(|eff| matches!(eff, Effect::PlayCue(CueKind::Complete))));
    }

    #[test]
    fn end_early_during_break_counts_the_finished_round() {
        let mut e = engine(5, 60, 20, false);
        e.start().unwrap();
        tick_n(&mut e, 60 + 5);
        assert_eq!(e.state().phase, Phase::Break);

        e.end_early().unwrap();
        assert_eq!(e.state().rounds_completed, 1);
        assert_eq!(e.state().rounds_attempted, 1);
    }

    #[test]
    fn end_early_while_paused_still_terminates() {
        let mut e = engine(3, 60, 20, false);
        e.start().unwrap();
        tick_n(&mut e, 10);
        e.pause().unwrap();

        e.end_early().unwrap();
        assert_eq!(e.state().phase, Phase::Complete);
        assert!(!e.state().is_paused);
    }

    // Scenario E: unknown workout type announces the fallback focus.
    #[test]
    fn unknown_workout_type_announces_fallback_focus() {
        let mut e = Engine::new(
            WorkoutConfig {
                workout_type: "yoga".to_string(),
                countdown: false,
                ..config(3, 60, 20, false)
            },
            quiet_settings(),
            BuiltinContent::new(),
        );
        let effects = e.start().unwrap();
        let announced = effects.iter().find_map(|eff| match eff {
            Effect::Announce(Announcement::RoundStart { focus, .. }) => Some(focus.clone()),
            _ => None,
        });
        let focus = announced.expect("round start announcement missing");
        assert_eq!(focus.title, "Yoga training");
        assert!(!focus.instruction.is_empty());
    }

    #[test]
    fn focus_rotation_is_deterministic_by_round() {
        fn trace() -> (Vec<usize>, Vec<Phase>) {
            let mut e = engine(10, 5, 2, false);
            e.start().unwrap();
            let mut indices = vec![e.state().focus_index];
            let mut phases = vec![e.state().phase];
            while e.state().is_running() {
                e.tick().unwrap();
                indices.push(e.state().focus_index);
                phases.push(e.state().phase);
            }
            (indices, phases)
        }
        assert_eq!(trace(), trace());
    }

    #[test]
    fn focus_index_wraps_past_content_length() {
        let content = BuiltinContent::new();
        let len = content.content_len("punching");
        let rounds = len as u32 + 2;
        let mut e = engine(rounds, 4, 2, false);
        e.start().unwrap();
        // Drive to the last round: each full round+break is 6 ticks
        tick_n(&mut e, (rounds - 1) * 6);
        assert_eq!(e.state().current_round, rounds);
        assert_eq!(e.state().focus_index, (rounds as usize - 1) % len);
    }

    #[test]
    fn encouragement_fires_once_at_round_halfway() {
        let mut e = engine(1, 60, 20, false);
        e.start().unwrap();
        let mut encouragements = 0;
        for _ in 0..60 {
            let effects = e.tick().unwrap();
            encouragements += effects
                .iter()
                .filter(|eff| matches!(eff, Effect::Announce(Announcement::Encouragement { .. })))
                .count();
        }
        assert_eq!(encouragements, 1);
    }

    #[test]
    fn elapsed_time_is_monotonic() {
        let mut e = engine(2, 10, 5, true);
        e.start().unwrap();
        let mut last = 0;
        while e.state().is_running() {
            e.tick().unwrap();
            assert!(e.state().elapsed_total_secs >= last);
            assert!(e.state().current_round <= 2);
            last = e.state().elapsed_total_secs;
        }
        assert_eq!(last, 2 * 10 + 5);
    }

    #[test]
    fn music_effects_follow_the_session_lifecycle() {
        let mut e = Engine::new(
            config(1, 10, 5, false),
            AppSettings::default(), // music on
            BuiltinContent::new(),
        );
        let started = e.start().unwrap();
        assert!(started
            .iter()
            .any(|eff| matches!(eff, Effect::StartMusic(_))));

        assert!(e.pause().unwrap().contains(&Effect::PauseMusic));
        assert!(e.resume().unwrap().contains(&Effect::ResumeMusic));

        tick_n(&mut e, 10);
        assert_eq!(e.state().phase, Phase::Complete);
    }

    #[test]
    fn music_disabled_emits_no_music_effects() {
        let mut e = engine(1, 10, 5, false);
        let started = e.start().unwrap();
        assert!(!started
            .iter()
            .any(|eff| matches!(
                eff,
                Effect::StartMusic(_) | Effect::PauseMusic | Effect::ResumeMusic | Effect::StopMusic
            )));
        assert!(!e.pause().unwrap().contains(&Effect::PauseMusic));
    }

    #[test]
    fn invalid_transitions_are_rejected() {
        let mut e = engine(3, 60, 20, false);

        assert_matches!(
            e.tick(),
            Err(EngineError::InvalidTransition { op: "tick", phase: Phase::Idle })
        );
        assert_matches!(
            e.pause(),
            Err(EngineError::InvalidTransition { op: "pause", .. })
        );
        assert_matches!(
            e.reset(),
            Err(EngineError::InvalidTransition { op: "reset", .. })
        );

        e.start().unwrap();
        assert_matches!(
            e.start(),
            Err(EngineError::InvalidTransition { op: "start", phase: Phase::RoundActive })
        );

        e.end_early().unwrap();
        assert_matches!(
            e.tick(),
            Err(EngineError::InvalidTransition { op: "tick", phase: Phase::Complete })
        );
        assert_matches!(
            e.end_early(),
            Err(EngineError::InvalidTransition { op: "endEarly", .. })
        );
    }

    #[test]
    fn reset_returns_to_idle_and_allows_restart() {
        let mut e = engine(1, 5, 2, false);
        e.start().unwrap();
        tick_n(&mut e, 5);
        assert_eq!(e.state().phase, Phase::Complete);

        e.reset().unwrap();
        assert_eq!(e.state(), &SessionState::default());

        e.start().unwrap();
        assert_eq!(e.state().phase, Phase::RoundActive);
        assert_eq!(e.state().elapsed_total_secs, 0);
    }

    #[test]
    fn error_message_names_operation_and_phase() {
        let err = EngineError::InvalidTransition {
            op: "tick",
            phase: Phase::Idle,
        };
        assert_eq!(err.to_string(), "invalid tick while in phase Idle");
    }
}
