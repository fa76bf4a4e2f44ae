use serde::{Deserialize, Serialize};

/// Lifecycle phase of a workout session.
///
/// `Countdown` is the short lead-in before round 1. `Complete` is terminal
/// until `reset()` returns the session to `Idle`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display,
)]
pub enum Phase {
    Idle,
    Countdown,
    RoundActive,
    Break,
    Complete,
}

/// The authoritative mutable record of a workout session.
///
/// Owned and mutated exclusively by the transition engine; everything else
/// (UI, history recorder) sees read-only snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub phase: Phase,
    /// 1-based round counter; meaningful only outside `Idle`.
    pub current_round: u32,
    /// Seconds left in the current phase, counts down to 0.
    pub time_remaining_secs: u32,
    /// Total seconds spent in `RoundActive` or `Break`. Never decremented,
    /// frozen while paused, and never advanced during `Countdown`.
    pub elapsed_total_secs: u32,
    /// Rounds whose full length elapsed. The in-progress round is tracked
    /// separately via `rounds_attempted`.
    pub rounds_completed: u32,
    /// Highest round that entered `RoundActive`; equals `rounds_completed`
    /// unless a round is cut short.
    pub rounds_attempted: u32,
    pub is_paused: bool,
    /// Cursor into the workout type's focus-content list, `(round - 1) % len`.
    pub focus_index: usize,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            phase: Phase::Idle,
            current_round: 0,
            time_remaining_secs: 0,
            elapsed_total_secs: 0,
            rounds_completed: 0,
            rounds_attempted: 0,
            is_paused: false,
            focus_index: 0,
        }
    }
}

impl SessionState {
    /// True while the session is in a tick-driven phase.
    pub fn is_running(&self) -> bool {
        matches!(
            self.phase,
            Phase::Countdown | Phase::RoundActive | Phase::Break
        )
    }

    pub fn is_terminal(&self) -> bool {
        self.phase == Phase::Complete
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_state_is_idle() {
        let state = SessionState::default();
        assert_eq!(state.phase, Phase::Idle);
        assert_eq!(state.current_round, 0);
        assert_eq!(state.time_remaining_secs, 0);
        assert_eq!(state.elapsed_total_secs, 0);
        assert!(!state.is_paused);
        assert!(!state.is_running());
        assert!(!state.is_terminal());
    }

    #[test]
    fn running_phases() {
        let mut state = SessionState::default();
        for phase in [Phase::Countdown, Phase::RoundActive, Phase::Break] {
            state.phase = phase;
            assert!(state.is_running(), "{} should be running", phase);
        }
        state.phase = Phase::Complete;
        assert!(!state.is_running());
        assert!(state.is_terminal());
    }

    #[test]
    fn phase_display_names() {
        assert_eq!(Phase::RoundActive.to_string(), "RoundActive");
        assert_eq!(Phase::Idle.to_string(), "Idle");
    }
}
