use std::collections::VecDeque;

use crate::content::{BuiltinContent, ContentProvider};
use crate::effects::{Announcement, EffectError};

/// Ticks an utterance stays on screen before the queue advances.
const DISPLAY_TICKS: u32 = 4;

/// Black-box voice capability. The sink owns its own queueing and must keep
/// at most one utterance in flight.
pub trait VoiceSink {
    fn announce(&mut self, line: &Announcement) -> Result<(), EffectError>;
}

/// Voice sink that swallows everything; used in headless tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullVoice;

impl VoiceSink for NullVoice {
    fn announce(&mut self, _line: &Announcement) -> Result<(), EffectError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Priority {
    Encouragement,
    Transition,
    Countdown,
}

/// Priority table for announcements. Countdown numbers preempt everything;
/// round/break transitions outrank encouragement. Adjust here rather than
/// scattering tie-breaks through the queue logic.
pub fn priority_of(line: &Announcement) -> Priority {
    match line {
        Announcement::CountdownNumber(_) => Priority::Countdown,
        Announcement::Encouragement { .. } => Priority::Encouragement,
        Announcement::GetReady
        | Announcement::RoundStart { .. }
        | Announcement::RoundEnd
        | Announcement::BreakEnd
        | Announcement::WorkoutComplete => Priority::Transition,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utterance {
    pub text: String,
    pub priority: Priority,
    ticks_left: u32,
}

/// Text-rendered coach voice for the terminal.
///
/// The "utterance in flight" is the line currently shown as the coach
/// message; it holds the screen for a few ticks, then the queue advances.
/// A higher-priority arrival preempts a lower-priority line in flight and
/// drops queued lower-priority lines.
pub struct CoachVoice {
    enabled: bool,
    countdown_enabled: bool,
    encouragement_enabled: bool,
    content: BuiltinContent,
    current: Option<Utterance>,
    queue: VecDeque<Utterance>,
}

impl CoachVoice {
    pub fn new(enabled: bool, countdown_enabled: bool, encouragement_enabled: bool) -> Self {
        Self {
            enabled,
            countdown_enabled,
            encouragement_enabled,
            content: BuiltinContent::new(),
            current: None,
            queue: VecDeque::new(),
        }
    }

    /// Advance the in-flight utterance by one tick.
    pub fn tick(&mut self) {
        if let Some(current) = self.current.as_mut() {
            current.ticks_left = current.ticks_left.saturating_sub(1);
            if current.ticks_left == 0 {
                self.current = self.queue.pop_front();
            }
        }
    }

    pub fn current_line(&self) -> Option<&str> {
        self.current.as_ref().map(|u| u.text.as_str())
    }

    pub fn clear(&mut self) {
        self.current = None;
        self.queue.clear();
    }

    fn render(&self, line: &Announcement) -> Option<String> {
        if !self.enabled {
            return None;
        }
        match line {
            Announcement::GetReady => Some("Get ready.".to_string()),
            Announcement::RoundStart {
                round,
                total,
                focus,
            } => Some(format!(
                "Round {} of {}. Focus on {}. {}",
                round, total, focus.title, focus.instruction
            )),
            Announcement::RoundEnd => Some("Round complete. Take a break.".to_string()),
            Announcement::BreakEnd => Some("Break over. Get ready.".to_string()),
            Announcement::CountdownNumber(n) => {
                if self.countdown_enabled {
                    Some(n.to_string())
                } else {
                    None
                }
            }
            Announcement::Encouragement { workout_type } => {
                if self.encouragement_enabled {
                    Some(self.content.encouragement(workout_type))
                } else {
                    None
                }
            }
            Announcement::WorkoutComplete => Some("Workout complete. Great job!".to_string()),
        }
    }
}

impl VoiceSink for CoachVoice {
    fn announce(&mut self, line: &Announcement) -> Result<(), EffectError> {
        let Some(text) = self.render(line) else {
            return Ok(());
        };
        let priority = priority_of(line);
        let ticks = match priority {
            // Countdown numbers replace each other every second
            Priority::Countdown => 1,
            _ => DISPLAY_TICKS,
        };
        let utterance = Utterance {
            text,
            priority,
            ticks_left: ticks,
        };

        self.queue.retain(|queued| queued.priority >= priority);

        match &self.current {
            Some(current) if current.priority > priority => {
                self.queue.push_back(utterance);
            }
            Some(current) if current.priority == priority => {
                // Same priority: newest transition/countdown wins the screen
                self.current = Some(utterance);
            }
            _ => {
                self.current = Some(utterance);
            }
        }
        Ok(())
    }
}
