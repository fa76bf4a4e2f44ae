use itertools::Itertools;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget, Wrap},
};
use time_humanize::{Accuracy, HumanTime, Tense};
use unicode_width::UnicodeWidthStr;

use crate::history::WorkoutRecord;
use crate::session::Phase;
use crate::util::format_time;
use crate::{App, Screen};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        match self.screen {
            Screen::Setup => render_setup(self, area, buf),
            Screen::Workout => render_workout(self, area, buf),
            Screen::Summary => render_summary(self, area, buf),
            Screen::History => render_history(self, area, buf),
        }
    }
}

fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

fn dim() -> Style {
    Style::default().add_modifier(Modifier::DIM)
}

fn legend() -> Style {
    Style::default().add_modifier(Modifier::ITALIC)
}

fn centered_lines(lines: Vec<Line>, area: Rect, buf: &mut Buffer) {
    let height = lines.len() as u16;
    let top = area.height.saturating_sub(height) / 2;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(top.saturating_sub(VERTICAL_MARGIN)),
            Constraint::Min(height),
        ])
        .split(area);

    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(chunks[1], buf);
}

fn render_setup(app: &App, area: Rect, buf: &mut Buffer) {
    let workout = app.engine.config();
    let settings = app.engine.settings();

    let lines = vec![
        Line::from(Span::styled("hitr", bold().fg(Color::Magenta))),
        Line::from(Span::styled("terminal boxing trainer", dim())),
        Line::from(""),
        Line::from(Span::raw(format!(
            "{} rounds x {}, {} break",
            workout.rounds,
            format_time(workout.round_length_secs),
            format_time(workout.break_length_secs),
        ))),
        Line::from(Span::raw(format!(
            "{} / {}",
            workout.workout_type, workout.difficulty
        ))),
        Line::from(Span::styled(
            format!(
                "music {} / voice {}",
                if settings.music { "on" } else { "off" },
                if settings.voice { "on" } else { "off" },
            ),
            dim(),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "(s)tart / (h)istory / (esc)ape",
            legend(),
        )),
    ];

    centered_lines(lines, area, buf);
}

fn phase_label(app: &App) -> String {
    let state = app.engine.state();
    let label = match state.phase {
        Phase::Countdown => "GET READY".to_string(),
        Phase::RoundActive => format!(
            "ROUND {} OF {}",
            state.current_round,
            app.engine.config().rounds
        ),
        Phase::Break => "BREAK".to_string(),
        Phase::Complete => "COMPLETE".to_string(),
        Phase::Idle => String::new(),
    };
    if state.is_paused {
        format!("{} - PAUSED", label)
    } else {
        label
    }
}

fn round_dots(app: &App) -> String {
    let state = app.engine.state();
    (1..=app.engine.config().rounds)
        .map(|r| {
            if r <= state.rounds_completed {
                "●"
            } else if r == state.current_round && state.phase != Phase::Idle {
                "◐"
            } else {
                "○"
            }
        })
        .join(" ")
}

fn render_workout(app: &App, area: Rect, buf: &mut Buffer) {
    let state = app.engine.state();

    let phase_style = match state.phase {
        Phase::Break => bold().fg(Color::Cyan),
        Phase::Countdown => bold().fg(Color::Yellow),
        _ => bold().fg(Color::Green),
    };

    let mut lines = vec![
        Line::from(Span::styled(phase_label(app), phase_style)),
        Line::from(Span::styled(
            format_time(state.time_remaining_secs),
            bold(),
        )),
        Line::from(Span::styled(round_dots(app), dim())),
        Line::from(""),
    ];

    if let Some(focus) = &app.dispatcher.ui.focus {
        lines.push(Line::from(Span::styled(focus.title.clone(), bold())));
        // Underline sized to the title so the card reads as a block
        lines.push(Line::from(Span::styled(
            "─".repeat(focus.title.width()),
            dim(),
        )));
        lines.push(Line::from(Span::raw(focus.instruction.clone())));
        lines.push(Line::from(""));
    }

    if let Some(coach) = app.dispatcher.voice.current_line() {
        lines.push(Line::from(Span::styled(
            coach.to_string(),
            Style::default().fg(Color::Yellow),
        )));
    } else {
        lines.push(Line::from(""));
    }

    if let Some(track) = app.dispatcher.audio.track_display() {
        lines.push(Line::from(Span::styled(format!("♪ {}", track), dim())));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "(p)ause / (e)nd / (esc)ape",
        legend(),
    )));

    centered_lines(lines, area, buf);
}

fn render_summary(app: &App, area: Rect, buf: &mut Buffer) {
    let Some(record) = &app.last_record else {
        centered_lines(
            vec![Line::from(Span::styled("No workout recorded", dim()))],
            area,
            buf,
        );
        return;
    };

    let lines = vec![
        Line::from(Span::styled("WORKOUT COMPLETE", bold().fg(Color::Green))),
        Line::from(""),
        Line::from(Span::raw(format!(
            "{} rounds of {} ({}% complete)",
            record.rounds_completed,
            record.rounds,
            record.completion_percentage,
        ))),
        Line::from(Span::raw(format!(
            "{} active / {} kcal",
            format_time(record.total_duration_seconds),
            record.calories_burned,
        ))),
        Line::from(Span::styled(
            format!("{} / {}", record.workout_type, record.difficulty),
            dim(),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "(r)estart / (h)istory / (esc)ape",
            legend(),
        )),
    ];

    centered_lines(lines, area, buf);
}

fn relative_age(record: &WorkoutRecord) -> String {
    let age = chrono::Local::now()
        .signed_duration_since(record.timestamp)
        .num_seconds()
        .max(0) as u64;
    HumanTime::from(std::time::Duration::from_secs(age))
        .to_text_en(Accuracy::Rough, Tense::Past)
}

fn render_history(app: &App, area: Rect, buf: &mut Buffer) {
    let mut lines = vec![Line::from(Span::styled("HISTORY", bold().fg(Color::Magenta)))];

    if app.records.is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "No workouts yet. Finish one and it shows up here.",
            dim(),
        )));
    } else {
        let totals = &app.totals;
        lines.push(Line::from(Span::raw(format!(
            "{} workouts / {} rounds / {} active / {} kcal",
            totals.workouts,
            totals.rounds_completed,
            format_time(totals.total_duration_seconds),
            totals.calories_burned,
        ))));

        let by_type = app
            .records
            .iter()
            .map(|r| r.workout_type.as_str())
            .counts();
        let breakdown = by_type
            .iter()
            .sorted_by_key(|(ty, _)| *ty)
            .map(|(ty, n)| format!("{} x{}", ty, n))
            .join("  ");
        lines.push(Line::from(Span::styled(breakdown, dim())));
        lines.push(Line::from(""));

        let visible = area.height.saturating_sub(10) as usize;
        for record in app.records.iter().take(visible.max(5)) {
            lines.push(Line::from(Span::raw(format!(
                "{}  {}/{} rounds  {}  {} kcal  {}",
                record.workout_type,
                record.rounds_completed,
                record.rounds,
                format_time(record.total_duration_seconds),
                record.calories_burned,
                relative_age(record),
            ))));
        }
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("(b)ack / (esc)ape", legend())));

    centered_lines(lines, area, buf);
}
