pub mod charting;
pub mod heatmap;
pub mod screen;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Clear, Dataset, GraphType, Paragraph, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;

use typeheat::{
    differ::CharState,
    scoring::{self, GradeCategory},
    session::{SessionPhase, SessionResult},
};

use crate::{App, AppState};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;

fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

fn dim_bold() -> Style {
    bold().add_modifier(Modifier::DIM)
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        match self.state {
            AppState::Results => render_results(self, area, buf),
            AppState::Typing | AppState::Heatmap => render_typing(self, area, buf),
        }
    }
}

/// Glyph shown for a target or typed character
fn visible(c: char, incorrect: bool) -> String {
    match c {
        '\n' => "⏎".to_owned(),
        '\t' => "→".to_owned(),
        ' ' if incorrect => "·".to_owned(),
        c => c.to_string(),
    }
}

/// The target text styled by character state, split at newlines
fn prompt_lines(app: &App) -> Vec<Line<'static>> {
    let green_bold = bold().fg(Color::Green);
    let red_bold = bold().fg(Color::Red);
    let current = dim_bold().add_modifier(Modifier::UNDERLINED);

    let controller = &app.controller;
    let typed = controller.typed();
    let mut lines = Vec::new();
    let mut spans = Vec::new();

    for (idx, (&expected, state)) in controller
        .target()
        .iter()
        .zip(controller.states())
        .enumerate()
    {
        let span = match state {
            CharState::Correct => Span::styled(visible(expected, false), green_bold),
            // what was actually typed, like a proofreading mark
            CharState::Incorrect => Span::styled(
                visible(typed.get(idx).copied().unwrap_or(expected), true),
                red_bold,
            ),
            CharState::Current => Span::styled(visible(expected, false), current),
            CharState::Neutral => Span::styled(visible(expected, false), dim_bold()),
        };
        spans.push(span);

        if expected == '\n' {
            lines.push(Line::from(std::mem::take(&mut spans)));
        }
    }
    lines.push(Line::from(spans));
    lines
}

/// Rows the prompt occupies once wrapped to `width`; newlines draw as one glyph
fn prompt_height(text: &str, width: u16) -> u16 {
    let width = usize::from(width.max(1));
    let lines: Vec<&str> = text.split('\n').collect();
    let last = lines.len().saturating_sub(1);
    let rows: usize = lines
        .iter()
        .enumerate()
        .map(|(idx, line)| {
            let glyphs = line.width() + usize::from(idx < last);
            glyphs.div_ceil(width).max(1)
        })
        .sum();
    u16::try_from(rows).unwrap_or(u16::MAX)
}

fn format_secs(secs: f64) -> String {
    format!("{secs:.1}")
}

fn status_line(app: &App) -> Line<'static> {
    let controller = &app.controller;
    if let Some(notice) = &app.notice {
        return Line::from(Span::styled(notice.clone(), bold().fg(Color::Red)));
    }

    match controller.phase() {
        SessionPhase::Idle => {
            let config = controller.config();
            let length = match config.duration {
                Some(d) => format!("{}s", d.as_secs()),
                None => "untimed".to_owned(),
            };
            Line::from(vec![
                Span::styled(config.difficulty.to_string(), bold().fg(Color::Cyan)),
                Span::styled(format!(" · {length}"), dim_bold()),
            ])
        }
        SessionPhase::Countdown => Line::from(Span::styled(
            format!("starting in {}", controller.countdown().unwrap_or(0)),
            bold().fg(Color::Yellow),
        )),
        SessionPhase::Running | SessionPhase::Paused => {
            let metrics = controller.live_metrics();
            let clock = match controller.remaining() {
                Some(remaining) => format_secs(remaining.as_secs_f64()),
                None => format_secs(controller.elapsed().as_secs_f64()),
            };
            Line::from(vec![
                Span::styled(clock, dim_bold()),
                Span::styled(
                    format!(
                        "   {} wpm   {}% acc",
                        metrics.reported_wpm(),
                        metrics.reported_accuracy()
                    ),
                    bold(),
                ),
            ])
        }
        SessionPhase::Complete => Line::default(),
    }
}

fn typing_legend(phase: SessionPhase) -> &'static str {
    match phase {
        SessionPhase::Idle => "(enter) start / (h)eatmap / (ctrl+r) new text / (esc)ape",
        SessionPhase::Countdown => "(ctrl+r) new text / (esc)ape",
        SessionPhase::Running => "(tab) pause / (ctrl+e) end / (ctrl+r) new text / (esc)ape",
        SessionPhase::Paused => "(tab) resume / (ctrl+e) end / (esc)ape",
        SessionPhase::Complete => "",
    }
}

fn render_typing(app: &App, area: Rect, buf: &mut Buffer) {
    let max_chars_per_line = area.width.saturating_sub(HORIZONTAL_MARGIN * 2);
    let lines = prompt_lines(app);
    let prompt_rows = prompt_height(&app.controller.target_text(), max_chars_per_line);
    let single_line = prompt_rows == 1;
    let padding = area.height.saturating_sub(prompt_rows.saturating_add(3)) / 2;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .constraints([
            Constraint::Length(padding),
            Constraint::Length(2),
            Constraint::Length(prompt_rows),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);

    Paragraph::new(status_line(app))
        .alignment(Alignment::Center)
        .render(chunks[1], buf);

    // when the prompt fits on one line centering it gives a calmer screen
    Paragraph::new(lines)
        .alignment(if single_line {
            Alignment::Center
        } else {
            Alignment::Left
        })
        .wrap(Wrap { trim: false })
        .render(chunks[2], buf);

    Paragraph::new(Span::styled(
        typing_legend(app.controller.phase()),
        Style::default().add_modifier(Modifier::ITALIC),
    ))
    .render(chunks[4], buf);

    if app.controller.phase() == SessionPhase::Paused {
        render_pause_overlay(chunks[2].union(chunks[1]), buf);
    }
}

fn render_pause_overlay(area: Rect, buf: &mut Buffer) {
    let width = 30.min(area.width);
    let height = 3.min(area.height);
    let overlay = Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    };

    Clear.render(overlay, buf);
    Paragraph::new(Span::styled("PAUSED", bold().fg(Color::Yellow)))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL))
        .render(overlay, buf);
}

pub fn grade_color(category: GradeCategory) -> Color {
    match category {
        GradeCategory::S => Color::Magenta,
        GradeCategory::A => Color::Green,
        GradeCategory::B => Color::Cyan,
        GradeCategory::C => Color::Yellow,
        GradeCategory::D => Color::LightRed,
        GradeCategory::F => Color::Red,
    }
}

fn best_line(app: &App, result: &SessionResult) -> String {
    let Some(comparison) = app.comparison else {
        return String::new();
    };
    match (comparison.is_new_best, comparison.previous_best_wpm) {
        (true, Some(previous)) => format!(
            "new personal best on {}! previous best {previous} wpm",
            result.difficulty
        ),
        (true, None) => format!("first {} result, a new personal best", result.difficulty),
        (false, Some(best)) => format!(
            "personal best {best} wpm on {} · this run ranks #{}",
            result.difficulty, comparison.rank
        ),
        (false, None) => String::new(),
    }
}

fn render_results(app: &App, area: Rect, buf: &mut Buffer) {
    let Some(result) = app.controller.result() else {
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Min(1),    // chart
            Constraint::Length(1), // stats
            Constraint::Length(1), // score
            Constraint::Length(1), // personal best
            Constraint::Length(1), // padding
            Constraint::Length(1), // legend
        ])
        .split(area);

    let samples = app.controller.samples();
    let bounds = charting::chart_bounds(samples, result.time);
    let tuples = samples.as_tuples();
    let datasets = vec![Dataset::default()
        .marker(Marker::Braille)
        .style(Style::default().fg(Color::Magenta))
        .graph_type(GraphType::Line)
        .data(&tuples)];

    Chart::new(datasets)
        .x_axis(
            Axis::default()
                .title("seconds")
                .bounds([1.0, bounds.x_max])
                .labels(vec![
                    Span::styled("1", bold()),
                    Span::styled(charting::format_label(bounds.x_max), bold()),
                ]),
        )
        .y_axis(
            Axis::default()
                .title("wpm")
                .bounds([0.0, bounds.y_max])
                .labels(vec![
                    Span::styled("0", bold()),
                    Span::styled(charting::format_label(bounds.y_max), bold()),
                ]),
        )
        .render(chunks[0], buf);

    Paragraph::new(Span::styled(
        format!(
            "{} wpm   {}% acc   {} cpm   {:.2} sd   {}s",
            result.wpm,
            result.accuracy,
            result.cpm,
            result.consistency,
            charting::format_label(result.time)
        ),
        bold(),
    ))
    .alignment(Alignment::Center)
    .render(chunks[1], buf);

    let score = scoring::score(result);
    let grade = scoring::grade(score);
    Paragraph::new(Line::from(vec![
        Span::styled(format!("score {score}   "), bold()),
        Span::styled(
            format!("grade {grade}"),
            bold().fg(grade_color(grade.category())),
        ),
    ]))
    .alignment(Alignment::Center)
    .render(chunks[2], buf);

    Paragraph::new(Span::styled(
        best_line(app, result),
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::ITALIC),
    ))
    .alignment(Alignment::Center)
    .render(chunks[3], buf);

    Paragraph::new(Span::styled(
        "(r)etry / (n)ew / (h)eatmap / (esc)ape",
        Style::default().add_modifier(Modifier::ITALIC),
    ))
    .render(chunks[5], buf);
}
