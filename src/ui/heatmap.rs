use itertools::Itertools;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, Wrap},
    Frame,
};

use typeheat::heatmap::{display_key, ErrorAggregator, ErrorHeatmap, Trend, TrendReport};

const KEY_ROWS: [&str; 4] = ["1234567890-=", "qwertyuiop[]", "asdfghjkl;'", "zxcvbnm,./"];
const TOP_KEYS: usize = 8;

/// Background for a key given its share of the busiest key's errors
pub fn heat_color(count: u64, max: u64) -> Color {
    if count == 0 || max == 0 {
        return Color::Reset;
    }
    let level = count as f64 / max as f64;
    if level <= 0.25 {
        Color::Green
    } else if level <= 0.5 {
        Color::Yellow
    } else if level <= 0.75 {
        Color::LightRed
    } else {
        Color::Red
    }
}

fn key_cap(label: &str, count: u64, max: u64) -> Span<'static> {
    let bg = heat_color(count, max);
    let style = if bg == Color::Reset {
        Style::default().add_modifier(Modifier::DIM)
    } else {
        Style::default()
            .bg(bg)
            .fg(Color::Black)
            .add_modifier(Modifier::BOLD)
    };
    Span::styled(format!(" {label} "), style)
}

fn keyboard_lines(heatmap: &ErrorHeatmap) -> Vec<Line<'static>> {
    let max = heatmap.top_keys(1).first().map_or(0, |(_, n)| *n);

    let mut lines: Vec<Line> = KEY_ROWS
        .iter()
        .enumerate()
        .map(|(indent, row)| {
            let mut spans = vec![Span::raw(" ".repeat(indent * 2))];
            spans.extend(
                row.chars()
                    .map(|c| key_cap(&c.to_string(), heatmap.get(c), max)),
            );
            Line::from(spans)
        })
        .collect();

    lines.push(Line::from(vec![
        Span::raw(" ".repeat(10)),
        key_cap("     space     ", heatmap.get(' '), max),
        Span::raw(" "),
        key_cap("enter", heatmap.get('\n'), max),
    ]));
    lines
}

fn trend_text(report: &TrendReport, days: usize) -> String {
    match report.trend {
        _ if days < 2 => "not enough history for a trend yet".to_string(),
        Trend::Positive => format!("improving: errors down {}% over {days} days", report.percentage),
        Trend::Negative => format!("errors up {}% over {days} days", report.percentage),
        Trend::Neutral => format!("steady over {days} days"),
    }
}

fn trend_color(trend: Trend) -> Color {
    match trend {
        Trend::Positive => Color::Green,
        Trend::Negative => Color::Red,
        Trend::Neutral => Color::Gray,
    }
}

pub fn render_heatmap(aggregator: &ErrorAggregator, f: &mut Frame) {
    let area = f.area();
    let heatmap = aggregator.heatmap();
    let breakdown = aggregator.breakdown();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3), // title
            Constraint::Length(7), // keyboard
            Constraint::Min(8),    // breakdown + top keys
            Constraint::Length(1), // trend
            Constraint::Length(8), // insights
            Constraint::Length(1), // legend
        ])
        .split(area);

    let title = Paragraph::new(format!("{} errors recorded", heatmap.total()))
        .block(Block::default().borders(Borders::ALL).title("Error heatmap"))
        .style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .alignment(Alignment::Center);
    f.render_widget(title, chunks[0]);

    let keyboard = Paragraph::new(keyboard_lines(heatmap))
        .block(Block::default().borders(Borders::ALL).title("Keyboard"));
    f.render_widget(keyboard, chunks[1]);

    let middle = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(chunks[2]);

    let bucket_rows = breakdown
        .rows
        .iter()
        .map(|s| ("row", s.bucket.to_string(), s.count, s.percent))
        .chain(
            breakdown
                .hands
                .iter()
                .map(|s| ("hand", s.bucket.to_string(), s.count, s.percent)),
        )
        .chain(
            breakdown
                .fingers
                .iter()
                .filter(|s| s.count > 0)
                .map(|s| ("finger", s.bucket.to_string(), s.count, s.percent)),
        )
        .map(|(group, name, count, percent)| {
            Row::new(vec![
                Cell::from(group),
                Cell::from(name),
                Cell::from(count.to_string()),
                Cell::from(format!("{percent}%")),
            ])
        })
        .collect::<Vec<_>>();

    let table = Table::new(
        bucket_rows,
        [
            Constraint::Length(7),
            Constraint::Min(12),
            Constraint::Length(7),
            Constraint::Length(5),
        ],
    )
    .header(
        Row::new(vec!["", "bucket", "errors", "share"])
            .style(Style::default().add_modifier(Modifier::BOLD)),
    )
    .block(Block::default().borders(Borders::ALL).title("Breakdown"));
    f.render_widget(table, middle[0]);

    let top_keys = heatmap.top_keys(TOP_KEYS);
    let max = top_keys.first().map_or(0, |(_, n)| *n);
    let top_rows = top_keys
        .into_iter()
        .map(|(c, count)| {
            Row::new(vec![
                Cell::from(display_key(c)),
                Cell::from(count.to_string()).style(Style::default().fg(heat_color(count, max))),
            ])
        })
        .collect::<Vec<_>>();
    let top = Table::new(top_rows, [Constraint::Min(6), Constraint::Length(7)])
        .block(Block::default().borders(Borders::ALL).title("Most missed"));
    f.render_widget(top, middle[1]);

    let report = aggregator.trend();
    let trend = Paragraph::new(Span::styled(
        trend_text(&report, aggregator.history().len()),
        Style::default().fg(trend_color(report.trend)),
    ))
    .alignment(Alignment::Center);
    f.render_widget(trend, chunks[3]);

    let insight_lines = aggregator
        .insights()
        .into_iter()
        .map(|insight| {
            Line::from(vec![
                Span::styled(
                    format!("{}: ", insight.title),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                Span::raw(insight.message),
            ])
        })
        .collect::<Vec<_>>();
    let insights = Paragraph::new(insight_lines)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title("Insights"));
    f.render_widget(insights, chunks[4]);

    let legend = Paragraph::new(Span::styled(
        "(b)ack / (r)etry / (n)ew / (esc)ape",
        Style::default().add_modifier(Modifier::ITALIC),
    ));
    f.render_widget(legend, chunks[5]);
}

/// Plain-text report for `--heatmap`
pub fn text_report(aggregator: &ErrorAggregator) -> String {
    let heatmap = aggregator.heatmap();
    let mut lines = Vec::new();

    if heatmap.is_empty() {
        lines.push("No errors recorded yet.".to_string());
    } else {
        let breakdown = aggregator.breakdown();
        lines.push(format!("Error heatmap: {} errors", breakdown.total));
        lines.push(String::new());
        lines.push(format!(
            "Rows:     {}",
            breakdown
                .rows
                .iter()
                .map(|s| format!("{} {}%", s.bucket, s.percent))
                .join("  ")
        ));
        lines.push(format!(
            "Hands:    {}",
            breakdown
                .hands
                .iter()
                .map(|s| format!("{} {}%", s.bucket, s.percent))
                .join("  ")
        ));
        lines.push(format!(
            "Fingers:  {}",
            breakdown
                .fingers
                .iter()
                .filter(|s| s.count > 0)
                .map(|s| format!("{} {} ({}%)", s.bucket, s.count, s.percent))
                .join(", ")
        ));
        lines.push(format!(
            "Top keys: {}",
            heatmap
                .top_keys(TOP_KEYS)
                .into_iter()
                .map(|(c, n)| format!("'{}' {n}", display_key(c)))
                .join(", ")
        ));
    }

    lines.push(format!(
        "Trend:    {}",
        trend_text(&aggregator.trend(), aggregator.history().len())
    ));
    lines.push(String::new());
    lines.push("Insights:".to_string());
    lines.extend(
        aggregator
            .insights()
            .into_iter()
            .map(|i| format!("  - {}: {}", i.title, i.message)),
    );

    let mut report = lines.join("\n");
    report.push('\n');
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use ratatui::{backend::TestBackend, Terminal};
    use typeheat::heatmap::{ErrorHistory, ErrorHistoryEntry};

    fn aggregator() -> ErrorAggregator {
        let heatmap = ErrorHeatmap::from_counts([('q', 9), ('a', 2), (' ', 1)]);
        let history = ErrorHistory::from_entries(vec![
            ErrorHistoryEntry {
                date: NaiveDate::from_ymd_opt(2026, 10, 17).unwrap(),
                count: 10,
            },
            ErrorHistoryEntry {
                date: NaiveDate::from_ymd_opt(2026, 10, 19).unwrap(),
                count: 4,
            },
        ]);
        ErrorAggregator::new(heatmap, history)
    }

    #[test]
    fn test_heat_color_levels() {
        assert_eq!(heat_color(0, 10), Color::Reset);
        assert_eq!(heat_color(2, 10), Color::Green);
        assert_eq!(heat_color(5, 10), Color::Yellow);
        assert_eq!(heat_color(7, 10), Color::LightRed);
        assert_eq!(heat_color(10, 10), Color::Red);
    }

    #[test]
    fn test_text_report_sections() {
        let report = text_report(&aggregator());
        assert!(report.starts_with("Error heatmap: 12 errors"));
        assert!(report.contains("Top keys: 'q' 9, 'a' 2, 'space' 1"));
        assert!(report.contains("improving: errors down 60% over 2 days"));
        assert!(report.contains("Most missed key"));
    }

    #[test]
    fn test_text_report_empty() {
        let report = text_report(&ErrorAggregator::default());
        assert!(report.starts_with("No errors recorded yet."));
        assert!(report.contains("not enough history"));
        assert!(report.contains("Keep practising"));
    }

    #[test]
    fn test_render_heatmap() {
        let backend = TestBackend::new(100, 40);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal
            .draw(|f| render_heatmap(&aggregator(), f))
            .unwrap();

        let content: String = terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|c| c.symbol())
            .collect();
        assert!(content.contains("Error heatmap"));
        assert!(content.contains("12 errors recorded"));
        assert!(content.contains("Most missed"));
    }
}
