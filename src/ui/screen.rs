use ratatui::Frame;

use crate::{ui::heatmap::render_heatmap, App, AppState};

/// A UI Screen boundary: responsible for rendering one app state
pub trait Screen {
    fn render(&self, app: &App, f: &mut Frame);
}

/// Typing screen, covering idle, countdown, running and paused
pub struct TypingScreen;

impl Screen for TypingScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        f.render_widget(app, f.area());
    }
}

pub struct ResultsScreen;

impl Screen for ResultsScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        f.render_widget(app, f.area());
    }
}

/// Long-term error heatmap and insights
pub struct HeatmapScreen;

impl Screen for HeatmapScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        render_heatmap(&app.aggregator, f);
    }
}

/// Helper to construct the appropriate screen for the current state
pub fn current_screen(state: AppState) -> Box<dyn Screen> {
    match state {
        AppState::Typing => Box::new(TypingScreen),
        AppState::Results => Box::new(ResultsScreen),
        AppState::Heatmap => Box::new(HeatmapScreen),
    }
}
