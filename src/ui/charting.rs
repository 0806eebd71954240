use typeheat::time_series::WpmSeries;

/// Upper X (seconds) and Y (wpm) bounds for the results chart
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartBounds {
    pub x_max: f64,
    pub y_max: f64,
}

/// Bounds for a finished session's wpm samples.
///
/// Without samples the session length stands in for the x range. The y
/// range is rounded up to the next ten so the top label stays readable.
pub fn chart_bounds(series: &WpmSeries, session_secs: f64) -> ChartBounds {
    let x_max = series
        .points()
        .last()
        .map_or(session_secs, |p| p.t)
        .max(1.0);
    let y_max = ((series.peak() / 10.0).ceil() * 10.0).max(10.0);

    ChartBounds { x_max, y_max }
}

/// Format a simple numeric label consistently
pub fn format_label(val: f64) -> String {
    if (val - val.round()).abs() < f64::EPSILON {
        format!("{}", val.round())
    } else {
        format!("{val:.2}")
    }
}
