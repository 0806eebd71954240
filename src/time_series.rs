#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeSeriesPoint {
    /// seconds of running time
    pub t: f64,
    pub wpm: f64,
}

impl TimeSeriesPoint {
    pub fn new(t: f64, wpm: f64) -> Self {
        Self { t, wpm }
    }
}

impl From<TimeSeriesPoint> for (f64, f64) {
    fn from(p: TimeSeriesPoint) -> Self {
        (p.t, p.wpm)
    }
}

/// Live wpm samples taken once per running second
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WpmSeries {
    points: Vec<TimeSeriesPoint>,
}

impl WpmSeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, t: f64, wpm: f64) {
        self.points.push(TimeSeriesPoint::new(t, wpm));
    }

    pub fn points(&self) -> &[TimeSeriesPoint] {
        &self.points
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn peak(&self) -> f64 {
        self.points.iter().map(|p| p.wpm).fold(0.0, f64::max)
    }

    /// Population standard deviation of the samples; zero below two samples
    pub fn consistency(&self) -> f64 {
        if self.points.len() < 2 {
            return 0.0;
        }
        let wpms: Vec<f64> = self.points.iter().map(|p| p.wpm).collect();
        std_dev(&wpms).unwrap_or(0.0)
    }

    pub fn as_tuples(&self) -> Vec<(f64, f64)> {
        self.points.iter().copied().map(Into::into).collect()
    }
}

pub fn mean(data: &[f64]) -> Option<f64> {
    if data.is_empty() {
        return None;
    }
    Some(data.iter().sum::<f64>() / data.len() as f64)
}

pub fn std_dev(data: &[f64]) -> Option<f64> {
    let data_mean = mean(data)?;
    let variance = data
        .iter()
        .map(|value| (data_mean - value).powi(2))
        .sum::<f64>()
        / data.len() as f64;
    Some(variance.sqrt())
}
