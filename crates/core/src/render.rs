use crate::domain::ExchangeSeries;
use serde::Serialize;

pub const NO_DATA_TEXT: &str = "No data available";

const AXIS_PADDING: f64 = 0.5;
const EMPTY_BOUNDS: AxisBounds = AxisBounds { min: 0.0, max: 1.0 };

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartState {
    Empty,
    Populated,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChartPoint {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AxisBounds {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LineMode {
    Linear,
    CubicBezier,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum XAxisPosition {
    Top,
    Bottom,
}

/// Presentation hints for whatever front end draws the chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartStyle {
    pub title: &'static str,
    pub description: &'static str,
    pub dataset_label: &'static str,
    pub line_color: &'static str,
    pub fill_color: &'static str,
    pub value_text_color: &'static str,
    pub background_color: &'static str,
    pub line_width: f32,
    pub point_radius: f32,
    pub draw_values: bool,
    pub draw_filled: bool,
    pub line_mode: LineMode,
    pub x_axis_position: XAxisPosition,
    pub x_granularity: f64,
    pub x_label_rotation_deg: f32,
    pub y_granularity: f64,
    pub right_axis_enabled: bool,
}

impl Default for ChartStyle {
    fn default() -> Self {
        Self {
            title: "Exchange rate history",
            description: "Exchange rate trend",
            dataset_label: "Exchange rate",
            line_color: "#FFA500",
            fill_color: "#FFECB3",
            value_text_color: "#000000",
            background_color: "#FFFFFF",
            line_width: 3.0,
            point_radius: 5.0,
            draw_values: true,
            draw_filled: true,
            line_mode: LineMode::CubicBezier,
            x_axis_position: XAxisPosition::Bottom,
            x_granularity: 1.0,
            x_label_rotation_deg: -45.0,
            y_granularity: 0.1,
            right_axis_enabled: false,
        }
    }
}

/// Everything needed to draw one exchange-rate line chart.
///
/// X coordinates are positions in the series, not dates, so samples are evenly spaced whatever
/// the gaps between their dates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartDescription {
    pub state: ChartState,
    pub points: Vec<ChartPoint>,
    pub labels: Vec<String>,
    pub y_axis: AxisBounds,
    pub placeholder: Option<&'static str>,
    pub style: ChartStyle,
}

impl ChartDescription {
    pub fn empty() -> Self {
        Self {
            state: ChartState::Empty,
            points: Vec::new(),
            labels: Vec::new(),
            y_axis: EMPTY_BOUNDS,
            placeholder: Some(NO_DATA_TEXT),
            style: ChartStyle::default(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.state == ChartState::Empty
    }

    /// Tick text for an X coordinate. Coordinates outside the series give an empty label.
    pub fn label_at(&self, x: f64) -> &str {
        if !x.is_finite() || x < 0.0 {
            return "";
        }
        self.labels
            .get(x.trunc() as usize)
            .map(String::as_str)
            .unwrap_or("")
    }
}

impl Default for ChartDescription {
    fn default() -> Self {
        Self::empty()
    }
}

pub fn render(series: &ExchangeSeries) -> ChartDescription {
    let (Some(min), Some(max)) = (series.min_rate(), series.max_rate()) else {
        return ChartDescription::empty();
    };

    let points = series
        .iter()
        .enumerate()
        .map(|(i, obs)| ChartPoint {
            x: i as f64,
            y: obs.rate,
        })
        .collect();
    let labels = series.iter().map(|obs| obs.date.to_string()).collect();

    ChartDescription {
        state: ChartState::Populated,
        points,
        labels,
        y_axis: AxisBounds {
            min: min - AXIS_PADDING,
            max: max + AXIS_PADDING,
        },
        placeholder: None,
        style: ChartStyle::default(),
    }
}
