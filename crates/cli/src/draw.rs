use divisas_core::render::{ChartDescription, ChartState};
use std::fmt::Write;

pub const DEFAULT_WIDTH: usize = 40;

/// One row per point: date label, rate, and a bar scaled to the chart's Y bounds.
pub fn draw_chart(chart: &ChartDescription, width: usize) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", chart.style.title);

    if chart.state == ChartState::Empty {
        let _ = writeln!(out, "  {}", chart.placeholder.unwrap_or_default());
        return out;
    }

    let min = chart.y_axis.min;
    let span = chart.y_axis.max - min;
    let _ = writeln!(
        out,
        "  {} (y: {:.4} .. {:.4})",
        chart.style.dataset_label, chart.y_axis.min, chart.y_axis.max
    );

    for point in &chart.points {
        let filled = if span > 0.0 {
            (((point.y - min) / span) * width as f64).round() as usize
        } else {
            0
        };
        let _ = writeln!(
            out,
            "  {:<10}  {:>12.4}  {}",
            chart.label_at(point.x),
            point.y,
            "#".repeat(filled.min(width))
        );
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use divisas_core::domain::{DateKey, ExchangeSeries, RateObservation};
    use divisas_core::render::render;

    fn chart(rows: &[(&str, f64)]) -> ChartDescription {
        render(&ExchangeSeries::from_observations(
            rows.iter()
                .map(|(d, r)| RateObservation::new(DateKey::parse(d).unwrap(), *r))
                .collect(),
        ))
    }

    #[test]
    fn empty_chart_shows_placeholder() {
        let text = draw_chart(&ChartDescription::empty(), 20);
        assert_eq!(text, "Exchange rate history\n  No data available\n");
    }

    #[test]
    fn draws_one_row_per_point_with_scaled_bars() {
        let text = draw_chart(&chart(&[("2024-01-01", 1.00), ("2024-01-02", 2.00)]), 40);
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[1].contains("0.5000 .. 2.5000"));
        assert!(lines[2].starts_with("  2024-01-01"));
        assert!(lines[3].starts_with("  2024-01-02"));

        let bar = |line: &str| line.chars().filter(|c| *c == '#').count();
        assert_eq!(bar(lines[2]), 10);
        assert_eq!(bar(lines[3]), 30);
    }
}
