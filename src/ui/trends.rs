//! Trend charts, one per metric over the stored history.

use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::Style,
    symbols,
    text::Span,
    widgets::{Axis, Chart, Dataset, GraphType, Paragraph},
    Frame,
};

use super::common::panel;
use crate::app::App;
use crate::data::status::Bands;
use crate::data::{classify, Metric};

/// Render a 2x2 grid of line charts.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let series = {
        let store = app.store().read();
        Metric::ALL.map(|metric| {
            store
                .window(&[metric])
                .enumerate()
                .filter_map(|(i, p)| p.get(metric).map(|v| (i as f64, v)))
                .collect::<Vec<(f64, f64)>>()
        })
    };

    if series[0].is_empty() {
        let paragraph = Paragraph::new("No history yet")
            .alignment(Alignment::Center)
            .block(panel(app, " Trends "));
        frame.render_widget(paragraph, area);
        return;
    }

    let rows = Layout::vertical([Constraint::Fill(1); 2]).split(area);
    let cells: Vec<Rect> = rows
        .iter()
        .flat_map(|row| Layout::horizontal([Constraint::Fill(1); 2]).split(*row).to_vec())
        .collect();

    for ((metric, points), cell) in Metric::ALL.iter().copied().zip(series.iter()).zip(cells) {
        render_chart(frame, app, metric, points, cell);
    }
}

fn render_chart(frame: &mut Frame, app: &App, metric: Metric, points: &[(f64, f64)], area: Rect) {
    let Some(&(_, latest)) = points.last() else {
        return;
    };
    let status = classify(metric, latest);
    let (lo, hi) = y_bounds(metric, points);
    let x_max = (points.len().saturating_sub(1)).max(1) as f64;

    let dataset = Dataset::default()
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(app.theme.series))
        .data(points);

    let title = format!(
        " {} {} {} [{}] ",
        metric.label(),
        metric.format_value(latest),
        metric.unit(),
        status
    );

    let chart = Chart::new(vec![dataset])
        .block(panel(app, Span::styled(title, app.theme.status_style(status))))
        .x_axis(
            Axis::default()
                .bounds([0.0, x_max])
                .labels([format!("-{}", points.len()), "now".to_string()]),
        )
        .y_axis(
            Axis::default()
                .bounds([lo, hi])
                .labels([metric.format_value(lo), metric.format_value(hi)]),
        );

    frame.render_widget(chart, area);
}

/// Y range covering the data and the metric's warn limits, with a little headroom.
pub fn y_bounds(metric: Metric, points: &[(f64, f64)]) -> (f64, f64) {
    let bands = Bands::for_metric(metric);
    let lo = points
        .iter()
        .map(|p| p.1)
        .chain(bands.warn_below)
        .fold(f64::INFINITY, f64::min);
    let hi = points
        .iter()
        .map(|p| p.1)
        .chain(std::iter::once(bands.warn_above))
        .fold(f64::NEG_INFINITY, f64::max);
    let pad = ((hi - lo) * 0.05).max(0.5);
    ((lo - pad).max(0.0), hi + pad)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_include_warn_limit_and_data() {
        let (lo, hi) = y_bounds(Metric::Co2, &[(0.0, 600.0), (1.0, 650.0)]);
        assert!(lo < 600.0);
        assert!(hi > 800.0);

        let (lo, hi) = y_bounds(Metric::Temp, &[(0.0, 29.0)]);
        assert!(lo < 20.0);
        assert!(hi > 29.0);
    }

    #[test]
    fn bounds_never_go_negative() {
        let (lo, _) = y_bounds(Metric::Pm, &[(0.0, 0.1)]);
        assert_eq!(lo, 0.0);
    }
}
