//! Overview rendering.
//!
//! Displays one tile per metric coloured by its band, the CO₂ alert banner
//! when active, and the insight panel.

use chrono::Utc;
use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
    Frame,
};

use super::common::{format_age, panel};
use crate::app::App;
use crate::data::{Assessment, Metric, Reading};

/// Render the Overview: alert banner, metric tiles, insight panel.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let Some(latest) = app.latest() else {
        let paragraph = Paragraph::new("Waiting for first reading...")
            .alignment(Alignment::Center)
            .block(panel(app, " Overview "));
        frame.render_widget(paragraph, area);
        return;
    };
    let assessment = Assessment::of(&latest.metrics);

    let banner_height = if app.alert.is_some() { 3 } else { 0 };
    let chunks = Layout::vertical([
        Constraint::Length(banner_height),
        Constraint::Length(5),
        Constraint::Min(4),
    ])
    .split(area);

    if let Some(ref alert) = app.alert {
        let banner = Paragraph::new(Line::from(Span::styled(
            format!("⚠ {}", alert),
            app.theme.badge_style(crate::data::Status::Bad),
        )))
        .alignment(Alignment::Center)
        .block(panel(app, " Alert ").border_style(Style::default().fg(app.theme.bad)));
        frame.render_widget(banner, chunks[0]);
    }

    render_tiles(frame, app, &latest, &assessment, chunks[1]);
    render_insights(frame, app, chunks[2]);
}

fn render_tiles(
    frame: &mut Frame,
    app: &App,
    latest: &Reading,
    assessment: &Assessment,
    area: Rect,
) {
    let tiles = Layout::horizontal([Constraint::Fill(1); 4]).split(area);

    for (metric, tile) in Metric::ALL.iter().copied().zip(tiles.iter()) {
        let status = assessment.get(metric);
        let style = app.theme.status_style(status);
        let value = latest.value(metric);

        let lines = vec![
            Line::from(vec![
                Span::styled(metric.format_value(value), style.add_modifier(Modifier::BOLD)),
                Span::raw(format!(" {}", metric.unit())),
            ]),
            Line::from(Span::styled(format!("{} {}", status.symbol(), status), style)),
        ];

        let block = panel(app, format!(" {} ", metric.label())).border_style(style);
        frame.render_widget(
            Paragraph::new(lines).alignment(Alignment::Center).block(block),
            *tile,
        );
    }
}

fn render_insights(frame: &mut Frame, app: &App, area: Rect) {
    let age = app
        .insight
        .cache()
        .and_then(|c| (Utc::now() - c.computed_at).to_std().ok())
        .map(|age| format!(" {} ago", format_age(age)))
        .unwrap_or_default();
    let refreshing = if app.insight.is_refreshing() { " ⟳" } else { "" };
    let title = format!(
        " Insights [{}{}{}] ",
        app.insight.backend_name(),
        age,
        refreshing
    );

    let text: Vec<Line> = app.insight.text().lines().map(|l| Line::from(l.to_string())).collect();
    let paragraph = Paragraph::new(text)
        .wrap(Wrap { trim: false })
        .block(panel(app, title));
    frame.render_widget(paragraph, area);
}
