//! Common UI components shared across views.
//!
//! This module contains the header bar, tab bar, status bar, and help overlay.

use std::time::Duration;

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Tabs},
    Frame,
};

use crate::app::{App, View};
use crate::data::Assessment;

/// Render the header bar with the overall badge.
///
/// Displays: overall status, degraded metrics, latest room, history fill level.
pub fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let title = Span::styled(" IAQ DASHBOARD ", Style::default().add_modifier(Modifier::BOLD));

    let Some(latest) = app.latest() else {
        let line = Line::from(vec![title, Span::raw("| Waiting for first reading...")]);
        frame.render_widget(Paragraph::new(line), area);
        return;
    };

    let assessment = Assessment::of(&latest.metrics);
    let status = assessment.overall;
    let (len, capacity) = {
        let store = app.store().read();
        (store.len(), store.capacity())
    };

    let mut spans = vec![
        Span::styled(format!(" {} ", status.symbol()), app.theme.status_style(status)),
        title,
        Span::raw("│ Overall "),
        Span::styled(
            format!(" {} ", status.as_str().to_uppercase()),
            app.theme.badge_style(status),
        ),
        Span::raw(" "),
    ];
    for (metric, metric_status) in assessment.degraded() {
        spans.push(Span::styled(
            format!("{} {} ", metric_status.symbol(), metric.label()),
            app.theme.status_style(metric_status),
        ));
    }
    spans.push(Span::raw(format!("│ Last: {} ", latest.room)));
    spans.push(Span::raw(format!("│ {}/{} readings ", len, capacity)));

    if app.overrides.any() {
        spans.push(Span::styled(
            "│ DEMO OVERRIDE ",
            Style::default().fg(app.theme.warn).add_modifier(Modifier::BOLD),
        ));
    }
    if app.faults.enabled {
        spans.push(Span::styled(
            format!("│ faults:{} skipped ", app.skipped),
            Style::default().fg(app.theme.warn),
        ));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Render the tab bar showing available views.
///
/// Highlights the currently active view.
pub fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let titles: Vec<Line> = [View::Overview, View::Trends, View::Rooms]
        .iter()
        .map(|v| Line::from(format!(" {}:{} ", v.index() + 1, v.label())))
        .collect();

    let tabs = Tabs::new(titles)
        .select(app.current_view.index())
        .style(app.theme.tab_inactive)
        .highlight_style(app.theme.tab_active)
        .divider("|");

    frame.render_widget(tabs, area);
}

/// Render the status bar at the bottom.
///
/// Shows: source, time since last update, available controls.
/// Also displays temporary status messages and errors.
pub fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    if let Some(msg) = app.get_status_message() {
        let paragraph =
            Paragraph::new(format!(" {} ", msg)).style(Style::default().fg(app.theme.highlight));
        frame.render_widget(paragraph, area);
        return;
    }

    let status = if let Some(ref err) = app.load_error {
        format!(" Error: {} | q:quit", err)
    } else if let Some(updated) = app.last_update {
        format!(
            " {} | Updated {:.1}s ago | c/p/t:demo f:faults i:insights e:export ?:help q:quit",
            app.source_description(),
            updated.elapsed().as_secs_f64(),
        )
    } else {
        format!(" {} | Starting... | q:quit", app.source_description())
    };

    let paragraph = Paragraph::new(status).style(Style::default().add_modifier(Modifier::DIM));

    frame.render_widget(paragraph, area);
}

/// Render the help overlay with keyboard shortcuts.
///
/// Displayed as a centered modal on top of the current view.
pub fn render_help(frame: &mut Frame, app: &App, area: Rect) {
    let section = |title: &'static str| {
        Line::from(vec![Span::styled(title, Style::default().add_modifier(Modifier::BOLD))])
    };
    let flag = |label: &'static str, on: bool| {
        let state = if on { "on" } else { "off" };
        Line::from(format!("  {:<14}{}", label, state))
    };

    let help_text = vec![
        Line::from(vec![Span::styled("Keyboard Shortcuts", app.theme.header)]),
        Line::from(""),
        section(" Navigation"),
        Line::from("  ←/→ h/l     Switch views"),
        Line::from("  1-3         Jump to view"),
        Line::from(""),
        section(" Demo"),
        Line::from("  c           Force high CO₂"),
        Line::from("  p           Force high PM2.5"),
        Line::from("  t           Force high temperature"),
        Line::from("  f           Toggle fault injection"),
        Line::from(""),
        section(" General"),
        Line::from("  r           Tick now"),
        Line::from("  i           Refresh insights"),
        Line::from("  e           Export to JSON"),
        Line::from("  q           Quit"),
        Line::from(""),
        section(" Current"),
        flag("CO₂ override", app.overrides.force_high_co2),
        flag("PM override", app.overrides.force_high_pm),
        flag("Temp override", app.overrides.force_high_temp),
        flag("Faults", app.faults.enabled),
        Line::from(""),
        Line::from(vec![Span::styled(
            "Press any key to close",
            Style::default().add_modifier(Modifier::DIM),
        )]),
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.highlight));

    let paragraph = Paragraph::new(help_text).block(block);

    let help_width = 42u16.min(area.width.saturating_sub(4));
    let help_height = 28u16.min(area.height.saturating_sub(2));
    let x = area.x + (area.width.saturating_sub(help_width)) / 2;
    let y = area.y + (area.height.saturating_sub(help_height)) / 2;
    let help_area = Rect::new(x, y, help_width, help_height);

    frame.render_widget(Clear, help_area);
    frame.render_widget(paragraph, help_area);
}

/// Standard bordered block used by all panels.
pub fn panel<'a>(app: &App, title: impl Into<Line<'a>>) -> Block<'a> {
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border))
}

/// Format an age for display (e.g., "4s", "2m 05s", "1h 03m").
pub fn format_age(age: Duration) -> String {
    let secs = age.as_secs();
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m {:02}s", secs / 60, secs % 60)
    } else {
        format!("{}h {:02}m", secs / 3600, (secs % 3600) / 60)
    }
}
