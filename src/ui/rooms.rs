//! Room view: a simple floor plan plus a per-room table.

use chrono::Utc;
use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Cell, Paragraph, Row, Table},
    Frame,
};

use super::common::{format_age, panel};
use crate::app::App;
use crate::data::{overall, Liveness, Metric, Reading, Status};

/// One row of the room view.
#[derive(Debug, Clone)]
pub struct RoomRow {
    pub room: String,
    pub latest: Option<Reading>,
    pub status: Option<Status>,
    pub liveness: Liveness,
}

/// Latest reading, status and liveness for every configured room.
pub fn room_rows(app: &App) -> Vec<RoomRow> {
    let store = app.store().read();
    let now = Utc::now();
    app.rooms()
        .iter()
        .map(|room| {
            let latest = store.latest_for_room(room).cloned();
            RoomRow {
                room: room.clone(),
                status: latest.as_ref().map(|r| overall(&r.metrics)),
                latest,
                liveness: store.liveness(room, now, app.offline_after),
            }
        })
        .collect()
}

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let rows = room_rows(app);

    let chunks = Layout::vertical([Constraint::Length(5), Constraint::Min(4)]).split(area);
    render_plan(frame, app, &rows, chunks[0]);
    render_table(frame, app, &rows, chunks[1]);
}

/// Rooms side by side, each box coloured by its latest overall status.
fn render_plan(frame: &mut Frame, app: &App, rows: &[RoomRow], area: Rect) {
    if rows.is_empty() {
        return;
    }
    let boxes = Layout::horizontal(vec![Constraint::Fill(1); rows.len()]).split(area);

    for (row, area) in rows.iter().zip(boxes.iter()) {
        let style = match (row.status, row.liveness.is_online()) {
            (Some(status), true) => app.theme.status_style(status),
            _ => Style::default().add_modifier(Modifier::DIM),
        };
        let label = match row.status {
            Some(status) => format!("{} {}", status.symbol(), status),
            None => "-".to_string(),
        };
        let lines = vec![
            Line::from(Span::styled(label, style)),
            Line::from(Span::styled(
                row.liveness.label(),
                Style::default().add_modifier(Modifier::DIM),
            )),
        ];
        let block = panel(app, format!(" {} ", row.room)).border_style(style);
        frame.render_widget(
            Paragraph::new(lines).alignment(Alignment::Center).block(block),
            *area,
        );
    }
}

fn render_table(frame: &mut Frame, app: &App, rows: &[RoomRow], area: Rect) {
    let mut header_cells = vec![Cell::from("Room"), Cell::from("Status")];
    header_cells.extend(Metric::ALL.iter().map(|m| Cell::from(m.label())));
    header_cells.push(Cell::from("Last seen"));
    header_cells.push(Cell::from("Device"));
    let header = Row::new(header_cells).height(1).style(app.theme.header);

    let table_rows: Vec<Row> = rows
        .iter()
        .map(|row| {
            let mut cells = vec![Cell::from(row.room.clone())];
            cells.push(match row.status {
                Some(status) => {
                    Cell::from(status.to_string()).style(app.theme.status_style(status))
                }
                None => Cell::from("-"),
            });
            for metric in Metric::ALL {
                cells.push(match row.latest {
                    Some(ref r) => {
                        let value = r.value(metric);
                        Cell::from(metric.format_value(value))
                            .style(app.theme.status_style(crate::data::classify(metric, value)))
                    }
                    None => Cell::from("-"),
                });
            }
            cells.push(Cell::from(match row.liveness {
                Liveness::Online { age } | Liveness::Offline { age } => {
                    format!("{} ago", format_age(age))
                }
                Liveness::Never => "never".to_string(),
            }));
            let device_style = if row.liveness.is_online() {
                Style::default().fg(app.theme.good)
            } else {
                Style::default().fg(app.theme.bad)
            };
            cells.push(Cell::from(row.liveness.label()).style(device_style));
            Row::new(cells)
        })
        .collect();

    let widths = [
        Constraint::Fill(2),
        Constraint::Fill(1),
        Constraint::Fill(1),
        Constraint::Fill(1),
        Constraint::Fill(1),
        Constraint::Fill(1),
        Constraint::Fill(1),
        Constraint::Min(8),
    ];

    let title = format!(
        " Rooms ({}) [offline after {}] ",
        rows.len(),
        format_age(app.offline_after)
    );
    let table = Table::new(table_rows, widths).header(header).block(panel(app, title));

    frame.render_widget(table, area);
}
