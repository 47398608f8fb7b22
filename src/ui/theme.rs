//! Theme configuration for the TUI.
//!
//! Supports light and dark themes with automatic terminal detection.

use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::block::BorderType;

use crate::data::Status;

/// Color and style theme for the TUI.
///
/// Use [`Theme::auto_detect()`] for automatic theme selection based on
/// terminal background, or [`Theme::dark()`]/[`Theme::light()`] explicitly.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Accent color for highlights and active elements.
    pub highlight: Color,
    /// Color for the warn band.
    pub warn: Color,
    /// Color for the bad band and alerts.
    pub bad: Color,
    /// Color for the good band.
    pub good: Color,
    /// Color for borders and separators.
    pub border: Color,
    /// Color for chart lines.
    pub series: Color,
    /// Style for header rows in tables.
    pub header: Style,
    /// Style for the active tab.
    pub tab_active: Style,
    /// Style for inactive tabs.
    pub tab_inactive: Style,
    /// Border style (rounded, plain, etc.).
    pub border_type: BorderType,
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}

impl Theme {
    /// Create a dark theme suitable for dark terminal backgrounds.
    pub fn dark() -> Self {
        Self {
            highlight: Color::Cyan,
            warn: Color::Yellow,
            bad: Color::Red,
            good: Color::Green,
            border: Color::Gray,
            series: Color::Cyan,
            header: Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            tab_active: Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            tab_inactive: Style::default().fg(Color::Gray),
            border_type: BorderType::Rounded,
        }
    }

    /// Create a light theme suitable for light terminal backgrounds.
    pub fn light() -> Self {
        Self {
            highlight: Color::Blue,
            warn: Color::Rgb(184, 134, 11),
            bad: Color::Red,
            good: Color::Green,
            border: Color::DarkGray,
            series: Color::Blue,
            header: Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            tab_active: Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            tab_inactive: Style::default().fg(Color::DarkGray),
            border_type: BorderType::Rounded,
        }
    }

    /// Auto-detect based on terminal background
    pub fn auto_detect() -> Self {
        match terminal_light::luma() {
            Ok(luma) if luma > 0.5 => Self::light(),
            _ => Self::dark(),
        }
    }

    pub fn status_color(&self, status: Status) -> Color {
        match status {
            Status::Good => self.good,
            Status::Warn => self.warn,
            Status::Bad => self.bad,
        }
    }

    /// Get style for a status band
    pub fn status_style(&self, status: Status) -> Style {
        let style = Style::default().fg(self.status_color(status));
        match status {
            Status::Bad => style.add_modifier(Modifier::BOLD),
            _ => style,
        }
    }

    /// Reverse-video badge used for the overall status.
    pub fn badge_style(&self, status: Status) -> Style {
        Style::default()
            .fg(Color::Black)
            .bg(self.status_color(status))
            .add_modifier(Modifier::BOLD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_status_is_bold() {
        let theme = Theme::dark();
        assert!(theme.status_style(Status::Bad).add_modifier.contains(Modifier::BOLD));
        assert_eq!(theme.status_style(Status::Good).fg, Some(Color::Green));
        assert_eq!(theme.badge_style(Status::Warn).bg, Some(Color::Yellow));
    }
}
