use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};

use crate::app::{App, View};

/// Poll for events with a timeout
pub fn poll_event(timeout: Duration) -> Result<Option<Event>> {
    if event::poll(timeout)? {
        Ok(Some(event::read()?))
    } else {
        Ok(None)
    }
}

/// Handle a key event
pub fn handle_key_event(app: &mut App, key: KeyEvent) {
    // If help is shown, any key closes it
    if app.show_help {
        app.show_help = false;
        return;
    }

    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.quit(),
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => app.quit(),

        // View switching
        KeyCode::Tab => {
            if key.modifiers.contains(KeyModifiers::SHIFT) {
                app.prev_view();
            } else {
                app.next_view();
            }
        }
        KeyCode::BackTab => app.prev_view(),
        KeyCode::Left | KeyCode::Char('h') => app.prev_view(),
        KeyCode::Right | KeyCode::Char('l') => app.next_view(),

        KeyCode::Char('1') => app.set_view(View::Overview),
        KeyCode::Char('2') => app.set_view(View::Trends),
        KeyCode::Char('3') => app.set_view(View::Rooms),

        // Demo overrides
        KeyCode::Char('c') => app.toggle_force_co2(),
        KeyCode::Char('p') => app.toggle_force_pm(),
        KeyCode::Char('t') => app.toggle_force_temp(),
        KeyCode::Char('f') => app.toggle_faults(),

        KeyCode::Char('i') => app.refresh_insights(),
        KeyCode::Char('e') => app.export_to_default(),

        // Tick now
        KeyCode::Char('r') => {
            app.tick();
        }

        KeyCode::Char('?') => app.toggle_help(),

        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Generator, Session, SharedStore};
    use crate::insight::{InsightService, RuleSummarizer, DEFAULT_TTL};
    use crate::source::LocalSource;
    use std::sync::Arc;
    use tokio::runtime::Handle;

    fn app() -> App {
        let session = Session::new(
            Generator::noiseless(vec!["Lab".to_string()]),
            SharedStore::with_capacity(10),
        );
        let insight = InsightService::new(Arc::new(RuleSummarizer), DEFAULT_TTL, Handle::current());
        App::new(Box::new(LocalSource::new(session)), insight)
    }

    fn press(app: &mut App, code: KeyCode) {
        handle_key_event(app, KeyEvent::new(code, KeyModifiers::NONE));
    }

    #[tokio::test]
    async fn number_keys_select_views() {
        let mut app = app();
        press(&mut app, KeyCode::Char('3'));
        assert_eq!(app.current_view, View::Rooms);
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.current_view, View::Overview);
        press(&mut app, KeyCode::Char('h'));
        assert_eq!(app.current_view, View::Rooms);
    }

    #[tokio::test]
    async fn demo_keys_toggle_overrides() {
        let mut app = app();
        press(&mut app, KeyCode::Char('c'));
        press(&mut app, KeyCode::Char('p'));
        assert!(app.overrides.force_high_co2);
        assert!(app.overrides.force_high_pm);
        assert!(!app.overrides.force_high_temp);

        press(&mut app, KeyCode::Char('r'));
        let latest = app.latest().unwrap();
        assert_eq!(latest.metrics.co2, 1200.0);
        assert_eq!(latest.metrics.pm, 40.0);

        press(&mut app, KeyCode::Char('c'));
        assert!(!app.overrides.force_high_co2);
    }

    #[tokio::test]
    async fn ctrl_c_quits_but_plain_c_does_not() {
        let mut app = app();
        press(&mut app, KeyCode::Char('c'));
        assert!(app.running);
        handle_key_event(&mut app, KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(!app.running);
    }

    #[tokio::test]
    async fn help_swallows_the_next_key() {
        let mut app = app();
        press(&mut app, KeyCode::Char('?'));
        assert!(app.show_help);
        press(&mut app, KeyCode::Char('q'));
        assert!(!app.show_help);
        assert!(app.running);
    }
}
