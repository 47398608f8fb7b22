//! Application state and navigation logic.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::Result;
use chrono::{DateTime, Utc};

use crate::data::{
    Assessment, Co2Alert, FaultInjection, Overrides, Reading, SharedStore, TickOutcome,
    WindowStats,
};
use crate::export;
use crate::insight::InsightService;
use crate::source::ReadingSource;
use crate::ui::Theme;

/// Default file written by the export key.
pub const DEFAULT_EXPORT_PATH: &str = "iaq_export.json";

/// The current view/tab in the TUI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// Metric tiles, overall badge, alert banner and insights.
    Overview,
    /// One chart per metric over the recent window.
    Trends,
    /// Latest status and liveness per room.
    Rooms,
}

impl View {
    /// Cycle to the next view.
    pub fn next(self) -> Self {
        match self {
            View::Overview => View::Trends,
            View::Trends => View::Rooms,
            View::Rooms => View::Overview,
        }
    }

    /// Cycle to the previous view.
    pub fn prev(self) -> Self {
        match self {
            View::Overview => View::Rooms,
            View::Trends => View::Overview,
            View::Rooms => View::Trends,
        }
    }

    /// Returns the display label for this view.
    pub fn label(&self) -> &'static str {
        match self {
            View::Overview => "Overview",
            View::Trends => "Trends",
            View::Rooms => "Rooms",
        }
    }

    pub fn index(&self) -> usize {
        match self {
            View::Overview => 0,
            View::Trends => 1,
            View::Rooms => 2,
        }
    }
}

/// Main application state.
pub struct App {
    pub running: bool,
    pub current_view: View,
    pub show_help: bool,

    // Data source
    source: Box<dyn ReadingSource>,
    pub overrides: Overrides,
    pub faults: FaultInjection,
    pub load_error: Option<String>,

    /// Alert raised by the latest stored reading.
    pub alert: Option<Co2Alert>,
    /// Samples dropped by fault injection since start.
    pub skipped: u64,
    pub last_update: Option<Instant>,

    // Insights
    pub insight: InsightService,
    pub insight_window: Duration,

    pub offline_after: Duration,
    pub export_path: PathBuf,

    // UI
    pub theme: Theme,

    // Status message (temporary feedback)
    pub status_message: Option<(String, Instant)>,
}

impl App {
    /// Create a new App driving `source`, with insights from `insight`.
    pub fn new(source: Box<dyn ReadingSource>, insight: InsightService) -> Self {
        Self {
            running: true,
            current_view: View::Overview,
            show_help: false,
            source,
            overrides: Overrides::default(),
            faults: FaultInjection::default(),
            load_error: None,
            alert: None,
            skipped: 0,
            last_update: None,
            insight,
            insight_window: Duration::from_secs(3600),
            offline_after: Duration::from_secs(30),
            export_path: PathBuf::from(DEFAULT_EXPORT_PATH),
            theme: Theme::default(),
            status_message: None,
        }
    }

    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    pub fn with_offline_after(mut self, offline_after: Duration) -> Self {
        self.offline_after = offline_after;
        self
    }

    pub fn with_insight_window(mut self, window: Duration) -> Self {
        self.insight_window = window;
        self
    }

    pub fn with_export_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.export_path = path.into();
        self
    }

    /// Initial overrides, pushed to the source immediately.
    pub fn with_overrides(mut self, overrides: Overrides) -> Self {
        self.overrides = overrides;
        self.source.set_overrides(overrides);
        self
    }

    pub fn with_faults(mut self, faults: FaultInjection) -> Self {
        self.faults = faults;
        self.source.set_faults(faults);
        self
    }

    /// Returns a description of the current data source.
    pub fn source_description(&self) -> &str {
        self.source.description()
    }

    pub fn store(&self) -> &SharedStore {
        self.source.store()
    }

    pub fn rooms(&self) -> &[String] {
        self.source.rooms()
    }

    /// Latest stored reading, if any.
    pub fn latest(&self) -> Option<Reading> {
        self.source.store().latest()
    }

    /// Bands and overall badge of the latest reading.
    pub fn assessment(&self) -> Option<Assessment> {
        self.latest().map(|r| Assessment::of(&r.metrics))
    }

    /// Set a temporary status message that will be shown for a few seconds.
    pub fn set_status_message(&mut self, message: String) {
        self.status_message = Some((message, Instant::now()));
    }

    /// Get the current status message if it hasn't expired (3 seconds).
    pub fn get_status_message(&self) -> Option<&str> {
        if let Some((msg, time)) = &self.status_message {
            if time.elapsed() < Duration::from_secs(3) {
                return Some(msg);
            }
        }
        None
    }

    /// Poll the source for new readings and refresh derived state.
    ///
    /// Returns the number of tick outcomes received.
    pub fn tick(&mut self) -> usize {
        let outcomes = self.source.poll();
        self.load_error = self.source.error().map(str::to_string);

        for outcome in &outcomes {
            if let TickOutcome::Skipped { .. } = outcome {
                self.skipped += 1;
            }
        }

        if !outcomes.is_empty() {
            self.last_update = Some(Instant::now());
            let alert = self.latest().as_ref().and_then(Co2Alert::check);
            if let Some(ref a) = alert {
                if self.alert.as_ref().is_none_or(|prev| prev.room != a.room) {
                    tracing::warn!(room = %a.room, co2 = a.co2, "{}", a);
                }
            }
            self.alert = alert;
        }

        self.poll_insights(Utc::now());
        outcomes.len()
    }

    /// Collect finished insights and start a recomputation when stale.
    pub fn poll_insights(&mut self, now: DateTime<Utc>) -> bool {
        let start = window_start(now, self.insight_window);
        let store = self.source.store();
        self.insight.poll(now, || WindowStats::from_readings(store.read().since(start)))
    }

    /// Statistics over the trailing insight window.
    pub fn window_stats(&self, now: DateTime<Utc>) -> WindowStats {
        let start = window_start(now, self.insight_window);
        WindowStats::from_readings(self.source.store().read().since(start))
    }

    /// Switch to the next view (cycles through Overview → Trends → Rooms).
    pub fn next_view(&mut self) {
        self.current_view = self.current_view.next();
    }

    /// Switch to the previous view.
    pub fn prev_view(&mut self) {
        self.current_view = self.current_view.prev();
    }

    /// Switch to a specific view.
    pub fn set_view(&mut self, view: View) {
        self.current_view = view;
    }

    pub fn toggle_force_co2(&mut self) {
        self.overrides.force_high_co2 = !self.overrides.force_high_co2;
        self.apply_overrides("Forcing high CO₂", self.overrides.force_high_co2);
    }

    pub fn toggle_force_pm(&mut self) {
        self.overrides.force_high_pm = !self.overrides.force_high_pm;
        self.apply_overrides("Forcing high PM2.5", self.overrides.force_high_pm);
    }

    pub fn toggle_force_temp(&mut self) {
        self.overrides.force_high_temp = !self.overrides.force_high_temp;
        self.apply_overrides("Forcing high temperature", self.overrides.force_high_temp);
    }

    fn apply_overrides(&mut self, label: &str, on: bool) {
        self.source.set_overrides(self.overrides);
        tracing::info!(overrides = ?self.overrides, "overrides changed");
        self.set_status_message(format!("{}: {}", label, on_off(on)));
    }

    /// Toggle dropping of random samples.
    pub fn toggle_faults(&mut self) {
        self.faults.enabled = !self.faults.enabled;
        self.source.set_faults(self.faults);
        self.set_status_message(format!(
            "Fault injection ({:.0}% skip): {}",
            self.faults.skip_probability * 100.0,
            on_off(self.faults.enabled)
        ));
    }

    /// Discard the cached insight so the next tick recomputes it.
    pub fn refresh_insights(&mut self) {
        self.insight.invalidate();
        self.poll_insights(Utc::now());
        self.set_status_message("Refreshing insights...".to_string());
    }

    /// Toggle the help overlay.
    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    /// Signal the application to quit.
    pub fn quit(&mut self) {
        self.running = false;
    }

    /// Export the full history to `path`.
    pub fn export_state(&self, path: &Path) -> Result<usize> {
        let store = self.source.store().read();
        if store.is_empty() {
            anyhow::bail!("No readings to export");
        }
        export::write_export(path, &store)
    }

    /// Export to [`App::export_path`], reporting the result in the status bar.
    pub fn export_to_default(&mut self) {
        let path = self.export_path.clone();
        match self.export_state(&path) {
            Ok(rows) => {
                let message = format!("Exported {} readings to {}", rows, path.display());
                self.set_status_message(message);
            }
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "export failed");
                self.set_status_message(format!("Export failed: {}", e));
            }
        }
    }
}

fn on_off(on: bool) -> &'static str {
    if on {
        "on"
    } else {
        "off"
    }
}

/// Start of a trailing window ending at `now`.
pub fn window_start(now: DateTime<Utc>, window: Duration) -> DateTime<Utc> {
    chrono::Duration::from_std(window)
        .ok()
        .and_then(|w| now.checked_sub_signed(w))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Generator, Session, Status};
    use crate::insight::{RuleSummarizer, DEFAULT_TTL, NO_INSIGHTS};
    use crate::source::LocalSource;
    use std::sync::Arc;
    use tokio::runtime::Handle;

    fn app() -> App {
        let rooms = vec!["Lab".to_string()];
        let session = Session::new(Generator::noiseless(rooms), SharedStore::with_capacity(10));
        let insight = InsightService::new(Arc::new(RuleSummarizer), DEFAULT_TTL, Handle::current());
        App::new(Box::new(LocalSource::new(session)), insight)
    }

    #[test]
    fn views_cycle_both_ways() {
        assert_eq!(View::Overview.next(), View::Trends);
        assert_eq!(View::Rooms.next(), View::Overview);
        assert_eq!(View::Overview.prev(), View::Rooms);
        assert_eq!(View::Trends.index(), 1);
    }

    #[tokio::test]
    async fn empty_app_has_no_latest_reading() {
        let app = app();
        assert!(app.latest().is_none());
        assert!(app.assessment().is_none());
        assert!(app.alert.is_none());
        assert_eq!(app.insight.text(), NO_INSIGHTS);
    }

    #[tokio::test]
    async fn tick_appends_and_classifies() {
        let mut app = app();
        assert_eq!(app.tick(), 1);
        assert_eq!(app.store().len(), 1);

        let assessment = app.assessment().unwrap();
        assert_eq!(assessment.overall, Status::Good);
        assert!(app.alert.is_none());
        assert!(app.last_update.is_some());
        // first tick starts an insight computation
        assert!(app.insight.is_refreshing());
    }

    #[tokio::test]
    async fn forcing_co2_raises_alert_and_releasing_clears_it() {
        let mut app = app();
        app.toggle_force_co2();
        assert!(app.overrides.force_high_co2);
        app.tick();

        let alert = app.alert.clone().unwrap();
        assert_eq!(alert.room, "Lab");
        assert_eq!(alert.co2, 1200.0);
        assert_eq!(app.assessment().unwrap().co2, Status::Bad);
        assert!(app.get_status_message().unwrap().contains("on"));

        app.toggle_force_co2();
        // released co2 is clamped back into its band
        app.tick();
        assert!(app.alert.is_none());
        assert_eq!(app.latest().unwrap().metrics.co2, 800.0);
    }

    #[tokio::test]
    async fn certain_faults_are_counted_as_skipped() {
        let mut app = app();
        app.faults.skip_probability = 1.0;
        app.toggle_faults();
        assert!(app.faults.enabled);

        app.tick();
        app.tick();
        assert_eq!(app.skipped, 2);
        assert!(app.store().is_empty());
    }

    #[tokio::test]
    async fn export_requires_readings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        let mut app = app();
        assert!(app.export_state(&path).is_err());

        app.tick();
        app.tick();
        assert_eq!(app.export_state(&path).unwrap(), 2);
        assert!(path.exists());
    }

    #[tokio::test]
    async fn export_key_writes_to_configured_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.json");
        let mut app = app().with_export_path(&path);

        app.export_to_default();
        assert!(!path.exists());
        assert!(app.get_status_message().unwrap().starts_with("Export failed"));

        app.tick();
        app.export_to_default();
        assert!(path.exists());
        assert_eq!(
            app.get_status_message(),
            Some(format!("Exported 1 readings to {}", path.display()).as_str())
        );
    }

    #[tokio::test]
    async fn window_stats_follow_the_store() {
        let mut app = app();
        app.tick();
        let stats = app.window_stats(Utc::now());
        assert_eq!(stats.rows, 1);
        assert_eq!(stats.mean(crate::data::Metric::Co2), Some(650.0));
    }

    #[test]
    fn window_start_saturates() {
        let now = Utc::now();
        assert_eq!(window_start(now, Duration::from_secs(60)), now - chrono::Duration::seconds(60));
        assert_eq!(window_start(now, Duration::MAX), DateTime::<Utc>::MIN_UTC);
    }
}
