use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Layout},
    Terminal,
};
use tracing_subscriber::EnvFilter;

use iaq_dashboard::config::{InsightBackend, InsightConfig, LoggingConfig};
use iaq_dashboard::insight::{InsightService, RuleSummarizer, Summarizer};
use iaq_dashboard::ui::{self, Theme};
use iaq_dashboard::{
    events, export, overall, App, BackgroundSource, Co2Alert, DashboardConfig, Generator,
    LocalSource, Overrides, ReadingSource, Session, SharedStore, TickOutcome, View, WindowStats,
};

/// How often a background producer's outcomes are drained.
const BACKGROUND_POLL: Duration = Duration::from_millis(100);

#[derive(Parser, Debug)]
#[command(name = "iaq-dashboard")]
#[command(about = "Live terminal dashboard for simulated indoor air-quality monitoring")]
struct Args {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Tick interval in milliseconds (overrides the configuration)
    #[arg(short, long)]
    refresh: Option<u64>,

    /// Seed for a reproducible run
    #[arg(long)]
    seed: Option<u64>,

    /// Generate readings on a background task instead of the UI loop
    #[arg(short, long)]
    background: bool,

    /// Randomly drop about 1% of samples
    #[arg(long)]
    fault_injection: bool,

    /// Run without the TUI, logging each reading
    #[arg(long)]
    headless: bool,

    /// Stop after this many ticks (headless mode)
    #[arg(long)]
    ticks: Option<u64>,

    /// Export the history to a JSON file after a headless run
    #[arg(short, long)]
    export: Option<PathBuf>,

    /// Start with CO₂ forced to its alarm value
    #[arg(long)]
    force_co2: bool,

    /// Start with PM2.5 forced to its alarm value
    #[arg(long)]
    force_pm: bool,

    /// Start with temperature forced to its alarm value
    #[arg(long)]
    force_temp: bool,
}

impl Args {
    fn apply(&self, config: &mut DashboardConfig) {
        if let Some(refresh) = self.refresh {
            config.refresh_ms = refresh;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        if self.fault_injection {
            config.fault_injection.enabled = true;
        }
    }

    fn overrides(&self) -> Overrides {
        Overrides {
            force_high_co2: self.force_co2,
            force_high_pm: self.force_pm,
            force_high_temp: self.force_temp,
        }
    }

    fn headless(&self) -> bool {
        self.headless || self.export.is_some() || self.ticks.is_some()
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = DashboardConfig::load(args.config.as_deref())?;
    args.apply(&mut config);
    config.validate()?;

    init_logging(&config.logging, args.headless())?;

    let rt = tokio::runtime::Runtime::new()?;
    let session = build_session(&config, args.overrides());

    // Background ticks are drained often; local ticks follow the refresh interval
    let (source, poll_interval): (Box<dyn ReadingSource>, Duration) = if args.background {
        let source = BackgroundSource::spawn(session, config.refresh_interval(), rt.handle());
        (Box::new(source), BACKGROUND_POLL)
    } else {
        (Box::new(LocalSource::new(session)), config.refresh_interval())
    };

    // Handle headless mode (non-interactive)
    if args.headless() {
        return rt.block_on(run_headless(
            source,
            poll_interval,
            &config,
            args.ticks,
            args.export.as_deref(),
        ));
    }

    let insight = InsightService::new(
        build_summarizer(&config.insight),
        Duration::from_secs(config.insight.ttl_secs),
        rt.handle().clone(),
    );

    let app = App::new(source, insight)
        .with_theme(Theme::auto_detect())
        .with_offline_after(config.offline_after())
        .with_insight_window(Duration::from_secs(config.insight.window_secs))
        .with_export_path(config.export_path.clone())
        .with_overrides(args.overrides())
        .with_faults(config.faults());

    run_tui(app, poll_interval)
}

/// Route logs to stderr in headless mode, otherwise to the configured file.
///
/// With no file configured the TUI discards logs so they never reach the
/// alternate screen.
fn init_logging(config: &LoggingConfig, headless: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .with_context(|| format!("Invalid log level {:?}", config.level))?;
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    if headless {
        builder.with_writer(io::stderr).init();
    } else if let Some(ref path) = config.file {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open log file {}", path.display()))?;
        builder.with_writer(Mutex::new(file)).with_ansi(false).init();
    } else {
        builder.with_writer(io::sink).init();
    }
    Ok(())
}

fn build_session(config: &DashboardConfig, overrides: Overrides) -> Session {
    let generator = match config.seed {
        Some(seed) => Generator::with_seed(seed, config.rooms.clone()),
        None => Generator::new(config.rooms.clone()),
    };
    let session = Session::new(generator, SharedStore::with_capacity(config.capacity))
        .with_faults(config.faults())
        .with_overrides(overrides);

    match config.seed {
        Some(seed) => session.with_fault_seed(seed.wrapping_add(1)),
        None => session,
    }
}

fn build_summarizer(config: &InsightConfig) -> Arc<dyn Summarizer> {
    match config.backend {
        InsightBackend::Rules => Arc::new(RuleSummarizer::new()),
        #[cfg(feature = "openai")]
        InsightBackend::Openai => Arc::new(
            iaq_dashboard::insight::OpenAiSummarizer::builder()
                .endpoint(&config.endpoint)
                .model(&config.model)
                .api_key_from_env(&config.api_key_env)
                .timeout(Duration::from_secs(config.timeout_secs))
                .build(),
        ),
        #[cfg(not(feature = "openai"))]
        InsightBackend::Openai => {
            tracing::warn!("built without the openai feature, using rule-based insights");
            Arc::new(RuleSummarizer::new())
        }
    }
}

/// Drive `source` until `ticks` outcomes have been seen or Ctrl-C is pressed,
/// logging each reading, then log the insight text and optionally export.
async fn run_headless(
    mut source: Box<dyn ReadingSource>,
    poll_interval: Duration,
    config: &DashboardConfig,
    ticks: Option<u64>,
    export_path: Option<&Path>,
) -> Result<()> {
    tracing::info!(
        source = source.description(),
        refresh_ms = config.refresh_ms,
        capacity = config.capacity,
        rooms = ?config.rooms,
        "headless run started"
    );

    let seen = drive_headless(source.as_mut(), poll_interval, ticks).await;
    if let Some(err) = source.error() {
        tracing::error!(error = err, "source stopped");
    }
    let store = source.store().clone();
    // stops a background producer before the history is summarized
    drop(source);
    tracing::info!(ticks = seen, rows = store.len(), "headless run finished");

    let stats = {
        let store = store.read();
        WindowStats::from_readings(store.iter())
    };
    let mut insight = InsightService::new(
        build_summarizer(&config.insight),
        Duration::from_secs(config.insight.ttl_secs),
        tokio::runtime::Handle::current(),
    );
    let text = insight.refresh_now(Utc::now(), &stats).await.to_string();
    tracing::info!(backend = insight.backend_name(), "insights:\n{}", text);

    if let Some(path) = export_path {
        let store = store.read();
        match export::write_export(path, &store) {
            Ok(rows) => println!("Exported {} readings to: {}", rows, path.display()),
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "export failed");
                return Err(e);
            }
        }
    }
    Ok(())
}

/// Poll `source` every `poll_interval` and log what it produced.
///
/// Returns the number of tick outcomes seen, skipped samples included.
async fn drive_headless(
    source: &mut dyn ReadingSource,
    poll_interval: Duration,
    ticks: Option<u64>,
) -> u64 {
    let mut ticker = tokio::time::interval(poll_interval);
    let mut seen = 0u64;

    while ticks.is_none_or(|n| seen < n) && source.error().is_none() {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("interrupted");
                break;
            }
        }

        for outcome in source.poll() {
            seen += 1;
            if let TickOutcome::Appended { reading, .. } = outcome {
                let m = reading.metrics;
                tracing::info!(
                    room = %reading.room,
                    co2 = m.co2,
                    temp = m.temp,
                    rh = m.rh,
                    pm = m.pm,
                    overall = %overall(&m),
                    "reading"
                );
                if let Some(alert) = Co2Alert::check(&reading) {
                    tracing::warn!(room = %alert.room, co2 = alert.co2, "{}", alert);
                }
            }
        }
    }
    seen
}

/// Run the TUI with the given app
fn run_tui(mut app: App, tick_interval: Duration) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Setup panic hook to restore terminal
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic);
    }));

    app.tick();

    let result = run_app(&mut terminal, &mut app, tick_interval);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    tick_interval: Duration,
) -> Result<()> {
    let mut last_tick = Instant::now();

    // Minimum terminal size for usable display
    const MIN_WIDTH: u16 = 60;
    const MIN_HEIGHT: u16 = 16;

    while app.running {
        terminal.draw(|frame| {
            let area = frame.area();

            if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
                let msg = format!(
                    "Terminal too small: {}x{}\nMinimum: {}x{}\n\nResize to continue",
                    area.width, area.height, MIN_WIDTH, MIN_HEIGHT
                );
                let paragraph = ratatui::widgets::Paragraph::new(msg)
                    .alignment(ratatui::layout::Alignment::Center)
                    .style(ratatui::style::Style::default().fg(ratatui::style::Color::Yellow));
                let centered = ratatui::layout::Rect::new(
                    0,
                    (area.height / 2).saturating_sub(2),
                    area.width,
                    5.min(area.height),
                );
                frame.render_widget(paragraph, centered);
                return;
            }

            let chunks = Layout::vertical([
                Constraint::Length(1), // Header bar
                Constraint::Length(1), // Tabs
                Constraint::Min(10),   // Content
                Constraint::Length(1), // Status bar
            ])
            .split(area);

            ui::common::render_header(frame, app, chunks[0]);
            ui::common::render_tabs(frame, app, chunks[1]);

            match app.current_view {
                View::Overview => ui::overview::render(frame, app, chunks[2]),
                View::Trends => ui::trends::render(frame, app, chunks[2]),
                View::Rooms => ui::rooms::render(frame, app, chunks[2]),
            }

            ui::common::render_status_bar(frame, app, chunks[3]);

            if app.show_help {
                ui::common::render_help(frame, app, area);
            }
        })?;

        if let Some(Event::Key(key)) = events::poll_event(Duration::from_millis(100))? {
            events::handle_key_event(app, key);
        }

        if last_tick.elapsed() >= tick_interval {
            app.tick();
            last_tick = Instant::now();
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session::new(
            Generator::with_seed(9, vec!["Lab".to_string()]),
            SharedStore::with_capacity(100),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn headless_drives_a_local_source() {
        let mut source = LocalSource::new(session());
        let seen = drive_headless(&mut source, Duration::from_secs(1), Some(5)).await;
        assert_eq!(seen, 5);
        assert_eq!(source.store().len(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn headless_drives_a_background_source() {
        let runtime = tokio::runtime::Handle::current();
        let mut source = BackgroundSource::spawn(session(), Duration::from_secs(1), &runtime);
        let seen = drive_headless(&mut source, BACKGROUND_POLL, Some(3)).await;
        assert_eq!(seen, 3);
        assert!(source.store().len() >= 3);
        assert!(source.error().is_none());
    }

    #[test]
    fn export_and_ticks_imply_headless() {
        let args = Args::try_parse_from(["iaq-dashboard", "--background", "--ticks", "3"]).unwrap();
        assert!(args.background);
        assert!(args.headless());

        let args = Args::try_parse_from(["iaq-dashboard", "--background"]).unwrap();
        assert!(!args.headless());
    }
}
