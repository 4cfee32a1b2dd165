mod app;
mod config;
mod engine;
mod error;
mod event;
mod labs;
mod ui;

use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::Terminal;
use tracing::{info, warn, Level};

use app::{App, Tab};
use config::Settings;
use engine::narrative::Phrasing;
use event::{Event, EventHandler};

// --- CLI Arguments ---
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Settings file; defaults apply when it does not exist
    #[arg(short, long, default_value = "labsim.toml")]
    config: PathBuf,

    /// Seed for every lab's random stream
    #[arg(short, long)]
    seed: Option<u64>,

    /// Lab to open on start, e.g. `motion` or `corrosion`
    #[arg(short, long)]
    lab: Option<String>,

    /// Event poll interval in milliseconds
    #[arg(long)]
    tick_rate: Option<u64>,

    /// Where to write the log
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Always use the first phrasing in explanations
    #[arg(long)]
    fixed_phrasing: bool,
}

impl Args {
    fn apply(&self, settings: &mut Settings) {
        if let Some(seed) = self.seed {
            settings.seed = seed;
        }
        if let Some(tick_rate) = self.tick_rate {
            settings.tick_rate_ms = tick_rate.max(1);
        }
        if let Some(file) = &self.log_file {
            settings.log.file = file.clone();
        }
        if self.fixed_phrasing {
            settings.phrasing = Phrasing::Fixed;
        }
    }
}

fn init_logging(settings: &Settings) -> anyhow::Result<()> {
    // The terminal belongs to the UI, so logs go to a file.
    let file = File::create(&settings.log.file)
        .with_context(|| format!("creating log file {}", settings.log.file.display()))?;
    let level = settings.log.max_level();
    tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_max_level(level.unwrap_or(Level::INFO))
        .init();
    if level.is_none() {
        warn!(level = %settings.log.level, "unknown log level, falling back to info");
    }
    Ok(())
}

fn run<B: Backend>(terminal: &mut Terminal<B>, app: &mut App, events: &EventHandler) -> anyhow::Result<()> {
    loop {
        terminal.draw(|frame| ui::render(frame, app))?;

        match events.next()? {
            Event::Tick(now) => app.on_tick(now),
            Event::Key(key, now) => app.on_key(key, now),
            Event::Resize => {}
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut settings = Settings::load(&args.config)
        .with_context(|| format!("loading settings from {}", args.config.display()))?;
    args.apply(&mut settings);
    init_logging(&settings)?;
    info!(seed = settings.seed, tick_ms = settings.tick_rate_ms, "labsim starting");

    let start_tab = match args.lab.as_deref() {
        None => Tab::Home,
        Some(name) => match Tab::from_name(name) {
            Some(tab) => tab,
            None => bail!("unknown lab `{name}`"),
        },
    };

    let mut app = App::new(&settings).context("building labs")?;
    app.switch_to(start_tab);
    let events = EventHandler::new(Duration::from_millis(settings.tick_rate_ms));

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let result = run(&mut terminal, &mut app, &events);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    info!("labsim exiting");
    result
}
