use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::info;
use tracing_subscriber::EnvFilter;
use url::Url;

use playdeck::config::{duration::parse_duration, Settings};
use playdeck::navigation::{parse_deep_link, with_module_param, NavigationSynchronizer, SessionHistory};
use playdeck::ui::{self, Theme};
use playdeck::{events, App, ModuleCatalog, ModuleDescriptor, ModuleLoader, ModuleRegistry};

#[derive(Parser, Debug)]
#[command(name = "playdeck")]
#[command(about = "Browse a catalog of terminal mini-apps and run one at a time")]
struct Args {
    /// Module to open at startup: a bare id or a URL with a `module` parameter
    #[arg(short, long)]
    module: Option<String>,

    /// Settings file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// JSON catalog to use instead of the bundled modules
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Print the browsable catalog as JSON and exit
    #[arg(short, long)]
    list: bool,

    /// Only list modules in this category (used with --list)
    #[arg(long, requires = "list")]
    category: Option<String>,

    /// Write logs to this file (RUST_LOG controls the level)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Minimum loading-indicator duration (e.g., "1200ms", "1.5s")
    #[arg(long)]
    min_transition: Option<String>,

    /// Simulated fetch delay for every module (e.g., "300ms")
    #[arg(long)]
    fetch_latency: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut settings = Settings::load(args.config.as_deref())?;
    if let Some(catalog) = args.catalog {
        settings.catalog = Some(catalog);
    }
    if let Some(log_file) = args.log_file {
        settings.log_file = Some(log_file);
    }
    if let Some(min_transition) = args.min_transition {
        parse_duration(&min_transition).context("--min-transition")?;
        settings.min_transition = min_transition;
    }
    if let Some(fetch_latency) = args.fetch_latency {
        parse_duration(&fetch_latency).context("--fetch-latency")?;
        settings.fetch_latency = fetch_latency;
    }

    let catalog = match &settings.catalog {
        Some(path) => ModuleCatalog::load(path)
            .with_context(|| format!("Failed to load catalog {}", path.display()))?,
        None => ModuleCatalog::builtin(),
    };

    // Handle list mode (non-interactive)
    if args.list {
        return list_catalog(&catalog, args.category.as_deref());
    }

    init_logging(settings.log_file.as_deref())?;

    let base_url = Url::parse(&settings.base_url)
        .with_context(|| format!("Invalid base_url: {}", settings.base_url))?;
    let initial_url = match args.module.as_deref() {
        Some(link) => match parse_deep_link(link) {
            Some(id) => with_module_param(&base_url, Some(&id)),
            None => bail!("Not a module id or deep link: {}", link),
        },
        None => base_url,
    };

    // The runtime runs module fetches; the TUI loop stays on this thread
    let rt = tokio::runtime::Runtime::new()?;

    let registry = ModuleRegistry::builtin().with_latency(settings.fetch_latency()?);
    let loader = ModuleLoader::new(Arc::new(catalog), Arc::new(registry), rt.handle().clone())
        .with_min_transition(settings.min_transition()?);
    let navigation = NavigationSynchronizer::new(SessionHistory::new(initial_url));
    let mut app = App::new(loader, navigation, Theme::from_choice(settings.theme));

    info!(url = %app.navigation().current_url(), "starting");
    app.start();

    run_tui(app, settings.tick_rate()?)
}

/// Send tracing output to `path`. The terminal belongs to the TUI, so
/// without a file nothing is logged.
fn init_logging(path: Option<&Path>) -> Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    let file = File::create(path)
        .with_context(|| format!("Failed to create log file {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

/// Print the enabled catalog entries as JSON
fn list_catalog(catalog: &ModuleCatalog, category: Option<&str>) -> Result<()> {
    let modules: Vec<&ModuleDescriptor> = match category {
        Some(category) => catalog.by_category(category),
        None => catalog.enabled(),
    };
    println!("{}", serde_json::to_string_pretty(&modules)?);
    Ok(())
}

/// Run the TUI until the user quits
fn run_tui(mut app: App, tick_rate: Duration) -> Result<()> {
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
        let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
        original_hook(panic);
    }));

    let result = run_app(&mut terminal, &mut app, tick_rate);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    info!("exiting");
    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    tick_rate: Duration,
) -> Result<()> {
    while app.running {
        app.process_completions();
        app.tick();

        terminal.draw(|frame| ui::draw(frame, app))?;

        // Wake up in time for the live module's next tick
        let timeout = app
            .loader()
            .slot()
            .tick_interval()
            .map_or(tick_rate, |interval| interval.min(tick_rate));

        if let Some(event) = events::poll_event(timeout)? {
            match event {
                Event::Key(key) => events::handle_key_event(app, key),
                Event::Mouse(mouse) => {
                    events::handle_mouse_event(app, mouse, ui::CONTENT_START_ROW);
                }
                Event::Resize(_, _) => {
                    // Terminal will redraw on next iteration
                }
                _ => {}
            }
        }
    }

    Ok(())
}
