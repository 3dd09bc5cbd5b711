mod app;
mod cli;
mod config;
mod datasources;
mod db;
mod error;
mod logic;
mod models;
mod ui;

use anyhow::{bail, Context};
use app::{App, FormField, Screen};
use chrono::NaiveDate;
use clap::Parser;
use cli::{Cli, Commands};
use config::Config;
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use datasources::ForecastProvider;
use db::{ApplicationStore, Database};
use logic::{ApplicationRequest, Clock, FixedClock, RiskEngine, SystemClock, WithdrawalTracker};
use logic::withdrawal::application_status;
use ratatui::{backend::CrosstermBackend, Frame, Terminal};
use std::fs::OpenOptions;
use std::io::{self, Stdout};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use ui::screens::{AlertsScreen, DashboardScreen, WithdrawalsScreen};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let Cli {
        command,
        config: config_path,
        data_dir,
        as_of,
        verbose,
    } = Cli::parse();

    init_logging(verbose, command.is_none(), data_dir.as_ref())?;

    let command = match command {
        Some(Commands::Init) => {
            let (config, _path) =
                Config::setup_interactive().context("Interactive setup failed")?;
            println!(
                "Run `cropsafe` to open the dashboard for '{}'.",
                config.farm.name
            );
            return Ok(());
        }
        other => other,
    };

    let config = Config::load(config_path.as_ref()).context("Failed to load configuration")?;

    let clock: Arc<dyn Clock> = match as_of {
        Some(date) => {
            tracing::info!(%date, "Using fixed evaluation date");
            Arc::new(FixedClock::on(date))
        }
        None => Arc::new(SystemClock),
    };

    let db_path = Config::db_path(data_dir.as_ref()).context("Failed to resolve data directory")?;
    let db = Database::open(&db_path)
        .with_context(|| format!("Failed to open database at {}", db_path.display()))?;

    match command {
        None => run_tui(config, db, clock).await,
        Some(Commands::Init) => Ok(()),
        Some(Commands::Check) => cmd_check(&config, config_path.as_ref(), &db, clock).await,
        Some(Commands::Log {
            product,
            days,
            date,
            notes,
        }) => cmd_log(&config, &db, clock, product, days, date, notes),
        Some(Commands::List) => cmd_list(&db, clock),
        Some(Commands::Remove { id }) => cmd_remove(&db, clock, &id),
        Some(Commands::Status) => cmd_status(&db, clock),
        Some(Commands::Alerts { rule }) => cmd_alerts(&config, clock, rule.as_deref()).await,
        Some(Commands::Products) => {
            cmd_products(&config);
            Ok(())
        }
    }
}

fn init_logging(verbose: u8, tui: bool, data_dir: Option<&PathBuf>) -> anyhow::Result<()> {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    if tui {
        // The alternate screen owns the terminal, so logs go to a file.
        let log_path = Config::log_path(data_dir).context("Failed to resolve data directory")?;
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
            .with_context(|| format!("Failed to open log file {}", log_path.display()))?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .init();
    }

    Ok(())
}

async fn cmd_check(
    config: &Config,
    config_path: Option<&PathBuf>,
    db: &Database,
    clock: Arc<dyn Clock>,
) -> anyhow::Result<()> {
    match config_path.cloned().or_else(Config::find_config_path) {
        Some(path) => println!("Config:   {} (farm '{}')", path.display(), config.farm.name),
        None => println!("Config:   built-in defaults (run `cropsafe init`)"),
    }

    let applications = db.load().context("Failed to read applications")?;
    println!(
        "Database: {} ({} applications)",
        db.path().display(),
        applications.len()
    );
    println!("Products: {} known", config.product_registry().len());

    let rules: Vec<String> = RiskEngine::new()
        .list_rules()
        .into_iter()
        .map(|(id, name)| format!("{} ({})", id, name))
        .collect();
    println!("Rules:    {}", rules.join(", "));

    let provider = ForecastProvider::from_config(config, clock);
    let reachable = provider.test_connection().await.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Weather connection test failed");
        false
    });
    println!(
        "Weather:  {} {}",
        provider.name(),
        if reachable { "OK" } else { "OFFLINE" }
    );

    let observations = provider
        .fetch_forecast()
        .await
        .context("Failed to fetch forecast")?;
    let alerts = RiskEngine::new().evaluate(&observations);
    println!(
        "Forecast: {} days, {} alerts",
        observations.len(),
        alerts.len()
    );

    Ok(())
}

fn cmd_log(
    config: &Config,
    db: &Database,
    clock: Arc<dyn Clock>,
    product: String,
    days: Option<i64>,
    date: Option<NaiveDate>,
    notes: Option<String>,
) -> anyhow::Result<()> {
    let registry = config.product_registry();
    let days = match days {
        Some(days) => days,
        None => {
            let suggested = registry.suggested_withdrawal_days(&product);
            if registry.lookup_default_withdrawal_days(&product).is_none() {
                println!(
                    "'{}' is not a known product, using {} days (pass --days to override)",
                    product.trim(),
                    suggested
                );
            }
            i64::from(suggested)
        }
    };

    let mut request = ApplicationRequest::new(product, days);
    if let Some(date) = date {
        request = request.applied_on(date);
    }
    if let Some(notes) = notes {
        request = request.with_notes(&notes);
    }

    let mut tracker = WithdrawalTracker::new(db.load()?, clock);
    let created = tracker.add(request)?;
    db.save(tracker.applications())
        .context("Failed to save applications")?;

    let status = tracker.status_of(&created);
    println!(
        "Logged {} [{}] applied {}, safe to harvest on {} ({})",
        created.product_name,
        created.short_id(),
        created.applied_date.format("%Y-%m-%d"),
        created.safe_date.format("%Y-%m-%d"),
        status.label()
    );
    Ok(())
}

fn cmd_list(db: &Database, clock: Arc<dyn Clock>) -> anyhow::Result<()> {
    let tracker = WithdrawalTracker::new(db.load()?, clock);
    if tracker.is_empty() {
        println!("No applications recorded.");
        return Ok(());
    }

    println!(
        "{:<8}  {:<10}  {:<20}  {:>4}  {:<10}  {:<12}  Notes",
        "ID", "Applied", "Product", "Days", "Safe On", "Status"
    );
    let today = tracker.today();
    for app in tracker.sorted_for_display() {
        let status = application_status(app, today);
        println!(
            "{:<8}  {:<10}  {:<20}  {:>4}  {:<10}  {:<12}  {}",
            app.short_id(),
            app.applied_date.format("%Y-%m-%d"),
            app.product_name,
            app.withdrawal_days,
            app.safe_date.format("%Y-%m-%d"),
            status.label(),
            app.display_notes()
        );
    }
    Ok(())
}

fn cmd_remove(db: &Database, clock: Arc<dyn Clock>, id: &str) -> anyhow::Result<()> {
    let mut tracker = WithdrawalTracker::new(db.load()?, clock);
    let target = tracker.find_by_prefix(id)?.id;
    let removed = tracker.remove(target)?;
    db.save(tracker.applications())
        .context("Failed to save applications")?;

    println!(
        "Removed {} [{}] applied {}",
        removed.product_name,
        removed.short_id(),
        removed.applied_date.format("%Y-%m-%d")
    );
    Ok(())
}

fn cmd_status(db: &Database, clock: Arc<dyn Clock>) -> anyhow::Result<()> {
    let tracker = WithdrawalTracker::new(db.load()?, clock);
    let today = tracker.today();
    let status = tracker.farm_status(today);

    println!("{} as of {}", status.describe(), today.format("%Y-%m-%d"));
    for (app, days) in tracker.upcoming_clearances(today) {
        println!(
            "  {:<20} safe on {} ({} day{})",
            app.product_name,
            app.safe_date.format("%Y-%m-%d"),
            days,
            if days == 1 { "" } else { "s" }
        );
    }
    Ok(())
}

async fn cmd_alerts(config: &Config, clock: Arc<dyn Clock>, rule: Option<&str>) -> anyhow::Result<()> {
    let provider = ForecastProvider::from_config(config, clock);
    let observations = provider
        .fetch_forecast()
        .await
        .with_context(|| format!("Failed to fetch forecast from {}", provider.name()))?;

    let engine = RiskEngine::new();
    let alerts = match rule {
        Some(id) => {
            if !engine.list_rules().iter().any(|(rule_id, _)| *rule_id == id) {
                let known: Vec<&str> = engine.list_rules().iter().map(|(id, _)| *id).collect();
                bail!("Unknown rule '{}' (expected one of: {})", id, known.join(", "));
            }
            engine.evaluate_rule(id, &observations)
        }
        None => engine.evaluate(&observations),
    };
    let summary = RiskEngine::summarize(&alerts);

    println!("Forecast ({})", provider.name());
    for obs in &observations {
        println!(
            "  {:<12} {:>5.1}°C {:>4.0}% {:>5.1} mm {:>4.0} km/h",
            obs.label, obs.temperature_c, obs.humidity_pct, obs.rainfall_mm, obs.wind_speed_kmh
        );
    }
    println!();

    if alerts.is_empty() {
        println!("All clear - no risks in the forecast");
        return Ok(());
    }

    for alert in &alerts {
        println!(
            "{} [{}] {} ({}): {}",
            alert.risk_level.symbol(),
            alert.risk_level,
            alert.title,
            alert.observation_label,
            alert.description
        );
        println!("    -> {}", alert.recommended_action);
    }
    println!();
    println!(
        "{} alerts: {} high, {} medium, {} low",
        summary.total(),
        summary.high_count,
        summary.medium_count,
        summary.low_count
    );
    Ok(())
}

fn cmd_products(config: &Config) {
    println!("{:<24} Withdrawal days", "Product");
    for (name, days) in config.product_registry().entries() {
        println!("{:<24} {}", name, days);
    }
}

async fn run_tui(config: Config, db: Database, clock: Arc<dyn Clock>) -> anyhow::Result<()> {
    let provider = ForecastProvider::from_config(&config, Arc::clone(&clock));
    let mut app = App::new(config, db, clock).context("Failed to load applications")?;

    match provider.fetch_forecast().await {
        Ok(observations) => {
            app.update_forecast(provider.name(), observations);
            app.set_status(&format!("Weather: {}", provider.name()));
        }
        Err(e) => {
            tracing::warn!("Failed to fetch forecast: {}", e);
            app.set_status(&format!("Forecast failed: {}", e));
        }
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app, &provider).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result.context("TUI exited with an error")
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    app: &mut App,
    provider: &ForecastProvider,
) -> error::Result<()> {
    loop {
        terminal.draw(|f| draw(f, app))?;

        // Handle input with timeout for async operations
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }

                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                    app.quit();
                } else if app.is_editing() {
                    handle_form_input(app, key.code);
                } else {
                    match key.code {
                        KeyCode::Char('q') => app.quit(),
                        KeyCode::Esc => app.switch_screen(Screen::Dashboard),
                        KeyCode::Char(c) => {
                            if let Some(screen) = Screen::from_key(c) {
                                app.switch_screen(screen);
                            } else {
                                handle_screen_input(app, key.code);
                            }
                        }
                        _ => handle_screen_input(app, key.code),
                    }
                }
            }
        }

        if app.needs_refresh {
            app.needs_refresh = false;
            app.refreshing = true;
            terminal.draw(|f| draw(f, app))?;
            match provider.fetch_forecast().await {
                Ok(observations) => {
                    app.update_forecast(provider.name(), observations);
                    app.set_status("Forecast refreshed");
                }
                Err(e) => {
                    tracing::warn!("Forecast refresh failed: {}", e);
                    app.set_status(&format!("Refresh failed: {}", e));
                }
            }
            app.refreshing = false;
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

fn draw(frame: &mut Frame, app: &App) {
    let area = frame.area();
    // one date per frame
    let today = app.tracker.today();

    match app.screen {
        Screen::Dashboard => {
            let upcoming = app.clearance_rows(today);
            let screen = DashboardScreen::new(
                &app.config.farm,
                today,
                app.tracker.farm_status(today),
                &upcoming,
            )
            .with_alerts(&app.alerts, app.summary)
            .with_source(&app.forecast_source)
            .with_status(app.status_message.as_deref());
            frame.render_widget(screen, area);
        }
        Screen::Withdrawals => {
            let rows = app.withdrawal_rows(today);
            let screen = WithdrawalsScreen::new(&rows)
                .with_selection(app.withdrawals_state.selected_index)
                .with_form(app.withdrawals_state.form.as_ref())
                .with_status(app.status_message.as_deref());
            frame.render_widget(screen, area);
        }
        Screen::Alerts => {
            let screen = AlertsScreen::new(&app.observations, &app.alerts)
                .with_summary(app.summary)
                .with_selection(app.alerts_state.selected_index)
                .with_source(&app.forecast_source, app.refreshing);
            frame.render_widget(screen, area);
        }
    }
}

fn handle_screen_input(app: &mut App, code: KeyCode) {
    match app.screen {
        Screen::Dashboard => handle_dashboard_input(app, code),
        Screen::Withdrawals => handle_withdrawals_input(app, code),
        Screen::Alerts => handle_alerts_input(app, code),
    }
}

fn handle_dashboard_input(app: &mut App, code: KeyCode) {
    match code {
        KeyCode::Char('r') => app.request_refresh(),
        KeyCode::Char('a') => {
            // Quick add - jump straight into the form
            app.switch_screen(Screen::Withdrawals);
            app.open_add_form();
        }
        _ => {}
    }
}

fn handle_withdrawals_input(app: &mut App, code: KeyCode) {
    let count = app.tracker.len();
    match code {
        KeyCode::Up => app.withdrawals_state.prev(),
        KeyCode::Down => app.withdrawals_state.next(count),
        KeyCode::Char('a') => app.open_add_form(),
        KeyCode::Char('d') => app.delete_selected(),
        _ => {}
    }
}

fn handle_alerts_input(app: &mut App, code: KeyCode) {
    let count = app.alerts.len();
    match code {
        KeyCode::Up => app.alerts_state.prev(),
        KeyCode::Down => app.alerts_state.next(count),
        KeyCode::Char('r') => app.request_refresh(),
        _ => {}
    }
}

fn handle_form_input(app: &mut App, code: KeyCode) {
    match code {
        KeyCode::Esc => app.cancel_add_form(),
        KeyCode::Enter => app.submit_add_form(),
        _ => {
            let registry = &app.registry;
            let Some(form) = app.withdrawals_state.form.as_mut() else {
                return;
            };
            match code {
                KeyCode::Tab | KeyCode::Down => form.next_field(),
                KeyCode::BackTab | KeyCode::Up => form.prev_field(),
                KeyCode::Left if form.focused == FormField::Product => {
                    form.prev_product(registry)
                }
                KeyCode::Right if form.focused == FormField::Product => {
                    form.next_product(registry)
                }
                KeyCode::Backspace => form.backspace(),
                KeyCode::Char(c) => form.input_char(c),
                _ => {}
            }
        }
    }
}
