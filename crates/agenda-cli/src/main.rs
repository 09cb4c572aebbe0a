use std::sync::Arc;

use agenda_alerts::{
    sink_from_kind, AlertStack, DisplayService, EligibilityPoller, PollSettings, PresentationLoop,
    StackSettings, TerminalSurface,
};
use agenda_core::config::AgendaConfig;
use agenda_core::datetime::{
    format_date_for_display, format_time_for_display, parse_date_input, parse_time_input,
};
use agenda_core::{ScheduledItem, View};
use agenda_store::AgendaStore;
use chrono::{Local, Utc};
use clap::Parser;
use tracing::{info, warn};

mod cli;
mod logging;

use cli::{Cli, Command};
use logging::LogTarget;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // load config: --config > AGENDA_CONFIG env > ~/.agenda/agenda.toml
    let config_path = cli.config.clone().or_else(|| std::env::var("AGENDA_CONFIG").ok());
    let loaded = AgendaConfig::load(config_path.as_deref());
    let config = loaded.as_ref().cloned().unwrap_or_default();

    // Held until exit so the file writer flushes.
    let _log_guard = logging::init(&LogTarget::for_command(&cli.command, &config));
    if let Err(e) = &loaded {
        warn!("Config load failed ({}), using defaults", e);
    }
    config.validate()?;

    match cli.command {
        Command::Add {
            date,
            time,
            description,
        } => add(&open_store(&config)?, &date, &time, &description),
        Command::Get { period, json } => get(&open_store(&config)?, period, json),
        Command::Serve => serve(config).await,
        Command::Alert {
            title,
            message,
            time,
        } => alert(&config, &title, &message, &time),
        Command::Window => window(&open_store(&config)?, &config),
    }
}

fn open_store(config: &AgendaConfig) -> anyhow::Result<AgendaStore> {
    let db_path = &config.database.path;
    ensure_parent_dir(db_path);
    info!(path = %db_path, "opening SQLite database");
    Ok(AgendaStore::open(db_path)?)
}

fn add(store: &AgendaStore, date: &str, time: &str, description: &str) -> anyhow::Result<()> {
    let today = Local::now().date_naive();
    let date = parse_date_input(date, today)?;
    let time = parse_time_input(time)?;
    let item = store.add_item(date, time, description)?;
    println!(
        "Added: {} at {} - {}",
        format_date_for_display(&item.date),
        format_time_for_display(&item.time),
        item.description
    );
    Ok(())
}

fn get(store: &AgendaStore, period: View, json: bool) -> anyhow::Result<()> {
    let items = store.items_in(period, &Local::now())?;
    if json {
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }
    if items.is_empty() {
        println!("No agenda items found for {}.", period);
        return Ok(());
    }
    println!("Agenda items for {}:\n", period);
    for (i, item) in items.iter().enumerate() {
        println!("{}. {}", i + 1, describe_when(item));
        println!("   {}\n", item.description);
    }
    Ok(())
}

fn describe_when(item: &ScheduledItem) -> String {
    format!(
        "{} at {}",
        format_date_for_display(&item.date),
        format_time_for_display(&item.time)
    )
}

/// Long-running notifier: poller task plus a blocking display thread.
async fn serve(config: AgendaConfig) -> anyhow::Result<()> {
    let store = Arc::new(open_store(&config)?);
    let stack = AlertStack::new(StackSettings::from_config(&config.display));
    let sink = sink_from_kind(config.notify.sink);

    // Capacity 1: one pending wake is enough, the display drains the stack.
    let (wake_tx, wake_rx) = tokio::sync::mpsc::channel::<()>(1);
    let poller = EligibilityPoller::new(
        store,
        sink,
        stack.clone(),
        PollSettings::from_config(&config.notify),
    )
    .with_wake(wake_tx);

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let poller_task = tokio::spawn(async move { poller.run(shutdown_rx).await });

    let display = DisplayService::new(stack, config.display.clone(), wake_rx, TerminalSurface::new);
    let mut display_task = tokio::task::spawn_blocking(move || display.run_blocking());

    info!(
        log = %logging::log_file_path(&config).display(),
        "agenda notifier running, press Ctrl-C to stop"
    );
    let finished = tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal?;
            info!("shutting down");
            None
        }
        result = &mut display_task => Some(result?),
    };

    // Stopping the poller drops the wake sender, which ends the display thread.
    let _ = shutdown_tx.send(true);
    poller_task.await?;
    let sessions = match finished {
        Some(result) => result?,
        None => display_task.await??,
    };
    info!(sessions, "agenda notifier stopped");
    Ok(())
}

fn alert(config: &AgendaConfig, title: &str, message: &str, time: &str) -> anyhow::Result<()> {
    let stack = AlertStack::new(StackSettings::from_config(&config.display));
    stack.insert(title, message, time);
    let mut presenter = PresentationLoop::new(stack, &config.display);
    let outcome = presenter.run_session(&mut TerminalSurface::new())?;
    info!(?outcome, "alert session finished");
    Ok(())
}

fn window(store: &AgendaStore, config: &AgendaConfig) -> anyhow::Result<()> {
    let now = Utc::now();
    let settings = PollSettings::from_config(&config.notify);
    let window = settings.window_at(now);
    let local = |ts: i64| {
        chrono::DateTime::from_timestamp(ts, 0)
            .map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "invalid".to_string())
    };

    println!("Current time: {} ({})", now.timestamp(), local(now.timestamp()));
    println!("Eligible window:");
    println!("  start: {} ({})", window.start, local(window.start));
    println!("  end:   {} ({})", window.end, local(window.end));
    println!();

    let due = store.fetch_due(&window)?;
    if due.is_empty() {
        println!("No pending items in the window.");
    } else {
        println!("Pending items in the window:");
        for item in &due {
            println!("  #{} {} - {}", item.id, describe_when(item), item.description);
        }
    }

    println!();
    println!("Items this month:");
    for item in store.items_in(View::Month, &Local::now())? {
        println!(
            "  #{} {} ({}) notified={} - {}",
            item.id,
            describe_when(&item),
            local(item.scheduled_at),
            item.notified,
            item.description
        );
    }
    Ok(())
}

fn ensure_parent_dir(path: &str) {
    if let Some(parent) = std::path::Path::new(path).parent() {
        let _ = std::fs::create_dir_all(parent);
    }
}
