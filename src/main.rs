//! # daybell — local reminder daemon with a console front end
//!
//! The poll worker runs in the background; this binary owns the
//! foreground presentation context. Due alerts arrive as fire events on
//! a channel, are printed as a modal-style prompt, and the next input
//! line acknowledges them — only then does the dedup mark become
//! durable.
//!
//! Usage:
//!   daybell                    # run with ~/.daybell/config.toml
//!   daybell --interval 10      # override poll cadence (5..600 s)
//!   daybell --verbose          # debug logging

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, Mutex};
use tracing_subscriber::EnvFilter;

use daybell::config::clamp_interval;
use daybell::schedule::DAY_NAMES;
use daybell::{
    ChannelNotifier, DaybellConfig, DaybellError, FireEvent, PollWorker, Schedule, ScheduleStore,
    SystemClock,
};

#[derive(Parser)]
#[command(name = "daybell", version, about = "🔔 daybell — local recurring reminders")]
struct Cli {
    /// Poll cadence in seconds (5..600); overrides the config file
    #[arg(short, long)]
    interval: Option<u64>,

    /// Path to a config file (default: ~/.daybell/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory holding schedules.json (default: from config)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "daybell=debug" } else { "daybell=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    let config = match &cli.config {
        Some(path) => DaybellConfig::load_from(path)?,
        None => DaybellConfig::load(),
    };
    let tz = config.tz();
    let interval = Arc::new(AtomicU64::new(clamp_interval(
        cli.interval.unwrap_or(config.poll_interval_secs),
    )));
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data_dir());
    let store = Arc::new(Mutex::new(ScheduleStore::open(&data_dir)));

    let (notifier, fire_rx) = ChannelNotifier::new(8);
    let worker = PollWorker::new(
        store.clone(),
        Arc::new(SystemClock::new(tz)),
        Arc::new(notifier),
        interval.clone(),
        config.lead_secs,
    );
    let handle = worker.spawn();

    run_console(&store, fire_rx, &interval).await?;

    handle.stop(Duration::from_secs(5)).await;
    Ok(())
}

/// Foreground loop: drains fire events and reads commands. While an
/// alert is up, the next input line acknowledges it; commands resume
/// afterwards.
async fn run_console(
    store: &Mutex<ScheduleStore>,
    mut fire_rx: mpsc::Receiver<FireEvent>,
    interval: &AtomicU64,
) -> Result<()> {
    println!("daybell — type 'help' for commands");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut pending: Option<FireEvent> = None;

    loop {
        tokio::select! {
            event = fire_rx.recv(), if pending.is_none() => {
                let Some(event) = event else { break };
                println!();
                println!("🔔 REMINDER: {}", event.title);
                println!("   (due at {})", event.target.format("%Y-%m-%d %H:%M:%S %Z"));
                println!("   press Enter to acknowledge");
                pending = Some(event);
            }
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if let Some(event) = pending.take() {
                    // Any input acknowledges the alert on screen.
                    let _ = event.ack.send(());
                    continue;
                }
                if !handle_command(store, interval, line.trim()).await {
                    break;
                }
            }
        }
    }
    Ok(())
}

/// Execute one console command; returns false on quit.
async fn handle_command(store: &Mutex<ScheduleStore>, interval: &AtomicU64, line: &str) -> bool {
    let mut parts = line.split_whitespace();
    match parts.next() {
        None => true,
        Some("help") => {
            println!("  add <HH:MM[:SS]> <days> <title>   days: mon,fri | daily | weekdays | weekend");
            println!("  list                              show all schedules");
            println!("  rm <n>                            delete schedule n");
            println!("  toggle <n>                        enable/disable schedule n");
            println!("  interval <secs>                   set poll cadence (5..600)");
            println!("  quit                              exit");
            true
        }
        Some("list") => {
            let guard = store.lock().await;
            if guard.is_empty() {
                println!("no schedules");
            }
            for (i, s) in guard.schedules().iter().enumerate() {
                println!(
                    "  [{i}] {:<24} {:<9} {:<14} {:<3} last: {}",
                    s.title,
                    s.time_str,
                    s.days_label(),
                    if s.active { "on" } else { "off" },
                    s.last_fired_date
                        .map(|d| d.to_string())
                        .unwrap_or_else(|| "-".into()),
                );
            }
            true
        }
        Some("add") => {
            let (time_str, days_str) = match (parts.next(), parts.next()) {
                (Some(t), Some(d)) => (t, d),
                _ => {
                    println!("usage: add <HH:MM[:SS]> <days> <title>");
                    return true;
                }
            };
            let title = parts.collect::<Vec<_>>().join(" ");
            let parsed = parse_days(days_str).and_then(|days| Schedule::new(&title, time_str, &days));
            match parsed {
                Ok(schedule) => {
                    let title = schedule.title.clone();
                    match store.lock().await.add(schedule) {
                        Ok(()) => println!("added '{title}'"),
                        Err(e) => println!("error: {e}"),
                    }
                }
                Err(e) => println!("error: {e}"),
            }
            true
        }
        Some("rm") => {
            with_index(parts.next(), |index| async move {
                match store.lock().await.remove(index) {
                    Ok(removed) => println!("removed '{}'", removed.title),
                    Err(e) => println!("error: {e}"),
                }
            })
            .await;
            true
        }
        Some("toggle") => {
            with_index(parts.next(), |index| async move {
                match store.lock().await.toggle(index) {
                    Ok(state) => println!("schedule {index} is now {}", if state { "on" } else { "off" }),
                    Err(e) => println!("error: {e}"),
                }
            })
            .await;
            true
        }
        Some("interval") => {
            match parts.next().and_then(|v| v.parse::<u64>().ok()) {
                Some(secs) => {
                    let clamped = clamp_interval(secs);
                    interval.store(clamped, Ordering::Relaxed);
                    println!("poll cadence set to {clamped}s (applies after the current sleep)");
                }
                None => println!("usage: interval <secs>"),
            }
            true
        }
        Some("quit") | Some("exit") => false,
        Some(other) => {
            println!("unknown command '{other}' — try 'help'");
            true
        }
    }
}

async fn with_index<F, Fut>(arg: Option<&str>, f: F)
where
    F: FnOnce(usize) -> Fut,
    Fut: std::future::Future<Output = ()>,
{
    match arg.and_then(|v| v.parse::<usize>().ok()) {
        Some(index) => f(index).await,
        None => println!("expected a schedule index"),
    }
}

/// Parse a day spec: `daily`, `weekdays`, `weekend`, or a comma list of
/// names/digits (`mon,fri` / `0,4`).
fn parse_days(spec: &str) -> daybell::Result<Vec<u8>> {
    match spec.to_ascii_lowercase().as_str() {
        "daily" | "all" => return Ok((0..=6).collect()),
        "weekdays" => return Ok((0..=4).collect()),
        "weekend" => return Ok(vec![5, 6]),
        _ => {}
    }
    spec.split(',')
        .map(|day| {
            let day = day.trim().to_ascii_lowercase();
            if let Ok(n) = day.parse::<u8>() {
                return Ok(n);
            }
            DAY_NAMES
                .iter()
                .position(|name| name.eq_ignore_ascii_case(&day))
                .map(|i| i as u8)
                .ok_or_else(|| DaybellError::Validation(format!("unknown weekday '{day}'")))
        })
        .collect()
}
