#![deny(clippy::implicit_return)]
#![allow(clippy::needless_return)]

mod application;
mod configuration;
mod domain;
mod infrastructure;

use std::env;
use std::process;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Error;
use domain::models::Action;
use domain::models::Event;
use domain::models::FinancialSnapshot;
use owo_colors::OwoColorize;
use tokio::sync::mpsc;
use tokio::sync::watch;
use tokio::task;

use crate::application::cli;
use crate::application::ui;
use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::services::actions::ActionsService;
use crate::domain::services::ProactiveMonitor;
use crate::infrastructure::notify::TerminalNotifier;

fn handle_error(err: Error) {
    eprintln!(
        "{}",
        format!(
            "Oh no! Ledgerchat has failed with the following app version and error.\n\nVersion: {}\nError: {}",
            env!("CARGO_PKG_VERSION"),
            err
        )
        .red()
    );

    let backtrace = err.backtrace();
    if backtrace.to_string() == "disabled backtrace" {
        let args = env::args().collect::<Vec<String>>().join(" ");
        eprintln!("\nRunning the following can help explain further what the issue is:");
        eprintln!("\nRUST_BACKTRACE=1 {args}");
    } else {
        eprintln!("\n{}", backtrace);
    }

    process::exit(1);
}

#[tokio::main]
async fn main() {
    let debug_log_dir = env::var("LEDGERCHAT_LOG_DIR").unwrap_or_else(|_| {
        return dirs::cache_dir()
            .unwrap()
            .join("ledgerchat")
            .to_string_lossy()
            .to_string();
    });

    let file_appender = tracing_appender::rolling::never(debug_log_dir, "debug.log");
    let (writer, _guard) = tracing_appender::non_blocking(file_appender);
    if env::var("RUST_LOG")
        .unwrap_or_else(|_| return "".to_string())
        .contains("ledgerchat")
    {
        tracing_subscriber::fmt()
            .json()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(writer)
            .init();
    }

    let ready_res = cli::parse().await;
    if let Err(ready_err) = ready_res {
        handle_error(ready_err);
        return;
    }
    if !ready_res.unwrap() {
        process::exit(0);
    }

    let (action_tx, mut action_rx) = mpsc::unbounded_channel::<Action>();
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<Event>();
    let (snapshot_tx, snapshot_rx) = watch::channel(FinancialSnapshot::default());

    let mut background_futures = task::JoinSet::new();
    background_futures.spawn(async move {
        return ActionsService::start(event_tx, &mut action_rx, snapshot_tx).await;
    });

    let monitor_interval = Config::get(ConfigKey::MonitorInterval)
        .parse::<u64>()
        .unwrap_or(30);
    let monitor = ProactiveMonitor::start(
        snapshot_rx,
        Arc::new(TerminalNotifier::default()),
        Duration::from_secs(monitor_interval),
    );

    let ui_future = ui::start(action_tx, &mut event_rx);

    let res = tokio::select!(
        res = background_futures.join_next() => res.unwrap().unwrap(),
        res = ui_future => res,
    );

    monitor.stop();

    if res.is_err() {
        handle_error(res.unwrap_err());
    }

    process::exit(0);
}
