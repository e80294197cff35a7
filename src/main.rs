use anyhow::{anyhow, Result};
use serde_json::json;
use std::sync::Arc;

use coffee_terminal::config::{Config, InputKind};
use coffee_terminal::display::ConsoleDisplay;
use coffee_terminal::feed::{self, FeedSource, RssFeed, StaticFeed};
use coffee_terminal::input;
use coffee_terminal::ledger::BalanceLedger;
use coffee_terminal::logging::{log, log_session_summary, obj, v_str, Domain, Level};
use coffee_terminal::menu::MenuController;
use coffee_terminal::retry::RetryConfig;
use coffee_terminal::scheduler::DisplayScheduler;
use coffee_terminal::supervisor::{Supervisor, TaskExit};
use coffee_terminal::ticker::{self, TickerBuffer};

async fn show_banner(scheduler: &DisplayScheduler) {
    if let Err(err) = scheduler.maintenance_banner().await {
        log(
            Level::Warn,
            Domain::Display,
            "banner_failed",
            obj(&[("error", v_str(&format!("{:#}", err)))]),
        );
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cfg = Config::from_env();
    log(
        Level::Info,
        Domain::System,
        "startup",
        obj(&[
            ("snapshot", v_str(&cfg.snapshot_path.to_string_lossy())),
            ("log", v_str(&cfg.log_path.to_string_lossy())),
            ("feed_url", v_str(&cfg.feed_url)),
            ("event_queue_capacity", json!(cfg.event_queue_capacity)),
        ]),
    );

    let scheduler = DisplayScheduler::new(Box::new(ConsoleDisplay));
    scheduler.power_on().await?;

    let ledger = match BalanceLedger::open(&cfg.snapshot_path, &cfg.log_path) {
        Ok((ledger, _report)) => ledger,
        Err(err) => {
            log(
                Level::Error,
                Domain::Ledger,
                "startup_failed",
                obj(&[("error", v_str(&format!("{:#}", err)))]),
            );
            show_banner(&scheduler).await;
            return Err(err);
        }
    };

    let buffer = TickerBuffer::new(&cfg.ticker_placeholder);
    let source: Arc<dyn FeedSource> = if cfg.feed_url.is_empty() {
        Arc::new(StaticFeed(vec![cfg.ticker_placeholder.clone()]))
    } else {
        Arc::new(RssFeed::new(&cfg.feed_url, cfg.feed_timeout)?)
    };
    let (publisher, events) = input::channel(cfg.event_queue_capacity, cfg.debounce);

    let mut sup = Supervisor::new();
    sup.spawn(
        "ticker",
        ticker::run(scheduler.ticker(), buffer.subscribe(), cfg.ticker.clone()),
    );
    sup.spawn(
        "feed",
        feed::run(
            source,
            buffer,
            cfg.feed_refresh,
            RetryConfig::with_retries(cfg.feed_retries),
        ),
    );
    sup.spawn(
        "menu",
        MenuController::new(ledger, scheduler.menu(), cfg.feedback.clone()).run(events),
    );
    // Without a local source the queue must stay open or the menu task ends.
    let _idle_publisher = match cfg.input {
        InputKind::Keyboard => {
            sup.spawn("keyboard", input::run_keyboard(publisher));
            None
        }
        InputKind::None => Some(publisher),
    };

    let failure = loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break None,
            exit = sup.next_exit() => match exit {
                Some(TaskExit { name, outcome: Err(err) }) => {
                    break Some(anyhow!("{} task failed: {:#}", name, err));
                }
                Some(_) => continue,
                None => break None,
            },
        }
    };

    sup.shutdown().await;
    show_banner(&scheduler).await;
    match failure {
        Some(err) => {
            log_session_summary("task_failure");
            Err(err)
        }
        None => {
            log_session_summary("shutdown");
            Ok(())
        }
    }
}
