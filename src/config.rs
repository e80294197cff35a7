use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_FEED_URL: &str = "http://www.tagesschau.de/xml/rss2/";

/// Which event source drives the menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// Line-based keyboard commands on stdin.
    Keyboard,
    /// No local source; the menu only redraws.
    None,
}

/// Timings of the ticker scroll cycle.
#[derive(Debug, Clone)]
pub struct TickerTiming {
    /// Hold on the first window of a scrolling text.
    pub settle: Duration,
    /// Interval between one-character slides.
    pub step: Duration,
    /// Hold on the last window before the next cycle.
    pub hold: Duration,
    /// Hold on a text that fits the line.
    pub still: Duration,
}

/// How long each purchase feedback frame stays up.
#[derive(Debug, Clone)]
pub struct FeedbackTiming {
    pub balance: Duration,
    pub thanks: Duration,
    pub failure: Duration,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub snapshot_path: PathBuf,
    pub log_path: PathBuf,
    pub feed_url: String,
    pub feed_refresh: Duration,
    pub feed_timeout: Duration,
    pub feed_retries: u32,
    pub ticker_placeholder: String,
    pub ticker: TickerTiming,
    pub feedback: FeedbackTiming,
    pub debounce: Duration,
    pub event_queue_capacity: usize,
    pub input: InputKind,
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_ms(key: &str, default: u64) -> Duration {
    Duration::from_millis(env_or(key, default))
}

impl Config {
    pub fn from_env() -> Self {
        let data_dir =
            PathBuf::from(std::env::var("DATA_DIR").unwrap_or_else(|_| "db".to_string()));
        Self {
            snapshot_path: std::env::var("SNAPSHOT_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| data_dir.join("config.json")),
            log_path: std::env::var("LOG_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| data_dir.join("coffee.log")),
            feed_url: std::env::var("FEED_URL").unwrap_or_else(|_| DEFAULT_FEED_URL.to_string()),
            feed_refresh: Duration::from_secs(env_or("FEED_REFRESH_SECS", 300)),
            feed_timeout: Duration::from_secs(env_or("FEED_TIMEOUT_SECS", 10)),
            feed_retries: env_or("FEED_RETRIES", 2),
            ticker_placeholder: std::env::var("TICKER_PLACEHOLDER")
                .unwrap_or_else(|_| "Loading news...".to_string()),
            ticker: TickerTiming {
                settle: env_ms("TICKER_SETTLE_MS", 2000),
                step: env_ms("TICKER_STEP_MS", 400),
                hold: env_ms("TICKER_HOLD_MS", 3000),
                still: env_ms("TICKER_STILL_MS", 4000),
            },
            feedback: FeedbackTiming {
                balance: env_ms("FEEDBACK_BALANCE_MS", 3000),
                thanks: env_ms("FEEDBACK_THANKS_MS", 2000),
                failure: env_ms("FEEDBACK_FAILURE_MS", 3000),
            },
            debounce: env_ms("DEBOUNCE_MS", 300),
            event_queue_capacity: env_or::<usize>("EVENT_QUEUE_CAP", 16).max(1),
            input: match std::env::var("INPUT").unwrap_or_default().to_lowercase().as_str() {
                "none" | "off" => InputKind::None,
                _ => InputKind::Keyboard,
            },
        }
    }
}
