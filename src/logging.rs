//! Structured logging for the terminal.
//!
//! Every record is one JSON line: mirrored to stdout and appended to the
//! run directory (`LOG_DIR/RUN_ID/events.jsonl`, trace/debug records go to
//! `trace.jsonl`). Records carry a process-wide sequence number so a log can
//! be replayed in order even when timestamps collide.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fs::{create_dir_all, File};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::process;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, OnceLock};

// =============================================================================
// Log Levels
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Trace = 0,
    Debug = 1,
    Info = 2,
    Warn = 3,
    Error = 4,
}

impl Level {
    pub fn from_env() -> Self {
        match std::env::var("LOG_LEVEL").as_deref() {
            Ok("trace") => Level::Trace,
            Ok("debug") => Level::Debug,
            Ok("info") => Level::Info,
            Ok("warn") => Level::Warn,
            Ok("error") => Level::Error,
            _ => Level::Info,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Trace => "trace",
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
        }
    }
}

// =============================================================================
// Log Domains (categories for filtering)
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    System,  // Startup, shutdown, task supervision
    Ledger,  // Reconciliation, purchases
    Menu,    // Navigation transitions
    Display, // Device writes
    Feed,    // Ticker source refresh
    Input,   // Encoder / keyboard events
}

impl Domain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::System => "system",
            Domain::Ledger => "ledger",
            Domain::Menu => "menu",
            Domain::Display => "display",
            Domain::Feed => "feed",
            Domain::Input => "input",
        }
    }

    pub fn is_enabled(&self) -> bool {
        // LOG_DOMAINS: comma-separated list or "all"
        match std::env::var("LOG_DOMAINS").as_deref() {
            Ok("all") | Err(_) => true,
            Ok(domains) => domains.split(',').any(|d| d.trim() == self.as_str()),
        }
    }
}

// =============================================================================
// Run context
// =============================================================================

static LOG_SEQ: AtomicU64 = AtomicU64::new(0);
static RUN_CONTEXT: OnceLock<RunContext> = OnceLock::new();

fn next_seq() -> u64 {
    LOG_SEQ.fetch_add(1, Ordering::SeqCst)
}

#[derive(Debug)]
struct RunContext {
    run_id: String,
    events: Option<Mutex<BufWriter<File>>>,
    trace: Option<Mutex<BufWriter<File>>>,
}

fn open_sink(path: PathBuf) -> Option<Mutex<BufWriter<File>>> {
    match File::create(&path) {
        Ok(file) => Some(Mutex::new(BufWriter::new(file))),
        Err(err) => {
            eprintln!("[log] failed to create {}: {}", path.display(), err);
            None
        }
    }
}

fn ensure_run_context() -> &'static RunContext {
    RUN_CONTEXT.get_or_init(|| {
        let run_id = std::env::var("RUN_ID")
            .unwrap_or_else(|_| format!("r-{}-{}", ts_epoch_ms(), process::id()));
        let base = std::env::var("LOG_DIR").unwrap_or_else(|_| "out/runs".to_string());
        let mut run_dir = PathBuf::from(base);
        run_dir.push(&run_id);
        if let Err(err) = create_dir_all(&run_dir) {
            eprintln!("[log] failed to create run dir: {}", err);
        }

        let _ = std::fs::write(
            run_dir.join("manifest.json"),
            json!({
                "run_id": run_id,
                "ts": ts_now(),
                "pid": process::id(),
                "log_dir": run_dir.to_string_lossy(),
            })
            .to_string(),
        );

        RunContext {
            events: open_sink(run_dir.join("events.jsonl")),
            trace: open_sink(run_dir.join("trace.jsonl")),
            run_id,
        }
    })
}

fn write_line(writer: &Option<Mutex<BufWriter<File>>>, line: &str) {
    if let Some(Ok(mut w)) = writer.as_ref().map(|m| m.lock()) {
        let _ = writeln!(w, "{}", line);
        let _ = w.flush();
    }
}

// =============================================================================
// Core logging functions
// =============================================================================

/// RFC3339 timestamp with milliseconds
pub fn ts_now() -> String {
    Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

/// Epoch milliseconds
pub fn ts_epoch_ms() -> u64 {
    Utc::now().timestamp_millis() as u64
}

/// Emit a structured log entry
pub fn log(level: Level, domain: Domain, event: &str, fields: Map<String, Value>) {
    if level < Level::from_env() || !domain.is_enabled() {
        return;
    }
    emit_record(level, domain.as_str(), event, fields);
}

fn emit_record(level: Level, component: &str, event: &str, mut fields: Map<String, Value>) {
    let ctx = ensure_run_context();

    let msg = fields.remove("msg").unwrap_or(Value::String(String::new()));
    let mut entry = Map::new();
    entry.insert("ts".to_string(), json!(ts_now()));
    entry.insert("run_id".to_string(), json!(ctx.run_id.clone()));
    entry.insert("seq".to_string(), json!(next_seq()));
    entry.insert("lvl".to_string(), json!(level.as_str().to_uppercase()));
    entry.insert("component".to_string(), json!(component));
    entry.insert("event".to_string(), json!(event));
    entry.insert("msg".to_string(), msg);
    entry.insert("data".to_string(), Value::Object(fields));

    let line = Value::Object(entry).to_string();
    match level {
        Level::Trace | Level::Debug => write_line(&ctx.trace, &line),
        _ => write_line(&ctx.events, &line),
    }
    println!("{}", line);
}

// =============================================================================
// Session counters
// =============================================================================

static PURCHASES: AtomicU64 = AtomicU64::new(0);
static DROPPED_EVENTS: AtomicU64 = AtomicU64::new(0);
static FEED_FAILURES: AtomicU64 = AtomicU64::new(0);

// =============================================================================
// Domain-Specific Logging Helpers
// =============================================================================

/// Outcome of the startup log replay
pub fn log_reconcile(replayed: usize, skipped: usize, accounts: usize) {
    log(
        Level::Info,
        Domain::Ledger,
        "reconciled",
        obj(&[
            ("replayed", json!(replayed)),
            ("skipped", json!(skipped)),
            ("accounts", json!(accounts)),
        ]),
    );
}

pub fn log_unknown_entry(line_no: usize, entry: &str) {
    log(
        Level::Warn,
        Domain::Ledger,
        "unknown_entry",
        obj(&[
            ("msg", v_str("log entry matches no known user, skipped")),
            ("line", json!(line_no)),
            ("entry", v_str(entry)),
        ]),
    );
}

pub fn log_purchase(name: &str, balance: u64) {
    PURCHASES.fetch_add(1, Ordering::Relaxed);
    log(
        Level::Info,
        Domain::Ledger,
        "purchase",
        obj(&[("name", v_str(name)), ("balance", json!(balance))]),
    );
}

pub fn log_feed_refresh(entries: usize, chars: usize) {
    log(
        Level::Info,
        Domain::Feed,
        "refreshed",
        obj(&[("entries", json!(entries)), ("chars", json!(chars))]),
    );
}

pub fn log_feed_failure(reason: &str) {
    FEED_FAILURES.fetch_add(1, Ordering::Relaxed);
    log(
        Level::Warn,
        Domain::Feed,
        "refresh_failed",
        obj(&[
            ("msg", v_str("keeping previous ticker text")),
            ("reason", v_str(reason)),
        ]),
    );
}

pub fn log_dropped_events(reason: &str, count: usize) {
    DROPPED_EVENTS.fetch_add(count as u64, Ordering::Relaxed);
    log(
        Level::Warn,
        Domain::Input,
        "events_dropped",
        obj(&[("reason", v_str(reason)), ("count", json!(count))]),
    );
}

/// Session summary on shutdown
pub fn log_session_summary(reason: &str) {
    log(
        Level::Info,
        Domain::System,
        "session_summary",
        obj(&[
            ("reason", v_str(reason)),
            ("purchases", json!(PURCHASES.load(Ordering::Relaxed))),
            ("dropped_events", json!(DROPPED_EVENTS.load(Ordering::Relaxed))),
            ("feed_failures", json!(FEED_FAILURES.load(Ordering::Relaxed))),
        ]),
    );
}

// =============================================================================
// Field helpers
// =============================================================================

pub fn obj(pairs: &[(&str, Value)]) -> Map<String, Value> {
    let mut map = Map::new();
    for (k, v) in pairs {
        map.insert((*k).to_string(), v.clone());
    }
    map
}

pub fn v_str(s: &str) -> Value {
    Value::String(s.to_string())
}
