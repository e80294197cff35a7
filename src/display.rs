use anyhow::{bail, Result};
use async_trait::async_trait;
use serde_json::json;
use std::sync::{Arc, Mutex};

use crate::layout::LINES;
use crate::logging::{log, obj, v_str, Domain, Level};

/// A character display that takes one whole line at a time.
///
/// Implementations need not be safe for concurrent calls; the scheduler
/// serializes every access.
#[async_trait]
pub trait Display: Send {
    async fn render_line(&mut self, text: &str, line: usize) -> Result<()>;
    async fn clear(&mut self) -> Result<()>;
    async fn set_backlight(&mut self, on: bool) -> Result<()>;
}

/// Stub device for machines without the panel: every write becomes a debug log record.
#[derive(Debug, Default)]
pub struct ConsoleDisplay;

#[async_trait]
impl Display for ConsoleDisplay {
    async fn render_line(&mut self, text: &str, line: usize) -> Result<()> {
        if line >= LINES {
            bail!("line {} out of range", line);
        }
        log(
            Level::Debug,
            Domain::Display,
            "render_line",
            obj(&[("line", json!(line)), ("text", v_str(text))]),
        );
        Ok(())
    }

    async fn clear(&mut self) -> Result<()> {
        log(Level::Debug, Domain::Display, "clear", obj(&[]));
        Ok(())
    }

    async fn set_backlight(&mut self, on: bool) -> Result<()> {
        log(Level::Debug, Domain::Display, "backlight", obj(&[("on", json!(on))]));
        Ok(())
    }
}

/// One call observed by a [`RecordingDisplay`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceOp {
    Line { line: usize, text: String },
    Clear,
    Backlight(bool),
}

/// In-memory device keeping every call and the current frame.
///
/// Clones share the same history, so a test can keep one handle while the
/// scheduler owns the other.
#[derive(Debug, Clone, Default)]
pub struct RecordingDisplay {
    inner: Arc<Mutex<Recording>>,
}

#[derive(Debug, Default)]
struct Recording {
    ops: Vec<DeviceOp>,
    frame: [String; LINES],
    fail_writes: bool,
}

impl RecordingDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ops(&self) -> Vec<DeviceOp> {
        self.inner.lock().map(|r| r.ops.clone()).unwrap_or_default()
    }

    /// Texts written to `line`, oldest first.
    pub fn writes_to(&self, line: usize) -> Vec<String> {
        self.ops()
            .into_iter()
            .filter_map(|op| match op {
                DeviceOp::Line { line: l, text } if l == line => Some(text),
                _ => None,
            })
            .collect()
    }

    /// What the panel currently shows.
    pub fn frame(&self) -> [String; LINES] {
        self.inner.lock().map(|r| r.frame.clone()).unwrap_or_default()
    }

    /// Make every following line write fail.
    pub fn fail_writes(&self, fail: bool) {
        if let Ok(mut r) = self.inner.lock() {
            r.fail_writes = fail;
        }
    }
}

#[async_trait]
impl Display for RecordingDisplay {
    async fn render_line(&mut self, text: &str, line: usize) -> Result<()> {
        let Ok(mut r) = self.inner.lock() else {
            bail!("recording poisoned");
        };
        if r.fail_writes {
            bail!("device write failed");
        }
        if line >= LINES {
            bail!("line {} out of range", line);
        }
        r.frame[line] = text.to_string();
        r.ops.push(DeviceOp::Line {
            line,
            text: text.to_string(),
        });
        Ok(())
    }

    async fn clear(&mut self) -> Result<()> {
        let Ok(mut r) = self.inner.lock() else {
            bail!("recording poisoned");
        };
        r.frame = Default::default();
        r.ops.push(DeviceOp::Clear);
        Ok(())
    }

    async fn set_backlight(&mut self, on: bool) -> Result<()> {
        let Ok(mut r) = self.inner.lock() else {
            bail!("recording poisoned");
        };
        r.ops.push(DeviceOp::Backlight(on));
        Ok(())
    }
}
