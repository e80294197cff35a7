//! Ambient ticker on line 0.
//!
//! The feed task publishes whole texts into a [`TickerBuffer`]; the render
//! loop picks up the latest text at the start of every cycle and scrolls it
//! through the 20-column viewport.

use anyhow::Result;
use tokio::sync::watch;
use tokio::time::sleep;

use crate::config::TickerTiming;
use crate::layout::scroll_windows;
use crate::scheduler::TickerLine;

/// Latest ticker text. Writers replace it wholesale.
#[derive(Debug)]
pub struct TickerBuffer {
    tx: watch::Sender<String>,
}

impl TickerBuffer {
    pub fn new(placeholder: &str) -> Self {
        let (tx, _rx) = watch::channel(placeholder.to_string());
        Self { tx }
    }

    /// Publish a new text. Returns false when it equals the current one.
    pub fn replace(&self, text: String) -> bool {
        self.tx.send_if_modified(|current| {
            if *current == text {
                false
            } else {
                *current = text;
                true
            }
        })
    }

    pub fn current(&self) -> String {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.tx.subscribe()
    }
}

/// Render one full cycle of `text`. Returns the number of frames written.
pub async fn run_cycle(line: &TickerLine, text: &str, timing: &TickerTiming) -> Result<usize> {
    let frames = scroll_windows(text);
    let mut iter = frames.iter();
    let Some(first) = iter.next() else {
        return Ok(0);
    };

    line.show(first).await?;
    if frames.len() == 1 {
        sleep(timing.still).await;
        return Ok(1);
    }

    sleep(timing.settle).await;
    for frame in iter {
        line.show(frame).await?;
        sleep(timing.step).await;
    }
    sleep(timing.hold).await;
    Ok(frames.len())
}

/// Scroll the buffer's text forever. Only device errors end the loop.
pub async fn run(
    line: TickerLine,
    mut rx: watch::Receiver<String>,
    timing: TickerTiming,
) -> Result<()> {
    loop {
        // A text published mid-cycle starts over at offset 0 on the next pass.
        let text = rx.borrow_and_update().clone();
        run_cycle(&line, &text, &timing).await?;
    }
}
