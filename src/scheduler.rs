//! Serialized access to the one display device.
//!
//! Producers never touch the device directly. The ticker gets a
//! [`TickerLine`] that can only write line 0, the menu gets [`MenuLines`]
//! that can only write lines 1-3. Each write takes the device lock for the
//! duration of that single write, so the two streams interleave line by line.

use anyhow::Result;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::display::Display;
use crate::layout::{fit, LINES};

/// First line owned by the menu.
pub const MENU_FIRST_LINE: usize = 1;
/// Lines owned by the menu.
pub const MENU_ROWS: usize = LINES - MENU_FIRST_LINE;
pub const TICKER_LINE: usize = 0;

const MAINTENANCE_BANNER: [&str; LINES] = [
    "Sorry for the",
    "inconvenience.",
    "Maintenance in",
    "progress...",
];

#[derive(Clone)]
pub struct DisplayScheduler {
    device: Arc<Mutex<Box<dyn Display>>>,
}

impl DisplayScheduler {
    pub fn new(device: Box<dyn Display>) -> Self {
        Self {
            device: Arc::new(Mutex::new(device)),
        }
    }

    async fn write(&self, line: usize, text: &str) -> Result<()> {
        let text = fit(text);
        let mut device = self.device.lock().await;
        device.render_line(&text, line).await
    }

    /// Clear the panel and switch the backlight on.
    pub async fn power_on(&self) -> Result<()> {
        let mut device = self.device.lock().await;
        device.clear().await?;
        device.set_backlight(true).await
    }

    /// Replace the whole panel with the maintenance notice.
    pub async fn maintenance_banner(&self) -> Result<()> {
        self.device.lock().await.clear().await?;
        for (line, text) in MAINTENANCE_BANNER.iter().enumerate() {
            self.write(line, text).await?;
        }
        Ok(())
    }

    pub fn ticker(&self) -> TickerLine {
        TickerLine {
            scheduler: self.clone(),
        }
    }

    pub fn menu(&self) -> MenuLines {
        MenuLines {
            scheduler: self.clone(),
        }
    }
}

/// Write access to the ticker line.
#[derive(Clone)]
pub struct TickerLine {
    scheduler: DisplayScheduler,
}

impl TickerLine {
    pub async fn show(&self, text: &str) -> Result<()> {
        self.scheduler.write(TICKER_LINE, text).await
    }
}

/// Write access to the menu lines.
#[derive(Clone)]
pub struct MenuLines {
    scheduler: DisplayScheduler,
}

impl MenuLines {
    /// Draw all menu rows, top to bottom.
    pub async fn show(&self, rows: &[String; MENU_ROWS]) -> Result<()> {
        for (row, text) in rows.iter().enumerate() {
            self.scheduler.write(MENU_FIRST_LINE + row, text).await?;
        }
        Ok(())
    }
}
