//! Interactive menu on lines 1-3.
//!
//! The controller owns the ledger and the navigation state and is the only
//! consumer of the event queue, so events are handled strictly one at a
//! time. While purchase feedback is on screen no event is handled; whatever
//! queued up meanwhile is discarded once the feedback ends.

pub mod nav;
pub mod view;

use anyhow::Result;
use serde_json::json;
use tokio::sync::mpsc;
use tokio::time::sleep;

use crate::config::FeedbackTiming;
use crate::input::Event;
use crate::ledger::BalanceLedger;
use crate::logging::{log, log_dropped_events, obj, v_str, Domain, Level};
use crate::scheduler::MenuLines;
use nav::{Mode, Navigation, Transition};

pub struct MenuController {
    nav: Navigation,
    ledger: BalanceLedger,
    screen: MenuLines,
    feedback: FeedbackTiming,
}

impl MenuController {
    pub fn new(ledger: BalanceLedger, screen: MenuLines, feedback: FeedbackTiming) -> Self {
        let nav = Navigation::new(ledger.selected_index(), ledger.roster().len());
        Self {
            nav,
            ledger,
            screen,
            feedback,
        }
    }

    pub fn navigation(&self) -> &Navigation {
        &self.nav
    }

    pub fn ledger(&self) -> &BalanceLedger {
        &self.ledger
    }

    fn selected_name(&self, selected: usize) -> &str {
        &self.ledger.roster()[selected]
    }

    fn balance_of(&self, name: &str) -> u64 {
        self.ledger.balance(name).unwrap_or_default()
    }

    /// Redraw the rows for the current state.
    pub async fn render(&self) -> Result<()> {
        let rows = match self.nav.mode() {
            Mode::Browsing => view::browsing(self.ledger.roster(), self.nav.selected(), |n| {
                self.balance_of(n)
            }),
            Mode::Confirming => {
                let name = self.selected_name(self.nav.selected());
                view::confirming(name, self.balance_of(name), self.nav.choice())
            }
        };
        self.screen.show(&rows).await
    }

    async fn purchase(&mut self, selected: usize) -> Result<()> {
        let name = self.selected_name(selected).to_string();
        match self.ledger.record_purchase(&name) {
            Ok(balance) => {
                self.screen.show(&view::new_balance(balance)).await?;
                sleep(self.feedback.balance).await;
                self.screen.show(&view::thanks()).await?;
                sleep(self.feedback.thanks).await;
            }
            Err(err) => {
                log(
                    Level::Error,
                    Domain::Ledger,
                    "purchase_failed",
                    obj(&[("name", v_str(&name)), ("error", v_str(&format!("{:#}", err)))]),
                );
                self.screen.show(&view::not_recorded()).await?;
                sleep(self.feedback.failure).await;
            }
        }
        Ok(())
    }

    /// Apply one event and redraw. Device errors are returned.
    pub async fn handle(&mut self, event: Event) -> Result<Transition> {
        let transition = self.nav.apply(event);
        log(
            Level::Debug,
            Domain::Menu,
            "transition",
            obj(&[
                ("event", v_str(event.as_str())),
                ("transition", v_str(&format!("{:?}", transition))),
                ("selected", json!(self.nav.selected())),
            ]),
        );
        if let Transition::Purchase { selected } = transition {
            self.purchase(selected).await?;
        }
        self.render().await?;
        Ok(transition)
    }

    /// Draw the menu, then handle events until every publisher is gone.
    pub async fn run(mut self, mut rx: mpsc::Receiver<Event>) -> Result<()> {
        self.render().await?;
        while let Some(event) = rx.recv().await {
            let transition = self.handle(event).await?;
            if matches!(transition, Transition::Purchase { .. }) {
                let mut stale = 0;
                while rx.try_recv().is_ok() {
                    stale += 1;
                }
                if stale > 0 {
                    log_dropped_events("during_feedback", stale);
                }
            }
        }
        Ok(())
    }
}
