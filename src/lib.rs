//! Coffee terminal: a per-user coffee tally behind a rotary-encoder menu on
//! a 20x4 character display, with a news ticker on the top line.

pub mod config;
pub mod display;
pub mod feed;
pub mod input;
pub mod layout;
pub mod ledger;
pub mod logging;
pub mod menu;
pub mod retry;
pub mod scheduler;
pub mod supervisor;
pub mod ticker;
