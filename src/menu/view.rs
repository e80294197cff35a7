use super::nav::Choice;
use crate::layout::balance_cell;
use crate::scheduler::MENU_ROWS;

pub type Rows = [String; MENU_ROWS];

const CURSOR: &str = "> ";
const BLANK: &str = "  ";
const PICKED: &str = "* ";

/// Three names centered on `selected`, wrapping around the roster ends.
pub fn browsing(roster: &[String], selected: usize, balance: impl Fn(&str) -> u64) -> Rows {
    let len = roster.len().max(1);
    let at = |offset: usize| roster[(selected + offset) % len].as_str();
    let prev = at(len - 1);
    let cur = at(0);
    let next = at(1);
    [
        balance_cell(BLANK, prev, balance(prev)),
        balance_cell(CURSOR, cur, balance(cur)),
        balance_cell(BLANK, next, balance(next)),
    ]
}

/// The picked user with the Confirm/Cancel prompt below.
pub fn confirming(name: &str, balance: u64, choice: Choice) -> Rows {
    let (confirm, cancel) = match choice {
        Choice::Confirm => (CURSOR, BLANK),
        Choice::Cancel => (BLANK, CURSOR),
    };
    [
        balance_cell(PICKED, name, balance),
        format!("{}Confirm", confirm),
        format!("{}Cancel", cancel),
    ]
}

pub fn new_balance(balance: u64) -> Rows {
    ["New Balance:".to_string(), balance.to_string(), String::new()]
}

pub fn thanks() -> Rows {
    [
        "Thank you for".to_string(),
        "choosing the".to_string(),
        "Coffee-Terminal".to_string(),
    ]
}

pub fn not_recorded() -> Rows {
    [
        "Not recorded.".to_string(),
        "Please try again".to_string(),
        "later.".to_string(),
    ]
}
