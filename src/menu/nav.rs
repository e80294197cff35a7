use crate::input::Event;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Browsing,
    Confirming,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    Confirm,
    Cancel,
}

impl Choice {
    /// Highlighted when the confirmation prompt opens.
    pub const DEFAULT: Choice = Choice::Confirm;

    pub fn toggled(self) -> Self {
        match self {
            Choice::Confirm => Choice::Cancel,
            Choice::Cancel => Choice::Confirm,
        }
    }
}

/// What an event did to the navigation state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Selection moved while browsing.
    Moved { selected: usize },
    /// Prompt opened for the selected user.
    Prompted { selected: usize },
    /// Prompt highlight changed.
    Toggled { choice: Choice },
    /// Purchase confirmed for the selected user; state is back to browsing.
    Purchase { selected: usize },
    /// Prompt dismissed; state is back to browsing.
    Cancelled { selected: usize },
}

/// Menu state machine over a roster of fixed size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    selected: usize,
    len: usize,
    mode: Mode,
    choice: Choice,
}

impl Navigation {
    /// Start browsing at `initial`, clamped into the roster.
    pub fn new(initial: i64, len: usize) -> Self {
        let len = len.max(1);
        let selected = initial.clamp(0, len as i64 - 1) as usize;
        Self {
            selected,
            len,
            mode: Mode::Browsing,
            choice: Choice::DEFAULT,
        }
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn choice(&self) -> Choice {
        self.choice
    }

    pub fn apply(&mut self, event: Event) -> Transition {
        match (self.mode, event) {
            (Mode::Browsing, Event::RotateUp) => {
                self.selected = (self.selected + 1) % self.len;
                Transition::Moved {
                    selected: self.selected,
                }
            }
            (Mode::Browsing, Event::RotateDown) => {
                self.selected = (self.selected + self.len - 1) % self.len;
                Transition::Moved {
                    selected: self.selected,
                }
            }
            (Mode::Browsing, Event::ShortPress | Event::LongPress) => {
                self.mode = Mode::Confirming;
                self.choice = Choice::DEFAULT;
                Transition::Prompted {
                    selected: self.selected,
                }
            }
            (Mode::Confirming, Event::RotateUp | Event::RotateDown) => {
                self.choice = self.choice.toggled();
                Transition::Toggled {
                    choice: self.choice,
                }
            }
            (Mode::Confirming, Event::ShortPress | Event::LongPress) => {
                self.mode = Mode::Browsing;
                match self.choice {
                    Choice::Confirm => Transition::Purchase {
                        selected: self.selected,
                    },
                    Choice::Cancel => Transition::Cancelled {
                        selected: self.selected,
                    },
                }
            }
        }
    }
}
