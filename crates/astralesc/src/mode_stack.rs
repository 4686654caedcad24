use log::{trace, warn};

use crate::grammar::Mode;

/// The nesting of grammatical units at the current input position.
///
/// Never empty: the bottom entry is always [`Mode::TopLevel`].
#[derive(Debug, Clone)]
pub(crate) struct ModeStack {
    modes: Vec<Mode>,
}

impl ModeStack {
    pub(crate) fn new() -> Self {
        Self {
            modes: vec![Mode::TopLevel],
        }
    }

    pub(crate) fn top(&self) -> Mode {
        self.modes.last().copied().unwrap_or(Mode::TopLevel)
    }

    pub(crate) fn depth(&self) -> usize {
        self.modes.len()
    }

    pub(crate) fn push(&mut self, mode: Mode) {
        trace!("enter {mode:?} at depth {}", self.modes.len());
        self.modes.push(mode);
    }

    /// Leaves the current unit. Popping the top-level mode is ignored.
    pub(crate) fn pop(&mut self) {
        if self.modes.len() <= 1 {
            warn!("ignoring pop of the top-level mode");
            return;
        }
        if let Some(mode) = self.modes.pop() {
            trace!("leave {mode:?} at depth {}", self.modes.len());
        }
    }
}
