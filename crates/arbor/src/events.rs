//! Application event types.
//!
//! Events flow through one mpsc channel into the main loop: key presses
//! and resizes from the input thread, ticks for spinner animation, and
//! completions of deferred commands from worker threads. They are handled
//! strictly one at a time.

use crossterm::event::KeyEvent;

use crate::commands::{Outcome, Ticket};

#[derive(Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Tick,
    /// New terminal size as (columns, rows).
    Resize(u16, u16),
    Completed { ticket: Ticket, outcome: Outcome },
}
