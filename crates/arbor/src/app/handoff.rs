//! Terminal handoff for interactive hooks.
//!
//! Interactive hook commands need the real terminal. The input thread is
//! parked at a gate so it stops reading stdin, the alternate screen and
//! raw mode are dropped, the commands run with inherited stdio, and the
//! TUI is restored afterwards.

use std::io::{self, BufRead, Stdout, Write};
use std::sync::{Condvar, Mutex, PoisonError};
use std::time::{Duration, Instant};

use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing::{info, warn};

use crate::hooks::{run_hooks, HandoffRequest, HandoffResult, ProcessHandoff, ProcessRunner, StdioMode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GateState {
    Open,
    PauseRequested,
    Paused,
}

/// Lets the main loop stop the input thread from polling the terminal.
#[derive(Debug)]
pub struct InputGate {
    state: Mutex<GateState>,
    changed: Condvar,
}

impl Default for InputGate {
    fn default() -> Self {
        Self {
            state: Mutex::new(GateState::Open),
            changed: Condvar::new(),
        }
    }
}

impl InputGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called by the input thread before every poll. Blocks while paused.
    pub fn checkpoint(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if *state == GateState::PauseRequested {
            *state = GateState::Paused;
            self.changed.notify_all();
        }
        while *state == GateState::Paused {
            state = self
                .changed
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Ask the input thread to park. Returns false if it did not
    /// acknowledge within `timeout`.
    pub fn pause(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if *state == GateState::Open {
            *state = GateState::PauseRequested;
        }
        while *state == GateState::PauseRequested {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            let (next, _) = self
                .changed
                .wait_timeout(state, deadline - now)
                .unwrap_or_else(PoisonError::into_inner);
            state = next;
        }
        true
    }

    pub fn resume(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        *state = GateState::Open;
        self.changed.notify_all();
    }

    pub fn is_paused(&self) -> bool {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) == GateState::Paused
    }
}

/// Runs hooks on the real terminal, suspending the TUI around them.
pub struct TerminalHandoff<'a> {
    pub terminal: &'a mut Terminal<CrosstermBackend<Stdout>>,
    pub gate: &'a InputGate,
    pub runner: &'a dyn ProcessRunner,
}

/// How long to wait for the input thread to finish its current poll.
const PAUSE_TIMEOUT: Duration = Duration::from_millis(500);

impl TerminalHandoff<'_> {
    fn suspend(&mut self) -> io::Result<()> {
        disable_raw_mode()?;
        self.terminal.backend_mut().execute(LeaveAlternateScreen)?;
        self.terminal.show_cursor()
    }

    fn restore(&mut self) -> io::Result<()> {
        enable_raw_mode()?;
        self.terminal.backend_mut().execute(EnterAlternateScreen)?;
        self.terminal.clear()
    }
}

impl ProcessHandoff for TerminalHandoff<'_> {
    fn run(&mut self, request: &HandoffRequest) -> HandoffResult {
        if !self.gate.pause(PAUSE_TIMEOUT) {
            warn!("input thread did not park before the handoff");
        }
        if let Err(err) = self.suspend() {
            warn!(error = %err, "failed to suspend the terminal");
        }

        info!(hook = %request.kind, commands = request.commands.len(), "running hooks in the terminal");
        let result = run_hooks(self.runner, request, StdioMode::Inherit);

        let mut stdout = io::stdout();
        let _ = writeln!(stdout, "\n{}", result.summary());
        let _ = write!(stdout, "Press Enter to return to arbor");
        let _ = stdout.flush();
        let mut line = String::new();
        if let Err(err) = io::stdin().lock().read_line(&mut line) {
            warn!(error = %err, "failed to read from stdin");
        }

        if let Err(err) = self.restore() {
            warn!(error = %err, "failed to restore the terminal");
        }
        self.gate.resume();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::InputGate;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn pause_times_out_without_a_reader() {
        let gate = InputGate::new();
        assert!(!gate.pause(Duration::from_millis(10)));
        gate.resume();
        assert!(!gate.is_paused());
    }

    #[test]
    fn reader_parks_until_resumed() {
        let gate = Arc::new(InputGate::new());
        let reader = {
            let gate = Arc::clone(&gate);
            std::thread::spawn(move || {
                for _ in 0..200 {
                    gate.checkpoint();
                    std::thread::sleep(Duration::from_millis(1));
                }
            })
        };

        assert!(gate.pause(Duration::from_secs(5)));
        assert!(gate.is_paused());
        gate.resume();
        reader.join().expect("reader thread");
        assert!(!gate.is_paused());
    }
}
