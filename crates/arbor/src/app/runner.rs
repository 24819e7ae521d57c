//! Application runner and event loop.
//!
//! Handles terminal setup/teardown and the main event loop.
//! Events are read from an mpsc channel and dispatched to handlers.

use std::io;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{self, Event};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing::{debug, info};

use crate::commands::Outcome;
use crate::config::ConfigStore;
use crate::events::AppEvent;
use crate::git::Repository;
use crate::hooks::{ProcessHandoff, ShellRunner};
use crate::ui::theme::Theme;

use super::handoff::{InputGate, TerminalHandoff};
use super::state::App;

/// Interval between ticks when no input arrives.
const TICK_RATE: Duration = Duration::from_millis(100);

/// Entry point: set up terminal and run the event loop. Returns the
/// worktree the user chose, if any.
pub fn run(
    repo: Arc<dyn Repository>,
    store: Arc<dyn ConfigStore>,
) -> io::Result<Option<PathBuf>> {
    let mut stdout = io::stdout();
    enable_raw_mode()?;
    stdout.execute(EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_loop(&mut terminal, repo, store);

    disable_raw_mode()?;
    terminal.backend_mut().execute(LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

/// Main event loop: process events until quit.
fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    repo: Arc<dyn Repository>,
    store: Arc<dyn ConfigStore>,
) -> io::Result<Option<PathBuf>> {
    let (event_tx, event_rx) = mpsc::channel::<AppEvent>();
    let gate = Arc::new(InputGate::new());
    spawn_input_thread(event_tx.clone(), Arc::clone(&gate));

    let mut app = App::new(repo, store, Arc::new(ShellRunner), Theme::default(), event_tx.clone());
    let size = terminal.size()?;
    super::input::handle_event(&mut app, AppEvent::Resize(size.width, size.height));
    app.start();

    terminal.clear()?;
    terminal.draw(|frame| super::render::render(&app, frame))?;

    while !app.should_quit {
        let event = match event_rx.recv() {
            Ok(event) => event,
            Err(_) => break,
        };
        super::input::handle_event(&mut app, event);
        // Drain any pending events before redraw
        while let Ok(event) = event_rx.try_recv() {
            super::input::handle_event(&mut app, event);
        }

        if let Some((ticket, request)) = app.take_handoff() {
            let result = {
                let mut handoff = TerminalHandoff {
                    terminal: &mut *terminal,
                    gate: &gate,
                    runner: &*app.runner,
                };
                handoff.run(&request)
            };
            drop_queued_keys(&event_rx, &mut app);
            super::input::handle_event(
                &mut app,
                AppEvent::Completed {
                    ticket,
                    outcome: Outcome::HooksFinished(result),
                },
            );
            let size = terminal.size()?;
            super::input::handle_event(&mut app, AppEvent::Resize(size.width, size.height));
        }

        terminal.draw(|frame| super::render::render(&app, frame))?;
    }
    info!(chosen = ?app.chosen, "exiting");
    Ok(app.chosen.take())
}

/// Keys typed while the hooks owned the terminal are not meant for the
/// TUI. Everything else is still handled.
fn drop_queued_keys(event_rx: &Receiver<AppEvent>, app: &mut App) {
    while let Ok(event) = event_rx.try_recv() {
        match event {
            AppEvent::Key(key) => debug!(?key, "dropping key typed during handoff"),
            other => super::input::handle_event(app, other),
        }
    }
}

/// Spawn a thread to read terminal input events.
fn spawn_input_thread(sender: Sender<AppEvent>, gate: Arc<InputGate>) {
    std::thread::spawn(move || loop {
        gate.checkpoint();
        let event = match event::poll(TICK_RATE) {
            Ok(true) => match event::read() {
                Ok(Event::Key(key)) => AppEvent::Key(key),
                Ok(Event::Resize(cols, rows)) => AppEvent::Resize(cols, rows),
                Ok(_) => continue,
                Err(_) => break,
            },
            Ok(false) => AppEvent::Tick,
            Err(_) => break,
        };
        if sender.send(event).is_err() {
            break;
        }
    });
}
