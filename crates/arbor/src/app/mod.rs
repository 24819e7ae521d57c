//! Application orchestration and main event loop.
//!
//! This module owns the core application lifecycle:
//! - Initialization (terminal setup, config loading)
//! - Event loop (input, ticks, completions of deferred commands)
//! - The hook approval protocol and the interactive terminal handoff
//! - Frame composition, including the approval modal overlay
//!
//! The app is structured around a single `App` struct that holds
//! all state. Events are processed sequentially in the main loop.
//!
//! Submodules:
//! - state: App struct and type definitions
//! - runner: main loop and terminal setup
//! - input: event handling and command dispatch
//! - render: frame composition
//! - handoff: input gate and terminal handoff for interactive hooks

mod handoff;
mod input;
mod render;
mod runner;
mod state;


pub use handoff::InputGate;
pub use input::handle_event;
pub use render::render_frame;
pub use runner::run;
pub use state::{App, Banner, HookPhase};
