//! Event handling and command dispatch.
//!
//! Every event is handled to completion before the next one. Keys go to
//! the approval modal when it is up, otherwise to the active view.
//! Deferred commands returned by views are executed here; their results
//! come back later as `AppEvent::Completed`.

use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tracing::{debug, info, warn};

use crate::commands::{spawn_task, Command, Outcome, Route, Ticket};
use crate::config::ApprovalRecord;
use crate::events::AppEvent;
use crate::flows::{CreationState, DashboardState, FlowContext, InitializationState, View};
use crate::hooks::{
    enter_hook_point, ApprovalDecision, CapturedHandoff, HandoffRequest, HandoffResult, HookEntry,
    HookKind, HookPoint, ProcessHandoff,
};
use crate::project::{detect_hook_suggestions, merge_with_configured};

use super::state::{App, Banner, HookPhase};

pub fn handle_event(app: &mut App, event: AppEvent) {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Tick => {
            app.frame = app.frame.wrapping_add(1);
            app.view.tick();
        }
        AppEvent::Resize(width, height) => {
            app.width = width;
            app.height = height;
            let body = app.body_height();
            app.view.resize(body);
        }
        AppEvent::Completed { ticket, outcome } => handle_completion(app, ticket, outcome),
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    if key.kind == KeyEventKind::Release {
        return;
    }
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    match std::mem::replace(&mut app.hooks, HookPhase::Idle) {
        HookPhase::PendingApproval(state) => {
            resolve_approval(app, state.handle_key(&key));
            return;
        }
        suspended @ HookPhase::Suspended { .. } => {
            debug!("key ignored while the terminal is handed off");
            app.hooks = suspended;
            return;
        }
        phase @ (HookPhase::Idle | HookPhase::Running { .. }) => app.hooks = phase,
    }

    app.banner = None;
    let view = std::mem::take(&mut app.view);
    let ctx = FlowContext {
        repo: app.repo.as_ref(),
        config: &app.config,
    };
    let (view, command) = view.handle_key(&key, &ctx);
    app.view = view;
    if let Some(command) = command {
        dispatch(app, command);
    }
}

fn handle_completion(app: &mut App, ticket: Ticket, outcome: Outcome) {
    match outcome {
        Outcome::HooksFinished(result) => finish_hooks(app, ticket, result),
        outcome if ticket != app.view_ticket => {
            debug!(
                %ticket,
                current = %app.view_ticket,
                outcome = outcome.label(),
                "discarding stale completion"
            );
        }
        outcome => {
            let view = std::mem::take(&mut app.view);
            let ctx = FlowContext {
                repo: app.repo.as_ref(),
                config: &app.config,
            };
            let (view, command) = view.handle_outcome(outcome, &ctx);
            app.view = view;
            if let Some(command) = command {
                dispatch(app, command);
            }
        }
    }
}

pub(super) fn dispatch(app: &mut App, command: Command) {
    let ticket = app.view_ticket;
    match command {
        Command::LoadWorktrees => {
            let repo = Arc::clone(&app.repo);
            spawn_task(&app.event_tx, ticket, move || {
                Outcome::Worktrees(repo.list_worktrees())
            });
        }
        Command::LoadBranches => {
            let repo = Arc::clone(&app.repo);
            spawn_task(&app.event_tx, ticket, move || {
                Outcome::Branches(repo.list_branches())
            });
        }
        Command::CreateWorktree(request) => {
            info!(branch = %request.branch, path = %request.path.display(), "creating worktree");
            let repo = Arc::clone(&app.repo);
            spawn_task(&app.event_tx, ticket, move || {
                Outcome::WorktreeCreated(repo.create_worktree(&request))
            });
        }
        Command::RemoveWorktree {
            path,
            branch,
            force,
        } => {
            info!(path = %path.display(), force, "removing worktree");
            let repo = Arc::clone(&app.repo);
            spawn_task(&app.event_tx, ticket, move || {
                let result = repo.remove_worktree(&path, force);
                Outcome::WorktreeRemoved {
                    path,
                    branch,
                    result,
                }
            });
        }
        Command::SaveProjectConfig(file) => {
            let store = Arc::clone(&app.store);
            let root = app.repo.root().to_path_buf();
            spawn_task(&app.event_tx, ticket, move || {
                Outcome::ConfigSaved(store.save_project_config(&root, &file))
            });
        }
        Command::ReloadConfig => {
            app.config = app.store.load_config(app.repo.root());
            info!("configuration reloaded");
        }
        Command::EnterHookPoint(point) => enter_hooks(app, point),
        Command::Open(route) => open(app, route),
        Command::Choose(path) => {
            info!(path = %path.display(), "worktree chosen");
            app.chosen = Some(path);
            app.should_quit = true;
        }
        Command::Quit => app.should_quit = true,
        Command::Batch(commands) => {
            for command in commands {
                dispatch(app, command);
            }
        }
    }
}

/// Replace the active view. Completions issued for the old view become
/// stale because the view ticket changes.
pub(super) fn open(app: &mut App, route: Route) {
    app.view_ticket = app.issue_ticket();
    let mut view = match route {
        Route::Dashboard => View::Dashboard(DashboardState::default()),
        Route::Create => View::Create(CreationState::default()),
        Route::Init => {
            let configured: Vec<_> = HookKind::ALL
                .iter()
                .flat_map(|kind| {
                    app.config
                        .hooks
                        .for_kind(*kind)
                        .iter()
                        .map(move |hook| (*kind, hook.clone()))
                })
                .collect();
            let suggestions =
                merge_with_configured(detect_hook_suggestions(app.repo.root()), &configured);
            View::Init(InitializationState::new(&app.config, suggestions))
        }
    };
    view.resize(app.body_height());
    app.view = view;
    debug!(view = app.view.name(), ticket = %app.view_ticket, "opened view");
    match route {
        Route::Dashboard => dispatch(app, Command::LoadWorktrees),
        Route::Create => dispatch(app, Command::LoadBranches),
        Route::Init => {}
    }
}

/// A flow reached a hook point: run, prompt, or do nothing.
fn enter_hooks(app: &mut App, point: HookPoint) {
    let commands = app.config.hooks.for_kind(point.kind).to_vec();
    if commands.is_empty() {
        debug!(hook = %point.kind, "no hooks configured");
        return;
    }
    if app.hooks != HookPhase::Idle {
        warn!(hook = %point.kind, "hook point reached while another hook run is active");
        app.banner = Some(Banner::Error(format!(
            "Skipped {} hooks: another hook run is in progress.",
            point.kind
        )));
        return;
    }

    let project = app.project_key();
    // Unreadable approvals count as nothing approved.
    let approvals = match app.store.load_approvals(&project) {
        Ok(record) => record,
        Err(err) => {
            warn!(error = %err, "could not load hook approvals");
            app.banner = Some(Banner::Error(format!(
                "Could not read hook approvals ({err}). Every command needs approval."
            )));
            ApprovalRecord::default()
        }
    };

    match enter_hook_point(point, &commands, &approvals, app.repo.root()) {
        HookEntry::Nothing => {}
        HookEntry::Run(request) => start_hooks(app, request),
        HookEntry::Prompt(state) => {
            info!(hook = %state.point.kind, pending = state.pending.len(), "hook approval requested");
            app.hooks = HookPhase::PendingApproval(state);
        }
    }
}

fn resolve_approval(app: &mut App, decision: ApprovalDecision) {
    match decision {
        ApprovalDecision::Pending(state) => app.hooks = HookPhase::PendingApproval(state),
        ApprovalDecision::Skip => {
            info!("hooks skipped");
            app.banner = Some(Banner::Info("Hooks skipped.".to_string()));
        }
        ApprovalDecision::Approve(state) => {
            let project = app.project_key();
            let mut record = match app.store.load_approvals(&project) {
                Ok(record) => record,
                Err(err) => {
                    warn!(error = %err, "could not load hook approvals");
                    app.banner = Some(Banner::Error(format!("Hooks not run: {err}")));
                    return;
                }
            };
            let added = state.record_approval(&mut record);
            // Persist before running anything.
            if let Err(err) = app.store.save_approvals(&project, &record) {
                warn!(error = %err, "could not save hook approvals");
                app.banner = Some(Banner::Error(format!(
                    "Hooks not run: could not save approval: {err}"
                )));
                return;
            }
            info!(hook = %state.point.kind, added, "hook commands approved");
            let request = state.request(app.repo.root());
            start_hooks(app, request);
        }
    }
}

fn start_hooks(app: &mut App, request: HandoffRequest) {
    let ticket = app.issue_ticket();
    let kind = request.kind;
    if request.interactive {
        info!(hook = %kind, %ticket, "handing the terminal to hooks");
        app.hooks = HookPhase::Suspended { ticket, kind };
        app.pending_handoff = Some((ticket, request));
        return;
    }
    app.hooks = HookPhase::Running { ticket, kind };
    let runner = Arc::clone(&app.runner);
    spawn_task(&app.event_tx, ticket, move || {
        let mut handoff = CapturedHandoff::new(runner);
        Outcome::HooksFinished(handoff.run(&request))
    });
}

fn finish_hooks(app: &mut App, ticket: Ticket, result: HandoffResult) {
    let current = match &app.hooks {
        HookPhase::Running { ticket, .. } | HookPhase::Suspended { ticket, .. } => Some(*ticket),
        HookPhase::Idle | HookPhase::PendingApproval(_) => None,
    };
    if current != Some(ticket) {
        debug!(%ticket, "discarding stale hook completion");
        return;
    }
    app.hooks = HookPhase::Idle;
    app.banner = Some(if result.ok() {
        Banner::Success(result.summary())
    } else {
        Banner::Error(result.summary())
    });
}
