//! Worktree creation wizard.
//!
//! Step graph:
//!
//! ```text
//! BranchMode ─┬─ new ──────> BranchName ─> BaseBranch ─┬─> Confirm ─> Creating ─> Complete
//!             └─ existing ─> ExistingBranch ────────────┘
//! ```
//!
//! Going back never discards what was already entered. Both branch lists
//! refuse to advance past a dirty branch until the risk is acknowledged.
//! An acknowledgement covers only the branch it was given for; moving the
//! highlight or entering a list step withdraws it.
//!
//! Branches in the existing list have no worktree, and git can only report
//! uncommitted changes for a checked-out branch, so with a real repository
//! the existing list never shows a dirty row.

use std::collections::HashSet;
use std::path::PathBuf;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::debug;

use super::{branch_name_error, FlowContext, FLOW_CHROME};
use crate::animals::pick_unused_name;
use crate::commands::{Command, Outcome, Route};
use crate::git::{BranchSource, BranchSummary, CreateRequest};
use crate::hooks::{HookKind, HookPoint};
use crate::ui::theme::Theme;
use crate::ui::widgets::{
    choice_row, error_banner, fit_frame, help_line, input_field, spinner, success_banner,
    title_line, warning_banner,
};
use crate::viewport::{Viewport, VIEWPORT_CHROME};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateStep {
    BranchMode,
    BranchName,
    BaseBranch,
    ExistingBranch,
    Confirm,
    Creating,
    Complete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchMode {
    New,
    Existing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BranchList {
    Base,
    Existing,
}

/// Rows used by the step prompt and the risk line above the footer.
const STEP_CHROME: usize = 2;

#[derive(Debug, Clone)]
pub struct CreationState {
    step: CreateStep,
    mode: BranchMode,
    name: String,
    name_error: Option<String>,
    bases: Viewport<BranchSummary>,
    existing: Viewport<BranchSummary>,
    branches_loaded: bool,
    /// Branch the user accepted uncommitted-change risk for.
    risk_acknowledged_for: Option<String>,
    risk_refused: bool,
    base_branch: Option<String>,
    existing_branch: Option<String>,
    target: Option<PathBuf>,
    created: Option<PathBuf>,
    error: Option<String>,
    frame: usize,
}

impl Default for CreationState {
    fn default() -> Self {
        Self {
            step: CreateStep::BranchMode,
            mode: BranchMode::New,
            name: String::new(),
            name_error: None,
            bases: Viewport::default(),
            existing: Viewport::default(),
            branches_loaded: false,
            risk_acknowledged_for: None,
            risk_refused: false,
            base_branch: None,
            existing_branch: None,
            target: None,
            created: None,
            error: None,
            frame: 0,
        }
    }
}

impl CreationState {
    pub fn step(&self) -> CreateStep {
        self.step
    }

    pub fn mode(&self) -> BranchMode {
        self.mode
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn name_error(&self) -> Option<&str> {
        self.name_error.as_deref()
    }

    pub fn risk_acknowledged(&self) -> bool {
        match self.step {
            CreateStep::BaseBranch => self.risk_accepted(BranchList::Base),
            CreateStep::ExistingBranch => self.risk_accepted(BranchList::Existing),
            _ => false,
        }
    }

    pub fn base_branch(&self) -> Option<&str> {
        self.base_branch.as_deref()
    }

    pub fn target(&self) -> Option<&PathBuf> {
        self.target.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn existing_branches(&self) -> &Viewport<BranchSummary> {
        &self.existing
    }

    /// Number of user-facing steps for the current branch mode.
    pub fn total_steps(&self) -> usize {
        match self.mode {
            BranchMode::New => 4,
            BranchMode::Existing => 3,
        }
    }

    /// 1-based step position, recomputed from the current choices.
    pub fn position(&self) -> Option<(usize, usize)> {
        let total = self.total_steps();
        let current = match self.step {
            CreateStep::BranchMode => 1,
            CreateStep::BranchName => 2,
            CreateStep::BaseBranch => 3,
            CreateStep::ExistingBranch => 2,
            CreateStep::Confirm => total,
            CreateStep::Creating | CreateStep::Complete => return None,
        };
        Some((current, total))
    }

    pub fn handle_key(self, key: &KeyEvent, ctx: &FlowContext<'_>) -> (Self, Option<Command>) {
        match self.step {
            CreateStep::BranchMode => self.on_branch_mode(key),
            CreateStep::BranchName => self.on_branch_name(key),
            CreateStep::BaseBranch => self.on_branch_list(key, ctx, BranchList::Base),
            CreateStep::ExistingBranch => self.on_branch_list(key, ctx, BranchList::Existing),
            CreateStep::Confirm => self.on_confirm(key),
            // Only the completion event leaves this step.
            CreateStep::Creating => (self, None),
            CreateStep::Complete => match key.code {
                KeyCode::Enter | KeyCode::Esc | KeyCode::Char('q') => {
                    (self, Some(Command::Open(Route::Dashboard)))
                }
                _ => (self, None),
            },
        }
    }

    fn on_branch_mode(mut self, key: &KeyEvent) -> (Self, Option<Command>) {
        match key.code {
            KeyCode::Up
            | KeyCode::Down
            | KeyCode::Tab
            | KeyCode::BackTab
            | KeyCode::Char('j')
            | KeyCode::Char('k') => {
                self.mode = match self.mode {
                    BranchMode::New => BranchMode::Existing,
                    BranchMode::Existing => BranchMode::New,
                };
            }
            KeyCode::Enter => {
                self.error = None;
                self.step = match self.mode {
                    BranchMode::New => CreateStep::BranchName,
                    BranchMode::Existing => {
                        self.reset_risk();
                        CreateStep::ExistingBranch
                    }
                };
            }
            KeyCode::Esc => return (self, Some(Command::Open(Route::Dashboard))),
            _ => {}
        }
        (self, None)
    }

    fn on_branch_name(mut self, key: &KeyEvent) -> (Self, Option<Command>) {
        match key.code {
            KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.name.push(ch);
                self.validate_name();
            }
            KeyCode::Backspace => {
                self.name.pop();
                self.validate_name();
            }
            KeyCode::Enter => self.submit_name(),
            KeyCode::Esc => self.step = CreateStep::BranchMode,
            _ => {}
        }
        (self, None)
    }

    fn validate_name(&mut self) {
        self.name_error = branch_name_error(&self.name).map(str::to_string);
    }

    fn known_branches(&self) -> HashSet<String> {
        self.bases
            .items()
            .iter()
            .map(|branch| branch.name.clone())
            .collect()
    }

    /// Advance from the name step. An empty name defers to a generated one.
    fn submit_name(&mut self) {
        let known = self.known_branches();
        if self.name.is_empty() {
            match pick_unused_name(&known) {
                Some(name) => self.name = name,
                None => {
                    self.name_error =
                        Some("No generated names left. Type a branch name.".to_string());
                    return;
                }
            }
        }
        self.validate_name();
        if self.name_error.is_some() {
            return;
        }
        if known.contains(&self.name) {
            self.name_error = Some(format!("A branch named {} already exists.", self.name));
            return;
        }
        self.reset_risk();
        self.step = CreateStep::BaseBranch;
    }

    fn list(&self, list: BranchList) -> &Viewport<BranchSummary> {
        match list {
            BranchList::Base => &self.bases,
            BranchList::Existing => &self.existing,
        }
    }

    fn list_mut(&mut self, list: BranchList) -> &mut Viewport<BranchSummary> {
        match list {
            BranchList::Base => &mut self.bases,
            BranchList::Existing => &mut self.existing,
        }
    }

    fn highlighted(&self, list: BranchList) -> Option<String> {
        self.list(list).selected().map(|branch| branch.name.clone())
    }

    /// Apply a viewport key, withdrawing the risk acknowledgement when the
    /// highlighted branch changes.
    fn navigate(&mut self, list: BranchList, key: &KeyEvent) {
        let before = self.highlighted(list);
        self.list_mut(list).handle_key(key);
        if self.highlighted(list) != before {
            self.reset_risk();
        }
    }

    fn reset_risk(&mut self) {
        self.risk_acknowledged_for = None;
        self.risk_refused = false;
    }

    fn risk_accepted(&self, list: BranchList) -> bool {
        self.risk_acknowledged_for.is_some()
            && self.risk_acknowledged_for == self.highlighted(list)
    }

    fn on_branch_list(
        mut self,
        key: &KeyEvent,
        ctx: &FlowContext<'_>,
        list: BranchList,
    ) -> (Self, Option<Command>) {
        if self.list(list).is_searching() {
            self.navigate(list, key);
            return (self, None);
        }
        match key.code {
            KeyCode::Enter => self.advance_from_list(list, ctx),
            KeyCode::Char('a') => {
                let dirty = self
                    .list(list)
                    .selected()
                    .filter(|branch| !branch.clean)
                    .map(|branch| branch.name.clone());
                if dirty.is_some() {
                    self.risk_acknowledged_for = dirty;
                    self.risk_refused = false;
                }
            }
            KeyCode::Esc => {
                self.step = match list {
                    BranchList::Base => CreateStep::BranchName,
                    BranchList::Existing => CreateStep::BranchMode,
                };
            }
            _ => self.navigate(list, key),
        }
        (self, None)
    }

    fn advance_from_list(&mut self, list: BranchList, ctx: &FlowContext<'_>) {
        let Some(branch) = self.list(list).selected().cloned() else {
            return;
        };
        if !branch.clean && !self.risk_accepted(list) {
            self.risk_refused = true;
            return;
        }
        let target_branch = match list {
            BranchList::Base => {
                self.base_branch = Some(branch.name);
                self.name.clone()
            }
            BranchList::Existing => {
                self.existing_branch = Some(branch.name.clone());
                branch.name
            }
        };
        self.target = Some(
            ctx.repo
                .worktree_path(&ctx.config.worktree.root, &target_branch),
        );
        self.step = CreateStep::Confirm;
    }

    fn request(&self) -> Option<CreateRequest> {
        let path = self.target.clone()?;
        let request = match self.mode {
            BranchMode::New => CreateRequest {
                branch: self.name.clone(),
                source: BranchSource::New {
                    base: self.base_branch.clone()?,
                },
                path,
            },
            BranchMode::Existing => CreateRequest {
                branch: self.existing_branch.clone()?,
                source: BranchSource::Existing,
                path,
            },
        };
        Some(request)
    }

    fn on_confirm(mut self, key: &KeyEvent) -> (Self, Option<Command>) {
        match key.code {
            KeyCode::Enter | KeyCode::Char('y') => {
                let Some(request) = self.request() else {
                    return (self, None);
                };
                self.error = None;
                self.step = CreateStep::Creating;
                (self, Some(Command::CreateWorktree(request)))
            }
            KeyCode::Esc => {
                self.step = match self.mode {
                    BranchMode::New => CreateStep::BaseBranch,
                    BranchMode::Existing => CreateStep::ExistingBranch,
                };
                (self, None)
            }
            _ => (self, None),
        }
    }

    pub fn handle_outcome(
        mut self,
        outcome: Outcome,
        _ctx: &FlowContext<'_>,
    ) -> (Self, Option<Command>) {
        match outcome {
            Outcome::Branches(Ok(branches)) => {
                self.load_branches(branches);
                (self, None)
            }
            Outcome::Branches(Err(err)) => {
                self.branches_loaded = true;
                self.error = Some(err.to_string());
                (self, None)
            }
            Outcome::WorktreeCreated(result) if self.step == CreateStep::Creating => match result {
                Ok(path) => {
                    self.step = CreateStep::Complete;
                    self.created = Some(path.clone());
                    let point = HookPoint {
                        kind: HookKind::PostCreate,
                        target: path,
                        branch: self.request().map(|request| request.branch),
                        base_branch: match self.mode {
                            BranchMode::New => self.base_branch.clone(),
                            BranchMode::Existing => None,
                        },
                    };
                    (self, Some(Command::EnterHookPoint(point)))
                }
                Err(err) => {
                    self.step = CreateStep::Confirm;
                    self.error = Some(err.to_string());
                    (self, None)
                }
            },
            other @ (Outcome::WorktreeCreated(_)
            | Outcome::Worktrees(_)
            | Outcome::WorktreeRemoved { .. }
            | Outcome::ConfigSaved(_)
            | Outcome::HooksFinished(_)) => {
                debug!(outcome = other.label(), step = ?self.step, "creation flow ignores outcome");
                (self, None)
            }
        }
    }

    fn load_branches(&mut self, branches: Vec<BranchSummary>) {
        let active = match self.step {
            CreateStep::ExistingBranch => Some(BranchList::Existing),
            CreateStep::BaseBranch => Some(BranchList::Base),
            _ => None,
        };
        let before = active.and_then(|list| self.highlighted(list));
        let first_load = !self.branches_loaded;

        let available: Vec<BranchSummary> = branches
            .iter()
            .filter(|branch| branch.worktree.is_none())
            .cloned()
            .collect();
        self.bases.set_items(branches);
        self.existing.set_items(available);
        if first_load {
            self.bases.select_where(|branch| branch.is_current);
        }
        self.branches_loaded = true;

        if active.and_then(|list| self.highlighted(list)) != before {
            self.reset_risk();
        }
    }

    pub fn tick(&mut self) {
        if self.step == CreateStep::Creating || !self.branches_loaded {
            self.frame = self.frame.wrapping_add(1);
        }
    }

    pub fn resize(&mut self, height: usize) {
        let container = height.saturating_sub(FLOW_CHROME + STEP_CHROME);
        self.bases.set_container_height(container, VIEWPORT_CHROME);
        self.existing.set_container_height(container, VIEWPORT_CHROME);
    }

    pub fn render(&self, theme: &Theme, width: usize, height: usize) -> String {
        let mut lines = vec![
            title_line(theme, "New worktree", self.position()),
            String::new(),
        ];
        match self.step {
            CreateStep::BranchMode => {
                lines.push("Where should the branch come from?".to_string());
                lines.push(choice_row(
                    theme,
                    "Create a new branch",
                    self.mode == BranchMode::New,
                ));
                lines.push(choice_row(
                    theme,
                    "Check out an existing branch",
                    self.mode == BranchMode::Existing,
                ));
            }
            CreateStep::BranchName => {
                lines.push("Branch name".to_string());
                lines.push(input_field(
                    theme,
                    &self.name,
                    "leave empty for a generated name",
                ));
                if let Some(error) = &self.name_error {
                    lines.push(error_banner(theme, error));
                }
            }
            CreateStep::BaseBranch => {
                lines.push(format!("Base {} on", self.name));
                self.render_list(theme, BranchList::Base, &mut lines);
            }
            CreateStep::ExistingBranch => {
                lines.push("Check out which branch?".to_string());
                self.render_list(theme, BranchList::Existing, &mut lines);
            }
            CreateStep::Confirm => {
                let source = match self.mode {
                    BranchMode::New => format!(
                        "new, from {}",
                        self.base_branch.as_deref().unwrap_or("?")
                    ),
                    BranchMode::Existing => "existing".to_string(),
                };
                let branch = match self.mode {
                    BranchMode::New => self.name.as_str(),
                    BranchMode::Existing => self.existing_branch.as_deref().unwrap_or("?"),
                };
                lines.push(format!("Branch  {branch} ({source})"));
                if let Some(target) = &self.target {
                    lines.push(format!("Path    {}", target.display()));
                }
                lines.push(String::new());
                lines.push("Create this worktree?".to_string());
            }
            CreateStep::Creating => {
                lines.push(format!("{} Creating worktree…", spinner(self.frame)));
            }
            CreateStep::Complete => {
                let path = self
                    .created
                    .as_ref()
                    .map(|path| path.display().to_string())
                    .unwrap_or_default();
                lines.push(success_banner(theme, &format!("Created worktree at {path}")));
            }
        }

        lines.push(String::new());
        if let Some(error) = &self.error {
            lines.push(error_banner(theme, error));
        }
        lines.push(help_line(theme, self.bindings()));
        fit_frame(lines, width, height)
    }

    fn render_list(&self, theme: &Theme, list: BranchList, lines: &mut Vec<String>) {
        if !self.branches_loaded {
            lines.push(format!("{} Loading branches…", spinner(self.frame)));
            return;
        }
        let empty = match list {
            BranchList::Base => "No branches found.",
            BranchList::Existing => "Every branch is already checked out in a worktree.",
        };
        lines.extend(self.list(list).render(theme, empty, |branch, selected| {
            choice_row(theme, &branch_row(branch), selected)
        }));

        let Some(branch) = self.list(list).selected().filter(|branch| !branch.clean) else {
            return;
        };
        let accepted = self.risk_accepted(list);
        let message = if accepted {
            format!("Proceeding from {} despite uncommitted changes.", branch.name)
        } else {
            format!(
                "{} has uncommitted changes that will not be in the new worktree. Press a to accept.",
                branch.name
            )
        };
        if self.risk_refused && !accepted {
            lines.push(error_banner(theme, &message));
        } else {
            lines.push(warning_banner(theme, &message));
        }
    }

    fn bindings(&self) -> &'static [(&'static str, &'static str)] {
        let searching = match self.step {
            CreateStep::BaseBranch => self.bases.is_searching(),
            CreateStep::ExistingBranch => self.existing.is_searching(),
            _ => false,
        };
        if searching {
            return &[("type", "filter"), ("enter/esc", "done")];
        }
        match self.step {
            CreateStep::BranchMode => &[("↑/↓", "choose"), ("enter", "next"), ("esc", "cancel")],
            CreateStep::BranchName => &[("enter", "next"), ("esc", "back")],
            CreateStep::BaseBranch | CreateStep::ExistingBranch => &[
                ("↑/↓", "move"),
                ("/", "search"),
                ("a", "accept risk"),
                ("enter", "next"),
                ("esc", "back"),
            ],
            CreateStep::Confirm => &[("enter", "create"), ("esc", "back")],
            CreateStep::Creating => &[],
            CreateStep::Complete => &[("enter", "dashboard")],
        }
    }
}

fn branch_row(branch: &BranchSummary) -> String {
    let mut row = branch.name.clone();
    if branch.is_current {
        row.push_str("  (current)");
    }
    if branch.ahead > 0 || branch.behind > 0 {
        row.push_str(&format!("  ↑{} ↓{}", branch.ahead, branch.behind));
    }
    if !branch.clean {
        row.push_str(&format!("  ~{} ?{}", branch.uncommitted, branch.untracked));
    }
    row
}

#[cfg(test)]
mod tests {
    use super::{BranchMode, CreateStep, CreationState};
    use crate::commands::{Command, Outcome, Route};
    use crate::config::Config;
    use crate::error::RepoError;
    use crate::flows::FlowContext;
    use crate::git::{BranchSource, BranchSummary};
    use crate::hooks::HookKind;
    use crate::test_utils::{branch, chars, key, FakeRepository};
    use crate::ui::theme::Theme;
    use crossterm::event::{KeyCode, KeyEvent};
    use std::path::PathBuf;

    struct Harness {
        repo: FakeRepository,
        config: Config,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                repo: FakeRepository::new("/repo"),
                config: Config::default(),
            }
        }

        fn ctx(&self) -> FlowContext<'_> {
            FlowContext {
                repo: &self.repo,
                config: &self.config,
            }
        }

        fn press(&self, state: CreationState, code: KeyCode) -> CreationState {
            state.handle_key(&KeyEvent::from(code), &self.ctx()).0
        }

        fn type_text(&self, mut state: CreationState, text: &str) -> CreationState {
            for key in chars(text) {
                state = state.handle_key(&key, &self.ctx()).0;
            }
            state
        }

        fn loaded(&self, branches: Vec<BranchSummary>) -> CreationState {
            let mut state = CreationState::default();
            state.resize(30);
            state
                .handle_outcome(Outcome::Branches(Ok(branches)), &self.ctx())
                .0
        }
    }

    fn current(mut summary: BranchSummary) -> BranchSummary {
        summary.is_current = true;
        summary.worktree = Some(PathBuf::from("/repo"));
        summary
    }

    #[test]
    fn forward_then_back_returns_to_start_with_values_kept() {
        let h = Harness::new();
        let state = h.loaded(vec![current(branch("main", false)), branch("dev", false)]);
        let state = h.press(state, KeyCode::Enter);
        let state = h.type_text(state, "feature/x-1");
        let state = h.press(state, KeyCode::Enter);
        assert_eq!(state.step(), CreateStep::BaseBranch);
        let state = h.press(state, KeyCode::Enter);
        assert_eq!(state.step(), CreateStep::Confirm);
        assert_eq!(state.base_branch(), Some("main"));

        let state = h.press(state, KeyCode::Esc);
        assert_eq!(state.step(), CreateStep::BaseBranch);
        let state = h.press(state, KeyCode::Esc);
        assert_eq!(state.step(), CreateStep::BranchName);
        let state = h.press(state, KeyCode::Esc);
        assert_eq!(state.step(), CreateStep::BranchMode);
        assert_eq!(state.name(), "feature/x-1");
        assert_eq!(state.mode(), BranchMode::New);

        // Walking forward again lands on the same selections.
        let state = h.press(state, KeyCode::Enter);
        assert_eq!(state.name(), "feature/x-1");
        let state = h.press(state, KeyCode::Enter);
        let state = h.press(state, KeyCode::Enter);
        assert_eq!(state.step(), CreateStep::Confirm);
        assert_eq!(state.base_branch(), Some("main"));
    }

    #[test]
    fn dirty_base_needs_acknowledged_risk() {
        let h = Harness::new();
        let state = h.loaded(vec![current(branch("main", true)), branch("dev", false)]);
        let state = h.press(state, KeyCode::Enter);
        let state = h.type_text(state, "topic");
        let state = h.press(state, KeyCode::Enter);
        assert_eq!(state.step(), CreateStep::BaseBranch);

        let state = h.press(state, KeyCode::Enter);
        assert_eq!(state.step(), CreateStep::BaseBranch);
        assert!(!state.risk_acknowledged());
        assert!(state.render(&Theme::plain(), 120, 30).contains("Press a to accept"));

        let state = h.press(state, KeyCode::Char('a'));
        assert!(state.risk_acknowledged());
        let state = h.press(state, KeyCode::Down);
        assert!(!state.risk_acknowledged());
        let state = h.press(state, KeyCode::Up);
        assert!(!state.risk_acknowledged());
        let state = h.press(state, KeyCode::Enter);
        assert_eq!(state.step(), CreateStep::BaseBranch);

        let state = h.press(state, KeyCode::Char('a'));
        let state = h.press(state, KeyCode::Enter);
        assert_eq!(state.step(), CreateStep::Confirm);
        assert_eq!(state.base_branch(), Some("main"));
    }

    #[test]
    fn accepted_risk_does_not_follow_into_the_other_list() {
        let h = Harness::new();
        let state = h.loaded(vec![current(branch("main", true)), branch("stale", true)]);
        let state = h.press(state, KeyCode::Down);
        let state = h.press(state, KeyCode::Enter);
        assert_eq!(state.step(), CreateStep::ExistingBranch);
        let state = h.press(state, KeyCode::Char('a'));
        assert!(state.risk_acknowledged());

        let state = h.press(state, KeyCode::Esc);
        assert_eq!(state.step(), CreateStep::BranchMode);
        let state = h.press(state, KeyCode::Up);
        let state = h.press(state, KeyCode::Enter);
        let state = h.type_text(state, "t");
        let state = h.press(state, KeyCode::Enter);
        assert_eq!(state.step(), CreateStep::BaseBranch);
        assert!(!state.risk_acknowledged());

        let state = h.press(state, KeyCode::Enter);
        assert_eq!(state.step(), CreateStep::BaseBranch);
        assert!(state
            .render(&Theme::plain(), 120, 30)
            .contains("main has uncommitted changes"));
    }

    #[test]
    fn accept_risk_does_nothing_on_clean_branch() {
        let h = Harness::new();
        let state = h.loaded(vec![current(branch("main", false))]);
        let state = h.press(state, KeyCode::Enter);
        let state = h.type_text(state, "topic");
        let state = h.press(state, KeyCode::Enter);
        let state = h.press(state, KeyCode::Char('a'));
        assert!(!state.risk_acknowledged());
    }

    #[test]
    fn branch_name_is_validated_per_keystroke() {
        let h = Harness::new();
        let state = h.loaded(vec![current(branch("main", false))]);
        let state = h.press(state, KeyCode::Enter);
        let state = h.type_text(state, "feat ure");
        assert!(state.name_error().is_some());
        let state = h.press(state, KeyCode::Enter);
        assert_eq!(state.step(), CreateStep::BranchName);
        assert_eq!(state.name(), "feat ure");

        let mut state = state;
        for _ in 0.."feat ure".len() {
            state = h.press(state, KeyCode::Backspace);
        }
        let state = h.type_text(state, "feature/x-1");
        assert_eq!(state.name_error(), None);
        let state = h.press(state, KeyCode::Enter);
        assert_eq!(state.step(), CreateStep::BaseBranch);
    }

    #[test]
    fn empty_name_defers_to_generated_default() {
        let h = Harness::new();
        let state = h.loaded(vec![current(branch("main", false)), branch("otter", false)]);
        let state = h.press(state, KeyCode::Enter);
        let state = h.press(state, KeyCode::Enter);
        assert_eq!(state.step(), CreateStep::BaseBranch);
        assert!(!state.name().is_empty());
        assert_ne!(state.name(), "otter");
        assert_ne!(state.name(), "main");
    }

    #[test]
    fn existing_branch_name_is_refused() {
        let h = Harness::new();
        let state = h.loaded(vec![current(branch("main", false)), branch("dev", false)]);
        let state = h.press(state, KeyCode::Enter);
        let state = h.type_text(state, "dev");
        let state = h.press(state, KeyCode::Enter);
        assert_eq!(state.step(), CreateStep::BranchName);
        assert!(state.name_error().is_some_and(|e| e.contains("already exists")));
    }

    #[test]
    fn step_count_follows_branch_mode() {
        let h = Harness::new();
        let state = h.loaded(vec![current(branch("main", false)), branch("dev", false)]);
        assert_eq!(state.position(), Some((1, 4)));
        let state = h.press(state, KeyCode::Down);
        assert_eq!(state.position(), Some((1, 3)));
        let state = h.press(state, KeyCode::Enter);
        assert_eq!(state.step(), CreateStep::ExistingBranch);
        assert_eq!(state.position(), Some((2, 3)));
        let state = h.press(state, KeyCode::Enter);
        assert_eq!(state.step(), CreateStep::Confirm);
        assert_eq!(state.position(), Some((3, 3)));
        assert!(state
            .render(&Theme::plain(), 80, 20)
            .contains("Step 3 of 3"));

        let state = h.press(state, KeyCode::Esc);
        let state = h.press(state, KeyCode::Esc);
        let state = h.press(state, KeyCode::Up);
        let state = h.press(state, KeyCode::Enter);
        assert_eq!(state.position(), Some((2, 4)));
        let state = h.press(state, KeyCode::Enter);
        assert_eq!(state.position(), Some((3, 4)));
        let state = h.press(state, KeyCode::Enter);
        assert_eq!(state.position(), Some((4, 4)));
    }

    #[test]
    fn existing_list_hides_checked_out_branches() {
        let h = Harness::new();
        let state = h.loaded(vec![current(branch("main", false)), branch("dev", false)]);
        let names: Vec<&str> = state
            .existing_branches()
            .filtered()
            .map(|b| b.name.as_str())
            .collect();
        assert_eq!(names, vec!["dev"]);
    }

    #[test]
    fn search_filters_and_escape_keeps_the_query() {
        let h = Harness::new();
        let state = h.loaded(vec![
            current(branch("main", false)),
            branch("hotfix/1", false),
            branch("feature/x", false),
            branch("fix-2", false),
        ]);
        let state = h.press(state, KeyCode::Down);
        let state = h.press(state, KeyCode::Enter);
        let state = h.press(state, KeyCode::Char('/'));
        let state = h.type_text(state, "fix");
        let names: Vec<&str> = state
            .existing_branches()
            .filtered()
            .map(|b| b.name.as_str())
            .collect();
        assert_eq!(names, vec!["hotfix/1", "fix-2"]);

        // Arrows do not navigate while searching; escape leaves search only.
        let state = h.press(state, KeyCode::Down);
        assert_eq!(
            state.existing_branches().selected().map(|b| b.name.as_str()),
            Some("hotfix/1")
        );
        let state = h.press(state, KeyCode::Esc);
        assert_eq!(state.step(), CreateStep::ExistingBranch);
        assert_eq!(state.existing_branches().query(), "fix");
        let state = h.press(state, KeyCode::Down);
        assert_eq!(
            state.existing_branches().selected().map(|b| b.name.as_str()),
            Some("fix-2")
        );
    }

    #[test]
    fn creating_waits_for_completion_then_enters_hook_point() {
        let h = Harness::new();
        let state = h.loaded(vec![current(branch("main", false))]);
        let state = h.press(state, KeyCode::Enter);
        let state = h.type_text(state, "feature/x-1");
        let state = h.press(state, KeyCode::Enter);
        let state = h.press(state, KeyCode::Enter);
        let expected = PathBuf::from("/repo/.arbor/worktrees/feature-x-1");
        assert_eq!(state.target(), Some(&expected));

        let (state, command) = state.handle_key(&key(KeyCode::Enter), &h.ctx());
        assert_eq!(state.step(), CreateStep::Creating);
        let Some(Command::CreateWorktree(request)) = command else {
            panic!("expected create command");
        };
        assert_eq!(request.branch, "feature/x-1");
        assert_eq!(
            request.source,
            BranchSource::New {
                base: "main".to_string()
            }
        );

        let (state, command) = state.handle_key(&key(KeyCode::Esc), &h.ctx());
        assert_eq!(state.step(), CreateStep::Creating);
        assert_eq!(command, None);

        let (state, command) =
            state.handle_outcome(Outcome::WorktreeCreated(Ok(expected.clone())), &h.ctx());
        assert_eq!(state.step(), CreateStep::Complete);
        match command {
            Some(Command::EnterHookPoint(point)) => {
                assert_eq!(point.kind, HookKind::PostCreate);
                assert_eq!(point.target, expected);
                assert_eq!(point.branch.as_deref(), Some("feature/x-1"));
                assert_eq!(point.base_branch.as_deref(), Some("main"));
            }
            other => panic!("unexpected command {other:?}"),
        }
        let (_, command) = state.handle_key(&key(KeyCode::Enter), &h.ctx());
        assert_eq!(command, Some(Command::Open(Route::Dashboard)));
    }

    #[test]
    fn failed_creation_returns_to_confirm_with_banner() {
        let h = Harness::new();
        let state = h.loaded(vec![current(branch("main", false)), branch("dev", false)]);
        let state = h.press(state, KeyCode::Down);
        let state = h.press(state, KeyCode::Enter);
        let state = h.press(state, KeyCode::Enter);
        let (state, _) = state.handle_key(&key(KeyCode::Enter), &h.ctx());
        let (state, command) = state.handle_outcome(
            Outcome::WorktreeCreated(Err(RepoError::Git {
                args: "worktree add".to_string(),
                message: "fatal: exists".to_string(),
            })),
            &h.ctx(),
        );
        assert_eq!(command, None);
        assert_eq!(state.step(), CreateStep::Confirm);
        assert!(state.error().is_some_and(|e| e.contains("fatal: exists")));
        assert!(state
            .render(&Theme::plain(), 80, 20)
            .contains("✗ git worktree add failed"));
    }

    #[test]
    fn escape_on_first_step_cancels_the_flow() {
        let h = Harness::new();
        let (_, command) = CreationState::default().handle_key(&key(KeyCode::Esc), &h.ctx());
        assert_eq!(command, Some(Command::Open(Route::Dashboard)));
    }
}
