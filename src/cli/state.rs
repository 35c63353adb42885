// src/cli/state.rs
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use ratatui::widgets::{ListState, TableState};

use crate::cli::input::LineEdit;
use crate::cli::util::{bucket_meta, fmt_vnd};
use crate::database::db::RecordStore;
use crate::funds::desk::FundView;
use crate::funds::{parse_amount, BucketKey, FundDesk};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Browse,
    Distribute,
    Adjust(BucketKey),
    Ratios,
    Endpoint,
    ConfirmPush,
    ConfirmPull,
    Help,
}

/// A confirmed sync waiting for the event loop to draw the busy state first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncAction {
    Push,
    Pull,
}

pub struct App<S> {
    pub desk: FundDesk<S>,
    pub view: FundView,
    pub mode: Mode,
    pub table: TableState,
    pub ratio_sel: ListState,
    pub input: LineEdit,
    pub status: String,
    pub error: Option<String>,
    pub pending_sync: Option<SyncAction>,
    pub quit: bool,
}

impl<S: RecordStore> App<S> {
    pub async fn new(desk: FundDesk<S>) -> Self {
        let view = desk.view().await;
        let mut table = TableState::default();
        table.select(Some(0));

        Self {
            desk,
            view,
            mode: Mode::Browse,
            table,
            ratio_sel: ListState::default(),
            input: LineEdit::default(),
            status: "Press ? for help | q to quit".into(),
            error: None,
            pending_sync: None,
            quit: false,
        }
    }

    pub async fn refresh(&mut self) {
        self.view = self.desk.view().await;
    }

    pub fn selected_bucket(&self) -> BucketKey {
        let idx = self.table.selected().unwrap_or(0);
        BucketKey::ALL[idx % BucketKey::ALL.len()]
    }

    pub fn selected_ratio(&self) -> BucketKey {
        let idx = self.ratio_sel.selected().unwrap_or(0);
        BucketKey::ALL[idx % BucketKey::ALL.len()]
    }

    pub async fn handle_key(&mut self, k: KeyEvent) -> anyhow::Result<()> {
        if k.kind != KeyEventKind::Press { return Ok(()); }

        match self.mode {
            Mode::Browse => self.handle_browse(k).await,
            Mode::Distribute | Mode::Adjust(_) | Mode::Endpoint => self.handle_prompt(k).await,
            Mode::Ratios => self.handle_ratios(k).await,
            Mode::ConfirmPush => self.confirm_sync(k, SyncAction::Push),
            Mode::ConfirmPull => self.confirm_sync(k, SyncAction::Pull),
            Mode::Help => {
                if matches!(k.code, KeyCode::Esc | KeyCode::Char('b') | KeyCode::Char('?')) {
                    self.mode = Mode::Browse;
                }
            }
        }
        self.refresh().await;
        Ok(())
    }

    async fn handle_browse(&mut self, k: KeyEvent) {
        match k.code {
            KeyCode::Char('q') => self.quit = true,
            KeyCode::Up => move_sel(&mut self.table, -1),
            KeyCode::Down => move_sel(&mut self.table, 1),
            KeyCode::Char('d') => self.open_prompt(Mode::Distribute, ""),
            KeyCode::Enter | KeyCode::Char('a') => {
                let key = self.selected_bucket();
                self.open_prompt(Mode::Adjust(key), "");
            }
            KeyCode::Char('e') => {
                let current = self.view.endpoint.clone().unwrap_or_default();
                self.open_prompt(Mode::Endpoint, current);
            }
            KeyCode::Char('r') => {
                self.ratio_sel.select(Some(0));
                self.error = None;
                self.mode = Mode::Ratios;
            }
            KeyCode::Char('p') => self.ask_sync(Mode::ConfirmPush),
            KeyCode::Char('l') => self.ask_sync(Mode::ConfirmPull),
            KeyCode::Char('?') => self.mode = Mode::Help,
            _ => {}
        }
    }

    fn open_prompt(&mut self, mode: Mode, initial: impl Into<String>) {
        self.input.set(initial);
        self.error = None;
        self.mode = mode;
    }

    async fn handle_prompt(&mut self, k: KeyEvent) {
        match k.code {
            KeyCode::Esc => {
                self.input.clear();
                self.error = None;
                self.mode = Mode::Browse;
            }
            KeyCode::Enter => self.submit_prompt().await,
            KeyCode::Char(c) => self.input.push(c),
            KeyCode::Backspace => self.input.backspace(),
            KeyCode::Delete => self.input.delete(),
            KeyCode::Left => self.input.left(),
            KeyCode::Right => self.input.right(),
            _ => {}
        }
    }

    async fn submit_prompt(&mut self) {
        let raw = self.input.value.clone();
        let result = match self.mode {
            Mode::Distribute => {
                let before = self.view.total;
                self.desk.distribute_input(&raw).await.map(|b| {
                    let added = b.total() - before;
                    if added.is_zero() {
                        "Nothing to distribute.".to_string()
                    } else {
                        format!("Distributed {}.", fmt_vnd(added))
                    }
                })
            }
            Mode::Adjust(key) => {
                let Some(delta) = parse_amount(&raw) else {
                    self.error = Some("Invalid amount (e.g. -50000)".into());
                    return;
                };
                self.desk.adjust_balance(key, delta).await.map(|b| {
                    format!("{}: {}", bucket_meta(key).label, fmt_vnd(b.get(key)))
                })
            }
            Mode::Endpoint => self
                .desk
                .configure_endpoint(&raw)
                .await
                .map(|()| "Sync endpoint saved.".to_string()),
            _ => return,
        };

        match result {
            Ok(msg) => {
                self.status = msg;
                self.error = None;
                self.input.clear();
                self.mode = Mode::Browse;
            }
            Err(e) => self.error = Some(e.to_string()),
        }
    }

    async fn handle_ratios(&mut self, k: KeyEvent) {
        let key = self.selected_ratio();
        let current = i64::from(self.view.ratios.get(key));
        let step = match k.code {
            KeyCode::Left | KeyCode::Char('-') => Some(-1),
            KeyCode::Right | KeyCode::Char('+') => Some(1),
            KeyCode::PageDown => Some(-10),
            KeyCode::PageUp => Some(10),
            _ => None,
        };

        if let Some(step) = step {
            // slider semantics: clamp instead of rejecting
            let next = (current + step).clamp(0, 100);
            if let Err(e) = self.desk.update_ratio(key, next).await {
                self.error = Some(e.to_string());
            }
            return;
        }

        match k.code {
            KeyCode::Up => move_list(&mut self.ratio_sel, -1),
            KeyCode::Down => move_list(&mut self.ratio_sel, 1),
            KeyCode::Enter => match self.desk.commit_ratios().await {
                Ok(()) => {
                    self.status = "Ratios saved.".into();
                    self.error = None;
                    self.mode = Mode::Browse;
                }
                Err(e) => self.error = Some(e.to_string()),
            },
            KeyCode::Esc => {
                self.desk.discard_ratio_edits().await;
                self.error = None;
                self.mode = Mode::Browse;
            }
            _ => {}
        }
    }

    fn ask_sync(&mut self, confirm: Mode) {
        if self.view.endpoint.is_none() {
            self.status = "No sync endpoint configured (press e).".into();
        } else {
            self.mode = confirm;
        }
    }

    fn confirm_sync(&mut self, k: KeyEvent, action: SyncAction) {
        if matches!(k.code, KeyCode::Char('y') | KeyCode::Char('Y')) {
            self.pending_sync = Some(action);
            self.status = "Syncing with endpoint…".into();
        } else {
            self.status = match action {
                SyncAction::Push => "Push cancelled.".into(),
                SyncAction::Pull => "Pull cancelled.".into(),
            };
        }
        self.mode = Mode::Browse;
    }

    /// Runs the confirmed sync, if any. The caller draws once before this so
    /// the busy state is on screen while the request is out.
    pub async fn run_pending_sync(&mut self) {
        match self.pending_sync.take() {
            Some(SyncAction::Push) => self.push().await,
            Some(SyncAction::Pull) => self.pull().await,
            None => return,
        }
        self.refresh().await;
    }

    async fn push(&mut self) {
        self.status = match self.desk.push().await {
            Ok(reply) if reply.trim().is_empty() => "Pushed.".into(),
            Ok(reply) => format!("Pushed: {}", reply.trim()),
            Err(e) => format!("Sync failed: {e}"),
        };
    }

    async fn pull(&mut self) {
        self.status = match self.desk.pull().await {
            Ok(b) => format!("Loaded balances from endpoint, total {}.", fmt_vnd(b.total())),
            Err(e) => format!("Load failed: {e}"),
        };
    }
}

fn move_sel(state: &mut TableState, delta: isize) {
    let n = BucketKey::ALL.len() as isize;
    let cur = state.selected().unwrap_or(0) as isize;
    state.select(Some((cur + delta).rem_euclid(n) as usize));
}

fn move_list(state: &mut ListState, delta: isize) {
    let n = BucketKey::ALL.len() as isize;
    let cur = state.selected().unwrap_or(0) as isize;
    state.select(Some((cur + delta).rem_euclid(n) as usize));
}
