//! Application core: event loop, screen management, action dispatch.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Tabs},
};
use secrecy::SecretString;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use vouchly_core::{Command, Console, CoreError, SessionState, VoucherFilter, export};

use crate::action::{Action, ExportKind, Notification, NotificationLevel, PendingConfirm};
use crate::component::Component;
use crate::event::{Event, EventReader};
use crate::form::{Form, FormEvent};
use crate::screen::ScreenId;
use crate::screens::{create_screens, login::LoginScreen};
use crate::theme;
use crate::tui::Tui;

const NOTIFICATION_TTL: Duration = Duration::from_secs(4);

/// Values pre-filled into the login view.
pub struct LoginDefaults {
    pub profile: String,
    pub username: String,
    pub password: Option<SecretString>,
}

#[allow(clippy::struct_excessive_bools)]
pub struct App {
    console: Console,
    defaults: LoginDefaults,
    active_screen: ScreenId,
    previous_screen: Option<ScreenId>,
    screens: HashMap<ScreenId, Box<dyn Component>>,
    running: bool,
    session: SessionState,
    refreshing: bool,
    help_visible: bool,
    search_active: bool,
    search_query: String,
    pending_confirm: Option<PendingConfirm>,
    form: Option<Form>,
    notification: Option<(Notification, Instant)>,
    action_tx: mpsc::UnboundedSender<Action>,
    action_rx: mpsc::UnboundedReceiver<Action>,
    data_cancel: CancellationToken,
}

impl App {
    pub fn new(console: Console, defaults: LoginDefaults) -> Self {
        let (action_tx, action_rx) = mpsc::unbounded_channel();
        let screens: HashMap<ScreenId, Box<dyn Component>> = create_screens().into_iter().collect();

        Self {
            console,
            defaults,
            active_screen: ScreenId::Dashboard,
            previous_screen: None,
            screens,
            running: true,
            session: SessionState::LoggedOut,
            refreshing: false,
            help_visible: false,
            search_active: false,
            search_query: String::new(),
            pending_confirm: None,
            form: None,
            notification: None,
            action_tx,
            action_rx,
            data_cancel: CancellationToken::new(),
        }
    }

    fn init_screens(&mut self) -> Result<()> {
        for screen in self.screens.values_mut() {
            screen.init(self.action_tx.clone())?;
        }
        Ok(())
    }

    pub async fn run(&mut self) -> Result<()> {
        // Resume a remembered session before the first frame.
        match self.console.restore() {
            Ok(true) => info!("resumed remembered session"),
            Ok(false) => {}
            Err(e) => {
                warn!(error = %e, "could not read stored session");
                self.action_tx.send(Action::Notify(Notification::warning(format!(
                    "Stored session unreadable: {}",
                    e.user_message()
                ))))?;
            }
        }
        if self.console.is_logged_in() {
            self.action_tx.send(Action::Refresh)?;
        } else {
            self.show_login()?;
        }

        let mut tui = Tui::new()?;
        tui.enter()?;
        self.init_screens()?;

        let bridge_console = self.console.clone();
        let bridge_tx = self.action_tx.clone();
        let bridge_cancel = self.data_cancel.clone();
        tokio::spawn(async move {
            crate::data_bridge::run_data_bridge(bridge_console, bridge_tx, bridge_cancel).await;
        });
        let refresh = self.console.spawn_refresh();

        let mut events = EventReader::new(Duration::from_millis(250), Duration::from_millis(33));
        info!("TUI event loop started");

        while self.running {
            let Some(event) = events.next().await else {
                break;
            };

            match event {
                Event::Key(key) => {
                    if let Some(action) = self.handle_key_event(key)? {
                        self.action_tx.send(action)?;
                    }
                }
                Event::Resize(w, h) => self.action_tx.send(Action::Resize(w, h))?,
                Event::Tick => self.action_tx.send(Action::Tick)?,
                Event::Render => self.action_tx.send(Action::Render)?,
            }

            while let Ok(action) = self.action_rx.try_recv() {
                self.process_action(&action)?;
                if let Action::Render = action {
                    tui.draw(|frame| self.render(frame))?;
                }
            }
        }

        self.data_cancel.cancel();
        self.console.shutdown();
        if let Some(handle) = refresh {
            handle.abort();
        }
        events.stop();
        info!("TUI event loop ended");
        Ok(())
    }

    // ── Screens ─────────────────────────────────────────────────────

    /// Mount a fresh login view and make it active.
    fn show_login(&mut self) -> Result<()> {
        let mut login = LoginScreen::new(
            self.console.clone(),
            self.defaults.profile.clone(),
            self.defaults.username.clone(),
            self.defaults.password.as_ref(),
        );
        login.init(self.action_tx.clone())?;
        self.screens.insert(ScreenId::Login, Box::new(login));
        self.pending_confirm = None;
        self.form = None;
        self.search_active = false;
        self.help_visible = false;
        self.focus(ScreenId::Login);
        Ok(())
    }

    fn focus(&mut self, target: ScreenId) {
        if let Some(screen) = self.screens.get_mut(&self.active_screen) {
            screen.set_focused(false);
        }
        if target != self.active_screen && self.active_screen != ScreenId::Login {
            self.previous_screen = Some(self.active_screen);
        }
        self.active_screen = target;
        if let Some(screen) = self.screens.get_mut(&target) {
            screen.set_focused(true);
        }
    }

    // ── Input ───────────────────────────────────────────────────────

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if key.modifiers == KeyModifiers::CONTROL && key.code == KeyCode::Char('c') {
            return Ok(Some(Action::Quit));
        }

        if self.active_screen == ScreenId::Login {
            if let Some(screen) = self.screens.get_mut(&ScreenId::Login) {
                return screen.handle_key_event(key);
            }
            return Ok(None);
        }

        if let Some(form) = self.form.as_mut() {
            return Ok(match form.handle_key(key) {
                FormEvent::Pending => None,
                FormEvent::Cancelled => Some(Action::CloseForm),
                FormEvent::Submitted(action) => {
                    self.form = None;
                    Some(action)
                }
            });
        }

        if self.pending_confirm.is_some() {
            return Ok(match key.code {
                KeyCode::Char('y' | 'Y') => Some(Action::ConfirmYes),
                KeyCode::Char('n' | 'N') | KeyCode::Esc => Some(Action::ConfirmNo),
                _ => None,
            });
        }

        if self.search_active {
            return Ok(match key.code {
                KeyCode::Esc => Some(Action::CloseSearch),
                KeyCode::Enter => Some(Action::SearchSubmit),
                KeyCode::Backspace => {
                    self.search_query.pop();
                    Some(Action::SearchInput(self.search_query.clone()))
                }
                KeyCode::Char(c) => {
                    self.search_query.push(c);
                    Some(Action::SearchInput(self.search_query.clone()))
                }
                _ => None,
            });
        }

        if self.help_visible {
            return Ok(match key.code {
                KeyCode::Esc | KeyCode::Char('?') => Some(Action::ToggleHelp),
                _ => None,
            });
        }

        match (key.modifiers, key.code) {
            (KeyModifiers::NONE, KeyCode::Char('q')) => return Ok(Some(Action::Quit)),
            (KeyModifiers::NONE, KeyCode::Char('?')) => return Ok(Some(Action::ToggleHelp)),
            (KeyModifiers::NONE, KeyCode::Char('/')) if self.active_screen.searchable() => {
                return Ok(Some(Action::OpenSearch));
            }
            (KeyModifiers::SHIFT | KeyModifiers::NONE, KeyCode::Char('R')) => {
                return Ok(Some(Action::Refresh));
            }
            (KeyModifiers::SHIFT | KeyModifiers::NONE, KeyCode::Char('L')) => {
                return Ok(Some(Action::Logout));
            }
            (KeyModifiers::NONE, KeyCode::Char(c @ '1'..='3')) => {
                let n = c.to_digit(10).and_then(|d| u8::try_from(d).ok());
                if let Some(screen) = n.and_then(ScreenId::from_number) {
                    return Ok(Some(Action::SwitchScreen(screen)));
                }
            }
            (KeyModifiers::NONE, KeyCode::Tab) => {
                return Ok(Some(Action::SwitchScreen(self.active_screen.next())));
            }
            (KeyModifiers::SHIFT, KeyCode::BackTab) => {
                return Ok(Some(Action::SwitchScreen(self.active_screen.prev())));
            }
            (KeyModifiers::NONE, KeyCode::Esc) => return Ok(Some(Action::GoBack)),
            _ => {}
        }

        if let Some(screen) = self.screens.get_mut(&self.active_screen) {
            return screen.handle_key_event(key);
        }
        Ok(None)
    }

    // ── Dispatch ────────────────────────────────────────────────────

    #[allow(clippy::too_many_lines)]
    fn process_action(&mut self, action: &Action) -> Result<()> {
        match action {
            Action::Quit => self.running = false,

            Action::Render | Action::Resize(..) => {}

            Action::Tick => {
                if self
                    .notification
                    .as_ref()
                    .is_some_and(|(_, shown)| shown.elapsed() > NOTIFICATION_TTL)
                {
                    self.notification = None;
                }
                if let Some(screen) = self.screens.get_mut(&self.active_screen) {
                    screen.update(action)?;
                }
            }

            Action::SwitchScreen(target) => {
                if *target != self.active_screen && self.active_screen != ScreenId::Login {
                    debug!("switching screen: {} → {}", self.active_screen, target);
                    self.focus(*target);
                }
            }

            Action::GoBack => {
                if let Some(prev) = self.previous_screen.take() {
                    self.focus(prev);
                }
            }

            Action::ToggleHelp => self.help_visible = !self.help_visible,

            // ── Session ─────────────────────────────────────────────
            Action::LoginFinished(result) => {
                if let Some(screen) = self.screens.get_mut(&ScreenId::Login) {
                    screen.update(action)?;
                }
                if result.is_ok() {
                    self.focus(ScreenId::Dashboard);
                    self.screens.remove(&ScreenId::Login);
                    self.previous_screen = None;
                    self.action_tx.send(Action::Refresh)?;
                    self.action_tx
                        .send(Action::Notify(Notification::success("Signed in")))?;
                }
            }

            Action::SessionChanged(state) => {
                let was_logged_in = self.session.is_logged_in();
                self.session = *state;
                self.broadcast(action)?;
                if *state == SessionState::Expired && was_logged_in {
                    self.show_login()?;
                    self.action_tx.send(Action::Notify(Notification::warning(
                        "Session expired, please sign in again",
                    )))?;
                }
            }

            Action::Logout => {
                self.console.logout();
                self.show_login()?;
                self.action_tx
                    .send(Action::Notify(Notification::info("Signed out")))?;
            }

            // ── Data ────────────────────────────────────────────────
            Action::VouchersUpdated(_)
            | Action::SalesUpdated(_)
            | Action::StatsUpdated(_)
            | Action::FilterChanged(_) => self.broadcast(action)?,

            Action::Refresh => self.refresh(),

            Action::RefreshFinished => self.refreshing = false,

            Action::ApplyFilter(filter) => self.apply_filter(filter.clone()),

            // ── Row actions ─────────────────────────────────────────
            Action::RequestRowAction(row_action, voucher) => {
                self.pending_confirm = Some(PendingConfirm::new(*row_action, voucher));
            }

            Action::ConfirmYes => {
                if let Some(pending) = self.pending_confirm.take() {
                    let fallback = format!("{} done", pending.key.action.label());
                    self.execute_command(pending.key.into_command(None), fallback);
                }
            }

            Action::ConfirmNo => self.pending_confirm = None,

            Action::OpenForm(kind) => self.form = Some(Form::new(*kind)),

            Action::CloseForm => self.form = None,

            Action::AddVoucher { serial, pin, kind } => {
                self.execute_command(
                    Command::AddVoucher {
                        serial: serial.clone(),
                        pin: pin.clone(),
                        kind: kind.clone(),
                    },
                    "Voucher added".into(),
                );
            }

            Action::ImportFile(path) => self.import_file(path.clone()),

            Action::Export(kind) => {
                let note = match write_export(&self.console, *kind, Path::new(".")) {
                    Ok(path) => Notification::success(format!("Exported to {}", path.display())),
                    Err(e) => Notification::error(format!("Export failed: {e}")),
                };
                self.action_tx.send(Action::Notify(note))?;
            }

            // ── Search ──────────────────────────────────────────────
            Action::OpenSearch => {
                self.search_active = true;
                self.search_query.clear();
            }

            Action::CloseSearch => {
                self.search_active = false;
                self.search_query.clear();
                self.forward_to_active(action)?;
            }

            Action::SearchSubmit => {
                self.search_active = false;
                self.forward_to_active(action)?;
            }

            Action::SearchInput(_) => self.forward_to_active(action)?,

            Action::Notify(n) => self.notification = Some((n.clone(), Instant::now())),
        }

        Ok(())
    }

    fn broadcast(&mut self, action: &Action) -> Result<()> {
        for screen in self.screens.values_mut() {
            if let Some(follow_up) = screen.update(action)? {
                self.action_tx.send(follow_up)?;
            }
        }
        Ok(())
    }

    fn forward_to_active(&mut self, action: &Action) -> Result<()> {
        if let Some(screen) = self.screens.get_mut(&self.active_screen) {
            if let Some(follow_up) = screen.update(action)? {
                self.action_tx.send(follow_up)?;
            }
        }
        Ok(())
    }

    // ── Background work ─────────────────────────────────────────────

    fn notify_error(tx: &mpsc::UnboundedSender<Action>, err: &CoreError) {
        // Session expiry is announced by the session watch.
        if !matches!(err, CoreError::SessionExpired) {
            let _ = tx.send(Action::Notify(Notification::error(err.user_message())));
        }
    }

    fn refresh(&mut self) {
        if self.refreshing || !self.console.is_logged_in() {
            return;
        }
        self.refreshing = true;
        let console = self.console.clone();
        let tx = self.action_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = console.full_refresh().await {
                warn!(error = %e, "refresh failed");
                Self::notify_error(&tx, &e);
            }
            let _ = tx.send(Action::RefreshFinished);
        });
    }

    fn apply_filter(&self, filter: VoucherFilter) {
        let console = self.console.clone();
        let tx = self.action_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = console.load_vouchers(&filter).await {
                Self::notify_error(&tx, &e);
            }
        });
    }

    /// Run a write command; the outcome arrives as a toast.
    fn execute_command(&self, cmd: Command, fallback: String) {
        let console = self.console.clone();
        let tx = self.action_tx.clone();
        tokio::spawn(async move {
            match console.execute(cmd).await {
                Ok(result) => {
                    let _ = tx.send(Action::Notify(Notification::success(
                        result.summary(&fallback),
                    )));
                }
                Err(e) => {
                    warn!(error = %e, "command failed");
                    Self::notify_error(&tx, &e);
                }
            }
        });
    }

    fn import_file(&self, path: PathBuf) {
        let console = self.console.clone();
        let tx = self.action_tx.clone();
        tokio::spawn(async move {
            let text = match tokio::fs::read_to_string(&path).await {
                Ok(text) => text,
                Err(e) => {
                    let _ = tx.send(Action::Notify(Notification::error(format!(
                        "Cannot read {}: {e}",
                        path.display()
                    ))));
                    return;
                }
            };
            let file_name = path
                .file_name()
                .map_or_else(|| "vouchers.csv".into(), |n| n.to_string_lossy().into_owned());
            match console.import_csv(&text, &file_name).await {
                Ok(result) => {
                    let _ = tx.send(Action::Notify(Notification::success(
                        result.summary("Upload complete"),
                    )));
                }
                Err(e) => Self::notify_error(&tx, &e),
            }
        });
    }

    // ── Rendering ───────────────────────────────────────────────────

    fn render(&self, frame: &mut Frame) {
        let area = frame.area();

        if self.active_screen == ScreenId::Login {
            if let Some(screen) = self.screens.get(&ScreenId::Login) {
                screen.render(frame, area);
            }
            if let Some((ref note, _)) = self.notification {
                render_notification(frame, area, note);
            }
            return;
        }

        let layout = Layout::vertical([
            Constraint::Min(1),
            Constraint::Length(1), // tabs
            Constraint::Length(1), // status
        ])
        .split(area);

        if let Some(screen) = self.screens.get(&self.active_screen) {
            screen.render(frame, layout[0]);
        }
        self.render_tab_bar(frame, layout[1]);
        self.render_status_bar(frame, layout[2]);

        if let Some((ref note, _)) = self.notification {
            render_notification(frame, area, note);
        }
        if let Some(ref form) = self.form {
            form.render(frame, area);
        }
        if let Some(ref pending) = self.pending_confirm {
            render_confirm(frame, area, pending);
        }
        if self.help_visible {
            render_help(frame, area);
        }
    }

    fn render_tab_bar(&self, frame: &mut Frame, area: Rect) {
        let titles: Vec<Line> = ScreenId::ALL
            .iter()
            .map(|&id| {
                let style = if id == self.active_screen {
                    theme::tab_active()
                } else {
                    theme::tab_inactive()
                };
                Line::from(Span::styled(format!(" {} {} ", id.number(), id.label()), style))
            })
            .collect();
        let selected = ScreenId::ALL
            .iter()
            .position(|&s| s == self.active_screen)
            .unwrap_or(0);
        let tabs = Tabs::new(titles)
            .divider(Span::styled(" ", theme::key_hint()))
            .select(selected);
        frame.render_widget(tabs, area);
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        if self.search_active {
            let line = Line::from(vec![
                Span::styled(" / ", Style::default().fg(theme::ACCENT)),
                Span::styled(self.search_query.clone(), Style::default().fg(theme::TEAL)),
                Span::styled("█", Style::default().fg(theme::TEAL)),
                Span::styled("  Esc clear  Enter apply", theme::key_hint()),
            ]);
            frame.render_widget(Paragraph::new(line), area);
            return;
        }

        let indicator = if self.refreshing {
            Span::styled("◐ refreshing", Style::default().fg(theme::AMBER))
        } else {
            match self.session {
                SessionState::LoggedIn { remember: true } => {
                    Span::styled("● signed in", Style::default().fg(theme::GREEN))
                }
                SessionState::LoggedIn { remember: false } => {
                    Span::styled("● signed in (this session)", Style::default().fg(theme::GREEN))
                }
                SessionState::LoggedOut => {
                    Span::styled("○ signed out", Style::default().fg(theme::RED))
                }
                SessionState::Expired => {
                    Span::styled("○ session expired", Style::default().fg(theme::RED))
                }
            }
        };
        let line = Line::from(vec![
            Span::raw(" "),
            indicator,
            Span::styled(format!("  {}", self.defaults.profile), theme::key_hint()),
            Span::styled(" │ ? help  R refresh  L logout  q quit", theme::key_hint()),
        ]);
        frame.render_widget(Paragraph::new(line), area);
    }
}

/// Write the current voucher list (filtered) or all sales as CSV into `dir`.
fn write_export(console: &Console, kind: ExportKind, dir: &Path) -> std::io::Result<PathBuf> {
    let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
    let (name, csv) = match kind {
        ExportKind::Vouchers => {
            let list = console.filtered_vouchers();
            (
                format!("vouchers-{stamp}.csv"),
                export::vouchers_csv(list.iter().map(Arc::as_ref)),
            )
        }
        ExportKind::Sales => {
            let list = console.store().sales_snapshot();
            (
                format!("sales-{stamp}.csv"),
                export::sales_csv(list.iter().map(Arc::as_ref)),
            )
        }
    };
    let path = dir.join(name);
    std::fs::write(&path, csv)?;
    Ok(path)
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width.saturating_sub(4));
    let height = height.min(area.height);
    Rect::new(
        area.x + area.width.saturating_sub(width) / 2,
        area.y + area.height.saturating_sub(height) / 2,
        width,
        height,
    )
}

fn render_confirm(frame: &mut Frame, area: Rect, pending: &PendingConfirm) {
    let rect = centered(area, 60, 5);
    frame.render_widget(Clear, rect);
    let block = Block::default()
        .title(" Confirm ")
        .title_style(theme::title_style())
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(theme::AMBER))
        .style(Style::default().bg(theme::BG_DARK));
    let inner = block.inner(rect);
    frame.render_widget(block, rect);

    let text = vec![
        Line::from(Span::styled(format!("  {pending}"), theme::table_row())),
        Line::from(""),
        Line::from(vec![
            Span::styled("  y ", theme::key_hint_key()),
            Span::styled("confirm    ", theme::key_hint()),
            Span::styled("n ", theme::key_hint_key()),
            Span::styled("cancel", theme::key_hint()),
        ]),
    ];
    frame.render_widget(Paragraph::new(text), inner);
}

fn render_notification(frame: &mut Frame, area: Rect, note: &Notification) {
    let len = u16::try_from(note.message.chars().count()).unwrap_or(u16::MAX);
    let width = len.saturating_add(6).clamp(20, 70).min(area.width);
    let height = 3u16;
    let rect = Rect::new(
        area.x + area.width.saturating_sub(width + 1),
        area.y + area.height.saturating_sub(height + 2),
        width,
        height,
    );

    let (color, icon) = match note.level {
        NotificationLevel::Success => (theme::GREEN, "✓"),
        NotificationLevel::Error => (theme::RED, "✗"),
        NotificationLevel::Warning => (theme::AMBER, "!"),
        NotificationLevel::Info => (theme::TEAL, "·"),
    };

    frame.render_widget(Clear, rect);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(color))
        .style(Style::default().bg(theme::BG_DARK));
    let inner = block.inner(rect);
    frame.render_widget(block, rect);
    frame.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled(format!(" {icon} "), Style::default().fg(color)),
            Span::styled(note.message.clone(), theme::table_row()),
        ])),
        inner,
    );
}

fn render_help(frame: &mut Frame, area: Rect) {
    let rect = centered(area, 56, 20);
    frame.render_widget(Clear, rect);
    let block = Block::default()
        .title(" Keyboard Shortcuts ")
        .title_style(theme::title_style())
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(theme::border_focused())
        .style(Style::default().bg(theme::BG_DARK));
    let inner = block.inner(rect);
    frame.render_widget(block, rect);

    let entry = |keys: &'static str, what: &'static str| {
        Line::from(vec![
            Span::styled(format!("  {keys:<10}"), theme::key_hint_key()),
            Span::styled(what, theme::key_hint()),
        ])
    };
    let section = |title: &'static str| Line::from(Span::styled(format!("  {title}"), theme::title_style()));

    let lines = vec![
        section("Navigation"),
        entry("1-3 Tab", "Switch screen"),
        entry("j/k ↑/↓", "Move"),
        entry("g/G", "Top / bottom"),
        entry("Esc", "Back"),
        Line::from(""),
        section("Vouchers"),
        entry("/", "Search"),
        entry("f", "Cycle status filter"),
        entry("m r d", "Mark used, resend, delete"),
        entry("a", "Add voucher"),
        entry("i", "Import CSV"),
        entry("e", "Export CSV"),
        Line::from(""),
        section("Global"),
        entry("R", "Refresh"),
        entry("L", "Log out"),
        entry("q", "Quit"),
    ];
    frame.render_widget(Paragraph::new(lines), inner);
}
