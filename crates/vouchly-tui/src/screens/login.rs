//! Login view: username, password, "remember me".
//!
//! Submitting spawns [`Console::login`] and reports back with
//! `Action::LoginFinished`; the app switches screens on success.

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Paragraph, Wrap};
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::mpsc::UnboundedSender;

use vouchly_core::Console;

use crate::action::Action;
use crate::component::Component;
use crate::theme;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Username,
    Password,
    Remember,
}

impl Field {
    fn next(self) -> Self {
        match self {
            Self::Username => Self::Password,
            Self::Password => Self::Remember,
            Self::Remember => Self::Username,
        }
    }

    fn prev(self) -> Self {
        match self {
            Self::Username => Self::Remember,
            Self::Password => Self::Username,
            Self::Remember => Self::Password,
        }
    }
}

pub struct LoginScreen {
    console: Console,
    profile: String,
    backend: String,
    action_tx: Option<UnboundedSender<Action>>,
    username: String,
    password: String,
    remember: bool,
    field: Field,
    show_password: bool,
    pending: bool,
    error: Option<String>,
    throbber_state: throbber_widgets_tui::ThrobberState,
}

impl LoginScreen {
    pub fn new(
        console: Console,
        profile: String,
        username: String,
        password: Option<&SecretString>,
    ) -> Self {
        let backend = console.config().url.to_string();
        let password = password.map(|p| p.expose_secret().to_owned()).unwrap_or_default();
        let field = if username.is_empty() && password.is_empty() {
            Field::Username
        } else {
            Field::Password
        };
        Self {
            console,
            profile,
            backend,
            action_tx: None,
            username,
            password,
            remember: true,
            field,
            show_password: false,
            pending: false,
            error: None,
            throbber_state: throbber_widgets_tui::ThrobberState::default(),
        }
    }

    fn active_input_mut(&mut self) -> Option<&mut String> {
        match self.field {
            Field::Username => Some(&mut self.username),
            Field::Password => Some(&mut self.password),
            Field::Remember => None,
        }
    }

    fn submit(&mut self) {
        if self.pending {
            return;
        }
        if self.password.is_empty() {
            self.error = Some("Password cannot be empty".into());
            self.field = Field::Password;
            return;
        }
        self.error = None;

        let Some(tx) = self.action_tx.clone() else {
            return;
        };
        self.pending = true;

        let console = self.console.clone();
        let username = Some(self.username.trim().to_owned()).filter(|u| !u.is_empty());
        let password = SecretString::from(self.password.clone());
        let remember = self.remember;
        tokio::spawn(async move {
            let result = console
                .login(username.as_deref(), &password, remember)
                .await
                .map_err(|e| e.user_message());
            let _ = tx.send(Action::LoginFinished(result));
        });
    }

    fn render_field(&self, field: Field, label: &str, value: &str) -> Line<'static> {
        let active = self.field == field;
        let cursor = if active && !self.pending { "█" } else { "" };
        Line::from(vec![
            Span::styled(
                format!("  {label:<10}"),
                if active { theme::key_hint_key() } else { theme::key_hint() },
            ),
            Span::styled(format!("{value}{cursor}"), theme::table_row()),
        ])
    }
}

impl Component for LoginScreen {
    fn init(&mut self, action_tx: UnboundedSender<Action>) -> Result<()> {
        self.action_tx = Some(action_tx);
        Ok(())
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if self.pending {
            return Ok(None);
        }
        match key.code {
            KeyCode::Esc => return Ok(Some(Action::Quit)),
            KeyCode::Enter => self.submit(),
            KeyCode::Tab | KeyCode::Down => self.field = self.field.next(),
            KeyCode::BackTab | KeyCode::Up => self.field = self.field.prev(),
            KeyCode::Char(' ') if self.field == Field::Remember => {
                self.remember = !self.remember;
            }
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.show_password = !self.show_password;
            }
            KeyCode::Backspace => {
                if let Some(input) = self.active_input_mut() {
                    input.pop();
                }
            }
            KeyCode::Char(c) => {
                if let Some(input) = self.active_input_mut() {
                    input.push(c);
                }
            }
            _ => {}
        }
        Ok(None)
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::LoginFinished(result) => {
                self.pending = false;
                match result {
                    Ok(()) => {
                        self.password.clear();
                        self.error = None;
                    }
                    Err(msg) => self.error = Some(msg.clone()),
                }
            }
            Action::Tick if self.pending => self.throbber_state.calc_next(),
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        frame.render_widget(
            Block::default().style(Style::default().bg(theme::BG_DARK)),
            area,
        );

        let width = 60u16.min(area.width.saturating_sub(4));
        let height = 14u16.min(area.height);
        let panel = Rect::new(
            area.x + area.width.saturating_sub(width) / 2,
            area.y + area.height.saturating_sub(height) / 2,
            width,
            height,
        );
        let block = Block::default()
            .title(" vouchly admin ")
            .title_style(theme::title_style())
            .title_alignment(Alignment::Center)
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_focused());
        let inner = block.inner(panel);
        frame.render_widget(block, panel);

        let layout = Layout::vertical([
            Constraint::Length(2), // target
            Constraint::Length(4), // fields
            Constraint::Length(2), // status
            Constraint::Min(0),
            Constraint::Length(1), // hints
        ])
        .split(inner);

        frame.render_widget(
            Paragraph::new(Line::from(vec![
                Span::styled("  Profile ", theme::key_hint()),
                Span::styled(self.profile.clone(), Style::default().fg(theme::TEAL)),
                Span::styled("  at ", theme::key_hint()),
                Span::styled(self.backend.clone(), Style::default().fg(theme::ACCENT)),
            ])),
            layout[0],
        );

        let masked = if self.show_password {
            self.password.clone()
        } else {
            "•".repeat(self.password.chars().count())
        };
        let checkbox = if self.remember { "[x]" } else { "[ ]" };
        let fields = vec![
            self.render_field(Field::Username, "Username", &self.username),
            self.render_field(Field::Password, "Password", &masked),
            Line::from(""),
            Line::from(vec![
                Span::styled(
                    format!("  {checkbox} "),
                    if self.field == Field::Remember {
                        theme::key_hint_key()
                    } else {
                        theme::key_hint()
                    },
                ),
                Span::styled("Remember me on this machine", theme::table_row()),
            ]),
        ];
        frame.render_widget(Paragraph::new(fields), layout[1]);

        if self.pending {
            let throbber = throbber_widgets_tui::Throbber::default()
                .label("  Signing in...")
                .style(Style::default().fg(theme::TEAL))
                .throbber_style(Style::default().fg(theme::ACCENT));
            frame.render_stateful_widget(throbber, layout[2], &mut self.throbber_state.clone());
        } else if let Some(ref err) = self.error {
            frame.render_widget(
                Paragraph::new(Span::styled(
                    format!("  {err}"),
                    Style::default().fg(theme::RED).add_modifier(Modifier::BOLD),
                ))
                .wrap(Wrap { trim: false }),
                layout[2],
            );
        }

        frame.render_widget(
            Paragraph::new(Line::from(vec![
                Span::styled("  Enter ", theme::key_hint_key()),
                Span::styled("sign in  ", theme::key_hint()),
                Span::styled("Tab ", theme::key_hint_key()),
                Span::styled("next  ", theme::key_hint()),
                Span::styled("Space ", theme::key_hint_key()),
                Span::styled("toggle  ", theme::key_hint()),
                Span::styled("Ctrl+u ", theme::key_hint_key()),
                Span::styled("show  ", theme::key_hint()),
                Span::styled("Esc ", theme::key_hint_key()),
                Span::styled("quit", theme::key_hint()),
            ])),
            layout[4],
        );
    }
}
